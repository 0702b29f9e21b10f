use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::compare::ComparisonRecord;
use crate::compare::materials::MaterialContrast;
use crate::fit::SweepFit;

pub const COMPARISON_HEADER: &str =
    "energy_MeV\tenergy_keV\tmuRho_reference\tmuRho_measured\tdifference_percent";
pub const FIT_HEADER: &str = "material\tenergy_MeV\tmodel\tslope\tslopeError\tchiSquare\tndf\thalfValueLayer\ttenthValueLayer";
pub const SWEEP_HEADER: &str = "thickness_cm\ttransmitted\ttransmission\ttransmissionError\tnegLogTransmission\tnegLogTransmissionError";
pub const MATERIALS_HEADER: &str = "material\tdescription\tdensity_gcm3\tthickness_cm\ttransmission\tmu_cm1\tmuRho_cm2g\ttransmitted\ttotal";

pub fn write_comparison_tsv(path: &Path, records: &[ComparisonRecord]) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "{}", COMPARISON_HEADER)?;
    for r in records {
        writeln!(
            w,
            "{:.6}\t{:.1}\t{:.6e}\t{:.6e}\t{:.2}",
            r.energy,
            r.energy_kev(),
            r.mu_rho_reference,
            r.mu_rho_measured,
            r.difference_percent
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_fit_tsv(path: &Path, fits: &[SweepFit]) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "{}", FIT_HEADER)?;
    for f in fits {
        writeln!(
            w,
            "{}\t{}\t{}\t{:.6}\t{:.6}\t{:.4}\t{}\t{}\t{}",
            f.material,
            opt(f.energy_mev, |e| e.to_string()),
            f.fit.model.as_str(),
            f.fit.slope,
            f.fit.slope_error,
            f.fit.chi_square,
            f.fit.ndf,
            opt(f.fit.half_value_layer, |v| format!("{:.4}", v)),
            opt(f.fit.tenth_value_layer, |v| format!("{:.4}", v)),
        )?;
    }
    w.flush()?;
    Ok(())
}

/// Per-point table behind one sweep fit.
pub fn write_sweep_tsv(path: &Path, sweep: &SweepFit) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "{}", SWEEP_HEADER)?;
    for p in &sweep.points {
        writeln!(
            w,
            "{}\t{}\t{:.6}\t{:.6}\t{}\t{}",
            p.thickness_cm,
            p.transmitted,
            p.transmission,
            p.transmission_error,
            opt(p.neg_log_transmission, |v| format!("{:.6}", v)),
            opt(p.neg_log_error, |v| format!("{:.6}", v)),
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_materials_tsv(path: &Path, contrast: &MaterialContrast) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "{}", MATERIALS_HEADER)?;
    for s in &contrast.summaries {
        writeln!(
            w,
            "{}\t{}\t{:.2}\t{}\t{:.6}\t{}\t{}\t{}\t{}",
            s.material,
            s.description,
            s.density,
            s.thickness_cm,
            s.transmission,
            opt(s.mu, |v| format!("{:.6}", v)),
            opt(s.mu_rho, |v| format!("{:.6}", v)),
            s.transmitted,
            s.total
        )?;
    }
    w.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<std::fs::File>> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn opt<T>(value: Option<T>, f: impl FnOnce(T) -> String) -> String {
    value.map(f).unwrap_or_else(|| "NA".to_string())
}
