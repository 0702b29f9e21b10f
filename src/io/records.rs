use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::io::open_maybe_gz;
use crate::run::{RunRecord, UncertaintyModel};

/// The first six columns are fixed for downstream report tooling.
pub const RECORDS_HEADER: &str = "material\tthicknessCm\ttotalEvents\ttransmittedEvents\ttransmissionRatio\tattenuationCoeffLinear\tenergy_MeV\ttransmissionError\tstatus";

pub fn write_run_records(path: &Path, records: &[RunRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    write_run_records_to(&mut w, records)?;
    w.flush()?;
    Ok(())
}

pub fn write_run_records_to<W: Write>(w: &mut W, records: &[RunRecord]) -> Result<()> {
    writeln!(w, "{}", RECORDS_HEADER)?;
    for r in records {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{:.6}\t{:.6}\t{}\t{:.6e}\t{}",
            r.material,
            r.thickness_cm,
            r.total_events,
            r.transmitted_events,
            r.transmission_ratio,
            r.attenuation_coeff_linear,
            r.energy_mev
                .map(|e| e.to_string())
                .unwrap_or_else(|| "NA".to_string()),
            r.transmission_error,
            r.status()
        )?;
    }
    Ok(())
}

/// Reads a RunRecord table. Ratios and coefficients are re-derived from the counts.
pub fn read_run_records(path: &Path, model: UncertaintyModel) -> Result<Vec<RunRecord>> {
    let reader = open_maybe_gz(path)
        .with_context(|| format!("failed to open run records {}", path.display()))?;
    let mut reader = BufReader::new(reader);
    let source = path.display().to_string();

    let mut records = Vec::new();
    let mut line = String::new();
    let mut line_no = 0usize;
    while reader
        .read_line(&mut line)
        .with_context(|| format!("{}:{} read error", source, line_no + 1))?
        > 0
    {
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("material\t") {
            line.clear();
            continue;
        }
        let parts: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        if parts.len() < 6 {
            bail!("{}:{} malformed run record (expected at least 6 columns)", source, line_no);
        }
        let thickness_cm: f64 = parts[1]
            .parse()
            .with_context(|| format!("{}:{} invalid thicknessCm '{}'", source, line_no, parts[1]))?;
        let total: u64 = parts[2]
            .parse()
            .with_context(|| format!("{}:{} invalid totalEvents '{}'", source, line_no, parts[2]))?;
        let transmitted: u64 = parts[3].parse().with_context(|| {
            format!("{}:{} invalid transmittedEvents '{}'", source, line_no, parts[3])
        })?;
        let energy_mev = match parts.get(6).copied() {
            None | Some("") | Some("NA") | Some("-") => None,
            Some(raw) => Some(
                raw.parse::<f64>()
                    .with_context(|| format!("{}:{} invalid energy_MeV '{}'", source, line_no, raw))?,
            ),
        };
        let record = RunRecord::from_counts(parts[0], thickness_cm, energy_mev, total, transmitted, model)
            .with_context(|| format!("{}:{} invalid run record", source, line_no))?;
        records.push(record);
        line.clear();
    }

    if records.is_empty() {
        bail!("{}: no run records", source);
    }
    Ok(records)
}
