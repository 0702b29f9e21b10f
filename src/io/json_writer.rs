use std::path::Path;

use anyhow::{Context, Result};

use crate::compare::ComparisonRecord;
use crate::ctx::{Ctx, RunSource};
use crate::schema::v1::{
    AttenuationV1, ComparisonRow, ComparisonSummary, FitSummary, InputMeta, RunRow,
};

pub fn build_report(ctx: &Ctx) -> Result<AttenuationV1> {
    let source = match &ctx.source {
        RunSource::Manifest(p) | RunSource::Records(p) => Some(p.display().to_string()),
    };
    let input_meta = InputMeta {
        source,
        runs: ctx.records.len() as u64,
        fit_model: ctx.fit_options.model,
        uncertainty: ctx.uncertainty,
        reference_version: ctx.library.as_ref().map(|l| l.version.clone()),
        calibration_energy_mev: ctx.calibration_energy,
    };

    let runs = ctx
        .records
        .iter()
        .map(|r| RunRow {
            material: r.material.clone(),
            thickness_cm: r.thickness_cm,
            energy_mev: r.energy_mev,
            total_events: r.total_events,
            transmitted_events: r.transmitted_events,
            transmission_ratio: r.transmission_ratio,
            attenuation_coeff_linear: r.attenuation_coeff().ok(),
            transmission_error: r.transmission_error,
            status: r.status().to_string(),
        })
        .collect();

    let fits = ctx
        .fits
        .iter()
        .map(|f| {
            let mass = f.mass_attenuation();
            FitSummary {
                material: f.material.clone(),
                energy_mev: f.energy_mev,
                model: f.fit.model,
                points: f.fit.points as u64,
                slope: f.fit.slope,
                slope_error: f.fit.slope_error,
                intercept: f.fit.intercept,
                intercept_error: f.fit.intercept_error,
                chi_square: f.fit.chi_square,
                ndf: f.fit.ndf as u64,
                half_value_layer: f.fit.half_value_layer,
                tenth_value_layer: f.fit.tenth_value_layer,
                mu_rho: mass.map(|m| m.0),
                mu_rho_error: mass.map(|m| m.1),
                warnings: f.fit.warnings.iter().map(|w| w.to_string()).collect(),
            }
        })
        .collect();

    let comparisons = ctx
        .comparisons
        .iter()
        .map(|c| ComparisonSummary {
            material: c.material.clone(),
            rows: c.records.iter().map(row).collect(),
            max_difference: c.max_difference.as_ref().map(row),
            min_difference: c.min_difference.as_ref().map(row),
            calibration: c.calibration.as_ref().map(row),
        })
        .collect();

    Ok(AttenuationV1 {
        tool: "gamma-atten".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: "v1".to_string(),
        input_meta,
        runs,
        fits,
        comparisons,
        material_contrast: ctx.contrast.clone(),
        warnings: ctx.warnings.clone(),
    })
}

pub fn write_json(path: &Path, ctx: &Ctx) -> Result<()> {
    let report = build_report(ctx)?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &report)?;
    Ok(())
}

fn row(r: &ComparisonRecord) -> ComparisonRow {
    ComparisonRow {
        energy_mev: r.energy,
        energy_kev: r.energy_kev(),
        mu_rho_reference: r.mu_rho_reference,
        mu_rho_measured: r.mu_rho_measured,
        difference_percent: r.difference_percent,
        valid: r.valid,
    }
}
