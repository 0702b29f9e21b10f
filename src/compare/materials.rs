use serde::{Deserialize, Serialize};

use crate::error::{AttenError, AttenResult};
use crate::materials::MaterialCatalog;
use crate::run::RunRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub material: String,
    pub description: String,
    pub density: f64,
    pub thickness_cm: f64,
    pub transmission: f64,
    /// cm^-1; `None` when nothing was transmitted.
    pub mu: Option<f64>,
    /// cm^2/g
    pub mu_rho: Option<f64>,
    pub transmitted: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialContrast {
    pub summaries: Vec<MaterialSummary>,
    pub density_range: (f64, f64),
    pub mu_range: Option<(f64, f64)>,
    /// max mu / min mu
    pub attenuation_factor: Option<f64>,
    /// Runs left out, one reason each.
    #[serde(default)]
    pub skipped: Vec<String>,
}

/// Side-by-side summary of several materials measured under the same conditions.
///
/// Runs whose material is not in the catalog are listed in `skipped`; the
/// contrast fails only when no known material is left.
pub fn contrast(records: &[RunRecord], catalog: &MaterialCatalog) -> AttenResult<MaterialContrast> {
    if records.is_empty() {
        return Err(AttenError::config("material contrast", "no runs to compare"));
    }

    let mut summaries = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    for r in records {
        let info = match catalog.get(&r.material) {
            Ok(info) => info,
            Err(err) => {
                skipped.push(err.to_string());
                continue;
            }
        };
        let mu = r.attenuation_coeff().ok();
        summaries.push(MaterialSummary {
            material: r.material.clone(),
            description: info.description.clone(),
            density: info.density,
            thickness_cm: r.thickness_cm,
            transmission: r.transmission_ratio,
            mu,
            mu_rho: mu.map(|m| m / info.density),
            transmitted: r.transmitted_events,
            total: r.total_events,
        });
    }

    if summaries.is_empty() {
        return Err(AttenError::config(
            "material contrast",
            format!("no known material among {} runs", records.len()),
        ));
    }

    let density_range = summaries
        .iter()
        .map(|s| s.density)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        });

    let mus: Vec<f64> = summaries.iter().filter_map(|s| s.mu).collect();
    let mu_range = if mus.is_empty() {
        None
    } else {
        Some(mus.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &m| {
            (lo.min(m), hi.max(m))
        }))
    };
    let attenuation_factor = mu_range.and_then(|(lo, hi)| if lo > 0.0 { Some(hi / lo) } else { None });

    Ok(MaterialContrast {
        summaries,
        density_range,
        mu_range,
        attenuation_factor,
        skipped,
    })
}
