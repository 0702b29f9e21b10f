pub mod materials;

use serde::{Deserialize, Serialize};

use crate::error::{AttenError, AttenResult};
use crate::reference::Interpolate;
use crate::run::RunRecord;

/// Cs-137 gamma line, MeV.
pub const CS137_LINE_MEV: f64 = 0.662;
/// Default window for `find_at`, MeV (1 keV).
pub const DEFAULT_ENERGY_TOLERANCE_MEV: f64 = 1.0e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    /// MeV
    pub energy: f64,
    pub mu_rho_reference: f64,
    pub mu_rho_measured: f64,
    /// 0 when `valid` is false.
    pub difference_percent: f64,
    pub valid: bool,
}

impl ComparisonRecord {
    pub fn new(energy: f64, mu_rho_reference: f64, mu_rho_measured: f64) -> Self {
        let valid = mu_rho_reference > 0.0 && mu_rho_measured > 0.0;
        let difference_percent = if valid {
            (mu_rho_measured - mu_rho_reference) / mu_rho_reference * 100.0
        } else {
            0.0
        };
        Self {
            energy,
            mu_rho_reference,
            mu_rho_measured,
            difference_percent,
            valid,
        }
    }

    pub fn energy_kev(&self) -> f64 {
        self.energy * 1000.0
    }
}

/// Pairs measured (energy, mu/rho) values with the reference, ascending by energy.
pub fn compare<R>(measured: &[(f64, f64)], reference: &R) -> AttenResult<Vec<ComparisonRecord>>
where
    R: Interpolate + ?Sized,
{
    let mut out = Vec::with_capacity(measured.len());
    for &(energy, mu_rho) in measured {
        if !(energy.is_finite() && energy > 0.0) {
            return Err(AttenError::config(
                reference.name(),
                format!("measured energy must be > 0 MeV, got {}", energy),
            ));
        }
        let mu_rho_reference = reference.lookup(energy)?;
        out.push(ComparisonRecord::new(energy, mu_rho_reference, mu_rho));
    }
    out.sort_by(|a, b| a.energy.total_cmp(&b.energy));
    Ok(out)
}

/// (max, min) by difference percent over valid records.
pub fn find_extrema(records: &[ComparisonRecord]) -> Option<(&ComparisonRecord, &ComparisonRecord)> {
    let mut valid = records.iter().filter(|r| r.valid);
    let first = valid.next()?;
    let (mut max, mut min) = (first, first);
    for r in valid {
        if r.difference_percent > max.difference_percent {
            max = r;
        }
        if r.difference_percent < min.difference_percent {
            min = r;
        }
    }
    Some((max, min))
}

/// First record whose energy is within `tolerance` MeV of `target_energy`.
pub fn find_at(
    records: &[ComparisonRecord],
    target_energy: f64,
    tolerance: f64,
) -> Option<&ComparisonRecord> {
    records
        .iter()
        .find(|r| (r.energy - target_energy).abs() <= tolerance)
}

/// Measured (energy, mu/rho) pairs from runs of one material.
///
/// Runs without an energy or with no transmission map to mu/rho = 0, which
/// `compare` turns into an invalid record.
pub fn measured_mass_attenuation(records: &[RunRecord], density: f64) -> Vec<(f64, f64)> {
    records
        .iter()
        .filter_map(|r| {
            let energy = r.energy_mev?;
            let mu_rho = match r.attenuation_coeff() {
                Ok(mu) if density > 0.0 => mu / density,
                _ => 0.0,
            };
            Some((energy, mu_rho))
        })
        .collect()
}

/// Comparison table of one material plus its summary extrema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialComparison {
    pub material: String,
    pub records: Vec<ComparisonRecord>,
    pub max_difference: Option<ComparisonRecord>,
    pub min_difference: Option<ComparisonRecord>,
    pub calibration: Option<ComparisonRecord>,
}

impl MaterialComparison {
    pub fn new(
        material: impl Into<String>,
        records: Vec<ComparisonRecord>,
        calibration_energy: f64,
        tolerance: f64,
    ) -> Self {
        let (max_difference, min_difference) = match find_extrema(&records) {
            Some((max, min)) => (Some(max.clone()), Some(min.clone())),
            None => (None, None),
        };
        let calibration = find_at(&records, calibration_energy, tolerance).cloned();
        Self {
            material: material.into(),
            records,
            max_difference,
            min_difference,
            calibration,
        }
    }
}
