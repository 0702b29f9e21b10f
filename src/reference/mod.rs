//! Tabulated mass attenuation coefficients and log-log interpolation.

mod loader;

pub use loader::{ReferenceLibrary, load_builtin_v1, load_reference_tsv, merge_tables};

use serde::{Deserialize, Serialize};

use crate::error::{AttenError, AttenResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// MeV
    pub energy: f64,
    /// cm^2/g
    pub mu_over_rho: f64,
}

impl ReferencePoint {
    pub fn new(energy: f64, mu_over_rho: f64) -> Self {
        Self {
            energy,
            mu_over_rho,
        }
    }
}

/// Anything that can answer "mu/rho at this energy".
pub trait Interpolate {
    fn name(&self) -> &str;
    fn lookup(&self, energy: f64) -> AttenResult<f64>;
}

/// An ordered table for one material. Energies are strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    material: String,
    points: Vec<ReferencePoint>,
}

impl ReferenceTable {
    pub fn new(material: impl Into<String>, points: Vec<ReferencePoint>) -> AttenResult<Self> {
        let material = material.into();
        if points.len() < 2 {
            return Err(AttenError::config(
                &material,
                format!(
                    "reference table needs at least 2 points, got {}",
                    points.len()
                ),
            ));
        }
        for (i, p) in points.iter().enumerate() {
            if !(p.energy.is_finite() && p.energy > 0.0) {
                return Err(AttenError::config(
                    &material,
                    format!("reference point {} has non-positive energy {}", i, p.energy),
                ));
            }
            if !(p.mu_over_rho.is_finite() && p.mu_over_rho > 0.0) {
                return Err(AttenError::config(
                    &material,
                    format!(
                        "reference point {} has non-positive mu/rho {}",
                        i, p.mu_over_rho
                    ),
                ));
            }
        }
        if let Some(i) = points.windows(2).position(|w| w[1].energy <= w[0].energy) {
            return Err(AttenError::config(
                &material,
                format!(
                    "reference energies must be strictly increasing (point {} = {} MeV, point {} = {} MeV)",
                    i,
                    points[i].energy,
                    i + 1,
                    points[i + 1].energy
                ),
            ));
        }
        Ok(Self { material, points })
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn points(&self) -> &[ReferencePoint] {
        &self.points
    }

    pub fn energy_range(&self) -> (f64, f64) {
        (self.points[0].energy, self.points[self.points.len() - 1].energy)
    }

    /// Tabulated energies return the stored value; values outside the table are
    /// clamped to the nearest edge.
    pub fn lookup(&self, energy: f64) -> AttenResult<f64> {
        if !energy.is_finite() {
            return Err(AttenError::config(
                &self.material,
                format!("cannot look up non-finite energy {}", energy),
            ));
        }
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if energy <= first.energy {
            return Ok(first.mu_over_rho);
        }
        if energy >= last.energy {
            return Ok(last.mu_over_rho);
        }

        // first.energy < energy < last.energy, so 1 <= j <= len - 1
        let j = self.points.partition_point(|p| p.energy < energy);
        let hi = self.points[j];
        if hi.energy == energy {
            return Ok(hi.mu_over_rho);
        }
        let lo = self.points[j - 1];
        Ok(log_log_interp(lo, hi, energy))
    }
}

impl Interpolate for ReferenceTable {
    fn name(&self) -> &str {
        &self.material
    }

    fn lookup(&self, energy: f64) -> AttenResult<f64> {
        ReferenceTable::lookup(self, energy)
    }
}

fn log_log_interp(lo: ReferencePoint, hi: ReferencePoint, energy: f64) -> f64 {
    let x1 = lo.energy.ln();
    let x2 = hi.energy.ln();
    let y1 = lo.mu_over_rho.ln();
    let y2 = hi.mu_over_rho.ln();
    let x = energy.ln();
    (y1 + (y2 - y1) * (x - x1) / (x2 - x1)).exp()
}
