pub mod aggregate;

pub use aggregate::{RunState, SharedRunState, aggregate_events, finalize, finalize_with};

use serde::{Deserialize, Serialize};

use crate::error::{AttenError, AttenResult};

/// Written in place of the attenuation coefficient when nothing was transmitted.
pub const ATTENUATION_SENTINEL: f64 = 999.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyModel {
    /// sqrt(k) / N
    #[default]
    Poisson,
    /// sqrt(k * (1 - T)) / N
    Binomial,
}

impl UncertaintyModel {
    pub fn transmission_error(self, transmitted: u64, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let k = transmitted as f64;
        let n = total as f64;
        match self {
            Self::Poisson => k.sqrt() / n,
            Self::Binomial => (k * (1.0 - k / n)).max(0.0).sqrt() / n,
        }
    }
}

/// One line of a run manifest: a single (material, thickness, energy) run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub material: String,
    pub thickness_cm: f64,
    pub energy_mev: Option<f64>,
    pub expected_events: u64,
    pub events_path: std::path::PathBuf,
}

impl RunConfig {
    pub fn label(&self) -> String {
        run_label(&self.material, self.thickness_cm, self.energy_mev)
    }
}

pub(crate) fn run_label(material: &str, thickness_cm: f64, energy_mev: Option<f64>) -> String {
    match energy_mev {
        Some(e) => format!("{} {} cm {} MeV", material, thickness_cm, e),
        None => format!("{} {} cm", material, thickness_cm),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub material: String,
    pub thickness_cm: f64,
    pub energy_mev: Option<f64>,
    pub total_events: u64,
    pub transmitted_events: u64,
    pub transmission_ratio: f64,
    /// `ATTENUATION_SENTINEL` when `degeneracy` is set.
    pub attenuation_coeff_linear: f64,
    pub transmission_error: f64,
    pub degeneracy: Option<String>,
}

impl RunRecord {
    /// Builds a record from final counts, enforcing the run invariants.
    pub fn from_counts(
        material: &str,
        thickness_cm: f64,
        energy_mev: Option<f64>,
        total_events: u64,
        transmitted_events: u64,
        model: UncertaintyModel,
    ) -> AttenResult<Self> {
        let label = run_label(material, thickness_cm, energy_mev);
        if material.trim().is_empty() {
            return Err(AttenError::config(label, "material name is empty"));
        }
        if !(thickness_cm.is_finite() && thickness_cm > 0.0) {
            return Err(AttenError::config(
                label,
                format!("thickness must be > 0 cm, got {}", thickness_cm),
            ));
        }
        if let Some(e) = energy_mev {
            if !(e.is_finite() && e > 0.0) {
                return Err(AttenError::config(
                    label,
                    format!("energy must be > 0 MeV, got {}", e),
                ));
            }
        }
        if total_events == 0 {
            return Err(AttenError::config(label, "run has zero total events"));
        }
        if transmitted_events > total_events {
            return Err(AttenError::config(
                label,
                format!(
                    "transmitted events ({}) exceed total events ({})",
                    transmitted_events, total_events
                ),
            ));
        }

        let transmission_ratio = transmitted_events as f64 / total_events as f64;
        let (attenuation_coeff_linear, degeneracy) = if transmission_ratio > 0.0 {
            (-transmission_ratio.ln() / thickness_cm, None)
        } else {
            tracing::warn!(
                run = %label,
                total_events,
                "no photons transmitted; attenuation coefficient undefined"
            );
            (
                ATTENUATION_SENTINEL,
                Some("no photons transmitted".to_string()),
            )
        };

        Ok(Self {
            material: material.to_string(),
            thickness_cm,
            energy_mev,
            total_events,
            transmitted_events,
            transmission_ratio,
            attenuation_coeff_linear,
            transmission_error: model.transmission_error(transmitted_events, total_events),
            degeneracy,
        })
    }

    pub fn label(&self) -> String {
        run_label(&self.material, self.thickness_cm, self.energy_mev)
    }

    pub fn is_degenerate(&self) -> bool {
        self.degeneracy.is_some()
    }

    /// The linear attenuation coefficient, or `NumericDegeneracy` when the
    /// stored value is the sentinel.
    pub fn attenuation_coeff(&self) -> AttenResult<f64> {
        match &self.degeneracy {
            Some(reason) => Err(AttenError::degenerate(self.label(), reason.clone())),
            None => Ok(self.attenuation_coeff_linear),
        }
    }

    pub fn status(&self) -> &'static str {
        if self.is_degenerate() { "degenerate" } else { "ok" }
    }
}
