//! Beer–Lambert extraction by weighted least squares on -ln(T) versus thickness.
//!
//! Two models are supported and the caller picks one: a line through the
//! origin (`Proportional`, μ only) and a free-intercept line (`Linear`).

mod solve;

pub use solve::fit;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AttenError, AttenResult};
use crate::run::RunRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitModel {
    /// response = slope * x
    #[default]
    Proportional,
    /// response = intercept + slope * x
    Linear,
}

impl FitModel {
    pub fn free_parameters(self) -> usize {
        match self {
            Self::Proportional => 1,
            Self::Linear => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proportional => "proportional",
            Self::Linear => "linear",
        }
    }
}

/// How parameter errors relate to the supplied weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorScale {
    /// Weights are 1/sigma^2; covariance is the inverted weighted design matrix.
    #[default]
    Absolute,
    /// Weights are relative; covariance is scaled by chi^2 / ndf.
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FitOptions {
    pub model: FitModel,
    pub error_scale: ErrorScale,
}

impl FitOptions {
    pub fn new(model: FitModel, error_scale: ErrorScale) -> Self {
        Self { model, error_scale }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitWarning {
    NonPositiveSlope { slope: f64 },
    PointSkipped { thickness_cm: f64, reason: String },
}

impl fmt::Display for FitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveSlope { slope } => {
                write!(f, "non-positive slope {:.6}: data not attenuating", slope)
            }
            Self::PointSkipped {
                thickness_cm,
                reason,
            } => write!(f, "point at {} cm skipped: {}", thickness_cm, reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: FitModel,
    /// Linear attenuation coefficient, cm^-1.
    pub slope: f64,
    pub slope_error: f64,
    pub intercept: f64,
    pub intercept_error: Option<f64>,
    pub chi_square: f64,
    pub ndf: usize,
    /// ln 2 / slope; `None` when slope <= 0.
    pub half_value_layer: Option<f64>,
    /// ln 10 / slope; `None` when slope <= 0.
    pub tenth_value_layer: Option<f64>,
    pub points: usize,
    pub warnings: Vec<FitWarning>,
}

impl FitResult {
    pub fn reduced_chi_square(&self) -> Option<f64> {
        if self.ndf == 0 {
            None
        } else {
            Some(self.chi_square / self.ndf as f64)
        }
    }

    pub fn is_attenuating(&self) -> bool {
        self.slope > 0.0
    }

    /// The slope as a physical coefficient; `NumericDegeneracy` when it is not.
    pub fn attenuation_coeff(&self, config: &str) -> AttenResult<f64> {
        if self.is_attenuating() {
            Ok(self.slope)
        } else {
            Err(AttenError::degenerate(
                config,
                format!("fitted slope {} is not positive", self.slope),
            ))
        }
    }

    /// (mu/rho, error) in cm^2/g.
    pub fn mass_attenuation(&self, density: f64) -> Option<(f64, f64)> {
        if density > 0.0 && self.is_attenuating() {
            Some((self.slope / density, self.slope_error / density))
        } else {
            None
        }
    }
}

/// Fits a thickness sweep of one material at one energy.
///
/// Responses are -ln(T) with weights 1/sigma^2, sigma(-ln T) = sigma(T) / T.
/// Runs with no transmission or zero uncertainty are skipped with a warning.
pub fn fit_sweep(records: &[RunRecord], options: FitOptions) -> AttenResult<FitResult> {
    let Some(first) = records.first() else {
        return Err(AttenError::FitUnderdetermined {
            config: "empty sweep".to_string(),
            points: 0,
            parameters: options.model.free_parameters(),
        });
    };
    let label = sweep_label(&first.material, first.energy_mev);
    if let Some(other) = records
        .iter()
        .find(|r| r.material != first.material || r.energy_mev != first.energy_mev)
    {
        return Err(AttenError::config(
            label,
            format!("sweep mixes configurations: {}", other.label()),
        ));
    }

    let mut thicknesses = Vec::with_capacity(records.len());
    let mut responses = Vec::with_capacity(records.len());
    let mut weights = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for p in sweep_points(records) {
        let (Some(response), Some(sigma)) = (p.neg_log_transmission, p.neg_log_error) else {
            skipped.push(FitWarning::PointSkipped {
                thickness_cm: p.thickness_cm,
                reason: "no photons transmitted".to_string(),
            });
            continue;
        };
        if !(sigma.is_finite() && sigma > 0.0) {
            skipped.push(FitWarning::PointSkipped {
                thickness_cm: p.thickness_cm,
                reason: "zero transmission uncertainty".to_string(),
            });
            continue;
        }
        thicknesses.push(p.thickness_cm);
        responses.push(response);
        weights.push(1.0 / (sigma * sigma));
    }

    for w in &skipped {
        tracing::warn!(sweep = %label, "{}", w);
    }

    let mut result = solve::fit_labeled(&label, &thicknesses, &responses, &weights, options)?;
    skipped.extend(result.warnings.drain(..));
    result.warnings = skipped;
    Ok(result)
}

pub fn sweep_label(material: &str, energy_mev: Option<f64>) -> String {
    match energy_mev {
        Some(e) => format!("{} {} MeV", material, e),
        None => material.to_string(),
    }
}

/// One run of a sweep as it enters the fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub thickness_cm: f64,
    pub transmitted: u64,
    pub transmission: f64,
    pub transmission_error: f64,
    /// -ln(T); `None` when nothing was transmitted.
    pub neg_log_transmission: Option<f64>,
    /// sigma(T) / T, alongside `neg_log_transmission`.
    pub neg_log_error: Option<f64>,
}

impl SweepPoint {
    pub fn from_record(r: &RunRecord) -> Self {
        let usable = !r.is_degenerate() && r.transmission_ratio > 0.0;
        Self {
            thickness_cm: r.thickness_cm,
            transmitted: r.transmitted_events,
            transmission: r.transmission_ratio,
            transmission_error: r.transmission_error,
            neg_log_transmission: usable.then(|| -r.transmission_ratio.ln()),
            neg_log_error: usable.then(|| r.transmission_error / r.transmission_ratio),
        }
    }
}

/// Points of a sweep in thickness order.
pub fn sweep_points(records: &[RunRecord]) -> Vec<SweepPoint> {
    let mut points: Vec<SweepPoint> = records.iter().map(SweepPoint::from_record).collect();
    points.sort_by(|a, b| a.thickness_cm.total_cmp(&b.thickness_cm));
    points
}

/// A fit attached to the sweep it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFit {
    pub material: String,
    pub energy_mev: Option<f64>,
    /// g/cm^3, when the material is in the catalog.
    pub density: Option<f64>,
    pub fit: FitResult,
    #[serde(default)]
    pub points: Vec<SweepPoint>,
}

impl SweepFit {
    pub fn label(&self) -> String {
        sweep_label(&self.material, self.energy_mev)
    }

    pub fn mass_attenuation(&self) -> Option<(f64, f64)> {
        self.density.and_then(|d| self.fit.mass_attenuation(d))
    }
}
