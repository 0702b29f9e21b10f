use serde::{Deserialize, Serialize};

use crate::compare::materials::MaterialContrast;
use crate::fit::FitModel;
use crate::run::UncertaintyModel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputMeta {
    pub source: Option<String>,
    pub runs: u64,
    pub fit_model: FitModel,
    pub uncertainty: UncertaintyModel,
    pub reference_version: Option<String>,
    pub calibration_energy_mev: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRow {
    pub material: String,
    #[serde(rename = "thicknessCm")]
    pub thickness_cm: f64,
    #[serde(rename = "energy_MeV")]
    pub energy_mev: Option<f64>,
    #[serde(rename = "totalEvents")]
    pub total_events: u64,
    #[serde(rename = "transmittedEvents")]
    pub transmitted_events: u64,
    #[serde(rename = "transmissionRatio")]
    pub transmission_ratio: f64,
    /// `None` when no photons were transmitted.
    #[serde(rename = "attenuationCoeffLinear")]
    pub attenuation_coeff_linear: Option<f64>,
    #[serde(rename = "transmissionError")]
    pub transmission_error: f64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSummary {
    pub material: String,
    #[serde(rename = "energy_MeV")]
    pub energy_mev: Option<f64>,
    pub model: FitModel,
    pub points: u64,
    pub slope: f64,
    #[serde(rename = "slopeError")]
    pub slope_error: f64,
    pub intercept: f64,
    #[serde(rename = "interceptError")]
    pub intercept_error: Option<f64>,
    #[serde(rename = "chiSquare")]
    pub chi_square: f64,
    pub ndf: u64,
    #[serde(rename = "halfValueLayer")]
    pub half_value_layer: Option<f64>,
    #[serde(rename = "tenthValueLayer")]
    pub tenth_value_layer: Option<f64>,
    #[serde(rename = "muRho")]
    pub mu_rho: Option<f64>,
    #[serde(rename = "muRhoError")]
    pub mu_rho_error: Option<f64>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    #[serde(rename = "energy_MeV")]
    pub energy_mev: f64,
    #[serde(rename = "energy_keV")]
    pub energy_kev: f64,
    #[serde(rename = "muRho_reference")]
    pub mu_rho_reference: f64,
    #[serde(rename = "muRho_measured")]
    pub mu_rho_measured: f64,
    pub difference_percent: f64,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub material: String,
    pub rows: Vec<ComparisonRow>,
    pub max_difference: Option<ComparisonRow>,
    pub min_difference: Option<ComparisonRow>,
    pub calibration: Option<ComparisonRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttenuationV1 {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub input_meta: InputMeta,
    pub runs: Vec<RunRow>,
    pub fits: Vec<FitSummary>,
    pub comparisons: Vec<ComparisonSummary>,
    pub material_contrast: Option<MaterialContrast>,
    pub warnings: Vec<String>,
}

impl AttenuationV1 {
    pub fn empty(tool_version: &str, fit_model: FitModel, uncertainty: UncertaintyModel) -> Self {
        Self {
            tool: "gamma-atten".to_string(),
            version: tool_version.to_string(),
            schema_version: "v1".to_string(),
            input_meta: InputMeta {
                source: None,
                runs: 0,
                fit_model,
                uncertainty,
                reference_version: None,
                calibration_energy_mev: crate::compare::CS137_LINE_MEV,
            },
            runs: Vec::new(),
            fits: Vec::new(),
            comparisons: Vec::new(),
            material_contrast: None,
            warnings: Vec::new(),
        }
    }
}
