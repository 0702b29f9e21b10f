use std::path::PathBuf;

use crate::compare::materials::MaterialContrast;
use crate::compare::{CS137_LINE_MEV, DEFAULT_ENERGY_TOLERANCE_MEV, MaterialComparison};
use crate::fit::{FitOptions, SweepFit};
use crate::materials::MaterialCatalog;
use crate::reference::ReferenceLibrary;
use crate::run::{RunConfig, RunRecord, UncertaintyModel};
use crate::schema::v1::AttenuationV1;

#[derive(Debug, Clone)]
pub enum RunSource {
    /// Run manifest pointing at per-run event files.
    Manifest(PathBuf),
    /// Previously written RunRecord table.
    Records(PathBuf),
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub records_path: PathBuf,
    pub fit_path: PathBuf,
    pub materials_path: PathBuf,
    pub json_path: PathBuf,
}

impl OutputPaths {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            records_path: out_dir.join("attenuation_data.tsv"),
            fit_path: out_dir.join("fit_summary.tsv"),
            materials_path: out_dir.join("material_comparison.tsv"),
            json_path: out_dir.join("report.json"),
            out_dir,
        }
    }

    pub fn comparison_path(&self, material: &str) -> PathBuf {
        self.out_dir.join(format!("comparison_{}.tsv", material))
    }

    pub fn sweep_path(&self, material: &str, energy_mev: Option<f64>) -> PathBuf {
        match energy_mev {
            Some(e) => self.out_dir.join(format!("sweep_{}_{}MeV.tsv", material, e)),
            None => self.out_dir.join(format!("sweep_{}.tsv", material)),
        }
    }
}

#[derive(Debug)]
pub struct Ctx {
    pub source: RunSource,
    pub reference_path: Option<PathBuf>,
    pub materials_path: Option<PathBuf>,
    pub fit_options: FitOptions,
    pub uncertainty: UncertaintyModel,
    pub calibration_energy: f64,
    pub energy_tolerance: f64,
    pub threads: usize,
    pub write_json: bool,
    pub write_tsv: bool,
    pub run_configs: Vec<RunConfig>,
    pub library: Option<ReferenceLibrary>,
    pub catalog: Option<MaterialCatalog>,
    pub records: Vec<RunRecord>,
    pub fits: Vec<SweepFit>,
    pub comparisons: Vec<MaterialComparison>,
    pub contrast: Option<MaterialContrast>,
    pub warnings: Vec<String>,
    pub output: OutputPaths,
    pub report: AttenuationV1,
}

impl Ctx {
    pub fn new(
        source: RunSource,
        out_dir: PathBuf,
        fit_options: FitOptions,
        uncertainty: UncertaintyModel,
        write_json: bool,
        write_tsv: bool,
        tool_version: &str,
    ) -> Self {
        let report = AttenuationV1::empty(tool_version, fit_options.model, uncertainty);
        Self {
            source,
            reference_path: None,
            materials_path: None,
            fit_options,
            uncertainty,
            calibration_energy: CS137_LINE_MEV,
            energy_tolerance: DEFAULT_ENERGY_TOLERANCE_MEV,
            threads: 0,
            write_json,
            write_tsv,
            run_configs: Vec::new(),
            library: None,
            catalog: None,
            records: Vec::new(),
            fits: Vec::new(),
            comparisons: Vec::new(),
            contrast: None,
            warnings: Vec::new(),
            output: OutputPaths::new(out_dir),
            report,
        }
    }

    /// Records a per-configuration problem without stopping the pipeline.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}
