use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "gamma-atten",
    version,
    about = "Gamma-ray attenuation measurement and analysis"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Aggregate one run's events into a RunRecord.
    Run(RunArgs),
    /// Full analysis: aggregate, fit sweeps, compare against reference data.
    Analyze(AnalyzeArgs),
    /// Fit thickness sweeps from a RunRecord table.
    Fit(FitArgs),
    Reference(ReferenceArgs),
    /// List the material catalog.
    Materials(MaterialsArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "Events TSV (.gz allowed)")]
    pub events: PathBuf,

    #[arg(long)]
    pub material: String,

    #[arg(long, help = "Slab thickness in cm")]
    pub thickness: f64,

    #[arg(long, help = "Photon energy in MeV")]
    pub energy: Option<f64>,

    #[arg(long, help = "Number of primary events in the run")]
    pub events_total: u64,

    #[arg(long, value_enum, default_value_t = UncertaintyArg::Poisson)]
    pub uncertainty: UncertaintyArg,

    #[arg(long, help = "Write the RunRecord table here instead of stdout")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[arg(long, conflicts_with = "records", required_unless_present = "records")]
    pub manifest: Option<PathBuf>,

    #[arg(long, help = "Previously written RunRecord table")]
    pub records: Option<PathBuf>,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, help = "Reference TSV to overlay on built-in tables")]
    pub reference: Option<PathBuf>,

    #[arg(long, help = "Materials TSV to overlay on the built-in catalog")]
    pub materials: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FitModelArg::Proportional)]
    pub fit_model: FitModelArg,

    #[arg(long, value_enum, default_value_t = ErrorScaleArg::Absolute)]
    pub error_scale: ErrorScaleArg,

    #[arg(long, value_enum, default_value_t = UncertaintyArg::Poisson)]
    pub uncertainty: UncertaintyArg,

    #[arg(long, default_value_t = 0.662, help = "Calibration line in MeV")]
    pub calibration_energy: f64,

    #[arg(long, default_value_t = 1.0e-3, help = "Calibration line window in MeV")]
    pub energy_tolerance: f64,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub tsv: bool,
}

#[derive(Debug, Args)]
pub struct FitArgs {
    #[arg(long)]
    pub records: PathBuf,

    #[arg(long, help = "Materials TSV to overlay on the built-in catalog")]
    pub materials: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FitModelArg::Proportional)]
    pub fit_model: FitModelArg,

    #[arg(long, value_enum, default_value_t = ErrorScaleArg::Absolute)]
    pub error_scale: ErrorScaleArg,

    #[arg(long, value_enum, default_value_t = UncertaintyArg::Poisson)]
    pub uncertainty: UncertaintyArg,
}

#[derive(Debug, Args)]
pub struct ReferenceArgs {
    #[command(subcommand)]
    pub command: ReferenceCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReferenceCommand {
    Show(ReferenceShowArgs),
}

#[derive(Debug, Args)]
pub struct ReferenceShowArgs {
    #[arg(long, help = "Only this material")]
    pub material: Option<String>,

    #[arg(long, help = "Interpolate mu/rho at this energy (MeV)")]
    pub energy: Option<f64>,

    #[arg(long, help = "Optional reference TSV to overlay on built-in tables")]
    pub reference: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MaterialsArgs {
    #[arg(long, help = "Optional materials TSV to overlay on the built-in catalog")]
    pub materials: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FitModelArg {
    Proportional,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorScaleArg {
    Absolute,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UncertaintyArg {
    Poisson,
    Binomial,
}
