use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use tracing_subscriber::EnvFilter;

use gamma_atten::cli::{
    AnalyzeArgs, Cli, Commands, ErrorScaleArg, FitArgs, FitModelArg, MaterialsArgs,
    ReferenceCommand, ReferenceShowArgs, RunArgs, UncertaintyArg,
};
use gamma_atten::ctx::{Ctx, RunSource};
use gamma_atten::fit::{ErrorScale, FitModel, FitOptions};
use gamma_atten::io;
use gamma_atten::materials::MaterialCatalog;
use gamma_atten::pipeline::Pipeline;
use gamma_atten::pipeline::stage1_input::Stage1Input;
use gamma_atten::pipeline::stage2_reference::Stage2Reference;
use gamma_atten::pipeline::stage4_fit::Stage4Fit;
use gamma_atten::reference::{ReferenceLibrary, ReferenceTable};
use gamma_atten::run::{RunConfig, UncertaintyModel, aggregate_events};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => handle_run(args)?,
        Commands::Analyze(args) => handle_analyze(args)?,
        Commands::Fit(args) => handle_fit(args)?,
        Commands::Reference(args) => match args.command {
            ReferenceCommand::Show(show) => handle_reference_show(show)?,
        },
        Commands::Materials(args) => handle_materials(args)?,
    }

    Ok(())
}

fn handle_run(args: RunArgs) -> Result<()> {
    let config = RunConfig {
        material: args.material,
        thickness_cm: args.thickness,
        energy_mev: args.energy,
        expected_events: args.events_total,
        events_path: args.events,
    };
    let crossings = io::events::read_events(&config.events_path)?;
    let record = aggregate_events(&config, &crossings, uncertainty(args.uncertainty))
        .with_context(|| format!("run {}", config.label()))?;

    match args.out {
        Some(path) => {
            io::records::write_run_records(&path, std::slice::from_ref(&record))?;
            tracing::info!(out = %path.display(), "run_record_written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            io::records::write_run_records_to(&mut lock, std::slice::from_ref(&record))?;
            lock.flush()?;
        }
    }
    Ok(())
}

fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let source = match (args.manifest, args.records) {
        (Some(manifest), _) => RunSource::Manifest(manifest),
        (None, Some(records)) => RunSource::Records(records),
        (None, None) => anyhow::bail!("either --manifest or --records is required"),
    };
    let mut ctx = Ctx::new(
        source,
        args.out,
        fit_options(args.fit_model, args.error_scale),
        uncertainty(args.uncertainty),
        args.json,
        args.tsv,
        env!("CARGO_PKG_VERSION"),
    );
    ctx.reference_path = args.reference;
    ctx.materials_path = args.materials;
    ctx.calibration_energy = args.calibration_energy;
    ctx.energy_tolerance = args.energy_tolerance;
    ctx.threads = args.threads;

    Pipeline::analyze().run(&mut ctx)?;
    print_summary(&ctx)
}

fn handle_fit(args: FitArgs) -> Result<()> {
    let mut ctx = Ctx::new(
        RunSource::Records(args.records),
        std::path::PathBuf::from("."),
        fit_options(args.fit_model, args.error_scale),
        uncertainty(args.uncertainty),
        false,
        false,
        env!("CARGO_PKG_VERSION"),
    );
    ctx.materials_path = args.materials;

    let pipeline = Pipeline::new(vec![
        Box::new(Stage1Input::new()),
        Box::new(Stage2Reference::new()),
        Box::new(Stage4Fit::new()),
    ]);
    pipeline.run(&mut ctx)?;
    if ctx.fits.is_empty() {
        ctx.warn("no thickness sweep could be fitted");
    }
    print_summary(&ctx)
}

fn handle_reference_show(args: ReferenceShowArgs) -> Result<()> {
    let library = ReferenceLibrary::with_overlay(args.reference.as_deref())?;
    let tables: Vec<&ReferenceTable> = match &args.material {
        Some(material) => vec![library.get(material)?],
        None => library.tables.iter().collect(),
    };

    println!("reference tables (version {}):", library.version);
    for table in tables {
        match args.energy {
            Some(energy) => {
                let mu_rho = table.lookup(energy)?;
                println!("{}\t{}\t{:.6e}", table.material(), energy, mu_rho);
            }
            None => {
                let (lo, hi) = table.energy_range();
                println!(
                    "{}\t{}\t{:e}\t{:e}",
                    table.material(),
                    table.points().len(),
                    lo,
                    hi
                );
            }
        }
    }
    Ok(())
}

fn handle_materials(args: MaterialsArgs) -> Result<()> {
    let catalog = MaterialCatalog::with_overlay(args.materials.as_deref())?;
    println!("materials (version {}):", catalog.version);
    for m in &catalog.materials {
        println!("{}\t{}\t{}", m.name, m.description, m.density);
    }
    Ok(())
}

fn print_summary(ctx: &Ctx) -> Result<()> {
    let summary = io::summary::format_summary(ctx)?;
    print!("{}", summary);
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
    Ok(())
}

fn fit_options(model: FitModelArg, scale: ErrorScaleArg) -> FitOptions {
    let model = match model {
        FitModelArg::Proportional => FitModel::Proportional,
        FitModelArg::Linear => FitModel::Linear,
    };
    let error_scale = match scale {
        ErrorScaleArg::Absolute => ErrorScale::Absolute,
        ErrorScaleArg::Relative => ErrorScale::Relative,
    };
    FitOptions::new(model, error_scale)
}

fn uncertainty(arg: UncertaintyArg) -> UncertaintyModel {
    match arg {
        UncertaintyArg::Poisson => UncertaintyModel::Poisson,
        UncertaintyArg::Binomial => UncertaintyModel::Binomial,
    }
}
