use anyhow::{Context, Result};
use tracing::info;

#[cfg(feature = "mt")]
use rayon::prelude::*;

use crate::ctx::Ctx;
use crate::io::events;
use crate::pipeline::Stage;
use crate::run::{RunConfig, RunRecord, UncertaintyModel, aggregate_events};

pub struct Stage3Aggregate;

impl Stage3Aggregate {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Aggregate {
    fn name(&self) -> &'static str {
        "stage3_aggregate"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.run_configs.is_empty() {
            return Ok(());
        }
        let model = ctx.uncertainty;

        #[cfg(feature = "mt")]
        let outcomes: Vec<Result<RunRecord>> = {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(ctx.threads)
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build thread pool: {}", e))?;
            let configs = &ctx.run_configs;
            pool.install(|| configs.par_iter().map(|c| aggregate_run(c, model)).collect())
        };

        #[cfg(not(feature = "mt"))]
        let outcomes: Vec<Result<RunRecord>> = ctx
            .run_configs
            .iter()
            .map(|c| aggregate_run(c, model))
            .collect();

        let labels: Vec<String> = ctx.run_configs.iter().map(RunConfig::label).collect();
        for (label, outcome) in labels.into_iter().zip(outcomes) {
            match outcome {
                Ok(record) => {
                    info!(
                        run = %label,
                        total = record.total_events,
                        transmitted = record.transmitted_events,
                        "run_aggregated"
                    );
                    ctx.records.push(record);
                }
                Err(err) => ctx.warn(format!("run {} skipped: {:#}", label, err)),
            }
        }

        if ctx.records.is_empty() {
            anyhow::bail!("no run could be aggregated");
        }
        Ok(())
    }
}

fn aggregate_run(config: &RunConfig, model: UncertaintyModel) -> Result<RunRecord> {
    let crossings = events::read_events(&config.events_path)?;
    let record = aggregate_events(config, &crossings, model)
        .with_context(|| format!("aggregating {}", config.events_path.display()))?;
    Ok(record)
}
