use anyhow::Result;
use tracing::info;

use crate::ctx::{Ctx, RunSource};
use crate::io::{manifest, records};
use crate::pipeline::Stage;

pub struct Stage1Input;

impl Stage1Input {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Input {
    fn name(&self) -> &'static str {
        "stage1_input"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        match ctx.source.clone() {
            RunSource::Manifest(path) => {
                ctx.run_configs = manifest::read_manifest(&path)?;
                info!(
                    manifest = %path.display(),
                    runs = ctx.run_configs.len(),
                    "manifest_loaded"
                );
            }
            RunSource::Records(path) => {
                ctx.records = records::read_run_records(&path, ctx.uncertainty)?;
                info!(
                    records = %path.display(),
                    runs = ctx.records.len(),
                    "run_records_loaded"
                );
            }
        }
        Ok(())
    }
}
