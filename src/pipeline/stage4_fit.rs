use std::collections::BTreeMap;

use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::fit::{SweepFit, fit_sweep, sweep_label, sweep_points};
use crate::pipeline::Stage;
use crate::run::RunRecord;

pub struct Stage4Fit;

impl Stage4Fit {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Fit {
    fn name(&self) -> &'static str {
        "stage4_fit"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let sweeps = group_sweeps(&ctx.records);
        let mut fits = Vec::new();
        let mut warnings = Vec::new();

        for ((material, _), records) in sweeps {
            let energy_mev = records[0].energy_mev;
            let label = sweep_label(&material, energy_mev);
            match fit_sweep(&records, ctx.fit_options) {
                Ok(fit) => {
                    let density = ctx
                        .catalog
                        .as_ref()
                        .and_then(|c| c.get(&material).ok())
                        .map(|m| m.density);
                    info!(
                        sweep = %label,
                        slope = fit.slope,
                        slope_error = fit.slope_error,
                        ndf = fit.ndf,
                        "sweep_fitted"
                    );
                    for w in &fit.warnings {
                        warnings.push(format!("fit {}: {}", label, w));
                    }
                    fits.push(SweepFit {
                        material,
                        energy_mev,
                        density,
                        fit,
                        points: sweep_points(&records),
                    });
                }
                Err(err) => warnings.push(format!("fit {} skipped: {}", label, err)),
            }
        }

        for w in warnings {
            ctx.warn(w);
        }
        ctx.fits = fits;
        Ok(())
    }
}

/// Thickness sweeps keyed by (material, energy bits), in sorted order.
pub(crate) fn group_sweeps(records: &[RunRecord]) -> BTreeMap<(String, Option<u64>), Vec<RunRecord>> {
    let mut sweeps: BTreeMap<(String, Option<u64>), Vec<RunRecord>> = BTreeMap::new();
    for r in records {
        sweeps
            .entry((r.material.clone(), r.energy_mev.map(f64::to_bits)))
            .or_default()
            .push(r.clone());
    }
    for records in sweeps.values_mut() {
        records.sort_by(|a, b| a.thickness_cm.total_cmp(&b.thickness_cm));
    }
    sweeps
}
