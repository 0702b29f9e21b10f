use std::collections::BTreeMap;

use anyhow::Result;
use tracing::info;

use crate::compare::materials::contrast;
use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::run::RunRecord;

pub struct Stage6Contrast;

impl Stage6Contrast {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage6Contrast {
    fn name(&self) -> &'static str {
        "stage6_contrast"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let Some(catalog) = ctx.catalog.as_ref() else {
            return Ok(());
        };
        let Some(group) = widest_group(&ctx.records) else {
            return Ok(());
        };
        match contrast(&group, catalog) {
            Ok(result) => {
                info!(
                    materials = result.summaries.len(),
                    factor = result.attenuation_factor.unwrap_or(0.0),
                    "material_contrast_built"
                );
                for reason in &result.skipped {
                    ctx.warn(format!("material contrast: run left out: {}", reason));
                }
                ctx.contrast = Some(result);
            }
            Err(err) => ctx.warn(format!("material contrast skipped: {}", err)),
        }
        Ok(())
    }
}

/// Runs sharing one (thickness, energy), the condition covering the most
/// distinct materials; `None` unless at least two materials qualify.
fn widest_group(records: &[RunRecord]) -> Option<Vec<RunRecord>> {
    let mut groups: BTreeMap<(u64, Option<u64>), BTreeMap<&str, &RunRecord>> = BTreeMap::new();
    for r in records {
        groups
            .entry((r.thickness_cm.to_bits(), r.energy_mev.map(f64::to_bits)))
            .or_default()
            .entry(r.material.as_str())
            .or_insert(r);
    }
    let best = groups
        .into_values()
        .max_by_key(|materials| materials.len())?;
    if best.len() < 2 {
        return None;
    }
    Some(best.into_values().cloned().collect())
}
