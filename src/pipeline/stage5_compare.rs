use std::collections::BTreeMap;

use anyhow::{Result, bail};
use tracing::info;

use crate::compare::{MaterialComparison, compare, measured_mass_attenuation};
use crate::ctx::Ctx;
use crate::fit::SweepFit;
use crate::pipeline::Stage;
use crate::run::RunRecord;

pub struct Stage5Compare;

impl Stage5Compare {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Compare {
    fn name(&self) -> &'static str {
        "stage5_compare"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let (Some(library), Some(catalog)) = (ctx.library.as_ref(), ctx.catalog.as_ref()) else {
            bail!("reference data not loaded");
        };

        let mut by_material: BTreeMap<&str, Vec<&RunRecord>> = BTreeMap::new();
        for r in ctx.records.iter().filter(|r| r.energy_mev.is_some()) {
            by_material.entry(r.material.as_str()).or_default().push(r);
        }

        let mut comparisons = Vec::new();
        let mut warnings = Vec::new();
        for (material, records) in by_material {
            let density = match catalog.get(material) {
                Ok(info) => info.density,
                Err(err) => {
                    warnings.push(format!("compare {} skipped: {}", material, err));
                    continue;
                }
            };
            let table = match library.get(material) {
                Ok(table) => table,
                Err(err) => {
                    warnings.push(format!("compare {} skipped: {}", material, err));
                    continue;
                }
            };
            let measured = measured_points(material, &records, density, &ctx.fits);
            match compare(&measured, table) {
                Ok(rows) => {
                    let comparison = MaterialComparison::new(
                        material,
                        rows,
                        ctx.calibration_energy,
                        ctx.energy_tolerance,
                    );
                    info!(
                        material = material,
                        energies = comparison.records.len(),
                        "comparison_built"
                    );
                    comparisons.push(comparison);
                }
                Err(err) => warnings.push(format!("compare {} skipped: {}", material, err)),
            }
        }

        for w in warnings {
            ctx.warn(w);
        }
        ctx.comparisons = comparisons;
        Ok(())
    }
}

/// One (energy, mu/rho) point per energy: the sweep fit when there is one,
/// else the mean over the non-degenerate runs at that energy.
fn measured_points(
    material: &str,
    records: &[&RunRecord],
    density: f64,
    fits: &[SweepFit],
) -> Vec<(f64, f64)> {
    let mut by_energy: BTreeMap<u64, Vec<RunRecord>> = BTreeMap::new();
    for r in records {
        if let Some(e) = r.energy_mev {
            by_energy.entry(e.to_bits()).or_default().push((*r).clone());
        }
    }

    by_energy
        .into_iter()
        .map(|(bits, runs)| {
            let energy = f64::from_bits(bits);
            let fitted = fits
                .iter()
                .find(|f| f.material == material && f.energy_mev == Some(energy))
                .and_then(SweepFit::mass_attenuation)
                .map(|(mu_rho, _)| mu_rho);
            let mu_rho = fitted.unwrap_or_else(|| {
                let values: Vec<f64> = measured_mass_attenuation(&runs, density)
                    .into_iter()
                    .map(|(_, v)| v)
                    .filter(|v| *v > 0.0)
                    .collect();
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            });
            (energy, mu_rho)
        })
        .collect()
}
