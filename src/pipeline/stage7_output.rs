use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::ctx::{Ctx, RunSource};
use crate::io::{json_writer, records, tsv_writer};
use crate::pipeline::Stage;

pub struct Stage7Output;

impl Stage7Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage7Output {
    fn name(&self) -> &'static str {
        "stage7_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.write_tsv {
            // Re-reading a records table must not overwrite it in place.
            let same_source = matches!(&ctx.source, RunSource::Records(p) if same_file(p, &ctx.output.records_path));
            if !same_source {
                records::write_run_records(&ctx.output.records_path, &ctx.records)?;
            }
            if !ctx.fits.is_empty() {
                tsv_writer::write_fit_tsv(&ctx.output.fit_path, &ctx.fits)?;
            }
            for f in &ctx.fits {
                tsv_writer::write_sweep_tsv(&ctx.output.sweep_path(&f.material, f.energy_mev), f)?;
            }
            for c in &ctx.comparisons {
                tsv_writer::write_comparison_tsv(&ctx.output.comparison_path(&c.material), &c.records)?;
            }
            if let Some(contrast) = &ctx.contrast {
                tsv_writer::write_materials_tsv(&ctx.output.materials_path, contrast)?;
            }
            info!(out_dir = %ctx.output.out_dir.display(), "tsv_written");
        }

        ctx.report = json_writer::build_report(ctx)?;
        if ctx.write_json {
            json_writer::write_json(&ctx.output.json_path, ctx)?;
            info!(json = %ctx.output.json_path.display(), "json_written");
        }
        Ok(())
    }
}

/// Path equality after resolving `.`/`..` and symlinks. A file that does not
/// exist yet is resolved through its parent directory.
fn same_file(a: &Path, b: &Path) -> bool {
    resolve(a) == resolve(b)
}

fn resolve(path: &Path) -> PathBuf {
    if let Ok(p) = std::fs::canonicalize(path) {
        return p;
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (std::fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}
