use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::run::RunConfig;

pub const MANIFEST_HEADER: &str = "material\tthickness_cm\tenergy_MeV\texpected_events\tevents_path";

/// Reads a run manifest. Relative event paths resolve against the manifest's directory.
pub fn read_manifest(path: &Path) -> Result<Vec<RunConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read run manifest {}", path.display()))?;
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    parse_manifest(&content, &path.display().to_string(), &base)
}

pub fn parse_manifest(content: &str, source: &str, base: &Path) -> Result<Vec<RunConfig>> {
    let mut configs = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("material\t") {
            continue;
        }
        let parts: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        if parts.len() != 5 {
            bail!("{}:{} malformed manifest (expected 5 columns)", source, line_no);
        }
        if parts[0].is_empty() {
            bail!("{}:{} empty material name", source, line_no);
        }
        let thickness_cm: f64 = parts[1]
            .parse()
            .with_context(|| format!("{}:{} invalid thickness '{}'", source, line_no, parts[1]))?;
        let energy_mev = match parts[2] {
            "" | "-" | "NA" => None,
            raw => Some(
                raw.parse::<f64>()
                    .with_context(|| format!("{}:{} invalid energy '{}'", source, line_no, raw))?,
            ),
        };
        let expected_events: u64 = parts[3].parse().with_context(|| {
            format!("{}:{} invalid expected_events '{}'", source, line_no, parts[3])
        })?;
        let events_path = PathBuf::from(parts[4]);
        let events_path = if events_path.is_absolute() {
            events_path
        } else {
            base.join(events_path)
        };
        configs.push(RunConfig {
            material: parts[0].to_string(),
            thickness_cm,
            energy_mev,
            expected_events,
            events_path,
        });
    }
    if configs.is_empty() {
        bail!("{}: manifest lists no runs", source);
    }
    Ok(configs)
}
