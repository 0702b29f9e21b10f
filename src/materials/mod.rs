//! Absorber materials known to the analysis: name, description and density.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::error::{AttenError, AttenResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialInfo {
    pub name: String,
    pub description: String,
    /// g/cm^3
    pub density: f64,
}

#[derive(Debug, Clone)]
pub struct MaterialCatalog {
    pub version: String,
    pub materials: Vec<MaterialInfo>,
}

impl MaterialCatalog {
    pub fn builtin() -> Result<Self> {
        let content = include_str!("../../assets/materials_v1.tsv");
        Ok(Self {
            version: "v1".to_string(),
            materials: parse_materials_tsv(content, "built-in v1")?,
        })
    }

    pub fn with_overlay(path: Option<&Path>) -> Result<Self> {
        let mut catalog = Self::builtin()?;
        if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read materials TSV {}", path.display()))?;
            for user in parse_materials_tsv(&content, &path.display().to_string())? {
                match catalog.materials.iter_mut().find(|m| m.name == user.name) {
                    Some(existing) => *existing = user,
                    None => catalog.materials.push(user),
                }
            }
        }
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> AttenResult<&MaterialInfo> {
        self.materials
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| AttenError::config(name, "unrecognized material"))
    }
}

fn parse_materials_tsv(content: &str, source: &str) -> Result<Vec<MaterialInfo>> {
    let mut out: Vec<MaterialInfo> = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        if parts.len() != 3 {
            bail!("{}:{} malformed TSV (expected 3 columns)", source, line_no);
        }
        if parts[0] == "name" {
            continue;
        }
        if parts[0].is_empty() {
            bail!("{}:{} empty material name", source, line_no);
        }
        let density: f64 = parts[2]
            .parse()
            .with_context(|| format!("{}:{} invalid density '{}'", source, line_no, parts[2]))?;
        if !(density.is_finite() && density > 0.0) {
            bail!("{}:{} density must be > 0", source, line_no);
        }
        if out.iter().any(|m| m.name == parts[0]) {
            bail!("{}:{} duplicate material '{}'", source, line_no, parts[0]);
        }
        out.push(MaterialInfo {
            name: parts[0].to_string(),
            description: parts[1].to_string(),
            density,
        });
    }
    Ok(out)
}
