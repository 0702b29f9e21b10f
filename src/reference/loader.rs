use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::error::{AttenError, AttenResult};
use crate::reference::{ReferencePoint, ReferenceTable};

#[derive(Debug, Clone)]
pub struct ReferenceLibrary {
    pub version: String,
    pub tables: Vec<ReferenceTable>,
}

impl ReferenceLibrary {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            version: "v1".to_string(),
            tables: load_builtin_v1()?,
        })
    }

    /// Built-in tables with any user tables replacing them by material name.
    pub fn with_overlay(path: Option<&Path>) -> Result<Self> {
        let mut library = Self::builtin()?;
        if let Some(path) = path {
            let user = load_reference_tsv(path)?;
            library.tables = merge_tables(library.tables, user);
            library.version = format!("{}+{}", library.version, path.display());
        }
        Ok(library)
    }

    pub fn get(&self, material: &str) -> AttenResult<&ReferenceTable> {
        self.tables
            .iter()
            .find(|t| t.material() == material)
            .ok_or_else(|| AttenError::config(material, "no reference table for material"))
    }

    pub fn materials(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.material())
    }
}

pub fn load_builtin_v1() -> Result<Vec<ReferenceTable>> {
    let content = include_str!("../../assets/reference/mu_rho_v1.tsv");
    parse_reference_tsv(content, "built-in v1")
}

pub fn load_reference_tsv(path: &Path) -> Result<Vec<ReferenceTable>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read reference TSV {}", path.display()))?;
    parse_reference_tsv(&content, &path.display().to_string())
}

pub fn merge_tables(builtin: Vec<ReferenceTable>, user: Vec<ReferenceTable>) -> Vec<ReferenceTable> {
    if user.is_empty() {
        return builtin;
    }
    let mut user_map: HashMap<String, ReferenceTable> = user
        .into_iter()
        .map(|t| (t.material().to_string(), t))
        .collect();

    let mut merged = Vec::with_capacity(builtin.len() + user_map.len());
    for table in builtin {
        match user_map.remove(table.material()) {
            Some(user_table) => merged.push(user_table),
            None => merged.push(table),
        }
    }
    let mut rest: Vec<ReferenceTable> = user_map.into_values().collect();
    rest.sort_by(|a, b| a.material().cmp(b.material()));
    merged.extend(rest);
    merged
}

fn parse_reference_tsv(content: &str, source: &str) -> Result<Vec<ReferenceTable>> {
    let mut points: HashMap<String, Vec<ReferencePoint>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

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
        if parts[0] == "material" {
            continue;
        }
        let material = parts[0];
        if material.is_empty() {
            bail!("{}:{} empty material name", source, line_no);
        }
        let energy: f64 = parts[1]
            .parse()
            .with_context(|| format!("{}:{} invalid energy '{}'", source, line_no, parts[1]))?;
        let mu_over_rho: f64 = parts[2]
            .parse()
            .with_context(|| format!("{}:{} invalid mu/rho '{}'", source, line_no, parts[2]))?;

        if !points.contains_key(material) {
            order.push(material.to_string());
        }
        points
            .entry(material.to_string())
            .or_default()
            .push(ReferencePoint::new(energy, mu_over_rho));
    }

    let mut tables = Vec::with_capacity(order.len());
    for material in order {
        if let Some(pts) = points.remove(&material) {
            let table = ReferenceTable::new(material, pts)
                .with_context(|| format!("{}: invalid reference table", source))?;
            tables.push(table);
        }
    }
    Ok(tables)
}
