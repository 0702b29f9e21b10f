use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::event::{BoundaryCrossing, Vec3};
use crate::io::open_maybe_gz;

/// Crossings grouped by event id. Events without crossings are absent.
pub type EventCrossings = BTreeMap<u64, Vec<BoundaryCrossing>>;

pub const EVENTS_HEADER: &str =
    "event_id\ttrack_id\tparticle_code\tedep_MeV\tx_mm\ty_mm\tz_mm\tboundary";

pub fn read_events(path: &Path) -> Result<EventCrossings> {
    let reader = open_maybe_gz(path)
        .with_context(|| format!("failed to open events file {}", path.display()))?;
    parse_events(BufReader::new(reader), &path.display().to_string())
}

pub fn parse_events<R: BufRead>(mut reader: R, source: &str) -> Result<EventCrossings> {
    let mut events = EventCrossings::new();
    let mut line = String::new();
    let mut line_no = 0usize;
    while reader
        .read_line(&mut line)
        .with_context(|| format!("{}:{} read error", source, line_no + 1))?
        > 0
    {
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("event_id") {
            line.clear();
            continue;
        }
        let parts: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        if parts.len() != 8 {
            bail!("{}:{} malformed events TSV (expected 8 columns)", source, line_no);
        }
        let event_id: u64 = parse_field(parts[0], "event_id", source, line_no)?;
        let deposited_energy: f64 = parse_field(parts[3], "edep_MeV", source, line_no)?;
        if !(deposited_energy.is_finite() && deposited_energy >= 0.0) {
            bail!("{}:{} deposited energy must be >= 0", source, line_no);
        }
        let crossing = BoundaryCrossing {
            track_id: parse_field(parts[1], "track_id", source, line_no)?,
            particle_code: parse_field(parts[2], "particle_code", source, line_no)?,
            deposited_energy,
            position: Vec3::new(
                parse_field(parts[4], "x_mm", source, line_no)?,
                parse_field(parts[5], "y_mm", source, line_no)?,
                parse_field(parts[6], "z_mm", source, line_no)?,
            ),
            boundary_entry: parse_flag(parts[7])
                .with_context(|| format!("{}:{} invalid boundary flag", source, line_no))?,
        };
        events.entry(event_id).or_default().push(crossing);
        line.clear();
    }
    Ok(events)
}

fn parse_field<T>(raw: &str, name: &str, source: &str, line_no: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("{}:{} invalid {} '{}'", source, line_no, name, raw))
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => bail!("expected 1/0, got '{}'", other),
    }
}
