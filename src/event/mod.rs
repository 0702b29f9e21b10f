//! Per-event transmission classification.
//!
//! An event counts as transmitted when the primary photon enters the detector
//! volume. Energy deposit is ignored: an unscattered photon can cross the
//! boundary with zero deposit.

#[cfg(feature = "mt")]
use rayon::prelude::*;

pub const PRIMARY_TRACK_ID: i32 = 1;
pub const PHOTON_CODE: i32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCrossing {
    pub track_id: i32,
    pub particle_code: i32,
    pub deposited_energy: f64,
    pub position: Vec3,
    /// Recorded on the first step inside the detector volume.
    pub boundary_entry: bool,
}

impl BoundaryCrossing {
    fn is_primary_photon_entry(&self) -> bool {
        self.boundary_entry
            && self.track_id == PRIMARY_TRACK_ID
            && self.particle_code == PHOTON_CODE
    }
}

pub fn classify(crossings: &[BoundaryCrossing]) -> bool {
    crossings.iter().any(BoundaryCrossing::is_primary_photon_entry)
}

pub fn classify_all<E>(events: &[E]) -> Vec<bool>
where
    E: AsRef<[BoundaryCrossing]> + Sync,
{
    #[cfg(feature = "mt")]
    {
        events.par_iter().map(|e| classify(e.as_ref())).collect()
    }
    #[cfg(not(feature = "mt"))]
    {
        events.iter().map(|e| classify(e.as_ref())).collect()
    }
}
