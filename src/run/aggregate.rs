use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "mt")]
use rayon::prelude::*;

use crate::error::{AttenError, AttenResult};
use crate::event::{BoundaryCrossing, classify};
use crate::run::{RunConfig, RunRecord, UncertaintyModel};

/// Counters for one run, owned by a single writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    expected: u64,
    recorded: u64,
    transmitted: u64,
}

impl RunState {
    pub fn begin(expected_total_events: u64) -> Self {
        Self {
            expected: expected_total_events,
            recorded: 0,
            transmitted: 0,
        }
    }

    pub fn record(&mut self, transmitted: bool) {
        self.recorded += 1;
        if transmitted {
            self.transmitted += 1;
        }
    }

    pub fn expected(&self) -> u64 {
        self.expected
    }

    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    pub fn transmitted(&self) -> u64 {
        self.transmitted
    }
}

/// Counters for one run fed from several threads at once.
#[derive(Debug)]
pub struct SharedRunState {
    expected: u64,
    recorded: AtomicU64,
    transmitted: AtomicU64,
}

impl SharedRunState {
    pub fn begin(expected_total_events: u64) -> Self {
        Self {
            expected: expected_total_events,
            recorded: AtomicU64::new(0),
            transmitted: AtomicU64::new(0),
        }
    }

    pub fn record(&self, transmitted: bool) {
        self.recorded.fetch_add(1, Ordering::Relaxed);
        if transmitted {
            self.transmitted.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn into_state(self) -> RunState {
        RunState {
            expected: self.expected,
            recorded: self.recorded.into_inner(),
            transmitted: self.transmitted.into_inner(),
        }
    }
}

/// Closes a run. Incomplete runs are rejected rather than reported partially.
pub fn finalize(state: RunState, material: &str, thickness_cm: f64) -> AttenResult<RunRecord> {
    finalize_with(state, material, thickness_cm, None, UncertaintyModel::Poisson)
}

pub fn finalize_with(
    state: RunState,
    material: &str,
    thickness_cm: f64,
    energy_mev: Option<f64>,
    model: UncertaintyModel,
) -> AttenResult<RunRecord> {
    let label = crate::run::run_label(material, thickness_cm, energy_mev);
    if state.expected == 0 {
        return Err(AttenError::config(label, "run has zero total events"));
    }
    if state.recorded != state.expected {
        return Err(AttenError::config(
            label,
            format!(
                "incomplete run: {} of {} events recorded",
                state.recorded, state.expected
            ),
        ));
    }
    RunRecord::from_counts(
        material,
        thickness_cm,
        energy_mev,
        state.recorded,
        state.transmitted,
        model,
    )
}

/// Classifies every event of one run and closes it.
///
/// Event ids run over `0..expected_events`; ids with no crossings were absorbed.
pub fn aggregate_events(
    config: &RunConfig,
    events: &BTreeMap<u64, Vec<BoundaryCrossing>>,
    model: UncertaintyModel,
) -> AttenResult<RunRecord> {
    let expected = config.expected_events;
    if expected == 0 {
        return Err(AttenError::config(config.label(), "run has zero total events"));
    }
    if let Some((&last_id, _)) = events.last_key_value() {
        if last_id >= expected {
            return Err(AttenError::config(
                config.label(),
                format!(
                    "event id {} outside the run's {} expected events",
                    last_id, expected
                ),
            ));
        }
    }

    let empty: &[BoundaryCrossing] = &[];
    let crossings_of = |id: u64| events.get(&id).map(Vec::as_slice).unwrap_or(empty);

    #[cfg(feature = "mt")]
    let state = {
        let shared = SharedRunState::begin(expected);
        (0..expected)
            .into_par_iter()
            .for_each(|id| shared.record(classify(crossings_of(id))));
        shared.into_state()
    };
    #[cfg(not(feature = "mt"))]
    let state = {
        let mut state = RunState::begin(expected);
        for id in 0..expected {
            state.record(classify(crossings_of(id)));
        }
        state
    };

    finalize_with(
        state,
        &config.material,
        config.thickness_cm,
        config.energy_mev,
        model,
    )
}
