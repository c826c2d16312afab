//! Connectivity validation and cascading pruning.
//!
//! A broken chain is structural and disqualifies the whole rotation; a single
//! driving event whose SOC did not drop is a local defect and only removes its
//! trip. Each chain is checked as stored and again as it will look after
//! those local removals, so a second pass over the result finds nothing to
//! delete.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::deletion::{DeletionOutcome, DeletionPlan};
use crate::{RotationId, ScenarioState, TripId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BreakReason {
    /// `from` arrives at a different station than `to` departs from.
    StationMismatch { from: TripId, to: TripId },
    /// `to` departs before `from` arrives.
    TimeOverlap { from: TripId, to: TripId },
    /// The trip's route is missing, so its stations are unknown.
    MissingRoute { trip: TripId },
    /// Nothing left once anomalous trips are removed.
    NoTripsLeft,
}

impl std::fmt::Display for BreakReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StationMismatch { from, to } => {
                write!(f, "{from} does not end where {to} starts")
            }
            Self::TimeOverlap { from, to } => write!(f, "{to} departs before {from} arrives"),
            Self::MissingRoute { trip } => write!(f, "{trip} references an unknown route"),
            Self::NoTripsLeft => f.write_str("no trips left"),
        }
    }
}

/// Non-fatal record of one removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PruneWarning {
    RotationRemoved {
        rotation: RotationId,
        trips: usize,
        reason: BreakReason,
    },
    TripRemoved {
        trip: TripId,
        rotation: RotationId,
        soc_start: f64,
        soc_end: f64,
    },
}

impl std::fmt::Display for PruneWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RotationRemoved {
                rotation,
                trips,
                reason,
            } => write!(f, "removed {rotation} with {trips} trips: {reason}"),
            Self::TripRemoved {
                trip,
                rotation,
                soc_start,
                soc_end,
            } => write!(
                f,
                "removed {trip} from {rotation}: soc {soc_start:.3} -> {soc_end:.3} did not decrease"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PruneReport {
    pub warnings: Vec<PruneWarning>,
    pub deleted: DeletionOutcome,
}

impl PruneReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn rotations_removed(&self) -> usize {
        self.deleted.rotations
    }

    pub fn trips_removed(&self) -> usize {
        self.deleted.trips
    }
}

/// Driving events with `soc_start <= soc_end`, keyed by their trip.
fn energy_anomalies(state: &ScenarioState) -> BTreeMap<TripId, (f64, f64)> {
    state
        .events
        .values()
        .filter(|e| e.is_driving() && e.soc_start <= e.soc_end)
        .filter_map(|e| Some((e.trip?, (e.soc_start, e.soc_end))))
        .collect()
}

/// First structural break in `chain`, if any.
pub fn find_break(state: &ScenarioState, chain: &[TripId]) -> Option<BreakReason> {
    if chain.is_empty() {
        return Some(BreakReason::NoTripsLeft);
    }
    if let Some(&trip) = chain.iter().find(|&&t| state.trip_endpoints(t).is_none()) {
        return Some(BreakReason::MissingRoute { trip });
    }
    chain.windows(2).find_map(|pair| {
        let (from, to) = (pair[0], pair[1]);
        let (_, arrival) = state.trip_endpoints(from)?;
        let (departure, _) = state.trip_endpoints(to)?;
        if arrival != departure {
            return Some(BreakReason::StationMismatch { from, to });
        }
        let (prev, next) = (state.trips.get(&from)?, state.trips.get(&to)?);
        (next.departure_time < prev.arrival_time).then_some(BreakReason::TimeOverlap { from, to })
    })
}

/// Removes every rotation with a broken chain and every trip whose driving
/// event shows no consumption. Never fails.
pub fn prune_invalid(state: &mut ScenarioState) -> PruneReport {
    let anomalies = energy_anomalies(state);
    let mut plan = DeletionPlan::default();
    let mut warnings = Vec::new();

    for rotation in state.rotations.values() {
        let remaining: Vec<TripId> = rotation
            .trips
            .iter()
            .copied()
            .filter(|t| !anomalies.contains_key(t))
            .collect();
        // A break in the stored chain disqualifies the rotation even when an
        // anomalous trip sits next to it; the remaining chain must hold too.
        let reason =
            find_break(state, &rotation.trips).or_else(|| find_break(state, &remaining));
        if let Some(reason) = reason {
            plan.delete_rotation(rotation.id);
            warnings.push(PruneWarning::RotationRemoved {
                rotation: rotation.id,
                trips: rotation.trips.len(),
                reason,
            });
        }
    }

    for (&trip, &(soc_start, soc_end)) in &anomalies {
        let Some(rotation) = state.trips.get(&trip).map(|t| t.rotation) else {
            continue;
        };
        if plan.removes_rotation(rotation) {
            continue;
        }
        plan.delete_trip(trip);
        warnings.push(PruneWarning::TripRemoved {
            trip,
            rotation,
            soc_start,
            soc_end,
        });
    }

    if plan.is_empty() {
        return PruneReport::default();
    }
    let deleted = plan.apply(state);
    for warning in &warnings {
        warn!(scenario = state.meta.id, "{warning}");
    }
    warn!(
        scenario = state.meta.id,
        rotations = deleted.rotations,
        trips = deleted.trips,
        events = deleted.events,
        "deleted invalid rotations and trips"
    );
    PruneReport { warnings, deleted }
}
