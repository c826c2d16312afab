use std::collections::BTreeSet;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::{RotationId, ScenarioState, TripId};

/// Rows removed by one `DeletionPlan::apply`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionOutcome {
    pub rotations: usize,
    pub trips: usize,
    pub stop_times: usize,
    pub events: usize,
}

/// Batch of cascading deletes, collected first and applied once.
///
/// Removal order is stop-times, events, trips, rotations, so no row ever
/// points at one that is already gone.
#[derive(Debug, Clone, Default)]
pub struct DeletionPlan {
    rotations: BTreeSet<RotationId>,
    /// Trips removed individually; their rotation survives.
    trips: BTreeSet<TripId>,
}

impl DeletionPlan {
    /// Returns `false` if the rotation was already planned.
    pub fn delete_rotation(&mut self, rotation: RotationId) -> bool {
        self.rotations.insert(rotation)
    }

    pub fn delete_trip(&mut self, trip: TripId) -> bool {
        self.trips.insert(trip)
    }

    pub fn removes_rotation(&self, rotation: RotationId) -> bool {
        self.rotations.contains(&rotation)
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty() && self.trips.is_empty()
    }

    pub fn apply(self, state: &mut ScenarioState) -> DeletionOutcome {
        let mut doomed: AHashSet<TripId> = self.trips.iter().copied().collect();
        for rotation in self
            .rotations
            .iter()
            .filter_map(|id| state.rotations.get(id))
        {
            doomed.extend(rotation.trips.iter().copied());
        }
        // Trips whose rotation is gone but which the rotation no longer lists.
        doomed.extend(
            state
                .trips
                .values()
                .filter(|t| self.rotations.contains(&t.rotation))
                .map(|t| t.id),
        );

        let stop_times_before = state.stop_times.len();
        state.stop_times.retain(|_, st| !doomed.contains(&st.trip));
        let events_before = state.events.len();
        state
            .events
            .retain(|_, e| e.trip.map_or(true, |trip| !doomed.contains(&trip)));

        for rotation in state.rotations.values_mut() {
            if !self.rotations.contains(&rotation.id) {
                rotation.trips.retain(|trip| !self.trips.contains(trip));
            }
        }
        let trips_before = state.trips.len();
        state.trips.retain(|id, _| !doomed.contains(id));
        let rotations_before = state.rotations.len();
        state
            .rotations
            .retain(|id, _| !self.rotations.contains(id));

        DeletionOutcome {
            rotations: rotations_before - state.rotations.len(),
            trips: trips_before - state.trips.len(),
            stop_times: stop_times_before - state.stop_times.len(),
            events: events_before - state.events.len(),
        }
    }
}
