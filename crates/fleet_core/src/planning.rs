use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, PipelineResult, ReferenceKind};
use crate::{Rotation, ScenarioState, TripId, VehicleTypeId};

/// Grouping of trips into rotations, as returned by a rotation planner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationPlan {
    pub rotations: Vec<Vec<TripId>>,
}

impl RotationPlan {
    pub fn trip_count(&self) -> usize {
        self.rotations.iter().map(Vec::len).sum()
    }
}

/// Replaces every rotation of the scenario with the planner's grouping.
///
/// Each trip must appear in exactly one group. Trips inside a group are
/// stored in departure order. Returns the number of rotations created.
pub fn write_back_rotation_plan(
    state: &mut ScenarioState,
    plan: &RotationPlan,
    vehicle_type: VehicleTypeId,
) -> PipelineResult<usize> {
    if !state.vehicle_types.contains_key(&vehicle_type) {
        return Err(PipelineError::not_found(
            ReferenceKind::VehicleType,
            vehicle_type,
        ));
    }
    let mut seen = AHashSet::with_capacity(plan.trip_count());
    for &trip in plan.rotations.iter().flatten() {
        if !state.trips.contains_key(&trip) {
            return Err(PipelineError::not_found(ReferenceKind::Trip, trip));
        }
        if !seen.insert(trip) {
            return Err(PipelineError::shape(trip, "trip planned into two rotations"));
        }
    }
    if let Some(missing) = state.trips.keys().find(|t| !seen.contains(*t)) {
        return Err(PipelineError::shape(missing, "trip missing from rotation plan"));
    }

    state.rotations.clear();
    let mut created = 0;
    for group in plan.rotations.iter().filter(|g| !g.is_empty()) {
        let mut trips = group.clone();
        trips.sort_by_key(|t| (state.trips[t].departure_time, *t));

        let id = state.alloc_rotation_id();
        for trip in &trips {
            if let Some(trip) = state.trips.get_mut(trip) {
                trip.rotation = id;
            }
        }
        state.rotations.insert(
            id,
            Rotation {
                id,
                name: None,
                vehicle_type,
                vehicle: None,
                trips,
                allow_opportunity_charging: true,
            },
        );
        created += 1;
    }
    info!(rotations = created, trips = seen.len(), "rotation plan written back");
    Ok(created)
}
