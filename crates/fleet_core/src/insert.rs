use serde::{Deserialize, Serialize};
use tracing::info;

use crate::anchor::DepotAnchors;
use crate::config::DeadheadConfig;
use crate::error::{PipelineError, PipelineResult, ReferenceKind};
use crate::{RotationId, RouteId, ScenarioState, Timestamp, Trip, TripId, TripKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertReport {
    pub rotations: usize,
    pub trips_inserted: usize,
}

/// Departure/arrival of the two deadhead trips around one rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeadheadWindow {
    rotation: RotationId,
    inbound: (Timestamp, Timestamp),
    outbound: (Timestamp, Timestamp),
}

/// Prepends a depot → terminal trip and appends a terminal → depot trip to
/// every rotation. No events are created here.
///
/// All windows are computed before any row is written, so an empty rotation
/// fails the stage without touching the state.
pub fn insert_depot_trips(
    state: &mut ScenarioState,
    anchors: &DepotAnchors,
    config: &DeadheadConfig,
) -> PipelineResult<InsertReport> {
    let windows = state
        .rotations
        .values()
        .map(|rotation| {
            let (Some(first), Some(last)) = (rotation.trips.first(), rotation.trips.last()) else {
                return Err(PipelineError::shape(rotation.id, "rotation has no trips"));
            };
            let first = state
                .trips
                .get(first)
                .ok_or_else(|| PipelineError::not_found(ReferenceKind::Trip, first))?;
            let last = state
                .trips
                .get(last)
                .ok_or_else(|| PipelineError::not_found(ReferenceKind::Trip, last))?;

            let inbound_end = first.departure_time - config.break_duration();
            let outbound_start = last.arrival_time + config.break_duration();
            Ok(DeadheadWindow {
                rotation: rotation.id,
                inbound: (inbound_end - config.trip_duration(), inbound_end),
                outbound: (outbound_start, outbound_start + config.trip_duration()),
            })
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    for window in &windows {
        let inbound = add_deadhead(state, window.rotation, anchors.inbound, window.inbound);
        let outbound = add_deadhead(state, window.rotation, anchors.outbound, window.outbound);
        if let Some(rotation) = state.rotations.get_mut(&window.rotation) {
            rotation.trips.insert(0, inbound);
            rotation.trips.push(outbound);
        }
    }

    let report = InsertReport {
        rotations: windows.len(),
        trips_inserted: windows.len() * 2,
    };
    info!(
        rotations = report.rotations,
        trips = report.trips_inserted,
        "deadhead trips inserted"
    );
    Ok(report)
}

fn add_deadhead(
    state: &mut ScenarioState,
    rotation: RotationId,
    route: RouteId,
    (departure_time, arrival_time): (Timestamp, Timestamp),
) -> TripId {
    let id = state.alloc_trip_id();
    state.trips.insert(
        id,
        Trip {
            id,
            rotation,
            route,
            departure_time,
            arrival_time,
            kind: TripKind::Empty,
            loaded_mass_kg: Some(0.0),
        },
    );
    id
}
