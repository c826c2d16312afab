//! SOC propagation.
//!
//! Each rotation is a left fold over its trips carrying one scalar, the SOC at
//! the start of the next trip. The fold produces a `SocPlan` without touching
//! the state; plans for every rotation are built before any of them is applied.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::energy::FleetEnergyRate;
use crate::error::{PipelineError, PipelineResult, ReferenceKind};
use crate::store::EventIndex;
use crate::{
    Event, EventId, EventKind, Rotation, RotationId, ScenarioState, TripId, Vehicle,
    VehicleTypeId,
};

pub const FULL_CHARGE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SocStep {
    /// Boundary trip without an event: a new driving event is created.
    Synthesized {
        trip: TripId,
        soc_start: f64,
        soc_end: f64,
    },
    /// Interior trip: its existing event keeps its delta and is re-based.
    Rebased {
        trip: TripId,
        event: EventId,
        soc_start: f64,
        soc_end: f64,
    },
}

impl SocStep {
    pub fn trip(&self) -> TripId {
        match *self {
            Self::Synthesized { trip, .. } | Self::Rebased { trip, .. } => trip,
        }
    }

    pub fn soc_end(&self) -> f64 {
        match *self {
            Self::Synthesized { soc_end, .. } | Self::Rebased { soc_end, .. } => soc_end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocPlan {
    pub rotation: RotationId,
    pub steps: Vec<SocStep>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PropagationReport {
    pub vehicles_created: usize,
    pub events_synthesized: usize,
    pub events_rebased: usize,
    /// Lowest `soc_end` over all rotations; `FULL_CHARGE` when there are none.
    pub min_soc: f64,
}

/// Battery capacity the fold divides energy by.
#[derive(Debug, Clone, Copy)]
pub struct FoldParams<'a> {
    pub rate: &'a FleetEnergyRate,
    pub capacity_kwh: f64,
}

/// Folds one rotation into its SOC steps, starting from a full battery.
pub fn plan_rotation(
    state: &ScenarioState,
    rotation: &Rotation,
    driving: &EventIndex,
    params: FoldParams<'_>,
) -> PipelineResult<SocPlan> {
    let last = rotation.trips.len().saturating_sub(1);
    let mut soc = FULL_CHARGE;
    let mut steps = Vec::with_capacity(rotation.trips.len());

    for (position, &trip) in rotation.trips.iter().enumerate() {
        let events = driving.get(&trip).map_or(&[][..], |ids| ids.as_slice());
        let boundary = position == 0 || position == last;

        let step = match (boundary, events) {
            (true, []) => {
                let distance_m = state
                    .trip_distance_m(trip)
                    .ok_or_else(|| PipelineError::not_found(ReferenceKind::Trip, trip))?;
                let delta = params.rate.energy_kwh(distance_m) / params.capacity_kwh;
                SocStep::Synthesized {
                    trip,
                    soc_start: soc,
                    soc_end: soc - delta,
                }
            }
            (false, &[event]) => {
                let delta = state.events[&event].soc_delta();
                if delta < 0.0 {
                    return Err(PipelineError::shape(
                        event,
                        format!("driving event on {trip} gains charge (delta {delta:.4})"),
                    ));
                }
                SocStep::Rebased {
                    trip,
                    event,
                    soc_start: soc,
                    soc_end: soc - delta,
                }
            }
            (boundary, found) => {
                let expected = if boundary { 0 } else { 1 };
                return Err(PipelineError::shape(
                    trip,
                    format!(
                        "expected {expected} driving event(s) at position {position} of {}, found {}",
                        rotation.id,
                        found.len()
                    ),
                ));
            }
        };

        soc = step.soc_end();
        if !(0.0..=FULL_CHARGE).contains(&soc) {
            return Err(PipelineError::SocOutOfRange {
                rotation: rotation.id,
                trip,
                soc_end: soc,
            });
        }
        steps.push(step);
    }

    Ok(SocPlan {
        rotation: rotation.id,
        steps,
    })
}

/// Gives every rotation its own vehicle of the reference type and a
/// continuous, non-increasing SOC sequence.
pub fn propagate_soc(
    state: &mut ScenarioState,
    rate: &FleetEnergyRate,
    reference_vehicle_type: &str,
) -> PipelineResult<PropagationReport> {
    let vehicle_type = state
        .vehicle_type_by_name(reference_vehicle_type)
        .ok_or_else(|| {
            PipelineError::not_found(ReferenceKind::VehicleType, reference_vehicle_type)
        })?;
    if vehicle_type.battery_capacity_kwh <= 0.0 {
        return Err(PipelineError::shape(
            vehicle_type.id,
            "battery capacity must be positive",
        ));
    }
    let params = FoldParams {
        rate,
        capacity_kwh: vehicle_type.battery_capacity_kwh,
    };
    let vehicle_type_id = vehicle_type.id;

    let driving = state.driving_events_by_trip();
    let plans = state
        .rotations
        .values()
        .map(|rotation| plan_rotation(state, rotation, &driving, params))
        .collect::<PipelineResult<Vec<_>>>()?;

    let mut report = PropagationReport {
        min_soc: FULL_CHARGE,
        ..PropagationReport::default()
    };
    for plan in plans {
        apply_plan(state, &plan, vehicle_type_id, &mut report);
    }
    info!(
        vehicles = report.vehicles_created,
        synthesized = report.events_synthesized,
        rebased = report.events_rebased,
        min_soc = report.min_soc,
        "state of charge propagated"
    );
    Ok(report)
}

fn apply_plan(
    state: &mut ScenarioState,
    plan: &SocPlan,
    vehicle_type: VehicleTypeId,
    report: &mut PropagationReport,
) {
    let vehicle_id = state.alloc_vehicle_id();
    state.vehicles.insert(
        vehicle_id,
        Vehicle {
            id: vehicle_id,
            name: format!("Auto-Generated Vehicle for Rotation {}", plan.rotation.0),
            name_short: format!("V_{}", plan.rotation.0),
            vehicle_type,
        },
    );
    if let Some(rotation) = state.rotations.get_mut(&plan.rotation) {
        rotation.vehicle = Some(vehicle_id);
        rotation.vehicle_type = vehicle_type;
    }
    report.vehicles_created += 1;

    for step in &plan.steps {
        match *step {
            SocStep::Synthesized {
                trip,
                soc_start,
                soc_end,
            } => {
                let Some((time_start, time_end)) = state
                    .trips
                    .get(&trip)
                    .map(|t| (t.departure_time, t.arrival_time))
                else {
                    continue;
                };
                let id = state.alloc_event_id();
                state.events.insert(
                    id,
                    Event {
                        id,
                        kind: EventKind::Driving,
                        trip: Some(trip),
                        vehicle: Some(vehicle_id),
                        vehicle_type,
                        time_start,
                        time_end,
                        soc_start,
                        soc_end,
                    },
                );
                report.events_synthesized += 1;
            }
            SocStep::Rebased {
                event,
                soc_start,
                soc_end,
                ..
            } => {
                if let Some(event) = state.events.get_mut(&event) {
                    event.vehicle = Some(vehicle_id);
                    event.vehicle_type = vehicle_type;
                    event.soc_start = soc_start;
                    event.soc_end = soc_end;
                    report.events_rebased += 1;
                }
            }
        }
        report.min_soc = report.min_soc.min(step.soc_end());
    }
    debug!(
        rotation = %plan.rotation,
        vehicle = %vehicle_id,
        steps = plan.steps.len(),
        "rotation propagated"
    );
}
