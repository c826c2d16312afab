//! Post-pipeline invariant checks.
//!
//! These read a prepared scenario and report every violation instead of
//! stopping at the first, so a `verify` run shows the full picture.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::prune::{find_break, BreakReason};
use crate::{EventId, RotationId, ScenarioState, TripId, TripKind, VehicleId};

/// Slack for accumulated floating-point error when comparing SOC values.
const SOC_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InvariantViolation {
    BrokenChain {
        rotation: RotationId,
        reason: BreakReason,
    },
    SocIncrease {
        rotation: RotationId,
        trip: TripId,
        previous: f64,
        next: f64,
    },
    SocOutOfBounds {
        event: EventId,
        soc_start: f64,
        soc_end: f64,
    },
    BoundaryNotEmpty {
        rotation: RotationId,
        trip: TripId,
    },
    DrivingEventCount {
        trip: TripId,
        count: usize,
    },
    MissingVehicle {
        rotation: RotationId,
    },
    SharedVehicle {
        vehicle: VehicleId,
        first: RotationId,
        second: RotationId,
    },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BrokenChain { rotation, reason } => write!(f, "{rotation}: {reason}"),
            Self::SocIncrease {
                rotation,
                trip,
                previous,
                next,
            } => write!(
                f,
                "{rotation}: soc rises from {previous:.4} to {next:.4} at {trip}"
            ),
            Self::SocOutOfBounds {
                event,
                soc_start,
                soc_end,
            } => write!(f, "{event}: soc {soc_start:.4} -> {soc_end:.4} outside [0, 1]"),
            Self::BoundaryNotEmpty { rotation, trip } => {
                write!(f, "{rotation}: boundary {trip} is not an empty trip")
            }
            Self::DrivingEventCount { trip, count } => {
                write!(f, "{trip}: {count} driving events, expected 1")
            }
            Self::MissingVehicle { rotation } => write!(f, "{rotation}: no vehicle assigned"),
            Self::SharedVehicle {
                vehicle,
                first,
                second,
            } => write!(f, "{vehicle} shared by {first} and {second}"),
        }
    }
}

/// Every adjacent trip pair connects, for every rotation.
pub fn check_connectivity(state: &ScenarioState) -> Vec<InvariantViolation> {
    state
        .rotations
        .values()
        .filter_map(|rotation| {
            find_break(state, &rotation.trips).map(|reason| InvariantViolation::BrokenChain {
                rotation: rotation.id,
                reason,
            })
        })
        .collect()
}

/// All checks that must hold once a scenario has been prepared.
pub fn check_invariants(state: &ScenarioState) -> Vec<InvariantViolation> {
    let mut violations = check_connectivity(state);
    check_events(state, &mut violations);
    check_boundaries(state, &mut violations);
    check_vehicles(state, &mut violations);
    violations
}

fn check_events(state: &ScenarioState, violations: &mut Vec<InvariantViolation>) {
    let driving = state.driving_events_by_trip();
    for trip in state.trips.keys() {
        let count = driving.get(trip).map_or(0, |ids| ids.len());
        if count != 1 {
            violations.push(InvariantViolation::DrivingEventCount { trip: *trip, count });
        }
    }
    for event in state.events.values().filter(|e| e.is_driving()) {
        let in_range = |soc: f64| (-SOC_EPSILON..=1.0 + SOC_EPSILON).contains(&soc);
        if !in_range(event.soc_start) || !in_range(event.soc_end) {
            violations.push(InvariantViolation::SocOutOfBounds {
                event: event.id,
                soc_start: event.soc_start,
                soc_end: event.soc_end,
            });
        }
    }

    for rotation in state.rotations.values() {
        let mut previous: Option<f64> = None;
        for trip in &rotation.trips {
            let Some(&[event]) = driving.get(trip).map(|ids| ids.as_slice()) else {
                continue;
            };
            let event = &state.events[&event];
            if let Some(previous) = previous {
                let next = event.soc_start.max(event.soc_end);
                if next > previous + SOC_EPSILON {
                    violations.push(InvariantViolation::SocIncrease {
                        rotation: rotation.id,
                        trip: *trip,
                        previous,
                        next,
                    });
                }
            }
            previous = Some(event.soc_end);
        }
    }
}

fn check_boundaries(state: &ScenarioState, violations: &mut Vec<InvariantViolation>) {
    for rotation in state.rotations.values() {
        let boundaries = rotation
            .trips
            .first()
            .into_iter()
            .chain(rotation.trips.last().filter(|_| rotation.trips.len() > 1));
        for trip in boundaries {
            if state.trips.get(trip).map(|t| t.kind) != Some(TripKind::Empty) {
                violations.push(InvariantViolation::BoundaryNotEmpty {
                    rotation: rotation.id,
                    trip: *trip,
                });
            }
        }
    }
}

fn check_vehicles(state: &ScenarioState, violations: &mut Vec<InvariantViolation>) {
    let mut owners: AHashMap<VehicleId, RotationId> = AHashMap::new();
    for rotation in state.rotations.values() {
        let Some(vehicle) = rotation.vehicle else {
            violations.push(InvariantViolation::MissingVehicle {
                rotation: rotation.id,
            });
            continue;
        };
        if let Some(&first) = owners.get(&vehicle) {
            violations.push(InvariantViolation::SharedVehicle {
                vehicle,
                first,
                second: rotation.id,
            });
        } else {
            owners.insert(vehicle, rotation.id);
        }
    }
}
