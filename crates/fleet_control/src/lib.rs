use chrono::TimeDelta;
use fleet_core::{
    write_back_rotation_plan, PipelineError, PipelineResult, ReferenceKind, RotationPlan,
    ScenarioState, StationId, Timestamp, TripId,
};
use serde::{Deserialize, Serialize};

/// Groups a scenario's trips into rotations.
///
/// Implementations only read the state; `apply_planner` writes the result back.
pub trait RotationPlanner {
    fn plan(&mut self, state: &ScenarioState) -> RotationPlan;
}

/// One rotation per trip. Every trip becomes its own vehicle duty, which is
/// the starting point before any chaining.
pub struct SingleTripPlanner;

impl RotationPlanner for SingleTripPlanner {
    fn plan(&mut self, state: &ScenarioState) -> RotationPlan {
        RotationPlan {
            rotations: chronological(state).into_iter().map(|t| vec![t]).collect(),
        }
    }
}

/// Chronological greedy chaining.
///
/// Trips are visited by departure time. Each joins the open chain that ends
/// at its departure station, leaves at least `min_layover` before it departs,
/// and (with `max_duration` set) stays within that total span. Among those the
/// chain that arrived most recently wins; otherwise the trip opens a new chain.
#[derive(Debug, Clone, Copy)]
pub struct GreedyChainPlanner {
    pub min_layover: TimeDelta,
    pub max_duration: Option<TimeDelta>,
}

impl Default for GreedyChainPlanner {
    fn default() -> Self {
        Self {
            min_layover: TimeDelta::zero(),
            max_duration: None,
        }
    }
}

struct OpenChain {
    trips: Vec<TripId>,
    first_departure: Timestamp,
    last_arrival: Timestamp,
    end_station: StationId,
}

impl GreedyChainPlanner {
    fn accepts(
        &self,
        chain: &OpenChain,
        departure: Timestamp,
        arrival: Timestamp,
        from: StationId,
    ) -> bool {
        chain.end_station == from
            && chain.last_arrival + self.min_layover <= departure
            && self
                .max_duration
                .map_or(true, |max| arrival - chain.first_departure <= max)
    }
}

impl RotationPlanner for GreedyChainPlanner {
    fn plan(&mut self, state: &ScenarioState) -> RotationPlan {
        let mut chains: Vec<OpenChain> = Vec::new();
        let mut loose: Vec<Vec<TripId>> = Vec::new();

        for trip_id in chronological(state) {
            let trip = &state.trips[&trip_id];
            let Some((from, to)) = state.trip_endpoints(trip_id) else {
                // Unknown route; left alone for the pruner to report.
                loose.push(vec![trip_id]);
                continue;
            };

            let best = chains
                .iter_mut()
                .filter(|c| self.accepts(c, trip.departure_time, trip.arrival_time, from))
                .max_by_key(|c| c.last_arrival);
            match best {
                Some(chain) => {
                    chain.trips.push(trip_id);
                    chain.last_arrival = trip.arrival_time;
                    chain.end_station = to;
                }
                None => chains.push(OpenChain {
                    trips: vec![trip_id],
                    first_departure: trip.departure_time,
                    last_arrival: trip.arrival_time,
                    end_station: to,
                }),
            }
        }

        let mut rotations: Vec<Vec<TripId>> = chains.into_iter().map(|c| c.trips).collect();
        rotations.extend(loose);
        RotationPlan { rotations }
    }
}

/// Planner selection as it appears in CLI flags and batch files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlannerKind {
    /// Keep the rotations the dataset came with.
    #[default]
    None,
    Single,
    Greedy,
}

impl PlannerKind {
    /// `None` when the dataset's rotations are used as they are.
    pub fn build(
        self,
        min_layover: TimeDelta,
        max_duration: Option<TimeDelta>,
    ) -> Option<Box<dyn RotationPlanner>> {
        match self {
            Self::None => None,
            Self::Single => Some(Box::new(SingleTripPlanner)),
            Self::Greedy => Some(Box::new(GreedyChainPlanner {
                min_layover,
                max_duration,
            })),
        }
    }
}

/// Runs `planner` and replaces the scenario's rotations with its grouping,
/// all of them assigned the vehicle type named `vehicle_type`.
pub fn apply_planner(
    state: &mut ScenarioState,
    planner: &mut dyn RotationPlanner,
    vehicle_type: &str,
) -> PipelineResult<usize> {
    let vehicle_type = state
        .vehicle_type_by_name(vehicle_type)
        .ok_or_else(|| PipelineError::ReferenceNotFound {
            kind: ReferenceKind::VehicleType,
            name: vehicle_type.to_string(),
        })?
        .id;
    let plan = planner.plan(state);
    write_back_rotation_plan(state, &plan, vehicle_type)
}

fn chronological(state: &ScenarioState) -> Vec<TripId> {
    let mut trips: Vec<TripId> = state.trips.keys().copied().collect();
    trips.sort_by_key(|t| (state.trips[t].departure_time, *t));
    trips
}
