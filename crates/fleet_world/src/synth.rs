//! Seeded synthetic timetables for benches and demos.
//!
//! Rotations run out of the default terminal to a random stop and back. A
//! configurable share of them carry the defects real datasets have: a return
//! leg from the wrong stop, or a driving event that gains charge.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use fleet_core::config::AnchorConfig;
use fleet_core::{
    Event, EventKind, Rotation, Route, RouteId, ScenarioMeta, ScenarioState, Station,
    StationId, StationKind, StopTime, Trip, TripId, TripKind, VehicleType, VehicleTypeId,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// 2024-04-01T00:00:00Z.
const SERVICE_DAY_EPOCH_S: i64 = 1_711_929_600;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    pub scenario_id: u64,
    pub stops: usize,
    pub rotations: usize,
    pub min_round_trips: usize,
    pub max_round_trips: usize,
    pub min_route_km: f64,
    pub max_route_km: f64,
    pub speed_kmh: f64,
    pub kwh_per_km: f64,
    pub battery_capacity_kwh: f64,
    /// Probability that a round trip returns from the wrong stop.
    pub break_rate: f64,
    /// Probability that a trip's driving event gains charge.
    pub anomaly_rate: f64,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            scenario_id: 1,
            stops: 6,
            rotations: 40,
            min_round_trips: 1,
            max_round_trips: 4,
            min_route_km: 3.0,
            max_route_km: 12.0,
            speed_kmh: 20.0,
            kwh_per_km: 1.2,
            battery_capacity_kwh: 300.0,
            break_rate: 0.05,
            anomaly_rate: 0.02,
        }
    }
}

struct Line {
    stop: StationId,
    outbound: RouteId,
    inbound: RouteId,
    km: f64,
}

struct Network {
    terminal: StationId,
    vehicle_type: VehicleTypeId,
    lines: Vec<Line>,
}

/// Same seed, same timetable.
pub fn generate_seeded(params: &SynthParams, seed: u64) -> Result<ScenarioState> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate_timetable(params, seed, &mut rng)
}

pub fn generate_timetable(
    params: &SynthParams,
    seed: u64,
    rng: &mut impl Rng,
) -> Result<ScenarioState> {
    let day_start = DateTime::<Utc>::from_timestamp(SERVICE_DAY_EPOCH_S, 0)
        .context("service day out of range")?;
    let mut state = ScenarioState::new(ScenarioMeta {
        id: params.scenario_id,
        name: format!("Synthetic timetable (seed {seed})"),
        name_short: Some(format!("SYN{seed}")),
    });

    let vehicle_type = state.alloc_vehicle_type_id();
    state.vehicle_types.insert(
        vehicle_type,
        VehicleType {
            id: vehicle_type,
            name: "ElectricBus".to_string(),
            battery_capacity_kwh: params.battery_capacity_kwh,
        },
    );

    let terminal = add_station(&mut state, AnchorConfig::default().terminal_name);
    let lines: Vec<Line> = (1..=params.stops.max(1))
        .map(|n| {
            let stop = add_station(&mut state, format!("Stop {n}"));
            let km = rng.gen_range(params.min_route_km..=params.max_route_km);
            let outbound = add_route(&mut state, terminal, stop, km);
            let inbound = add_route(&mut state, stop, terminal, km);
            Line {
                stop,
                outbound,
                inbound,
                km,
            }
        })
        .collect();
    let network = Network {
        terminal,
        vehicle_type,
        lines,
    };

    for _ in 0..params.rotations {
        let start = day_start + TimeDelta::minutes(rng.gen_range(300..=900));
        add_random_rotation(&mut state, params, &network, start, rng);
    }

    tracing::debug!(
        seed,
        rotations = state.rotations.len(),
        trips = state.trips.len(),
        "synthetic timetable generated"
    );
    Ok(state)
}

/// Round trips out of the terminal, back to back from `start`. With
/// `break_rate` a return leg comes back from a different stop than the
/// outbound leg went to.
fn add_random_rotation(
    state: &mut ScenarioState,
    params: &SynthParams,
    network: &Network,
    start: DateTime<Utc>,
    rng: &mut impl Rng,
) {
    let lines = &network.lines;
    let rotation = state.alloc_rotation_id();
    let mut clock = start;
    let mut soc = 1.0;
    let mut trips = Vec::new();

    let most = params.max_round_trips.max(params.min_round_trips);
    for _ in 0..rng.gen_range(params.min_round_trips..=most).max(1) {
        let line = &lines[rng.gen_range(0..lines.len())];
        let back = if rng.gen_bool(params.break_rate) {
            &lines[rng.gen_range(0..lines.len())]
        } else {
            line
        };
        for (route, stop, km) in [
            (line.outbound, line.stop, line.km),
            (back.inbound, network.terminal, back.km),
        ] {
            #[allow(clippy::cast_possible_truncation)] // minutes on a service day
            let minutes = (km / params.speed_kmh * 60.0).ceil() as i64;
            let departure_time = clock;
            let arrival_time = departure_time + TimeDelta::minutes(minutes.max(1));
            let trip = state.alloc_trip_id();
            state.trips.insert(
                trip,
                Trip {
                    id: trip,
                    rotation,
                    route,
                    departure_time,
                    arrival_time,
                    kind: TripKind::Revenue,
                    loaded_mass_kg: None,
                },
            );
            trips.push(trip);

            let delta =
                km * params.kwh_per_km * rng.gen_range(0.8..1.2) / params.battery_capacity_kwh;
            let soc_end = if rng.gen_bool(params.anomaly_rate) {
                soc + delta.min(1.0 - soc)
            } else {
                (soc - delta).max(0.0)
            };
            add_driving_event(state, trip, network.vehicle_type, soc, soc_end);
            soc = soc_end;
            add_stop_time(state, trip, stop);
            clock = arrival_time + TimeDelta::minutes(rng.gen_range(5..=15));
        }
    }

    state.rotations.insert(
        rotation,
        Rotation {
            id: rotation,
            name: None,
            vehicle_type: network.vehicle_type,
            vehicle: None,
            trips,
            allow_opportunity_charging: true,
        },
    );
}

fn add_station(state: &mut ScenarioState, name: String) -> StationId {
    let id = state.alloc_station_id();
    state.stations.insert(
        id,
        Station {
            id,
            name,
            name_short: None,
            location: None,
            kind: StationKind::Stop,
            is_electrified: false,
        },
    );
    id
}

fn add_route(state: &mut ScenarioState, from: StationId, to: StationId, km: f64) -> RouteId {
    let id = state.alloc_route_id();
    let name = format!("{} → {}", state.stations[&from].name, state.stations[&to].name);
    state.routes.insert(
        id,
        Route {
            id,
            name,
            name_short: None,
            departure_station: from,
            arrival_station: to,
            distance_m: km * 1000.0,
        },
    );
    id
}

fn add_driving_event(
    state: &mut ScenarioState,
    trip: TripId,
    vehicle_type: VehicleTypeId,
    soc_start: f64,
    soc_end: f64,
) {
    let (time_start, time_end) = {
        let t = &state.trips[&trip];
        (t.departure_time, t.arrival_time)
    };
    let id = state.alloc_event_id();
    state.events.insert(
        id,
        Event {
            id,
            kind: EventKind::Driving,
            trip: Some(trip),
            vehicle: None,
            vehicle_type,
            time_start,
            time_end,
            soc_start,
            soc_end,
        },
    );
}

fn add_stop_time(state: &mut ScenarioState, trip: TripId, station: StationId) {
    let arrival_time = state.trips[&trip].arrival_time;
    let id = state.alloc_stop_time_id();
    state.stop_times.insert(
        id,
        StopTime {
            id,
            trip,
            station,
            arrival_time,
        },
    );
}
