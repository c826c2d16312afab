//! Shared test fixtures for `fleet_core` and downstream crates.
//!
//! `empty_state()` is a network of a terminal and three stops with one
//! `ElectricBus` type (300 kWh) and no schedule. `base_state()` adds two
//! terminal-to-terminal rotations, each trip carrying one driving event.

use chrono::TimeZone;
use chrono::Utc;

use crate::config::AnchorConfig;
use crate::{
    Event, EventId, EventKind, Rotation, RotationId, Route, RouteId, ScenarioMeta, ScenarioState,
    Station, StationId, StationKind, StopTime, Timestamp, Trip, TripId, TripKind, VehicleType,
    VehicleTypeId,
};

pub const TERMINAL: StationId = StationId(0);
pub const STOP_A: StationId = StationId(1);
pub const STOP_B: StationId = StationId(2);
pub const STOP_C: StationId = StationId(3);
pub const ELECTRIC_BUS: VehicleTypeId = VehicleTypeId(0);
pub const BATTERY_KWH: f64 = 300.0;

/// Service-day timestamp, 2024-04-01 `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 4, 1, hour, minute, 0)
        .single()
        .expect("valid fixture time")
}

pub fn empty_state() -> ScenarioState {
    let mut state = ScenarioState::new(ScenarioMeta {
        id: 1,
        name: "Depot Charging".to_string(),
        name_short: Some("DC".to_string()),
    });
    let terminal_name = AnchorConfig::default().terminal_name;
    for name in [terminal_name.as_str(), "Stop A", "Stop B", "Stop C"] {
        let id = state.alloc_station_id();
        state.stations.insert(
            id,
            Station {
                id,
                name: name.to_string(),
                name_short: None,
                location: None,
                kind: StationKind::Stop,
                is_electrified: false,
            },
        );
    }
    let id = state.alloc_vehicle_type_id();
    state.vehicle_types.insert(
        id,
        VehicleType {
            id,
            name: "ElectricBus".to_string(),
            battery_capacity_kwh: BATTERY_KWH,
        },
    );
    state
}

pub fn add_route(
    state: &mut ScenarioState,
    from: StationId,
    to: StationId,
    distance_m: f64,
) -> RouteId {
    let id = state.alloc_route_id();
    state.routes.insert(
        id,
        Route {
            id,
            name: format!("{from} → {to}"),
            name_short: None,
            departure_station: from,
            arrival_station: to,
            distance_m,
        },
    );
    id
}

/// Adds a rotation of revenue trips, one per `(route, departure, arrival)` leg.
pub fn add_rotation(
    state: &mut ScenarioState,
    legs: &[(RouteId, Timestamp, Timestamp)],
) -> (RotationId, Vec<TripId>) {
    let rotation = state.alloc_rotation_id();
    let mut trips = Vec::with_capacity(legs.len());
    for &(route, departure_time, arrival_time) in legs {
        let id = state.alloc_trip_id();
        state.trips.insert(
            id,
            Trip {
                id,
                rotation,
                route,
                departure_time,
                arrival_time,
                kind: TripKind::Revenue,
                loaded_mass_kg: None,
            },
        );
        trips.push(id);
    }
    state.rotations.insert(
        rotation,
        Rotation {
            id: rotation,
            name: None,
            vehicle_type: ELECTRIC_BUS,
            vehicle: None,
            trips: trips.clone(),
            allow_opportunity_charging: true,
        },
    );
    (rotation, trips)
}

pub fn add_driving_event(
    state: &mut ScenarioState,
    trip: TripId,
    soc_start: f64,
    soc_end: f64,
) -> EventId {
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
            vehicle_type: ELECTRIC_BUS,
            time_start,
            time_end,
            soc_start,
            soc_end,
        },
    );
    id
}

pub fn add_stop_time(state: &mut ScenarioState, trip: TripId, station: StationId) {
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

/// Two rotations out of and back into the terminal:
/// - terminal → A → terminal, 06:00–06:50, 10 km per leg
/// - terminal → B → terminal, 07:00–08:10, 15 km per leg
pub fn base_state() -> ScenarioState {
    let mut state = empty_state();
    let t_a = add_route(&mut state, TERMINAL, STOP_A, 10_000.0);
    let a_t = add_route(&mut state, STOP_A, TERMINAL, 10_000.0);
    let t_b = add_route(&mut state, TERMINAL, STOP_B, 15_000.0);
    let b_t = add_route(&mut state, STOP_B, TERMINAL, 15_000.0);

    let (_, first) = add_rotation(
        &mut state,
        &[(t_a, at(6, 0), at(6, 20)), (a_t, at(6, 30), at(6, 50))],
    );
    add_driving_event(&mut state, first[0], 1.0, 0.95);
    add_driving_event(&mut state, first[1], 0.95, 0.90);
    add_stop_time(&mut state, first[0], STOP_A);

    let (_, second) = add_rotation(
        &mut state,
        &[(t_b, at(7, 0), at(7, 30)), (b_t, at(7, 40), at(8, 10))],
    );
    add_driving_event(&mut state, second[0], 1.0, 0.92);
    add_driving_event(&mut state, second[1], 0.92, 0.84);
    add_stop_time(&mut state, second[1], TERMINAL);
    state
}
