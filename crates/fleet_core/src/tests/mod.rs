use super::*;
use crate::config::{AnchorConfig, DeadheadConfig, DepotLayoutConfig};
use crate::test_fixtures::{
    add_driving_event, add_rotation, add_route, add_stop_time, at, base_state, empty_state,
    BATTERY_KWH, STOP_A, STOP_B, STOP_C, TERMINAL,
};

mod insert;
mod pipeline;
mod planning;
mod soc;

// --- Shared test helpers ------------------------------------------------

const EPS: f64 = 1e-9;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPS,
        "expected {expected}, got {actual}"
    );
}

fn anchored(state: &mut ScenarioState) -> DepotAnchors {
    resolve_anchors(state, &AnchorConfig::default()).unwrap()
}

/// Anchors and deadhead trips, as the pipeline leaves them before pruning.
fn with_deadheads(state: &mut ScenarioState) -> DepotAnchors {
    let anchors = anchored(state);
    insert_depot_trips(state, &anchors, &DeadheadConfig::default()).unwrap();
    anchors
}

/// Terminal → A (10 km) and A → terminal (15 km) with 60 kWh on each leg,
/// i.e. a fleet rate of exactly 4.8 kWh/km.
fn rate_state() -> (ScenarioState, Vec<TripId>) {
    let mut state = empty_state();
    let out = add_route(&mut state, TERMINAL, STOP_A, 10_000.0);
    let back = add_route(&mut state, STOP_A, TERMINAL, 15_000.0);
    let (_, trips) = add_rotation(
        &mut state,
        &[(out, at(6, 0), at(6, 20)), (back, at(6, 30), at(6, 50))],
    );
    add_driving_event(&mut state, trips[0], 1.0, 0.8);
    add_driving_event(&mut state, trips[1], 0.8, 0.6);
    (state, trips)
}

fn driving_event_of(state: &ScenarioState, trip: TripId) -> &Event {
    let ids = &state.driving_events_by_trip()[&trip];
    assert_eq!(ids.len(), 1, "{trip} should carry exactly one driving event");
    &state.events[&ids[0]]
}
