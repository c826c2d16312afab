use super::*;

#[test]
fn test_deadheads_wrap_every_rotation() {
    let mut state = base_state();
    let anchors = anchored(&mut state);
    let report = insert_depot_trips(&mut state, &anchors, &DeadheadConfig::default()).unwrap();

    assert_eq!(report.rotations, 2);
    assert_eq!(report.trips_inserted, 4);
    for rotation in state.rotations.values() {
        assert_eq!(rotation.trips.len(), 4);
        let first = &state.trips[&rotation.trips[0]];
        let last = &state.trips[&rotation.trips[3]];
        assert_eq!(first.kind, TripKind::Empty);
        assert_eq!(last.kind, TripKind::Empty);
        assert_eq!(first.route, anchors.inbound);
        assert_eq!(last.route, anchors.outbound);
        assert_eq!(first.rotation, rotation.id);
        assert_eq!(last.rotation, rotation.id);
        assert_eq!(first.loaded_mass_kg, Some(0.0));
    }
}

#[test]
fn test_deadhead_timing_uses_break_and_duration() {
    let mut state = base_state();
    let anchors = anchored(&mut state);
    insert_depot_trips(&mut state, &anchors, &DeadheadConfig::default()).unwrap();

    // First rotation runs 06:00–06:50.
    let rotation = state.rotations.values().next().unwrap();
    let inbound = &state.trips[&rotation.trips[0]];
    let outbound = &state.trips[&rotation.trips[3]];
    assert_eq!(inbound.departure_time, at(5, 49));
    assert_eq!(inbound.arrival_time, at(5, 55));
    assert_eq!(outbound.departure_time, at(6, 55));
    assert_eq!(outbound.arrival_time, at(7, 1));
}

#[test]
fn test_deadhead_timing_follows_config() {
    let mut state = base_state();
    let anchors = anchored(&mut state);
    let config = DeadheadConfig {
        break_minutes: 10,
        duration_minutes: 3,
    };
    insert_depot_trips(&mut state, &anchors, &config).unwrap();

    let rotation = state.rotations.values().next().unwrap();
    let inbound = &state.trips[&rotation.trips[0]];
    let outbound = &state.trips[&rotation.trips[3]];
    assert_eq!(inbound.departure_time, at(5, 47));
    assert_eq!(inbound.arrival_time, at(5, 50));
    assert_eq!(outbound.departure_time, at(7, 0));
    assert_eq!(outbound.arrival_time, at(7, 3));
}

#[test]
fn test_deadheads_keep_terminal_rotations_connected() {
    let mut state = base_state();
    with_deadheads(&mut state);
    assert!(check_connectivity(&state).is_empty());
}

#[test]
fn test_deadheads_create_no_events() {
    let mut state = base_state();
    let events = state.events.len();
    with_deadheads(&mut state);
    assert_eq!(state.events.len(), events);
}

#[test]
fn test_empty_rotation_is_an_input_shape_error() {
    let mut state = base_state();
    add_rotation(&mut state, &[]);
    let anchors = anchored(&mut state);
    let trips = state.trips.len();

    let err = insert_depot_trips(&mut state, &anchors, &DeadheadConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::InputShape { .. }));
    assert_eq!(state.trips.len(), trips, "no trip may be written on failure");
}
