use super::*;

fn snapshot(state: &ScenarioState) -> serde_json::Value {
    serde_json::to_value(state).unwrap()
}

#[test]
fn test_prepared_scenario_holds_all_invariants() {
    let mut state = base_state();
    let report = prepare_scenario(&mut state, &PipelineConfig::default()).unwrap();

    assert_eq!(report.insert.trips_inserted, 4);
    assert!(report.prune.is_clean());
    assert_eq!(report.rate.sample_count, 4);
    assert_eq!(report.propagation.vehicles_created, 2);
    assert!(state.depots.contains_key(&report.depot));
    assert_eq!(check_invariants(&state), Vec::new());
}

#[test]
fn test_summary_of_prepared_scenario() {
    let mut state = base_state();
    prepare_scenario(&mut state, &PipelineConfig::default()).unwrap();
    let summary = compute_summary(&state);

    assert_eq!(summary.rotations, 2);
    assert_eq!(summary.trips, 8);
    assert_eq!(summary.empty_trips, 4);
    assert_eq!(summary.vehicles, 2);
    assert_eq!(summary.driving_events, 8);
    assert_eq!(summary.depots, 1);
    assert_close(summary.total_distance_km, 62.4);
    assert!(summary.min_soc > 0.0 && summary.min_soc < 1.0);
}

#[test]
fn test_second_run_is_rejected_and_leaves_state_alone() {
    let mut state = base_state();
    prepare_scenario(&mut state, &PipelineConfig::default()).unwrap();
    let before = snapshot(&state);

    let err = prepare_scenario(&mut state, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateAnchor { .. }));
    assert_eq!(snapshot(&state), before);
}

#[test]
fn test_late_failure_rolls_back_earlier_stages() {
    let mut state = base_state();
    for vehicle_type in state.vehicle_types.values_mut() {
        vehicle_type.name = "DieselBus".to_string();
    }
    let before = snapshot(&state);

    let err = prepare_scenario(&mut state, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::ReferenceNotFound {
            kind: ReferenceKind::VehicleType,
            ..
        }
    ));
    assert!(state.station_by_short_name("DEP").is_none());
    assert_eq!(snapshot(&state), before);
}

#[test]
fn test_rotation_away_from_terminal_is_pruned() {
    let mut state = base_state();
    let a_b = add_route(&mut state, STOP_A, STOP_B, 4_000.0);
    let (stray, trips) = add_rotation(&mut state, &[(a_b, at(12, 0), at(12, 15))]);
    add_driving_event(&mut state, trips[0], 1.0, 0.97);

    let report = prepare_scenario(&mut state, &PipelineConfig::default()).unwrap();
    assert_eq!(report.prune.rotations_removed(), 1);
    assert_eq!(report.prune.trips_removed(), 3);
    assert!(!state.rotations.contains_key(&stray));
    assert_eq!(check_invariants(&state), Vec::new());
}

#[test]
fn test_scenario_without_consumption_fails() {
    let mut state = base_state();
    state.events.clear();
    assert!(matches!(
        prepare_scenario(&mut state, &PipelineConfig::default()),
        Err(PipelineError::InsufficientData { scenario: 1 })
    ));
    assert!(state.station_by_short_name("DEP").is_none());
}

#[test]
fn test_rotation_draining_the_battery_fails_the_run() {
    let mut state = empty_state();
    let t_a = add_route(&mut state, TERMINAL, STOP_A, 10_000.0);
    let a_t = add_route(&mut state, STOP_A, TERMINAL, 10_000.0);
    let (rotation, trips) = add_rotation(
        &mut state,
        &[(t_a, at(6, 0), at(6, 20)), (a_t, at(6, 30), at(6, 50))],
    );
    // 0.95 of the battery on revenue service leaves no room for two 3.1 km
    // deadheads at the resulting 14.25 kWh/km.
    add_driving_event(&mut state, trips[0], 1.0, 0.5);
    add_driving_event(&mut state, trips[1], 0.5, 0.05);
    let before = snapshot(&state);

    let err = prepare_scenario(&mut state, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::SocOutOfRange { rotation: r, trip, soc_end }
            if r == rotation && trip == trips[1] && soc_end < 0.0
    ));
    assert_eq!(snapshot(&state), before);
}
