use super::*;

fn rate_4_8() -> FleetEnergyRate {
    FleetEnergyRate {
        kwh_per_km: 4.8,
        total_energy_kwh: 120.0,
        total_distance_km: 25.0,
        sample_count: 2,
    }
}

#[test]
fn test_soc_chain_from_full_charge() {
    let (mut state, trips) = rate_state();
    with_deadheads(&mut state);
    let report = propagate_soc(&mut state, &rate_4_8(), "ElectricBus").unwrap();

    let rotation = state.rotations.values().next().unwrap();
    let chain = rotation.trips.clone();
    assert_eq!(chain.len(), 4);
    assert_eq!(&chain[1..3], trips.as_slice());

    let expected = [(1.0, 0.9504), (0.9504, 0.7504), (0.7504, 0.5504), (0.5504, 0.5008)];
    for (trip, (soc_start, soc_end)) in chain.iter().zip(expected) {
        let event = driving_event_of(&state, *trip);
        assert_close(event.soc_start, soc_start);
        assert_close(event.soc_end, soc_end);
    }

    assert_eq!(report.vehicles_created, 1);
    assert_eq!(report.events_synthesized, 2);
    assert_eq!(report.events_rebased, 2);
    assert_close(report.min_soc, 0.5008);
}

#[test]
fn test_each_rotation_gets_its_own_vehicle() {
    let mut state = base_state();
    with_deadheads(&mut state);
    let rate = estimate_fleet_rate(&state).unwrap();
    propagate_soc(&mut state, &rate, "ElectricBus").unwrap();

    assert_eq!(state.vehicles.len(), 2);
    let mut seen = Vec::new();
    for rotation in state.rotations.values() {
        let vehicle = rotation.vehicle.unwrap();
        assert!(!seen.contains(&vehicle));
        seen.push(vehicle);
        assert_eq!(
            state.vehicles[&vehicle].name_short,
            format!("V_{}", rotation.id.0)
        );
        for trip in &rotation.trips {
            let event = driving_event_of(&state, *trip);
            assert_eq!(event.vehicle, Some(vehicle));
            assert_eq!(event.vehicle_type, rotation.vehicle_type);
        }
    }
}

#[test]
fn test_plan_rotation_does_not_touch_state() {
    let (mut state, _) = rate_state();
    with_deadheads(&mut state);
    let driving = state.driving_events_by_trip();
    let rate = rate_4_8();
    let params = FoldParams {
        rate: &rate,
        capacity_kwh: BATTERY_KWH,
    };
    let rotation = state.rotations.values().next().unwrap();
    let plan = plan_rotation(&state, rotation, &driving, params).unwrap();

    assert_eq!(plan.steps.len(), 4);
    assert!(matches!(plan.steps[0], SocStep::Synthesized { .. }));
    assert!(matches!(plan.steps[1], SocStep::Rebased { .. }));
    assert!(matches!(plan.steps[3], SocStep::Synthesized { .. }));
    assert_eq!(state.events.len(), 2);
    assert!(state.vehicles.is_empty());
}

#[test]
fn test_gaining_interior_event_is_rejected_without_writes() {
    let (mut state, trips) = rate_state();
    with_deadheads(&mut state);
    let event = state.driving_events_by_trip()[&trips[1]][0];
    state.events.get_mut(&event).unwrap().soc_end = 0.9;

    let err = propagate_soc(&mut state, &rate_4_8(), "ElectricBus").unwrap_err();
    assert!(matches!(err, PipelineError::InputShape { .. }));
    assert!(state.vehicles.is_empty());
    assert_eq!(state.events.len(), 2);
    assert_close(state.events[&event].soc_start, 0.8);
}

#[test]
fn test_boundary_trip_with_event_is_rejected() {
    // No deadheads: the first trip is a boundary and already has an event.
    let (mut state, _) = rate_state();
    assert!(matches!(
        propagate_soc(&mut state, &rate_4_8(), "ElectricBus"),
        Err(PipelineError::InputShape { .. })
    ));
}

#[test]
fn test_interior_trip_without_event_is_rejected() {
    let (mut state, trips) = rate_state();
    with_deadheads(&mut state);
    state.events.retain(|_, e| e.trip != Some(trips[0]));
    assert!(matches!(
        propagate_soc(&mut state, &rate_4_8(), "ElectricBus"),
        Err(PipelineError::InputShape { .. })
    ));
}

#[test]
fn test_unknown_reference_type() {
    let (mut state, _) = rate_state();
    with_deadheads(&mut state);
    assert!(matches!(
        propagate_soc(&mut state, &rate_4_8(), "DieselBus"),
        Err(PipelineError::ReferenceNotFound {
            kind: ReferenceKind::VehicleType,
            ..
        })
    ));
}

#[test]
fn test_zero_capacity_is_rejected() {
    let (mut state, _) = rate_state();
    with_deadheads(&mut state);
    for vehicle_type in state.vehicle_types.values_mut() {
        vehicle_type.battery_capacity_kwh = 0.0;
    }
    assert!(matches!(
        propagate_soc(&mut state, &rate_4_8(), "ElectricBus"),
        Err(PipelineError::InputShape { .. })
    ));
}

#[test]
fn test_soc_below_zero_is_out_of_range() {
    let (mut state, _) = rate_state();
    with_deadheads(&mut state);
    let rate = FleetEnergyRate {
        kwh_per_km: 200.0,
        ..rate_4_8()
    };
    let err = propagate_soc(&mut state, &rate, "ElectricBus").unwrap_err();
    assert!(matches!(err, PipelineError::SocOutOfRange { soc_end, .. } if soc_end < 0.0));
    assert!(state.vehicles.is_empty());
}
