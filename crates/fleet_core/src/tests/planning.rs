use super::*;

use crate::test_fixtures::ELECTRIC_BUS;

fn plan(groups: &[&[u64]]) -> RotationPlan {
    RotationPlan {
        rotations: groups
            .iter()
            .map(|g| g.iter().copied().map(TripId).collect())
            .collect(),
    }
}

#[test]
fn test_write_back_replaces_rotations() {
    let mut state = base_state();
    let created =
        write_back_rotation_plan(&mut state, &plan(&[&[3, 0], &[1, 2]]), ELECTRIC_BUS).unwrap();

    assert_eq!(created, 2);
    assert_eq!(state.rotations.len(), 2);
    assert!(!state.rotations.contains_key(&RotationId(0)));

    let first = &state.rotations[&RotationId(2)];
    assert_eq!(first.trips, vec![TripId(0), TripId(3)]);
    assert_eq!(state.trips[&TripId(3)].rotation, RotationId(2));
    assert_eq!(state.trips[&TripId(0)].rotation, RotationId(2));

    let second = &state.rotations[&RotationId(3)];
    assert_eq!(second.trips, vec![TripId(1), TripId(2)]);
}

#[test]
fn test_empty_groups_are_skipped() {
    let mut state = base_state();
    let created =
        write_back_rotation_plan(&mut state, &plan(&[&[0, 1, 2, 3], &[]]), ELECTRIC_BUS).unwrap();
    assert_eq!(created, 1);
}

#[test]
fn test_trip_in_two_groups_is_rejected() {
    let mut state = base_state();
    let err = write_back_rotation_plan(&mut state, &plan(&[&[0, 1], &[1, 2, 3]]), ELECTRIC_BUS)
        .unwrap_err();
    assert!(matches!(err, PipelineError::InputShape { .. }));
    assert!(state.rotations.contains_key(&RotationId(0)));
}

#[test]
fn test_trip_left_out_is_rejected() {
    let mut state = base_state();
    let err =
        write_back_rotation_plan(&mut state, &plan(&[&[0, 1, 2]]), ELECTRIC_BUS).unwrap_err();
    assert!(matches!(err, PipelineError::InputShape { .. }));
    assert_eq!(state.rotations.len(), 2);
}

#[test]
fn test_unknown_trip_is_rejected() {
    let mut state = base_state();
    let err = write_back_rotation_plan(&mut state, &plan(&[&[0, 1, 2, 3, 99]]), ELECTRIC_BUS)
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::ReferenceNotFound {
            kind: ReferenceKind::Trip,
            ..
        }
    ));
}

#[test]
fn test_unknown_vehicle_type_is_rejected() {
    let mut state = base_state();
    assert!(matches!(
        write_back_rotation_plan(&mut state, &plan(&[&[0, 1, 2, 3]]), VehicleTypeId(7)),
        Err(PipelineError::ReferenceNotFound {
            kind: ReferenceKind::VehicleType,
            ..
        })
    ));
}
