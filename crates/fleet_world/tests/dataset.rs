//! Dataset directories on disk: the bundled Kitaoji sample and generated ones.

use fleet_core::{check_invariants, prepare_scenario, PipelineConfig, TripKind};
use fleet_world::{generate_seeded, load_dataset, write_dataset, SynthParams};
use std::path::PathBuf;

/// Integration tests run from the crate directory, so we go up two levels.
fn sample_dir() -> PathBuf {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    PathBuf::from(manifest).join("../../data/kitaoji")
}

#[test]
fn sample_dataset_loads() {
    let state = load_dataset(&sample_dir()).expect("sample dataset should load");
    assert_eq!(state.meta.name_short.as_deref(), Some("DC"));
    assert_eq!(state.stations.len(), 4);
    assert_eq!(state.trips.len(), 10);
    // No rotations.json: rebuilt from the trips' rotation field.
    assert_eq!(state.rotations.len(), 4);
    for rotation in state.rotations.values() {
        for trip in &rotation.trips {
            assert_eq!(state.trips[trip].rotation, rotation.id);
        }
    }
}

#[test]
fn sample_dataset_prepares_cleanly() {
    let mut state = load_dataset(&sample_dir()).unwrap();
    let report = prepare_scenario(&mut state, &PipelineConfig::default()).unwrap();

    // One rotation returns from the wrong stop, one loses its first leg to an
    // energy anomaly and no longer connects.
    assert_eq!(report.prune.rotations_removed(), 2);
    assert_eq!(state.rotations.len(), 2);
    assert_eq!(
        state
            .trips
            .values()
            .filter(|t| t.kind == TripKind::Empty)
            .count(),
        4
    );
    assert_eq!(check_invariants(&state), Vec::new());
}

#[test]
fn generated_dataset_round_trips_through_directory() {
    let dir = tempfile::tempdir().unwrap();
    let generated = generate_seeded(&SynthParams::default(), 3).unwrap();
    write_dataset(&generated, dir.path()).unwrap();

    let loaded = load_dataset(dir.path()).unwrap();
    assert_eq!(loaded.rotations.len(), generated.rotations.len());
    assert_eq!(loaded.trips.len(), generated.trips.len());
    assert_eq!(loaded.events.len(), generated.events.len());
    assert_eq!(
        loaded.counters.next_trip_id,
        generated.counters.next_trip_id
    );
}

#[test]
fn missing_table_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&generate_seeded(&SynthParams::default(), 3).unwrap(), dir.path()).unwrap();
    std::fs::remove_file(dir.path().join("trips.json")).unwrap();

    let err = load_dataset(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("reading trips.json"), "{err:#}");
}

#[test]
fn generated_scenarios_survive_the_pipeline() {
    for seed in 0..8 {
        let mut state = generate_seeded(&SynthParams::default(), seed).unwrap();
        prepare_scenario(&mut state, &PipelineConfig::default())
            .unwrap_or_else(|e| panic!("seed {seed}: {e}"));
        let violations = check_invariants(&state);
        assert!(violations.is_empty(), "seed {seed}: {violations:?}");
    }
}
