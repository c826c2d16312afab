//! Seeded random timetables: whatever survives pruning must come out of the
//! pipeline connected, monotone in SOC, and with one vehicle per rotation.

use chrono::TimeDelta;
use fleet_core::test_fixtures::{
    add_driving_event, add_rotation, add_route, at, base_state, STOP_A, STOP_B, STOP_C, TERMINAL,
};
use fleet_core::*;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const STOPS: [StationId; 3] = [STOP_A, STOP_B, STOP_C];

/// Adds `rotations` terminal-to-terminal rotations, a few of them broken by a
/// wrong departure station or a driving event that gains charge.
fn random_scenario(seed: u64, rotations: usize) -> ScenarioState {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = base_state();

    let mut outbound = Vec::new();
    let mut inbound = Vec::new();
    for stop in STOPS {
        let km = rng.gen_range(5.0..15.0);
        outbound.push(add_route(&mut state, TERMINAL, stop, km * 1000.0));
        inbound.push(add_route(&mut state, stop, TERMINAL, km * 1000.0));
    }

    for r in 0..rotations {
        let mut start = at(5, 0) + TimeDelta::minutes(i64::try_from(r).unwrap() * 7);
        let mut legs = Vec::new();
        for _ in 0..rng.gen_range(1..=3) {
            let stop = rng.gen_range(0..STOPS.len());
            let back = if rng.gen_bool(0.1) {
                (stop + 1) % STOPS.len()
            } else {
                stop
            };
            for route in [outbound[stop], inbound[back]] {
                let end = start + TimeDelta::minutes(20);
                legs.push((route, start, end));
                start = end + TimeDelta::minutes(10);
            }
        }
        let (_, trips) = add_rotation(&mut state, &legs);

        let mut soc = 1.0;
        for trip in trips {
            let delta = rng.gen_range(0.01..0.05);
            if rng.gen_bool(0.05) {
                add_driving_event(&mut state, trip, soc - delta, soc);
            } else {
                add_driving_event(&mut state, trip, soc, soc - delta);
                soc -= delta;
            }
        }
    }
    state
}

#[test]
fn prepared_scenarios_hold_invariants() {
    for seed in 0..32 {
        let mut state = random_scenario(seed, 12);
        let report = prepare_scenario(&mut state, &PipelineConfig::default())
            .unwrap_or_else(|e| panic!("seed {seed}: {e}"));

        let violations = check_invariants(&state);
        assert!(violations.is_empty(), "seed {seed}: {violations:?}");
        assert_eq!(
            report.propagation.vehicles_created,
            state.rotations.len(),
            "seed {seed}"
        );
        assert!(report.propagation.min_soc >= 0.0, "seed {seed}");
    }
}

#[test]
fn pruning_a_prepared_scenario_is_a_no_op() {
    for seed in 0..16 {
        let mut state = random_scenario(seed, 10);
        prepare_scenario(&mut state, &PipelineConfig::default()).unwrap();
        let report = prune_invalid(&mut state);
        assert!(report.is_clean(), "seed {seed}: {:?}", report.warnings);
    }
}

#[test]
fn same_seed_same_result() {
    let run = |seed| {
        let mut state = random_scenario(seed, 8);
        prepare_scenario(&mut state, &PipelineConfig::default()).unwrap();
        serde_json::to_string(&state).unwrap()
    };
    assert_eq!(run(7), run(7));
}
