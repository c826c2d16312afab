//! Dataset, config and state-file IO shared between fleet_cli and fleet_bench.

mod synth;

use anyhow::{bail, ensure, Context, Result};
use fleet_core::{
    write_back_rotation_plan, Event, PipelineConfig, Rotation, RotationPlan, Route,
    ScenarioMeta, ScenarioState, Station, StopTime, Trip, TripId, VehicleType,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;

pub use synth::{generate_seeded, generate_timetable, SynthParams};

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let text =
        std::fs::read_to_string(dir.join(file)).with_context(|| format!("reading {file}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {file}"))
}

fn read_optional_json<T: DeserializeOwned + Default>(dir: &Path, file: &str) -> Result<T> {
    if dir.join(file).exists() {
        read_json(dir, file)
    } else {
        Ok(T::default())
    }
}

/// Loads one scenario from a dataset directory.
///
/// `scenario.json`, `stations.json`, `routes.json`, `vehicle_types.json` and
/// `trips.json` are required. Without `rotations.json` the rotations are
/// rebuilt from each trip's `rotation` field.
pub fn load_dataset(dir: &Path) -> Result<ScenarioState> {
    let meta: ScenarioMeta = read_json(dir, "scenario.json")?;
    let stations: Vec<Station> = read_json(dir, "stations.json")?;
    let routes: Vec<Route> = read_json(dir, "routes.json")?;
    let vehicle_types: Vec<VehicleType> = read_json(dir, "vehicle_types.json")?;
    let trips: Vec<Trip> = read_json(dir, "trips.json")?;
    let rotations: Option<Vec<Rotation>> = read_optional_json(dir, "rotations.json")?;
    let events: Vec<Event> = read_optional_json(dir, "events.json")?;
    let stop_times: Vec<StopTime> = read_optional_json(dir, "stop_times.json")?;

    let mut state = ScenarioState::new(meta);
    state.stations = stations.into_iter().map(|s| (s.id, s)).collect();
    state.routes = routes.into_iter().map(|r| (r.id, r)).collect();
    state.vehicle_types = vehicle_types.into_iter().map(|v| (v.id, v)).collect();
    state.trips = trips.into_iter().map(|t| (t.id, t)).collect();
    state.events = events.into_iter().map(|e| (e.id, e)).collect();
    state.stop_times = stop_times.into_iter().map(|st| (st.id, st)).collect();
    state.resync_counters();

    match rotations {
        Some(rotations) => state.rotations = rotations.into_iter().map(|r| (r.id, r)).collect(),
        None => rebuild_rotations(&mut state)?,
    }
    state.resync_counters();

    validate_dataset(&state)?;
    tracing::info!(
        scenario = state.meta.id,
        rotations = state.rotations.len(),
        trips = state.trips.len(),
        events = state.events.len(),
        "dataset loaded"
    );
    Ok(state)
}

/// Groups trips by their `rotation` field, every rotation on the first vehicle type.
fn rebuild_rotations(state: &mut ScenarioState) -> Result<()> {
    let Some(vehicle_type) = state.vehicle_types.keys().next().copied() else {
        bail!("vehicle_types.json is empty");
    };
    let mut groups: BTreeMap<_, Vec<TripId>> = BTreeMap::new();
    for trip in state.trips.values() {
        groups.entry(trip.rotation).or_default().push(trip.id);
    }
    let plan = RotationPlan {
        rotations: groups.into_values().collect(),
    };
    write_back_rotation_plan(state, &plan, vehicle_type).context("rebuilding rotations")?;
    Ok(())
}

/// Checks every cross reference between the tables of a loaded dataset.
pub fn validate_dataset(state: &ScenarioState) -> Result<()> {
    let mut short_names = HashSet::new();
    for station in state.stations.values() {
        if let Some(name_short) = &station.name_short {
            ensure!(
                short_names.insert(name_short.as_str()),
                "station short name '{name_short}' is used twice"
            );
        }
    }

    for route in state.routes.values() {
        for station in [route.departure_station, route.arrival_station] {
            ensure!(
                state.stations.contains_key(&station),
                "{} references unknown {station}",
                route.id
            );
        }
        ensure!(
            route.distance_m >= 0.0,
            "{} has negative distance {}",
            route.id,
            route.distance_m
        );
    }

    for trip in state.trips.values() {
        ensure!(
            state.routes.contains_key(&trip.route),
            "{} references unknown {}",
            trip.id,
            trip.route
        );
        ensure!(
            trip.arrival_time >= trip.departure_time,
            "{} arrives before it departs",
            trip.id
        );
        let listed = state
            .rotations
            .get(&trip.rotation)
            .is_some_and(|r| r.trips.contains(&trip.id));
        ensure!(listed, "{} is not listed by {}", trip.id, trip.rotation);
    }

    for rotation in state.rotations.values() {
        ensure!(
            state.vehicle_types.contains_key(&rotation.vehicle_type),
            "{} references unknown {}",
            rotation.id,
            rotation.vehicle_type
        );
        for trip in &rotation.trips {
            let owner = state.trips.get(trip).map(|t| t.rotation);
            ensure!(
                owner == Some(rotation.id),
                "{} lists {trip}, which belongs to {owner:?}",
                rotation.id
            );
        }
    }

    for event in state.events.values() {
        ensure!(
            state.vehicle_types.contains_key(&event.vehicle_type),
            "{} references unknown {}",
            event.id,
            event.vehicle_type
        );
        if let Some(trip) = event.trip {
            ensure!(
                state.trips.contains_key(&trip),
                "{} references unknown {trip}",
                event.id
            );
        }
    }

    for stop_time in state.stop_times.values() {
        ensure!(
            state.trips.contains_key(&stop_time.trip),
            "{} references unknown {}",
            stop_time.id,
            stop_time.trip
        );
        ensure!(
            state.stations.contains_key(&stop_time.station),
            "{} references unknown {}",
            stop_time.id,
            stop_time.station
        );
    }
    Ok(())
}

/// Writes a state back out as a dataset directory `load_dataset` reads.
pub fn write_dataset(state: &ScenarioState, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    write_json(&dir.join("scenario.json"), &state.meta)?;
    write_json(&dir.join("stations.json"), &state.stations.values().collect::<Vec<_>>())?;
    write_json(&dir.join("routes.json"), &state.routes.values().collect::<Vec<_>>())?;
    write_json(
        &dir.join("vehicle_types.json"),
        &state.vehicle_types.values().collect::<Vec<_>>(),
    )?;
    write_json(&dir.join("trips.json"), &state.trips.values().collect::<Vec<_>>())?;
    write_json(&dir.join("rotations.json"), &state.rotations.values().collect::<Vec<_>>())?;
    write_json(&dir.join("events.json"), &state.events.values().collect::<Vec<_>>())?;
    write_json(
        &dir.join("stop_times.json"),
        &state.stop_times.values().collect::<Vec<_>>(),
    )?;
    Ok(())
}

/// Loads a pipeline config. Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_state(state: &ScenarioState, path: &Path) -> Result<()> {
    write_json(path, state).with_context(|| format!("saving state to {}", path.display()))
}

pub fn load_state(path: &Path) -> Result<ScenarioState> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading state {}", path.display()))?;
    let mut state: ScenarioState =
        serde_json::from_str(&text).with_context(|| format!("parsing state {}", path.display()))?;
    state.resync_counters();
    Ok(state)
}

/// Write JSON atomically: write to `.tmp` then rename.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value)?;
    let mut file = std::fs::File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
