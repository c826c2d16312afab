use serde::{Deserialize, Serialize};

use crate::{ScenarioState, TripKind};

/// Snapshot of one scenario's rotation structure and energy annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario_id: u64,
    pub scenario_name: String,
    pub rotations: u32,
    pub trips: u32,
    pub empty_trips: u32,
    pub vehicles: u32,
    pub driving_events: u32,
    pub depots: u32,
    pub total_distance_km: f64,
    /// Lowest `soc_end` over all driving events; 1.0 when there are none.
    pub min_soc: f64,
    /// Mean SOC at the end of each rotation's last trip.
    pub mean_final_soc: f64,
}

#[allow(clippy::cast_possible_truncation)] // table sizes fit in u32
pub fn compute_summary(state: &ScenarioState) -> ScenarioSummary {
    let driving = state.driving_events_by_trip();

    let total_distance_km = state
        .trips
        .keys()
        .filter_map(|&t| state.trip_distance_m(t))
        .sum::<f64>()
        / 1000.0;

    let min_soc = state
        .events
        .values()
        .filter(|e| e.is_driving())
        .map(|e| e.soc_end)
        .fold(1.0_f64, f64::min);

    let final_socs: Vec<f64> = state
        .rotations
        .values()
        .filter_map(|r| r.trips.last())
        .filter_map(|t| driving.get(t)?.first())
        .map(|e| state.events[e].soc_end)
        .collect();
    let mean_final_soc = if final_socs.is_empty() {
        0.0
    } else {
        final_socs.iter().sum::<f64>() / final_socs.len() as f64
    };

    ScenarioSummary {
        scenario_id: state.meta.id,
        scenario_name: state.meta.name.clone(),
        rotations: state.rotations.len() as u32,
        trips: state.trips.len() as u32,
        empty_trips: state
            .trips
            .values()
            .filter(|t| t.kind == TripKind::Empty)
            .count() as u32,
        vehicles: state.vehicles.len() as u32,
        driving_events: state.events.values().filter(|e| e.is_driving()).count() as u32,
        depots: state.depots.len() as u32,
        total_distance_km,
        min_soc,
        mean_final_soc,
    }
}
