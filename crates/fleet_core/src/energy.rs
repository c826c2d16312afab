use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, PipelineResult, ReferenceKind};
use crate::ScenarioState;

/// Scenario-wide average consumption, mixed over every vehicle type present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FleetEnergyRate {
    pub kwh_per_km: f64,
    pub total_energy_kwh: f64,
    pub total_distance_km: f64,
    pub sample_count: usize,
}

impl FleetEnergyRate {
    pub fn energy_kwh(&self, distance_m: f64) -> f64 {
        distance_m / 1000.0 * self.kwh_per_km
    }
}

/// Averages energy over distance across all driving events of the scenario.
pub fn estimate_fleet_rate(state: &ScenarioState) -> PipelineResult<FleetEnergyRate> {
    let mut total_energy_kwh = 0.0;
    let mut total_distance_km = 0.0;
    let mut sample_count = 0;

    for event in state.events.values().filter(|e| e.is_driving()) {
        let vehicle_type = state
            .vehicle_types
            .get(&event.vehicle_type)
            .ok_or_else(|| {
                PipelineError::not_found(ReferenceKind::VehicleType, event.vehicle_type)
            })?;
        let trip = event
            .trip
            .ok_or_else(|| PipelineError::shape(event.id, "driving event without a trip"))?;
        let distance_m = state
            .trip_distance_m(trip)
            .ok_or_else(|| PipelineError::not_found(ReferenceKind::Trip, trip))?;

        total_energy_kwh += event.soc_delta() * vehicle_type.battery_capacity_kwh;
        total_distance_km += distance_m / 1000.0;
        sample_count += 1;
    }

    if sample_count == 0 || total_distance_km <= 0.0 {
        return Err(PipelineError::InsufficientData {
            scenario: state.meta.id,
        });
    }

    let rate = FleetEnergyRate {
        kwh_per_km: total_energy_kwh / total_distance_km,
        total_energy_kwh,
        total_distance_km,
        sample_count,
    };
    info!(
        kwh_per_km = rate.kwh_per_km,
        samples = rate.sample_count,
        "fleet energy rate estimated"
    );
    Ok(rate)
}
