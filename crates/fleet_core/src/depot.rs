use tracing::info;

use crate::config::DepotLayoutConfig;
use crate::error::{PipelineError, PipelineResult, ReferenceKind};
use crate::{Area, AreaKind, Depot, DepotId, Plan, Process, ScenarioState};

/// Index of the charging area in `Depot::areas`.
const CHARGING_AREA: usize = 1;

/// Builds the depot topology the downstream simulator needs: one waiting
/// area, one charging area for the reference vehicle type, and a default
/// plan of charge-then-standby.
pub fn build_depot(
    state: &mut ScenarioState,
    layout: &DepotLayoutConfig,
    depot_name_short: &str,
    reference_vehicle_type: &str,
) -> PipelineResult<DepotId> {
    let station = state
        .station_by_short_name(depot_name_short)
        .ok_or_else(|| PipelineError::not_found(ReferenceKind::Station, depot_name_short))?
        .id;
    if state.depots.values().any(|d| d.station == station) {
        return Err(PipelineError::DuplicateAnchor {
            scenario: state.meta.id,
            name_short: depot_name_short.to_string(),
        });
    }
    let vehicle_type = state
        .vehicle_type_by_name(reference_vehicle_type)
        .ok_or_else(|| {
            PipelineError::not_found(ReferenceKind::VehicleType, reference_vehicle_type)
        })?
        .id;

    let areas = vec![
        Area {
            name: "Waiting area".to_string(),
            kind: AreaKind::DirectOneside,
            vehicle_type: None,
            capacity: layout.waiting_area_capacity,
        },
        Area {
            name: "Direct charging area".to_string(),
            kind: AreaKind::DirectOneside,
            vehicle_type: Some(vehicle_type),
            capacity: layout.charging_area_capacity,
        },
    ];

    let default_plan = Plan {
        name: "Direct charging plan".to_string(),
        processes: vec![
            Process {
                name: "Direct charging process".to_string(),
                dispatchable: true,
                electric_power_kw: Some(layout.charging_power_kw),
                areas: vec![CHARGING_AREA],
            },
            Process {
                name: "Standby departure process".to_string(),
                dispatchable: true,
                electric_power_kw: None,
                areas: vec![CHARGING_AREA],
            },
        ],
    };

    let id = state.alloc_depot_id();
    state.depots.insert(
        id,
        Depot {
            id,
            name: layout.depot_name.clone(),
            station,
            areas,
            default_plan,
        },
    );
    info!(depot = %id, station = %station, "depot topology created");
    Ok(id)
}
