use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{AnchorConfig, INBOUND_ROUTE_SHORT_NAME, OUTBOUND_ROUTE_SHORT_NAME};
use crate::error::{PipelineError, PipelineResult, ReferenceKind};
use crate::{Route, RouteId, ScenarioState, Station, StationId, StationKind};

/// Depot station plus the two fixed deadhead routes linking it to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepotAnchors {
    pub depot: StationId,
    pub terminal: StationId,
    /// depot → terminal
    pub inbound: RouteId,
    /// terminal → depot
    pub outbound: RouteId,
}

/// Creates the depot station and its deadhead routes.
///
/// Re-invocation on the same scenario is rejected with `DuplicateAnchor`
/// rather than skipped: a scenario is processed exactly once.
pub fn resolve_anchors(
    state: &mut ScenarioState,
    config: &AnchorConfig,
) -> PipelineResult<DepotAnchors> {
    if state.station_by_short_name(&config.depot_name_short).is_some() {
        return Err(PipelineError::DuplicateAnchor {
            scenario: state.meta.id,
            name_short: config.depot_name_short.clone(),
        });
    }
    let terminal = state
        .station_by_name(&config.terminal_name)
        .ok_or_else(|| PipelineError::not_found(ReferenceKind::Station, &config.terminal_name))?;
    let (terminal_id, terminal_name) = (terminal.id, terminal.name.clone());

    let depot_id = state.alloc_station_id();
    state.stations.insert(
        depot_id,
        Station {
            id: depot_id,
            name: config.depot_name.clone(),
            name_short: Some(config.depot_name_short.clone()),
            location: Some(config.depot_location),
            kind: StationKind::Depot,
            is_electrified: true,
        },
    );

    let inbound = add_route(
        state,
        depot_id,
        terminal_id,
        format!("{} → {terminal_name}", config.depot_name),
        INBOUND_ROUTE_SHORT_NAME,
        config.deadhead_distance_m,
    );
    let outbound = add_route(
        state,
        terminal_id,
        depot_id,
        format!("{terminal_name} → {}", config.depot_name),
        OUTBOUND_ROUTE_SHORT_NAME,
        config.deadhead_distance_m,
    );

    info!(
        scenario = state.meta.id,
        depot = %depot_id,
        terminal = %terminal_id,
        "depot anchor created"
    );
    Ok(DepotAnchors {
        depot: depot_id,
        terminal: terminal_id,
        inbound,
        outbound,
    })
}

fn add_route(
    state: &mut ScenarioState,
    from: StationId,
    to: StationId,
    name: String,
    name_short: &str,
    distance_m: f64,
) -> RouteId {
    let id = state.alloc_route_id();
    state.routes.insert(
        id,
        Route {
            id,
            name,
            name_short: Some(name_short.to_string()),
            departure_station: from,
            arrival_station: to,
            distance_m,
        },
    );
    id
}
