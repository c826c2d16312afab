use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::anchor::{resolve_anchors, DepotAnchors};
use crate::config::PipelineConfig;
use crate::depot::build_depot;
use crate::energy::{estimate_fleet_rate, FleetEnergyRate};
use crate::error::PipelineResult;
use crate::insert::{insert_depot_trips, InsertReport};
use crate::prune::{prune_invalid, PruneReport};
use crate::soc::{propagate_soc, PropagationReport};
use crate::{DepotId, ScenarioState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub anchors: DepotAnchors,
    pub insert: InsertReport,
    pub prune: PruneReport,
    pub rate: FleetEnergyRate,
    pub propagation: PropagationReport,
    pub depot: DepotId,
}

/// Runs every stage on one scenario.
///
/// Stages:
/// 1. Resolve the depot anchor (station + two deadhead routes).
/// 2. Insert deadhead trips around every rotation.
/// 3. Prune broken rotations and anomalous trips.
/// 4. Estimate the fleet energy rate.
/// 5. Assign vehicles and propagate SOC.
/// 6. Build the depot topology.
///
/// The stages work on a staged copy that replaces `state` only when all of
/// them succeed; on error `state` is left exactly as it was passed in.
pub fn prepare_scenario(
    state: &mut ScenarioState,
    config: &PipelineConfig,
) -> PipelineResult<PipelineReport> {
    let span = info_span!("prepare_scenario", scenario = state.meta.id, name = %state.meta.name);
    let _guard = span.enter();

    let mut staged = state.clone();
    let report = run_stages(&mut staged, config)?;
    *state = staged;

    info!(
        rotations = state.rotations.len(),
        vehicles = report.propagation.vehicles_created,
        pruned_rotations = report.prune.rotations_removed(),
        pruned_trips = report.prune.trips_removed(),
        "scenario prepared"
    );
    Ok(report)
}

fn run_stages(
    state: &mut ScenarioState,
    config: &PipelineConfig,
) -> PipelineResult<PipelineReport> {
    let reference = config.reference_vehicle_type.0.as_str();

    let anchors = resolve_anchors(state, &config.anchor)?;
    let insert = insert_depot_trips(state, &anchors, &config.deadhead)?;
    let prune = prune_invalid(state);
    let rate = estimate_fleet_rate(state)?;
    let propagation = propagate_soc(state, &rate, reference)?;
    let depot = build_depot(
        state,
        &config.depot_layout,
        &config.anchor.depot_name_short,
        reference,
    )?;

    Ok(PipelineReport {
        anchors,
        insert,
        prune,
        rate,
        propagation,
        depot,
    })
}
