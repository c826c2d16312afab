//! `fleet_core`: rotation assembly and state-of-charge consistency.
//!
//! No IO. Every stage reads and mutates one in-memory `ScenarioState`, the
//! image of a single scenario's rows in the relational store.

mod anchor;
mod check;
pub mod config;
mod deletion;
mod depot;
mod energy;
mod error;
mod insert;
mod pipeline;
mod planning;
mod prune;
mod soc;
mod store;
mod summary;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use anchor::{resolve_anchors, DepotAnchors};
pub use check::{check_connectivity, check_invariants, InvariantViolation};
pub use config::PipelineConfig;
pub use deletion::{DeletionOutcome, DeletionPlan};
pub use depot::build_depot;
pub use energy::{estimate_fleet_rate, FleetEnergyRate};
pub use error::{PipelineError, PipelineResult, ReferenceKind};
pub use insert::{insert_depot_trips, InsertReport};
pub use pipeline::{prepare_scenario, PipelineReport};
pub use planning::{write_back_rotation_plan, RotationPlan};
pub use prune::{find_break, prune_invalid, BreakReason, PruneReport, PruneWarning};
pub use soc::{
    plan_rotation, propagate_soc, FoldParams, PropagationReport, SocPlan, SocStep, FULL_CHARGE,
};
pub use store::EventIndex;
pub use summary::{compute_summary, ScenarioSummary};
pub use types::*;

#[cfg(test)]
mod tests;
