use crate::batch::Variant;
use crate::run_result::{self, RunResult, RunStatus, RUN_SCHEMA_VERSION};
use anyhow::{Context, Result};
use chrono::TimeDelta;
use fleet_control::apply_planner;
use fleet_core::{
    check_invariants, compute_summary, prepare_scenario, PipelineConfig, PipelineReport,
    PipelineResult, ScenarioState, ScenarioSummary,
};
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

/// What the batch keeps of one finished run.
pub struct RunOutcome {
    pub run_id: String,
    pub variant: String,
    pub seed: Option<u64>,
    pub status: RunStatus,
    pub summary: Option<ScenarioSummary>,
    pub kwh_per_km: Option<f64>,
    pub rotations_pruned: usize,
    pub trips_pruned: usize,
    pub wall_time_ms: u64,
}

/// Everything a run needs besides its own input scenario.
pub struct RunContext<'a> {
    pub batch_name: &'a str,
    pub batch_params: &'a serde_json::Value,
    pub config: &'a PipelineConfig,
}

#[allow(clippy::cast_possible_truncation)] // hours on a service day
fn variant_max_duration(variant: &Variant) -> Option<TimeDelta> {
    variant
        .max_duration_hours
        .and_then(|h| TimeDelta::try_minutes((h * 60.0).round() as i64))
}

/// Plans rotations for the variant, then runs the pipeline.
fn plan_and_prepare(
    state: &mut ScenarioState,
    variant: &Variant,
    config: &PipelineConfig,
) -> PipelineResult<PipelineReport> {
    if let Some(mut planner) = variant.planner.build(
        TimeDelta::minutes(variant.min_layover_minutes),
        variant_max_duration(variant),
    ) {
        apply_planner(state, planner.as_mut(), &config.reference_vehicle_type.0)?;
    }
    prepare_scenario(state, config)
}

/// Runs one variant on its own copy of `base` and writes `run_result.json`
/// (and `state.json` on success) into `run_dir`.
///
/// A scenario the pipeline rejects is a failed run, not an error; only IO
/// problems are returned as `Err`.
pub fn run_variant(
    ctx: &RunContext<'_>,
    base: &ScenarioState,
    variant: &Variant,
    seed: Option<u64>,
    run_dir: &Path,
) -> Result<RunOutcome> {
    let run_id = Uuid::new_v4().to_string();
    let start = Instant::now();
    std::fs::create_dir_all(run_dir)
        .with_context(|| format!("creating run directory: {}", run_dir.display()))?;

    let mut state = base.clone();
    state.meta.name.clone_from(&variant.name);
    state.meta.name_short = Some(variant.name_short.clone());

    let prepared = plan_and_prepare(&mut state, variant, ctx.config);
    #[allow(clippy::cast_possible_truncation)]
    let wall_time_ms = start.elapsed().as_millis() as u64;

    let mut result = RunResult {
        run_schema_version: RUN_SCHEMA_VERSION,
        run_status: RunStatus::Completed,
        run_id: run_id.clone(),
        git_sha: run_result::git_sha(),
        git_dirty: run_result::git_dirty(),
        batch_name: ctx.batch_name.to_string(),
        batch_params: ctx.batch_params.clone(),
        variant: variant.name_short.clone(),
        seed,
        wall_time_ms,
        summary: None,
        kwh_per_km: None,
        rotations_pruned: 0,
        trips_pruned: 0,
        invariant_violations: 0,
        state_path: None,
        error_message: None,
    };

    match prepared {
        Ok(report) => {
            let state_path = run_dir.join("state.json");
            fleet_world::save_state(&state, &state_path)?;
            result.summary = Some(compute_summary(&state));
            result.kwh_per_km = Some(report.rate.kwh_per_km);
            result.rotations_pruned = report.prune.rotations_removed();
            result.trips_pruned = report.prune.trips_removed();
            result.invariant_violations = check_invariants(&state).len();
            result.state_path = Some("state.json".to_string());
        }
        Err(err) => {
            tracing::warn!(variant = %variant.name_short, ?seed, "run failed: {err}");
            result.run_status = RunStatus::Failed;
            result.error_message = Some(err.to_string());
        }
    }

    result
        .write_atomic(&run_dir.join("run_result.json"))
        .context("writing run_result.json")?;

    Ok(RunOutcome {
        run_id,
        variant: result.variant,
        seed,
        status: result.run_status,
        summary: result.summary,
        kwh_per_km: result.kwh_per_km,
        rotations_pruned: result.rotations_pruned,
        trips_pruned: result.trips_pruned,
        wall_time_ms,
    })
}
