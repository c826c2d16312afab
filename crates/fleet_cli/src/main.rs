use anyhow::{bail, Context, Result};
use chrono::TimeDelta;
use clap::{Parser, Subcommand};
use fleet_control::{apply_planner, PlannerKind};
use fleet_core::{
    check_invariants, compute_summary, prepare_scenario, PipelineConfig, ScenarioSummary,
};
use fleet_world::{
    generate_seeded, load_config, load_dataset, load_state, save_state, write_dataset, SynthParams,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "fleet_cli", about = "Rotation assembly and SOC consistency pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline on a dataset directory and write the prepared state.
    Prepare {
        #[arg(long)]
        data: PathBuf,
        /// Pipeline config JSON. Missing fields take their defaults.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Regroup trips into rotations before the pipeline runs.
        #[arg(long, default_value = "none", value_parser = ["none", "single", "greedy"])]
        planner: String,
        /// Cap on a greedy rotation's length.
        #[arg(long)]
        max_duration_hours: Option<f64>,
        #[arg(long, default_value_t = 0)]
        min_layover_minutes: i64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Check a prepared state file against the pipeline's guarantees.
    Verify {
        #[arg(long)]
        state: PathBuf,
    },
    /// Write a synthetic dataset directory.
    Generate {
        /// Random if omitted.
        #[arg(long)]
        seed: Option<u64>,
        /// Generator parameters JSON. Missing fields take their defaults.
        #[arg(long)]
        params: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn planner_kind(name: &str) -> PlannerKind {
    match name {
        "single" => PlannerKind::Single,
        "greedy" => PlannerKind::Greedy,
        _ => PlannerKind::None,
    }
}

#[allow(clippy::cast_possible_truncation)] // hours on a service day
fn hours(h: f64) -> Result<TimeDelta> {
    if !h.is_finite() || h <= 0.0 {
        bail!("--max-duration-hours must be positive, got {h}");
    }
    TimeDelta::try_minutes((h * 60.0).round() as i64).context("--max-duration-hours out of range")
}

fn prepare(
    data: &Path,
    config: Option<&Path>,
    planner: PlannerKind,
    max_duration_hours: Option<f64>,
    min_layover_minutes: i64,
    out: &Path,
) -> Result<()> {
    let config = match config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    let mut state = load_dataset(data)
        .with_context(|| format!("loading dataset {}", data.display()))?;

    let max_duration = max_duration_hours.map(hours).transpose()?;
    if let Some(mut planner) = planner.build(TimeDelta::minutes(min_layover_minutes), max_duration)
    {
        let created = apply_planner(
            &mut state,
            planner.as_mut(),
            &config.reference_vehicle_type.0,
        )?;
        info!(rotations = created, "rotations planned");
    }

    let report = prepare_scenario(&mut state, &config)
        .with_context(|| format!("preparing scenario '{}'", state.meta.name))?;
    for warning in &report.prune.warnings {
        println!("  pruned: {warning}");
    }
    println!(
        "Fleet rate: {:.3} kWh/km over {} driving events",
        report.rate.kwh_per_km, report.rate.sample_count
    );

    let violations = check_invariants(&state);
    if !violations.is_empty() {
        for violation in &violations {
            warn!("{violation}");
        }
        bail!("{} invariant violations after preparation", violations.len());
    }

    save_state(&state, out)?;
    print_summary(&compute_summary(&state));
    println!("State written to {}", out.display());
    Ok(())
}

fn verify(path: &Path) -> Result<()> {
    let state = load_state(path)?;
    print_summary(&compute_summary(&state));
    let violations = check_invariants(&state);
    if violations.is_empty() {
        println!("OK: all invariants hold.");
        return Ok(());
    }
    for violation in &violations {
        println!("  violation: {violation}");
    }
    bail!("{} invariant violations in {}", violations.len(), path.display())
}

fn generate(seed: Option<u64>, params: Option<&Path>, out: &Path) -> Result<()> {
    let params: SynthParams = match params {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading params file: {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("parsing params file: {}", path.display()))?
        }
        None => SynthParams::default(),
    };
    let seed = seed.unwrap_or_else(rand::random);
    let state = generate_seeded(&params, seed)?;
    write_dataset(&state, out)?;
    println!(
        "Generated seed={seed}: {} rotations, {} trips -> {}",
        state.rotations.len(),
        state.trips.len(),
        out.display()
    );
    Ok(())
}

fn print_summary(summary: &ScenarioSummary) {
    println!("{}", "-".repeat(80));
    println!(
        "[scenario={id} {name}]  rotations={rotations}  trips={trips} (empty={empty})  \
         vehicles={vehicles}  depots={depots}",
        id = summary.scenario_id,
        name = summary.scenario_name,
        rotations = summary.rotations,
        trips = summary.trips,
        empty = summary.empty_trips,
        vehicles = summary.vehicles,
        depots = summary.depots,
    );
    println!(
        "  distance={:.1} km  min_soc={:.3}  mean_final_soc={:.3}",
        summary.total_distance_km, summary.min_soc, summary.mean_final_soc
    );
    println!("{}", "-".repeat(80));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Prepare {
            data,
            config,
            planner,
            max_duration_hours,
            min_layover_minutes,
            out,
        } => prepare(
            &data,
            config.as_deref(),
            planner_kind(&planner),
            max_duration_hours,
            min_layover_minutes,
            &out,
        ),
        Commands::Verify { state } => verify(&state),
        Commands::Generate { seed, params, out } => generate(seed, params.as_deref(), &out),
    }
}
