use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fleet_core::{PipelineConfig, ScenarioState};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod batch;
mod overrides;
mod run_result;
mod runner;
mod summary;

use run_result::RunStatus;
use runner::{RunContext, RunOutcome};

#[derive(Parser)]
#[command(
    name = "fleet_bench",
    about = "Runs rotation-planning variants across datasets and seeds"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every variant of a batch file against each of its inputs.
    Run {
        /// Path to the batch JSON file.
        #[arg(long)]
        batch: PathBuf,
        /// Output directory (default: runs/).
        #[arg(long, default_value = "runs")]
        output_dir: PathBuf,
    },
}

/// Input scenarios keyed by seed; a dataset batch has a single unseeded input.
fn load_inputs(batch: &batch::Batch) -> Result<Vec<(Option<u64>, ScenarioState)>> {
    if let Some(dataset) = &batch.dataset {
        let state = fleet_world::load_dataset(Path::new(dataset))?;
        return Ok(vec![(None, state)]);
    }
    let seeds = batch.seeds.as_ref().map(batch::SeedSpec::expand).unwrap_or_default();
    seeds
        .into_iter()
        .map(|seed| Ok((Some(seed), fleet_world::generate_seeded(&batch.synth, seed)?)))
        .collect()
}

fn load_batch_config(batch: &batch::Batch) -> Result<PipelineConfig> {
    let mut config = match &batch.config {
        Some(path) => fleet_world::load_config(Path::new(path))?,
        None => PipelineConfig::default(),
    };
    overrides::apply_overrides(&mut config, &batch.overrides)?;
    Ok(config)
}

fn input_dir_name(seed: Option<u64>) -> String {
    seed.map_or_else(|| "dataset".to_string(), |seed| format!("seed_{seed}"))
}

fn run(batch_path: &Path, output_dir: &Path) -> Result<()> {
    let batch = batch::load_batch(batch_path)?;
    let config = load_batch_config(&batch)?;
    let inputs = load_inputs(&batch)?;

    println!(
        "Loading batch '{}': {} inputs × {} variants",
        batch.name,
        inputs.len(),
        batch.variants.len()
    );

    let batch_params = serde_json::json!({
        "dataset": batch.dataset,
        "seeds": inputs.iter().filter_map(|(seed, _)| *seed).collect::<Vec<_>>(),
        "synth": batch.synth,
        "config": batch.config,
        "overrides": batch.overrides,
        "variants": batch.variants,
    });

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_dir = output_dir.join(format!("{}_{}", batch.name, timestamp));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating output directory: {}", run_dir.display()))?;
    std::fs::copy(batch_path, run_dir.join("batch.json")).context("copying batch file")?;
    fleet_world::write_json(&run_dir.join("config.json"), &config)?;

    println!("Output: {}", run_dir.display());

    let ctx = RunContext {
        batch_name: &batch.name,
        batch_params: &batch_params,
        config: &config,
    };
    let jobs: Vec<(&batch::Variant, Option<u64>, &ScenarioState)> = inputs
        .iter()
        .flat_map(|(seed, state)| batch.variants.iter().map(move |v| (v, *seed, state)))
        .collect();

    println!("Running {} runs in parallel...", jobs.len());
    let results: Vec<Result<RunOutcome>> = jobs
        .par_iter()
        .map(|&(variant, seed, state)| {
            let dir = run_dir.join(input_dir_name(seed)).join(&variant.name_short);
            runner::run_variant(&ctx, state, variant, seed, &dir)
        })
        .collect();

    let mut outcomes = Vec::new();
    for result in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => eprintln!("Run failed: {err:#}"),
        }
    }
    if !outcomes.iter().any(|o| o.status == RunStatus::Completed) {
        bail!("all runs failed");
    }

    let stats = summary::compute_variant_stats(&outcomes);
    summary::print_summary(&batch.name, &stats);

    let csv_path = run_dir.join("summary.csv");
    summary::write_csv(&csv_path, &outcomes)?;

    let batch_summary = serde_json::json!({
        "batch_schema_version": 1,
        "batch_id": Uuid::new_v4().to_string(),
        "batch_name": batch.name,
        "batch_params": batch_params,
        "run_count": outcomes.len(),
        "failed_count": outcomes.iter().filter(|o| o.status == RunStatus::Failed).count(),
        "run_ids": outcomes.iter().map(|o| o.run_id.as_str()).collect::<Vec<_>>(),
        "variants": stats,
    });
    let batch_path = run_dir.join("batch_summary.json");
    fleet_world::write_json(&batch_path, &batch_summary)?;

    println!("Per-run table written to {}", csv_path.display());
    println!("Batch summary written to {}", batch_path.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { batch, output_dir } => run(&batch, &output_dir)?,
    }
    Ok(())
}
