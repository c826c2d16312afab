use crate::run_result::RunStatus;
use crate::runner::RunOutcome;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use fleet_core::ScenarioSummary;
use serde::Serialize;
use std::path::Path;

type Extractor = (&'static str, Box<dyn Fn(&RunOutcome, &ScenarioSummary) -> f64>);

#[derive(Debug, Serialize)]
pub struct VariantStats {
    pub variant: String,
    pub run_count: usize,
    pub failed_count: usize,
    pub metrics: Vec<MetricSummary>,
}

#[derive(Debug, Serialize)]
pub struct MetricSummary {
    pub name: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}

fn extractors() -> Vec<Extractor> {
    vec![
        ("rotations", Box::new(|_, s| f64::from(s.rotations))),
        ("vehicles", Box::new(|_, s| f64::from(s.vehicles))),
        ("empty_trips", Box::new(|_, s| f64::from(s.empty_trips))),
        ("total_distance_km", Box::new(|_, s| s.total_distance_km)),
        ("min_soc", Box::new(|_, s| s.min_soc)),
        ("mean_final_soc", Box::new(|_, s| s.mean_final_soc)),
        (
            "kwh_per_km",
            Box::new(|r, _| r.kwh_per_km.unwrap_or_default()),
        ),
        (
            "rotations_pruned",
            Box::new(|r, _| r.rotations_pruned as f64),
        ),
        ("trips_pruned", Box::new(|r, _| r.trips_pruned as f64)),
    ]
}

/// One `VariantStats` per variant, in first-seen order. Failed runs are
/// counted but contribute no metric values.
pub fn compute_variant_stats(outcomes: &[RunOutcome]) -> Vec<VariantStats> {
    let mut variants: Vec<&str> = Vec::new();
    for outcome in outcomes {
        if !variants.contains(&outcome.variant.as_str()) {
            variants.push(&outcome.variant);
        }
    }
    let extractors = extractors();

    variants
        .into_iter()
        .map(|variant| {
            let runs: Vec<&RunOutcome> = outcomes.iter().filter(|o| o.variant == variant).collect();
            let completed: Vec<(&RunOutcome, &ScenarioSummary)> = runs
                .iter()
                .filter_map(|&o| Some((o, o.summary.as_ref()?)))
                .collect();
            let metrics = if completed.is_empty() {
                Vec::new()
            } else {
                extractors
                    .iter()
                    .map(|(name, extract)| {
                        let values: Vec<f64> =
                            completed.iter().map(|&(o, s)| extract(o, s)).collect();
                        compute_metric_summary(name, &values)
                    })
                    .collect()
            };
            VariantStats {
                variant: variant.to_string(),
                run_count: runs.len(),
                failed_count: runs.iter().filter(|o| o.status == RunStatus::Failed).count(),
                metrics,
            }
        })
        .collect()
}

fn compute_metric_summary(name: &str, values: &[f64]) -> MetricSummary {
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

    MetricSummary {
        name: name.to_string(),
        mean,
        min,
        max,
        stddev: variance.sqrt(),
    }
}

pub fn print_summary(batch_name: &str, stats: &[VariantStats]) {
    for variant in stats {
        println!(
            "\n=== {} / {} ({} runs, {} failed) ===\n",
            batch_name, variant.variant, variant.run_count, variant.failed_count
        );
        if variant.metrics.is_empty() {
            println!("no completed runs");
            continue;
        }
        println!(
            "{:<20} {:>10} {:>10} {:>10} {:>10}",
            "Metric", "Mean", "Min", "Max", "StdDev"
        );
        println!("{}", "-".repeat(64));
        for metric in &variant.metrics {
            println!(
                "{:<20} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
                metric.name, metric.mean, metric.min, metric.max, metric.stddev
            );
        }
    }
}

/// Flat per-run row for `summary.csv`.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    run_id: &'a str,
    variant: &'a str,
    seed: Option<u64>,
    status: RunStatus,
    rotations: Option<u32>,
    trips: Option<u32>,
    empty_trips: Option<u32>,
    vehicles: Option<u32>,
    total_distance_km: Option<f64>,
    min_soc: Option<f64>,
    mean_final_soc: Option<f64>,
    kwh_per_km: Option<f64>,
    rotations_pruned: usize,
    trips_pruned: usize,
    wall_time_ms: u64,
}

impl<'a> From<&'a RunOutcome> for CsvRow<'a> {
    fn from(o: &'a RunOutcome) -> Self {
        let s = o.summary.as_ref();
        CsvRow {
            run_id: &o.run_id,
            variant: &o.variant,
            seed: o.seed,
            status: o.status,
            rotations: s.map(|s| s.rotations),
            trips: s.map(|s| s.trips),
            empty_trips: s.map(|s| s.empty_trips),
            vehicles: s.map(|s| s.vehicles),
            total_distance_km: s.map(|s| s.total_distance_km),
            min_soc: s.map(|s| s.min_soc),
            mean_final_soc: s.map(|s| s.mean_final_soc),
            kwh_per_km: o.kwh_per_km,
            rotations_pruned: o.rotations_pruned,
            trips_pruned: o.trips_pruned,
            wall_time_ms: o.wall_time_ms,
        }
    }
}

/// Writes one row per run, failed runs included.
pub fn write_csv(path: &Path, outcomes: &[RunOutcome]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for outcome in outcomes {
        writer.serialize(CsvRow::from(outcome))?;
    }
    writer.flush()?;
    Ok(())
}
