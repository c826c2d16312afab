use anyhow::{bail, Context, Result};
use fleet_control::PlannerKind;
use fleet_world::SynthParams;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A batch runs every variant against every input scenario: either one
/// dataset directory, or one synthetic timetable per seed.
#[derive(Debug, Deserialize)]
pub struct Batch {
    pub name: String,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub seeds: Option<SeedSpec>,
    #[serde(default)]
    pub synth: SynthParams,
    /// Pipeline config JSON; defaults apply when omitted.
    #[serde(default)]
    pub config: Option<String>,
    #[serde(default)]
    pub overrides: HashMap<String, serde_json::Value>,
    #[serde(default = "default_variants")]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub name_short: String,
    #[serde(default)]
    pub planner: PlannerKind,
    #[serde(default)]
    pub max_duration_hours: Option<f64>,
    #[serde(default)]
    pub min_layover_minutes: i64,
}

/// Depot charging, mixed, and terminal charging: the same timetable with
/// rotations planned three ways. Only the mixed variant caps rotation length.
fn default_variants() -> Vec<Variant> {
    let greedy = |name: &str, name_short: &str, max_duration_hours| Variant {
        name: name.to_string(),
        name_short: name_short.to_string(),
        planner: PlannerKind::Greedy,
        max_duration_hours,
        min_layover_minutes: 0,
    };
    vec![
        greedy("Depot Charging", "DC", None),
        greedy("Mixed Charging", "MIX", Some(5.0)),
        greedy("Terminal Charging", "TERM", None),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SeedSpec {
    List(Vec<u64>),
    Range { range: [u64; 2] },
}

impl SeedSpec {
    pub fn expand(&self) -> Vec<u64> {
        match self {
            SeedSpec::List(seeds) => seeds.clone(),
            SeedSpec::Range { range } => (range[0]..=range[1]).collect(),
        }
    }
}

pub fn load_batch(path: &Path) -> Result<Batch> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading batch file: {}", path.display()))?;
    let batch: Batch = serde_json::from_str(&json)
        .with_context(|| format!("parsing batch file: {}", path.display()))?;
    if batch.name.is_empty() {
        bail!("batch 'name' must not be empty");
    }
    match (&batch.dataset, &batch.seeds) {
        (Some(_), Some(_)) => bail!("batch takes either 'dataset' or 'seeds', not both"),
        (None, None) => bail!("batch needs a 'dataset' or 'seeds'"),
        (None, Some(seeds)) if seeds.expand().is_empty() => {
            bail!("batch 'seeds' must produce at least one seed")
        }
        _ => {}
    }
    if batch.variants.is_empty() {
        bail!("batch 'variants' must not be empty");
    }
    let mut names = HashSet::new();
    for variant in &batch.variants {
        if variant.name_short.is_empty() || !names.insert(variant.name_short.as_str()) {
            bail!(
                "variant short names must be unique and non-empty, got '{}'",
                variant.name_short
            );
        }
        if variant.max_duration_hours.is_some_and(|h| h <= 0.0) {
            bail!("variant '{}': 'max_duration_hours' must be > 0", variant.name_short);
        }
    }
    Ok(batch)
}
