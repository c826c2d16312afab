use fleet_core::ScenarioSummary;
use serde::Serialize;
use std::path::Path;

pub const RUN_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct RunResult {
    pub run_schema_version: u32,
    pub run_status: RunStatus,
    pub run_id: String,
    pub git_sha: String,
    pub git_dirty: bool,
    pub batch_name: String,
    pub batch_params: serde_json::Value,
    pub variant: String,
    pub seed: Option<u64>,
    pub wall_time_ms: u64,
    pub summary: Option<ScenarioSummary>,
    pub kwh_per_km: Option<f64>,
    pub rotations_pruned: usize,
    pub trips_pruned: usize,
    pub invariant_violations: usize,
    pub state_path: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// The pipeline rejected the scenario; nothing was written for it.
    Failed,
}

impl RunResult {
    /// Write JSON atomically: write to `.tmp` then rename.
    pub fn write_atomic(&self, path: &Path) -> anyhow::Result<()> {
        fleet_world::write_json(path, self)
    }
}

pub fn git_sha() -> String {
    env!("GIT_SHA").to_string()
}

pub fn git_dirty() -> bool {
    env!("GIT_DIRTY") == "true"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(summary: Option<ScenarioSummary>) -> RunResult {
        RunResult {
            run_schema_version: RUN_SCHEMA_VERSION,
            run_status: RunStatus::Completed,
            run_id: "test-uuid".to_string(),
            git_sha: "abc123".to_string(),
            git_dirty: false,
            batch_name: "test_batch".to_string(),
            batch_params: serde_json::json!({"seeds": [42]}),
            variant: "DC".to_string(),
            seed: Some(42),
            wall_time_ms: 12,
            summary,
            kwh_per_km: Some(1.25),
            rotations_pruned: 1,
            trips_pruned: 3,
            invariant_violations: 0,
            state_path: Some("state.json".to_string()),
            error_message: None,
        }
    }

    #[test]
    fn test_run_result_serialization() {
        let summary = ScenarioSummary {
            rotations: 12,
            min_soc: 0.41,
            ..ScenarioSummary::default()
        };
        let json = serde_json::to_string_pretty(&sample_result(Some(summary))).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["run_schema_version"], 1);
        assert_eq!(parsed["run_status"], "completed");
        assert_eq!(parsed["seed"], 42);
        assert_eq!(parsed["summary"]["rotations"], 12);
    }

    #[test]
    fn test_atomic_write() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("run_result.json");
        sample_result(None).write_atomic(&path).unwrap();
        assert!(path.exists());
        // Tmp file should not remain
        assert!(!path.with_extension("json.tmp").exists());

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(parsed["summary"].is_null());
    }

    #[test]
    fn test_git_sha_not_empty() {
        // Build-time env vars should be set
        assert!(!git_sha().is_empty());
    }
}
