use anyhow::{bail, Result};
use fleet_core::config::ReferenceVehicleType;
use fleet_core::PipelineConfig;
use std::collections::HashMap;

const VALID_KEYS: &[&str] = &[
    "terminal_name",
    "depot_name_short",
    "deadhead_distance_m",
    "deadhead_break_minutes",
    "deadhead_duration_minutes",
    "waiting_area_capacity",
    "charging_area_capacity",
    "charging_power_kw",
    "reference_vehicle_type",
];

pub fn apply_overrides(
    config: &mut PipelineConfig,
    overrides: &HashMap<String, serde_json::Value>,
) -> Result<()> {
    for (key, value) in overrides {
        match key.as_str() {
            "terminal_name" => config.anchor.terminal_name = as_string(key, value)?,
            "depot_name_short" => config.anchor.depot_name_short = as_string(key, value)?,
            "deadhead_distance_m" => config.anchor.deadhead_distance_m = as_f64(key, value)?,
            "deadhead_break_minutes" => config.deadhead.break_minutes = as_minutes(key, value)?,
            "deadhead_duration_minutes" => {
                config.deadhead.duration_minutes = as_minutes(key, value)?;
            }
            "waiting_area_capacity" => {
                config.depot_layout.waiting_area_capacity = as_u32(key, value)?;
            }
            "charging_area_capacity" => {
                config.depot_layout.charging_area_capacity = as_u32(key, value)?;
            }
            "charging_power_kw" => config.depot_layout.charging_power_kw = as_f64(key, value)?,
            "reference_vehicle_type" => {
                config.reference_vehicle_type = ReferenceVehicleType(as_string(key, value)?);
            }
            _ => bail!(
                "unknown override key '{key}'. Valid keys: {}",
                VALID_KEYS.join(", ")
            ),
        }
    }
    Ok(())
}

fn as_f64(key: &str, value: &serde_json::Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| anyhow::anyhow!("override '{key}': expected a number, got {value}"))
}

fn as_minutes(key: &str, value: &serde_json::Value) -> Result<i64> {
    value
        .as_i64()
        .filter(|m| *m >= 0)
        .ok_or_else(|| anyhow::anyhow!("override '{key}': expected whole minutes, got {value}"))
}

fn as_u32(key: &str, value: &serde_json::Value) -> Result<u32> {
    let val = value.as_u64().ok_or_else(|| {
        anyhow::anyhow!("override '{key}': expected a positive integer, got {value}")
    })?;
    u32::try_from(val)
        .map_err(|_| anyhow::anyhow!("override '{key}': value {val} exceeds u32 range"))
}

fn as_string(key: &str, value: &serde_json::Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("override '{key}': expected a string, got {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_f64_override() {
        let mut config = PipelineConfig::default();
        let overrides = HashMap::from([(
            "charging_power_kw".to_string(),
            serde_json::json!(150.0),
        )]);
        apply_overrides(&mut config, &overrides).unwrap();
        assert!((config.depot_layout.charging_power_kw - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_apply_minutes_override() {
        let mut config = PipelineConfig::default();
        let overrides =
            HashMap::from([("deadhead_break_minutes".to_string(), serde_json::json!(12))]);
        apply_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.deadhead.break_minutes, 12);
    }

    #[test]
    fn test_apply_string_override() {
        let mut config = PipelineConfig::default();
        let overrides = HashMap::from([(
            "reference_vehicle_type".to_string(),
            serde_json::json!("ArticulatedBus"),
        )]);
        apply_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.reference_vehicle_type.0, "ArticulatedBus");
    }

    #[test]
    fn test_unknown_key_errors() {
        let mut config = PipelineConfig::default();
        let overrides = HashMap::from([("nonexistent_field".to_string(), serde_json::json!(1.0))]);
        let err = apply_overrides(&mut config, &overrides)
            .unwrap_err()
            .to_string();
        assert!(err.contains("unknown override key"));
        assert!(err.contains("nonexistent_field"));
    }

    #[test]
    fn test_type_mismatch_errors() {
        let mut config = PipelineConfig::default();
        let overrides = HashMap::from([(
            "waiting_area_capacity".to_string(),
            serde_json::json!("lots"),
        )]);
        assert!(apply_overrides(&mut config, &overrides).is_err());
    }

    #[test]
    fn test_negative_minutes_error() {
        let mut config = PipelineConfig::default();
        let overrides =
            HashMap::from([("deadhead_duration_minutes".to_string(), serde_json::json!(-3))]);
        assert!(apply_overrides(&mut config, &overrides).is_err());
    }
}
