//! Pipeline configuration.
//!
//! Every field defaults to the constants of the Kyoto depot study, so an empty
//! JSON object is a valid config.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::GeoPoint;

pub const DEFAULT_DEPOT_SHORT_NAME: &str = "DEP";
pub const INBOUND_ROUTE_SHORT_NAME: &str = "DEP_TERM";
pub const OUTBOUND_ROUTE_SHORT_NAME: &str = "TERM_DEP";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub anchor: AnchorConfig,
    pub deadhead: DeadheadConfig,
    pub depot_layout: DepotLayoutConfig,
    pub reference_vehicle_type: ReferenceVehicleType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    pub depot_name: String,
    /// Reserved short name; its presence marks a scenario as already processed.
    pub depot_name_short: String,
    pub depot_location: GeoPoint,
    /// Looked up by exact station name.
    pub terminal_name: String,
    pub deadhead_distance_m: f64,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            depot_name: "九条車庫前".to_string(),
            depot_name_short: DEFAULT_DEPOT_SHORT_NAME.to_string(),
            depot_location: GeoPoint {
                lat: 34.979_008_364_297_51,
                lon: 135.756_130_272_476_84,
            },
            terminal_name: "北大路バスターミナル（地下鉄北大路駅）".to_string(),
            deadhead_distance_m: 3100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadheadConfig {
    /// Gap between a deadhead trip and the revenue trip it connects to.
    pub break_minutes: i64,
    pub duration_minutes: i64,
}

impl Default for DeadheadConfig {
    fn default() -> Self {
        Self {
            break_minutes: 5,
            duration_minutes: 6,
        }
    }
}

impl DeadheadConfig {
    pub fn break_duration(&self) -> TimeDelta {
        TimeDelta::minutes(self.break_minutes)
    }

    pub fn trip_duration(&self) -> TimeDelta {
        TimeDelta::minutes(self.duration_minutes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepotLayoutConfig {
    pub depot_name: String,
    pub waiting_area_capacity: u32,
    pub charging_area_capacity: u32,
    pub charging_power_kw: f64,
}

impl Default for DepotLayoutConfig {
    fn default() -> Self {
        Self {
            depot_name: "Depot at Kyūjō Shako-mae".to_string(),
            waiting_area_capacity: 10,
            charging_area_capacity: 10,
            charging_power_kw: 50.0,
        }
    }
}

/// Name of the vehicle type every generated vehicle is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceVehicleType(pub String);

impl Default for ReferenceVehicleType {
    fn default() -> Self {
        Self("ElectricBus".to_string())
    }
}

impl std::fmt::Display for ReferenceVehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
