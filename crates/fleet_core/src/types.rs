//! Type definitions for `fleet_core`.
//!
//! Row types for every table of one scenario partition, the id newtypes that
//! key them, and the `ScenarioState` that owns them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Timestamp = DateTime<Utc>;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! row_id {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

row_id!(StationId, "station");
row_id!(RouteId, "route");
row_id!(TripId, "trip");
row_id!(RotationId, "rotation");
row_id!(VehicleTypeId, "vehicle_type");
row_id!(VehicleId, "vehicle");
row_id!(StopTimeId, "stop_time");
row_id!(EventId, "event");
row_id!(DepotId, "depot");

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationKind {
    #[default]
    Stop,
    Depot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripKind {
    Revenue,
    /// Deadhead movement without passengers.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Driving,
    ChargingDepot,
    ChargingOpportunity,
    Standby,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaKind {
    DirectOneside,
    DirectTwoside,
    Line,
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    /// Unique within a scenario when present.
    #[serde(default)]
    pub name_short: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub kind: StationKind,
    #[serde(default)]
    pub is_electrified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    #[serde(default)]
    pub name_short: Option<String>,
    pub departure_station: StationId,
    pub arrival_station: StationId,
    pub distance_m: f64,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub rotation: RotationId,
    pub route: RouteId,
    pub departure_time: Timestamp,
    pub arrival_time: Timestamp,
    pub kind: TripKind,
    #[serde(default)]
    pub loaded_mass_kg: Option<f64>,
}

/// Ordered chain of trips worked by one vehicle in one duty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rotation {
    pub id: RotationId,
    #[serde(default)]
    pub name: Option<String>,
    pub vehicle_type: VehicleTypeId,
    #[serde(default)]
    pub vehicle: Option<VehicleId>,
    /// Stored order must equal chronological order.
    pub trips: Vec<TripId>,
    #[serde(default = "default_true")]
    pub allow_opportunity_charging: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopTime {
    pub id: StopTimeId,
    pub trip: TripId,
    pub station: StationId,
    pub arrival_time: Timestamp,
}

// ---------------------------------------------------------------------------
// Fleet & energy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleType {
    pub id: VehicleTypeId,
    pub name: String,
    pub battery_capacity_kwh: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub name_short: String,
    pub vehicle_type: VehicleTypeId,
}

/// SOC values are fractions of battery capacity in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub kind: EventKind,
    #[serde(default)]
    pub trip: Option<TripId>,
    #[serde(default)]
    pub vehicle: Option<VehicleId>,
    pub vehicle_type: VehicleTypeId,
    pub time_start: Timestamp,
    pub time_end: Timestamp,
    pub soc_start: f64,
    pub soc_end: f64,
}

impl Event {
    pub fn is_driving(&self) -> bool {
        self.kind == EventKind::Driving
    }

    /// Fraction of capacity consumed. Negative when the battery gained charge.
    pub fn soc_delta(&self) -> f64 {
        self.soc_start - self.soc_end
    }
}

// ---------------------------------------------------------------------------
// Depot topology
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
    pub kind: AreaKind,
    /// `None` accepts every vehicle type.
    pub vehicle_type: Option<VehicleTypeId>,
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub name: String,
    pub dispatchable: bool,
    pub electric_power_kw: Option<f64>,
    /// Indices into the owning depot's `areas`.
    pub areas: Vec<usize>,
}

/// Processes run in list order; the index is the ordinal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub processes: Vec<Process>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Depot {
    pub id: DepotId,
    pub name: String,
    pub station: StationId,
    pub areas: Vec<Area>,
    pub default_plan: Plan,
}

// ---------------------------------------------------------------------------
// Scenario partition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub name_short: Option<String>,
}

/// Next free row id per table. Re-derived from the tables after loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub next_station_id: u64,
    pub next_route_id: u64,
    pub next_trip_id: u64,
    pub next_rotation_id: u64,
    pub next_vehicle_type_id: u64,
    pub next_vehicle_id: u64,
    pub next_stop_time_id: u64,
    pub next_event_id: u64,
    pub next_depot_id: u64,
}

/// Every row of one scenario. Tables are ordered by id so that every pass
/// over them is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioState {
    pub meta: ScenarioMeta,
    #[serde(default)]
    pub stations: BTreeMap<StationId, Station>,
    #[serde(default)]
    pub routes: BTreeMap<RouteId, Route>,
    #[serde(default)]
    pub vehicle_types: BTreeMap<VehicleTypeId, VehicleType>,
    #[serde(default)]
    pub vehicles: BTreeMap<VehicleId, Vehicle>,
    #[serde(default)]
    pub rotations: BTreeMap<RotationId, Rotation>,
    #[serde(default)]
    pub trips: BTreeMap<TripId, Trip>,
    #[serde(default)]
    pub stop_times: BTreeMap<StopTimeId, StopTime>,
    #[serde(default)]
    pub events: BTreeMap<EventId, Event>,
    #[serde(default)]
    pub depots: BTreeMap<DepotId, Depot>,
    #[serde(default)]
    pub counters: Counters,
}
