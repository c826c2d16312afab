//! Lookups, indexes, and row-id allocation on `ScenarioState`.

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::{
    Counters, DepotId, EventId, RotationId, RouteId, ScenarioMeta, ScenarioState, Station,
    StationId, StopTimeId, TripId, VehicleId, VehicleType, VehicleTypeId,
};

/// Trip → event ids. Most trips carry at most one event.
pub type EventIndex = AHashMap<TripId, SmallVec<[EventId; 1]>>;

fn bump(counter: &mut u64) -> u64 {
    let id = *counter;
    *counter += 1;
    id
}

fn next_after<K: Copy>(keys: impl Iterator<Item = K>, raw: impl Fn(K) -> u64) -> u64 {
    keys.map(|k| raw(k) + 1).max().unwrap_or(0)
}

impl ScenarioState {
    pub fn new(meta: ScenarioMeta) -> Self {
        Self {
            meta,
            stations: std::collections::BTreeMap::new(),
            routes: std::collections::BTreeMap::new(),
            vehicle_types: std::collections::BTreeMap::new(),
            vehicles: std::collections::BTreeMap::new(),
            rotations: std::collections::BTreeMap::new(),
            trips: std::collections::BTreeMap::new(),
            stop_times: std::collections::BTreeMap::new(),
            events: std::collections::BTreeMap::new(),
            depots: std::collections::BTreeMap::new(),
            counters: Counters::default(),
        }
    }

    /// Raises every counter past the largest id in its table. Needed after
    /// deserializing rows that were written without counters.
    pub fn resync_counters(&mut self) {
        let c = &mut self.counters;
        c.next_station_id = c
            .next_station_id
            .max(next_after(self.stations.keys().copied(), |k| k.0));
        c.next_route_id = c
            .next_route_id
            .max(next_after(self.routes.keys().copied(), |k| k.0));
        c.next_trip_id = c
            .next_trip_id
            .max(next_after(self.trips.keys().copied(), |k| k.0));
        c.next_rotation_id = c
            .next_rotation_id
            .max(next_after(self.rotations.keys().copied(), |k| k.0));
        c.next_vehicle_type_id = c
            .next_vehicle_type_id
            .max(next_after(self.vehicle_types.keys().copied(), |k| k.0));
        c.next_vehicle_id = c
            .next_vehicle_id
            .max(next_after(self.vehicles.keys().copied(), |k| k.0));
        c.next_stop_time_id = c
            .next_stop_time_id
            .max(next_after(self.stop_times.keys().copied(), |k| k.0));
        c.next_event_id = c
            .next_event_id
            .max(next_after(self.events.keys().copied(), |k| k.0));
        c.next_depot_id = c
            .next_depot_id
            .max(next_after(self.depots.keys().copied(), |k| k.0));
    }

    // --- id allocation -----------------------------------------------------

    pub fn alloc_station_id(&mut self) -> StationId {
        StationId(bump(&mut self.counters.next_station_id))
    }

    pub fn alloc_route_id(&mut self) -> RouteId {
        RouteId(bump(&mut self.counters.next_route_id))
    }

    pub fn alloc_trip_id(&mut self) -> TripId {
        TripId(bump(&mut self.counters.next_trip_id))
    }

    pub fn alloc_rotation_id(&mut self) -> RotationId {
        RotationId(bump(&mut self.counters.next_rotation_id))
    }

    pub fn alloc_vehicle_type_id(&mut self) -> VehicleTypeId {
        VehicleTypeId(bump(&mut self.counters.next_vehicle_type_id))
    }

    pub fn alloc_vehicle_id(&mut self) -> VehicleId {
        VehicleId(bump(&mut self.counters.next_vehicle_id))
    }

    pub fn alloc_stop_time_id(&mut self) -> StopTimeId {
        StopTimeId(bump(&mut self.counters.next_stop_time_id))
    }

    pub fn alloc_event_id(&mut self) -> EventId {
        EventId(bump(&mut self.counters.next_event_id))
    }

    pub fn alloc_depot_id(&mut self) -> DepotId {
        DepotId(bump(&mut self.counters.next_depot_id))
    }

    // --- lookups -----------------------------------------------------------

    pub fn station_by_name(&self, name: &str) -> Option<&Station> {
        self.stations.values().find(|s| s.name == name)
    }

    pub fn station_by_short_name(&self, name_short: &str) -> Option<&Station> {
        self.stations
            .values()
            .find(|s| s.name_short.as_deref() == Some(name_short))
    }

    pub fn vehicle_type_by_name(&self, name: &str) -> Option<&VehicleType> {
        self.vehicle_types.values().find(|vt| vt.name == name)
    }

    /// `(departure, arrival)` stations of a trip, resolved through its route.
    pub fn trip_endpoints(&self, trip: TripId) -> Option<(StationId, StationId)> {
        let route = self.routes.get(&self.trips.get(&trip)?.route)?;
        Some((route.departure_station, route.arrival_station))
    }

    pub fn trip_distance_m(&self, trip: TripId) -> Option<f64> {
        let route = self.routes.get(&self.trips.get(&trip)?.route)?;
        Some(route.distance_m)
    }

    // --- indexes -----------------------------------------------------------

    /// Every event bound to a trip, regardless of kind.
    pub fn events_by_trip(&self) -> EventIndex {
        let mut index = EventIndex::new();
        for event in self.events.values() {
            if let Some(trip) = event.trip {
                index.entry(trip).or_default().push(event.id);
            }
        }
        index
    }

    pub fn driving_events_by_trip(&self) -> EventIndex {
        let mut index = EventIndex::new();
        for event in self.events.values().filter(|e| e.is_driving()) {
            if let Some(trip) = event.trip {
                index.entry(trip).or_default().push(event.id);
            }
        }
        index
    }

    pub fn stop_times_by_trip(&self) -> AHashMap<TripId, Vec<StopTimeId>> {
        let mut index: AHashMap<TripId, Vec<StopTimeId>> = AHashMap::new();
        for stop_time in self.stop_times.values() {
            index.entry(stop_time.trip).or_default().push(stop_time.id);
        }
        index
    }
}
