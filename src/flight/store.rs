// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The flight entity store: the single owner of all tracked entities.

use std::collections::HashMap;

use crate::flight::entity::FlightEntity;

/// Id-keyed collection of tracked flights.
///
/// At most one entity exists per id; inserting an entity for an id that is
/// already tracked replaces it. All operations are synchronous and O(1)
/// amortized on the id.
#[derive(Debug, Default)]
pub struct FlightStore {
    flights: HashMap<String, FlightEntity>,
}

impl FlightStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entity for its id.
    pub fn insert(&mut self, flight: FlightEntity) {
        self.flights.insert(flight.id.clone(), flight);
    }

    #[allow(dead_code)]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FlightEntity> {
        self.flights.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut FlightEntity> {
        self.flights.get_mut(id)
    }

    #[allow(dead_code)]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.flights.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<FlightEntity> {
        self.flights.remove(id)
    }

    /// Keep only entities for which the predicate holds.
    pub fn retain(&mut self, mut keep: impl FnMut(&FlightEntity) -> bool) {
        self.flights.retain(|_, flight| keep(flight));
    }

    pub fn clear(&mut self) {
        self.flights.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlightEntity> {
        self.flights.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FlightEntity> {
        self.flights.values_mut()
    }

    /// Number of tracked flights.
    #[must_use]
    pub fn count(&self) -> usize {
        self.flights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    /// Mean altitude in feet across all tracked flights.
    #[must_use]
    pub fn average_altitude(&self) -> Option<f64> {
        if self.flights.is_empty() {
            return None;
        }
        let total: f64 = self.flights.values().map(|f| f.altitude).sum();
        Some(total / self.flights.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPos;

    fn flight(id: &str, altitude: f64) -> FlightEntity {
        FlightEntity::new(
            id.to_owned(),
            None,
            GeoPos::new(37.0, -122.5),
            GeoPos::new(37.0, -122.0),
            90.0,
            altitude,
            450.0,
        )
    }

    #[test]
    fn test_one_entity_per_id() {
        let mut store = FlightStore::new();
        store.insert(flight("abc123", 30000.0));
        store.insert(flight("abc123", 35000.0));

        assert_eq!(store.count(), 1);
        assert_eq!(store.get("abc123").unwrap().altitude, 35000.0);
    }

    #[test]
    fn test_remove_and_contains() {
        let mut store = FlightStore::new();
        store.insert(flight("abc123", 30000.0));
        assert!(store.contains("abc123"));

        store.remove("abc123");
        assert!(!store.contains("abc123"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_average_altitude() {
        let mut store = FlightStore::new();
        assert!(store.average_altitude().is_none());

        store.insert(flight("a", 30000.0));
        store.insert(flight("b", 40000.0));
        assert!((store.average_altitude().unwrap() - 35000.0).abs() < 1e-9);
    }

    #[test]
    fn test_retain() {
        let mut store = FlightStore::new();
        store.insert(flight("a", 10000.0));
        store.insert(flight("b", 40000.0));

        store.retain(|f| f.altitude > 20000.0);
        assert_eq!(store.count(), 1);
        assert!(store.contains("b"));
    }
}
