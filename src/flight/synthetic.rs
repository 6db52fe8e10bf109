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

//! Synthetic traffic generation for when the live feed is unavailable.
//!
//! Generated flights route between the active region's airports and are
//! structurally indistinguishable from live ones: everything downstream of
//! the reconciler treats them identically. The RNG is held behind this
//! generator so a fixed seed reproduces the exact same traffic in tests.

use log::info;
use opensky_client::BoundingBox;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::flight::entity::FlightEntity;
use crate::flight::store::FlightStore;
use crate::flight::trail::{self, TrailSettings};
use crate::geo;
use crate::regions::RegionPreset;

/// Id prefix for generated flights.
pub const SYNTHETIC_ID_PREFIX: &str = "sim_";

const MIN_ALTITUDE_FT: f64 = 25_000.0;
const MAX_ALTITUDE_FT: f64 = 41_000.0;
const MIN_VELOCITY_KT: f64 = 350.0;
const MAX_VELOCITY_KT: f64 = 550.0;

/// How far along its heading a persistent flight's target drifts per pass.
const DRIFT_STEP_DEGREES: f64 = 0.05;

/// Fractional route position new flights spawn at.
const SPAWN_FRACTION_MIN: f64 = 0.05;
const SPAWN_FRACTION_MAX: f64 = 0.6;

/// Whether an id belongs to generated traffic.
#[allow(dead_code)]
#[must_use]
pub fn is_synthetic_id(id: &str) -> bool {
    id.starts_with(SYNTHETIC_ID_PREFIX)
}

/// Produces and maintains the fallback population.
#[derive(Debug)]
pub struct SyntheticGenerator {
    rng: StdRng,
}

impl SyntheticGenerator {
    /// `seed` fixes the RNG for reproducible traffic; `None` seeds from the
    /// operating system.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Bring the store's synthetic population up to `target` flights for a
    /// region. Ids persist across passes: an existing flight drifts a small
    /// step along its heading, and one that has left the visible bounds is
    /// re-seeded onto a fresh route.
    pub fn populate(
        &mut self,
        store: &mut FlightStore,
        region: &RegionPreset,
        bounds: &BoundingBox,
        target: usize,
        trail_settings: &TrailSettings,
    ) {
        let mut spawned = 0_usize;

        for index in 0..target {
            let id = format!("{SYNTHETIC_ID_PREFIX}{index}");

            if let Some(flight) = store.get_mut(&id) {
                if bounds.contains(flight.current.lat, flight.current.lon) {
                    // Keep it moving between passes: push the target ahead
                    // along the heading.
                    flight.target = geo::offset(flight.target, flight.heading, DRIFT_STEP_DEGREES);
                    continue;
                }
                store.remove(&id);
            }

            let mut flight = self.spawn(index, region);
            trail::preseed(&mut flight, trail_settings, chrono::Utc::now());
            store.insert(flight);
            spawned += 1;
        }

        if spawned > 0 {
            info!(
                "Generated {} synthetic flights for {} ({} total)",
                spawned,
                region.name,
                store.count()
            );
        }
    }

    /// Build one flight on a random route between two distinct airports.
    fn spawn(&mut self, index: usize, region: &RegionPreset) -> FlightEntity {
        let waypoints = region.waypoints;
        let origin_idx = self.rng.gen_range(0..waypoints.len());
        let mut dest_idx = self.rng.gen_range(0..waypoints.len() - 1);
        if dest_idx >= origin_idx {
            dest_idx += 1;
        }

        let origin_wp = waypoints[origin_idx];
        let dest_wp = waypoints[dest_idx];
        let origin = geo::GeoPos::new(origin_wp.lat, origin_wp.lon);
        let target = geo::GeoPos::new(dest_wp.lat, dest_wp.lon);

        let fraction = self.rng.gen_range(SPAWN_FRACTION_MIN..SPAWN_FRACTION_MAX);
        let current = geo::lerp(origin, target, fraction);
        let heading = geo::initial_bearing(current, target);

        let mut flight = FlightEntity::new(
            format!("{SYNTHETIC_ID_PREFIX}{index}"),
            Some(format!("SIM{}", 1000 + index)),
            origin,
            target,
            heading,
            self.rng.gen_range(MIN_ALTITUDE_FT..MAX_ALTITUDE_FT),
            self.rng.gen_range(MIN_VELOCITY_KT..MAX_VELOCITY_KT),
        );
        flight.progress = fraction;
        flight.current = current;
        flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions;

    fn no_preseed() -> TrailSettings {
        TrailSettings {
            policy: crate::flight::trail::TrailPolicy::EveryTick,
            max_points: 80,
            preseed: false,
            preseed_points: 0,
        }
    }

    fn california_bounds() -> BoundingBox {
        BoundingBox::new(30.0, 42.0, -126.0, -113.0)
    }

    #[test]
    fn test_population_reaches_exact_target() {
        let mut store = FlightStore::new();
        let mut gen = SyntheticGenerator::new(Some(42));
        gen.populate(
            &mut store,
            regions::default_region(),
            &california_bounds(),
            30,
            &no_preseed(),
        );
        assert_eq!(store.count(), 30);
    }

    #[test]
    fn test_generated_flights_are_airborne_and_in_range() {
        let mut store = FlightStore::new();
        let mut gen = SyntheticGenerator::new(Some(7));
        gen.populate(
            &mut store,
            regions::default_region(),
            &california_bounds(),
            30,
            &no_preseed(),
        );

        for flight in store.iter() {
            assert!(is_synthetic_id(&flight.id));
            assert!(flight.callsign.starts_with("SIM"));
            assert!(flight.altitude >= MIN_ALTITUDE_FT && flight.altitude < MAX_ALTITUDE_FT);
            assert!(flight.velocity >= MIN_VELOCITY_KT && flight.velocity < MAX_VELOCITY_KT);
            assert!((0.0..360.0).contains(&flight.heading));
            assert!(flight.origin != flight.target, "route needs two airports");
            assert!(flight.progress > 0.0 && flight.progress < 1.0);
        }
    }

    #[test]
    fn test_seed_is_deterministic() {
        let mut a = FlightStore::new();
        let mut b = FlightStore::new();
        SyntheticGenerator::new(Some(99)).populate(
            &mut a,
            regions::default_region(),
            &california_bounds(),
            10,
            &no_preseed(),
        );
        SyntheticGenerator::new(Some(99)).populate(
            &mut b,
            regions::default_region(),
            &california_bounds(),
            10,
            &no_preseed(),
        );

        for flight in a.iter() {
            let twin = b.get(&flight.id).unwrap();
            assert_eq!(flight.current, twin.current);
            assert_eq!(flight.target, twin.target);
            assert!((flight.altitude - twin.altitude).abs() < 1e-12);
        }
    }

    #[test]
    fn test_persistent_ids_drift_forward() {
        let mut store = FlightStore::new();
        let mut gen = SyntheticGenerator::new(Some(5));
        let bounds = california_bounds();
        let region = regions::default_region();

        gen.populate(&mut store, region, &bounds, 5, &no_preseed());
        let before = store.get("sim_0").unwrap().target;

        gen.populate(&mut store, region, &bounds, 5, &no_preseed());
        let after = store.get("sim_0").unwrap().target;

        assert_ne!(before, after);
        assert_eq!(store.count(), 5);
    }

    #[test]
    fn test_out_of_bounds_flight_reseeded() {
        let mut store = FlightStore::new();
        let mut gen = SyntheticGenerator::new(Some(11));
        let bounds = california_bounds();
        let region = regions::default_region();

        gen.populate(&mut store, region, &bounds, 5, &no_preseed());
        store.get_mut("sim_0").unwrap().current = geo::GeoPos::new(0.0, 0.0);

        gen.populate(&mut store, region, &bounds, 5, &no_preseed());
        let reseeded = store.get("sim_0").unwrap();
        assert!(bounds.contains(reseeded.current.lat, reseeded.current.lon));
    }

    #[test]
    fn test_is_synthetic_id() {
        assert!(is_synthetic_id("sim_12"));
        assert!(!is_synthetic_id("abc123"));
    }
}
