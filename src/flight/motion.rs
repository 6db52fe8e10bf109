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

//! Per-tick motion interpolation.
//!
//! Every animation tick advances each flight's interpolation progress and
//! recomputes its displayed position, independent of how often telemetry
//! arrives. The two operating modes differ in what happens when progress
//! saturates; they are process-wide and never mixed per entity.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::flight::store::FlightStore;
use crate::geo;

/// Progress gained per tick at 1x speed.
pub const BASE_PROGRESS_PER_TICK: f64 = 0.002;

/// Nominal frame interval driving the extrapolation step.
const TICK_SECONDS: f64 = 1.0 / 60.0;

/// One knot is one nautical mile per hour; one degree is ~60 nautical miles.
const KNOTS_TO_DEG_PER_SEC: f64 = 1.0 / (60.0 * 3600.0);

/// How a flight behaves once it has fully interpolated to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationMode {
    /// Reaching the target means arrival; the flight is retired.
    PointToPoint,
    /// Flights live until reconciliation stops reporting them; a saturated
    /// flight coasts along its heading at its reported speed until fresh
    /// telemetry re-bases the interpolation.
    Continuous,
}

/// Advance every flight one tick. Returns the number of arrivals retired
/// (always zero in continuous mode).
pub fn advance(store: &mut FlightStore, mode: AnimationMode, speed_multiplier: u32) -> usize {
    let step = BASE_PROGRESS_PER_TICK * f64::from(speed_multiplier);

    for flight in store.iter_mut() {
        flight.progress = (flight.progress + step).min(1.0);
        flight.current = geo::lerp(flight.origin, flight.target, flight.progress);

        if mode == AnimationMode::Continuous && flight.arrived() {
            // Coast past the last fix. Keeping the target under the displayed
            // point means the saturated lerp stays consistent next tick.
            let coast = flight.velocity
                * KNOTS_TO_DEG_PER_SEC
                * TICK_SECONDS
                * f64::from(speed_multiplier);
            let next = geo::offset(flight.current, flight.heading, coast);
            flight.current = next;
            flight.target = next;
        }
    }

    if mode == AnimationMode::PointToPoint {
        let before = store.count();
        store.retain(|flight| !flight.arrived());
        let retired = before - store.count();
        if retired > 0 {
            debug!("Retired {} arrived flights", retired);
        }
        retired
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::entity::FlightEntity;
    use crate::geo::GeoPos;

    fn store_with_flight() -> FlightStore {
        let mut store = FlightStore::new();
        store.insert(FlightEntity::new(
            "abc123".to_owned(),
            None,
            GeoPos::new(37.0, -123.0),
            GeoPos::new(37.0, -122.0),
            90.0,
            32000.0,
            480.0,
        ));
        store
    }

    #[test]
    fn test_progress_monotonic_and_clamped() {
        let mut store = store_with_flight();
        let mut last = 0.0;

        for _ in 0..600 {
            advance(&mut store, AnimationMode::Continuous, 1);
            let p = store.get("abc123").unwrap().progress;
            assert!(p >= last);
            assert!(p <= 1.0);
            last = p;
        }
        assert!((last - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_speed_multiplier_scales_step() {
        let mut slow = store_with_flight();
        let mut fast = store_with_flight();

        advance(&mut slow, AnimationMode::Continuous, 1);
        advance(&mut fast, AnimationMode::Continuous, 10);

        let p1 = slow.get("abc123").unwrap().progress;
        let p10 = fast.get("abc123").unwrap().progress;
        assert!((p10 - p1 * 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_position_interpolates_toward_target() {
        let mut store = store_with_flight();
        advance(&mut store, AnimationMode::Continuous, 5);

        let flight = store.get("abc123").unwrap();
        // 0.002 * 5 = 0.01 of the one-degree span.
        assert!((flight.current.lon - (-123.0 + 0.01)).abs() < 1e-9);
        assert!((flight.current.lat - 37.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_to_point_retires_arrivals() {
        let mut store = store_with_flight();
        store.get_mut("abc123").unwrap().progress = 0.999;

        let retired = advance(&mut store, AnimationMode::PointToPoint, 1);
        assert_eq!(retired, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_continuous_never_retires_by_progress() {
        let mut store = store_with_flight();
        store.get_mut("abc123").unwrap().progress = 1.0;

        for _ in 0..10 {
            assert_eq!(advance(&mut store, AnimationMode::Continuous, 10), 0);
        }
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_continuous_coasts_along_heading_after_saturation() {
        let mut store = store_with_flight();
        store.get_mut("abc123").unwrap().progress = 1.0;
        let start_lon = store.get("abc123").unwrap().target.lon;

        for _ in 0..100 {
            advance(&mut store, AnimationMode::Continuous, 10);
        }

        let flight = store.get("abc123").unwrap();
        // Heading 90: eastward drift, latitude held.
        assert!(flight.current.lon > start_lon);
        assert!((flight.current.lat - 37.0).abs() < 1e-9);
    }
}
