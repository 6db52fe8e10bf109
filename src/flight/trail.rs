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

//! Trail buffer management: bounded position history per flight.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::flight::entity::{FlightEntity, TrailPoint};
use crate::flight::store::FlightStore;
use crate::geo;

/// Minimum movement before a new point is recorded under
/// [`TrailPolicy::MinDistance`]. Roughly 100 m at mid-latitudes.
const MIN_DISTANCE_DEGREES: f64 = 0.001;

/// Spacing of backward-projected pre-seed points.
const PRESEED_STEP_DEGREES: f64 = 0.01;

/// Nominal tick interval used to back-date pre-seeded timestamps.
const PRESEED_TICK_MS: i64 = 16;

/// When to append a sample to the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrailPolicy {
    /// Record a point on every animation tick.
    EveryTick,
    /// Record only when the position moved more than a small threshold.
    MinDistance,
}

/// Trail recording configuration.
#[derive(Debug, Clone, Copy)]
pub struct TrailSettings {
    pub policy: TrailPolicy,
    /// Hard cap on retained points; eviction is strictly FIFO.
    pub max_points: usize,
    /// Seed a backward-projected run of points on entity creation.
    pub preseed: bool,
    pub preseed_points: usize,
}

/// Append the current position of every flight to its trail.
pub fn record(store: &mut FlightStore, settings: &TrailSettings, now: DateTime<Utc>) {
    for flight in store.iter_mut() {
        push_point(flight, settings, now);
    }
}

/// Append one sample to a single flight, honoring policy and capacity.
pub fn push_point(flight: &mut FlightEntity, settings: &TrailSettings, now: DateTime<Utc>) {
    if settings.policy == TrailPolicy::MinDistance {
        if let Some(last) = flight.trail.back() {
            let dlat = flight.current.lat - last.position.lat;
            let dlon = flight.current.lon - last.position.lon;
            if (dlat * dlat + dlon * dlon).sqrt() <= MIN_DISTANCE_DEGREES {
                return;
            }
        }
    }

    flight.trail.push_back(TrailPoint {
        position: flight.current,
        timestamp: now,
    });

    while flight.trail.len() > settings.max_points {
        flight.trail.pop_front();
    }
}

/// Seed a newly created flight with a backward-projected trail so the first
/// frame already shows one. Points run oldest to newest, ending just behind
/// the current position; timestamps are back-dated one nominal tick apart.
pub fn preseed(flight: &mut FlightEntity, settings: &TrailSettings, now: DateTime<Utc>) {
    if !settings.preseed {
        return;
    }

    let count = settings.preseed_points.min(settings.max_points);
    for k in (1..=count).rev() {
        let position = geo::offset(
            flight.current,
            flight.heading - 180.0,
            PRESEED_STEP_DEGREES * k as f64,
        );
        flight.trail.push_back(TrailPoint {
            position,
            timestamp: now - Duration::milliseconds(PRESEED_TICK_MS * k as i64),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPos;

    fn flight() -> FlightEntity {
        FlightEntity::new(
            "abc123".to_owned(),
            None,
            GeoPos::new(37.0, -122.5),
            GeoPos::new(37.0, -122.0),
            90.0,
            32000.0,
            450.0,
        )
    }

    fn settings(policy: TrailPolicy, max_points: usize) -> TrailSettings {
        TrailSettings {
            policy,
            max_points,
            preseed: false,
            preseed_points: 0,
        }
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut f = flight();
        let s = settings(TrailPolicy::EveryTick, 80);
        let now = Utc::now();

        for i in 0..200 {
            f.current.lon = -122.5 + i as f64 * 0.01;
            push_point(&mut f, &s, now);
            assert!(f.trail.len() <= s.max_points);
        }
        assert_eq!(f.trail.len(), 80);
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut f = flight();
        let s = settings(TrailPolicy::EveryTick, 50);
        let base = Utc::now();

        for i in 0..60 {
            f.current.lon = -122.5 + i as f64 * 0.01;
            push_point(&mut f, &s, base + Duration::milliseconds(i));
        }

        // The ten oldest samples were evicted; the front is sample 10 and
        // timestamps increase monotonically from there.
        assert_eq!(f.trail.len(), 50);
        assert_eq!(f.trail.front().unwrap().timestamp, base + Duration::milliseconds(10));
        let ordered = f
            .trail
            .iter()
            .zip(f.trail.iter().skip(1))
            .all(|(a, b)| a.timestamp < b.timestamp);
        assert!(ordered);
    }

    #[test]
    fn test_every_tick_records_stationary_points() {
        let mut f = flight();
        let s = settings(TrailPolicy::EveryTick, 80);
        for _ in 0..5 {
            push_point(&mut f, &s, Utc::now());
        }
        assert_eq!(f.trail.len(), 5);
    }

    #[test]
    fn test_min_distance_skips_stationary_points() {
        let mut f = flight();
        let s = settings(TrailPolicy::MinDistance, 80);
        let now = Utc::now();

        push_point(&mut f, &s, now);
        push_point(&mut f, &s, now);
        assert_eq!(f.trail.len(), 1);

        f.current.lon += 0.01;
        push_point(&mut f, &s, now);
        assert_eq!(f.trail.len(), 2);
    }

    #[test]
    fn test_preseed_runs_backward_along_heading() {
        let mut f = flight();
        let s = TrailSettings {
            policy: TrailPolicy::EveryTick,
            max_points: 80,
            preseed: true,
            preseed_points: 10,
        };
        preseed(&mut f, &s, Utc::now());

        assert_eq!(f.trail.len(), 10);
        // Heading 90 means the seeded run extends west of the origin and
        // approaches it from behind.
        let front = f.trail.front().unwrap().position;
        let back = f.trail.back().unwrap().position;
        assert!(front.lon < back.lon);
        assert!(back.lon < f.current.lon);
    }

    #[test]
    fn test_preseed_disabled_by_default_settings() {
        let mut f = flight();
        preseed(&mut f, &settings(TrailPolicy::EveryTick, 80), Utc::now());
        assert!(f.trail.is_empty());
    }
}
