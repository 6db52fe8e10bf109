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

//! The flight entity data model.
//!
//! A [`FlightEntity`] is pure state: the renderer reads it, the reconciler
//! and interpolator mutate it, and nothing here touches the screen or the
//! network.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::geo::GeoPos;

/// One recorded trail sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub position: GeoPos,
    pub timestamp: DateTime<Utc>,
}

/// A tracked aircraft and its full kinematic and trail state.
#[derive(Debug, Clone)]
pub struct FlightEntity {
    /// Stable unique key (ICAO transponder address, or a synthetic id).
    pub id: String,
    /// Display label. Falls back to the id when telemetry has none.
    pub callsign: String,
    /// Fixed at creation: where the animated run started.
    pub origin: GeoPos,
    /// Continuously interpolated displayed position.
    pub current: GeoPos,
    /// Most recently known or commanded position.
    pub target: GeoPos,
    /// Degrees clockwise from north, in [0, 360).
    pub heading: f64,
    /// Feet.
    pub altitude: f64,
    /// Knots.
    pub velocity: f64,
    /// Interpolation blend factor between origin and target, in [0, 1].
    pub progress: f64,
    /// Past displayed positions, oldest first.
    pub trail: VecDeque<TrailPoint>,
}

impl FlightEntity {
    /// Create a fresh entity at its origin with an empty trail.
    #[must_use]
    pub fn new(
        id: String,
        callsign: Option<String>,
        origin: GeoPos,
        target: GeoPos,
        heading: f64,
        altitude: f64,
        velocity: f64,
    ) -> Self {
        let callsign = callsign
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| id.clone());

        Self {
            id,
            callsign,
            origin,
            current: origin,
            target,
            heading,
            altitude,
            velocity,
            progress: 0.0,
            trail: VecDeque::new(),
        }
    }

    /// Whether the entity has fully interpolated to its target.
    #[must_use]
    pub fn arrived(&self) -> bool {
        self.progress >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(callsign: Option<&str>) -> FlightEntity {
        FlightEntity::new(
            "abc123".to_owned(),
            callsign.map(str::to_owned),
            GeoPos::new(37.0, -122.5),
            GeoPos::new(37.0, -122.0),
            90.0,
            32000.0,
            480.0,
        )
    }

    #[test]
    fn test_new_entity_starts_at_origin() {
        let e = entity(Some("UAL100"));
        assert_eq!(e.current, e.origin);
        assert_eq!(e.progress, 0.0);
        assert!(e.trail.is_empty());
        assert!(!e.arrived());
    }

    #[test]
    fn test_callsign_trimmed() {
        let e = entity(Some("  UAL100  "));
        assert_eq!(e.callsign, "UAL100");
    }

    #[test]
    fn test_callsign_falls_back_to_id() {
        assert_eq!(entity(None).callsign, "abc123");
        assert_eq!(entity(Some("   ")).callsign, "abc123");
    }
}
