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

//! Telemetry reconciliation: merging raw observation batches into the store.
//!
//! Unit conversions happen here, at ingest; everything downstream works in
//! feet and knots. A batch is applied atomically: observations in order,
//! then one sweep that retires every id the batch no longer reports.

use std::collections::HashSet;

use log::{debug, info};
use opensky_client::{StateBatch, StateVector};

use crate::flight::entity::FlightEntity;
use crate::flight::motion::AnimationMode;
use crate::flight::store::FlightStore;
use crate::flight::trail::{self, TrailSettings};
use crate::geo::{self, GeoPos};

/// Barometric meters to feet.
pub const METERS_TO_FEET: f64 = 3.28084;

/// Ground-speed meters per second to knots.
pub const MPS_TO_KNOTS: f64 = 1.944;

/// How far behind the first observed fix a new flight's origin is thrown,
/// so it animates into view instead of popping in.
const ORIGIN_THROW_DEGREES: f64 = 0.5;

/// Below this, a refreshed target is treated as unmoved and the
/// interpolation base is left alone (keeps reconciliation idempotent).
const TARGET_MOVED_EPSILON: f64 = 1e-9;

/// Outcome counts for one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// Observations discarded for missing positions or being on the ground.
    pub skipped: usize,
}

/// Merge a batch into the store.
///
/// Per observation: rows without a position and rows on the ground are
/// skipped (and, if previously tracked, swept at the end); new ids create
/// entities; known ids refresh target, heading, altitude, and velocity
/// without touching progress or trail. After the batch, ids absent from it
/// are removed.
pub fn apply_batch(
    store: &mut FlightStore,
    batch: &StateBatch,
    mode: AnimationMode,
    trail_settings: &TrailSettings,
) -> ReconcileStats {
    let mut stats = ReconcileStats::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(batch.len());

    for obs in &batch.states {
        let (Some(lat), Some(lon)) = (obs.latitude, obs.longitude) else {
            debug!("Skipping {}: no position", obs.icao24);
            stats.skipped += 1;
            continue;
        };
        if obs.on_ground {
            debug!("Skipping {}: on ground", obs.icao24);
            stats.skipped += 1;
            continue;
        }

        seen.insert(obs.icao24.as_str());
        let fix = GeoPos::new(lat, lon);

        if let Some(flight) = store.get_mut(&obs.icao24) {
            update_flight(flight, obs, fix, mode);
            stats.updated += 1;
        } else {
            let flight = create_flight(obs, fix, trail_settings);
            store.insert(flight);
            stats.created += 1;
        }
    }

    let before = store.count();
    store.retain(|flight| seen.contains(flight.id.as_str()));
    stats.removed = before - store.count();

    info!(
        "Reconciled batch: {} created, {} updated, {} removed, {} skipped",
        stats.created, stats.updated, stats.removed, stats.skipped
    );
    stats
}

fn create_flight(obs: &StateVector, fix: GeoPos, trail_settings: &TrailSettings) -> FlightEntity {
    let heading = obs
        .true_track_deg
        .map_or(0.0, geo::normalize_heading);

    // Throw the origin back along the reverse heading so the flight
    // animates into view.
    let origin = geo::offset(fix, heading - 180.0, ORIGIN_THROW_DEGREES);

    let mut flight = FlightEntity::new(
        obs.icao24.clone(),
        obs.callsign.clone(),
        origin,
        fix,
        heading,
        obs.baro_altitude_m.unwrap_or(0.0) * METERS_TO_FEET,
        obs.velocity_mps.unwrap_or(0.0) * MPS_TO_KNOTS,
    );
    trail::preseed(&mut flight, trail_settings, chrono::Utc::now());
    flight
}

fn update_flight(flight: &mut FlightEntity, obs: &StateVector, fix: GeoPos, mode: AnimationMode) {
    let moved = (fix.lat - flight.target.lat).abs() > TARGET_MOVED_EPSILON
        || (fix.lon - flight.target.lon).abs() > TARGET_MOVED_EPSILON;

    // In continuous mode a genuinely new fix re-bases the interpolation at
    // the displayed position; a repeated identical batch changes nothing.
    if mode == AnimationMode::Continuous && moved {
        flight.origin = flight.current;
        flight.progress = 0.0;
    }

    flight.target = fix;
    if let Some(track) = obs.true_track_deg {
        flight.heading = geo::normalize_heading(track);
    }
    flight.altitude = obs.baro_altitude_m.unwrap_or(0.0) * METERS_TO_FEET;
    flight.velocity = obs.velocity_mps.unwrap_or(0.0) * MPS_TO_KNOTS;
}
