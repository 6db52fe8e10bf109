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

//! OpenSky state-vector protocol parser.
//!
//! The OpenSky REST API returns a JSON object with a `time` field and a
//! `states` array. Each state is itself a fixed-arity array:
//!
//! ```text
//! [icao24, callsign, origin_country, time_position, last_contact,
//!  longitude, latitude, baro_altitude, on_ground, velocity,
//!  true_track, vertical_rate, ...]
//! ```
//!
//! Any field past `icao24` may be null. Trailing fields beyond the ones
//! listed above are ignored. Rows that cannot be interpreted at all are
//! skipped rather than failing the batch.

use serde_json::Value;
use thiserror::Error;

/// Errors from parsing an OpenSky response body.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body was not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The body parsed but has no usable `states` array.
    #[error("response has no states array")]
    MissingStates,
}

/// Geographic bounding box in degrees, as used by the `states/all` query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn new(south: f64, north: f64, west: f64, east: f64) -> Self {
        Self {
            south,
            north,
            west,
            east,
        }
    }

    /// Whether a coordinate falls inside this box.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }
}

/// One raw aircraft observation in OpenSky field order.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    /// ICAO 24-bit transponder address (lowercase hex string).
    pub icao24: String,
    /// Callsign, if broadcast. Trimmed; never empty when present.
    pub callsign: Option<String>,
    /// Country of registration.
    pub origin_country: Option<String>,
    /// Unix timestamp of the last position report.
    pub time_position: Option<i64>,
    /// Unix timestamp of the last received message of any kind.
    pub last_contact: Option<i64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Barometric altitude in meters.
    pub baro_altitude_m: Option<f64>,
    /// Whether the aircraft reports being on the ground.
    pub on_ground: bool,
    /// Ground speed in meters per second.
    pub velocity_mps: Option<f64>,
    /// Track over ground in degrees clockwise from north.
    pub true_track_deg: Option<f64>,
    /// Vertical rate in meters per second.
    pub vertical_rate_mps: Option<f64>,
}

/// A full batch of observations from one API response.
#[derive(Debug, Clone, Default)]
pub struct StateBatch {
    /// Server-side batch timestamp (unix seconds).
    pub time: Option<i64>,
    /// Observations, in the order the server returned them.
    pub states: Vec<StateVector>,
}

impl StateBatch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Parse a response body into a batch of state vectors.
///
/// A response whose `states` field is absent or null is rejected with
/// [`ParseError::MissingStates`]; callers use that to fall back to
/// synthetic traffic. Individual unusable rows are skipped silently.
pub fn parse_states(body: &str) -> Result<StateBatch, ParseError> {
    let root: Value = serde_json::from_str(body)?;

    let states = match root.get("states") {
        Some(Value::Array(rows)) => rows,
        _ => return Err(ParseError::MissingStates),
    };

    let parsed = states
        .iter()
        .filter_map(|row| row.as_array().and_then(|fields| parse_row(fields)))
        .collect();

    Ok(StateBatch {
        time: root.get("time").and_then(Value::as_i64),
        states: parsed,
    })
}

/// Parse one state row. Returns `None` when the row has no icao24.
fn parse_row(fields: &[Value]) -> Option<StateVector> {
    let icao24 = non_empty_str(fields.first())?;

    Some(StateVector {
        icao24,
        callsign: non_empty_str(fields.get(1)),
        origin_country: non_empty_str(fields.get(2)),
        time_position: int_field(fields.get(3)),
        last_contact: int_field(fields.get(4)),
        longitude: num_field(fields.get(5)),
        latitude: num_field(fields.get(6)),
        baro_altitude_m: num_field(fields.get(7)),
        on_ground: fields.get(8).and_then(Value::as_bool).unwrap_or(false),
        velocity_mps: num_field(fields.get(9)),
        true_track_deg: num_field(fields.get(10)),
        vertical_rate_mps: num_field(fields.get(11)),
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_owned())
    }
}

fn num_field(value: Option<&Value>) -> Option<f64> {
    value?.as_f64()
}

fn int_field(value: Option<&Value>) -> Option<i64> {
    value?.as_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "time": 1700000000,
        "states": [
            ["abc123", "UAL100  ", "United States", 1699999990, 1699999995,
             -122.0, 37.0, 10000.0, false, 250.0, 90.0, -2.5],
            ["def456", null, "Germany", null, 1699999995,
             8.5, 50.1, null, true, null, null, null, "extra", 7]
        ]
    }"#;

    #[test]
    fn test_parse_full_batch() {
        let batch = parse_states(SAMPLE).unwrap();
        assert_eq!(batch.time, Some(1_700_000_000));
        assert_eq!(batch.len(), 2);

        let first = &batch.states[0];
        assert_eq!(first.icao24, "abc123");
        assert_eq!(first.callsign.as_deref(), Some("UAL100"));
        assert_eq!(first.latitude, Some(37.0));
        assert_eq!(first.longitude, Some(-122.0));
        assert_eq!(first.baro_altitude_m, Some(10000.0));
        assert!(!first.on_ground);
        assert_eq!(first.velocity_mps, Some(250.0));
        assert_eq!(first.true_track_deg, Some(90.0));
    }

    #[test]
    fn test_nulls_and_extra_fields_tolerated() {
        let batch = parse_states(SAMPLE).unwrap();
        let second = &batch.states[1];
        assert_eq!(second.icao24, "def456");
        assert!(second.callsign.is_none());
        assert!(second.baro_altitude_m.is_none());
        assert!(second.on_ground);
    }

    #[test]
    fn test_missing_states_field() {
        let err = parse_states(r#"{"time": 123}"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingStates));
    }

    #[test]
    fn test_null_states_field() {
        let err = parse_states(r#"{"time": 123, "states": null}"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingStates));
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_states("not json").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
    }

    #[test]
    fn test_rows_without_icao_skipped() {
        let body = r#"{"states": [[null, "X"], ["", "Y"], ["ok1"]]}"#;
        let batch = parse_states(body).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.states[0].icao24, "ok1");
        assert!(batch.states[0].latitude.is_none());
    }

    #[test]
    fn test_bounding_box_contains() {
        let bbox = BoundingBox::new(32.0, 42.0, -125.0, -114.0);
        assert!(bbox.contains(37.0, -122.0));
        assert!(!bbox.contains(50.0, -122.0));
        assert!(!bbox.contains(37.0, -100.0));
    }
}
