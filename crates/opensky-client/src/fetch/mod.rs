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

//! Async fetch layer for the OpenSky `states/all` endpoint.

use std::time::Duration;

use log::debug;
use thiserror::Error;

use crate::protocol::{parse_states, BoundingBox, ParseError, StateBatch};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://opensky-network.org/api";

/// Request timeout for a single states query.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors from a telemetry fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure (DNS, TLS, timeout, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("server returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Response body did not contain a usable batch.
    #[error("malformed response: {0}")]
    Malformed(#[from] ParseError),
}

/// HTTP client for the OpenSky REST API.
#[derive(Debug, Clone)]
pub struct OpenSkyClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for OpenSkyClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenSkyClient {
    /// Create a client against the public API.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a different API root (mirrors, tests).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Build the `states/all` URL for a bounding box.
    #[must_use]
    pub fn states_url(&self, bbox: &BoundingBox) -> String {
        format!(
            "{}/states/all?lamin={}&lomin={}&lamax={}&lomax={}",
            self.base_url, bbox.south, bbox.west, bbox.north, bbox.east
        )
    }

    /// Fetch all state vectors inside a bounding box.
    pub async fn fetch_states(&self, bbox: &BoundingBox) -> Result<StateBatch, FetchError> {
        let url = self.states_url(bbox);
        debug!("Fetching states: {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        Ok(parse_states(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_url() {
        let client = OpenSkyClient::new();
        let bbox = BoundingBox::new(32.0, 42.0, -125.0, -114.0);
        assert_eq!(
            client.states_url(&bbox),
            "https://opensky-network.org/api/states/all?lamin=32&lomin=-125&lamax=42&lomax=-114"
        );
    }

    #[test]
    fn test_custom_base_url() {
        let client = OpenSkyClient::with_base_url("http://localhost:8080/api");
        let bbox = BoundingBox::new(-1.0, 1.0, -2.0, 2.0);
        assert!(client
            .states_url(&bbox)
            .starts_with("http://localhost:8080/api/states/all?"));
    }

    #[test]
    fn test_malformed_maps_to_fetch_error() {
        let err: FetchError = ParseError::MissingStates.into();
        assert!(matches!(err, FetchError::Malformed(ParseError::MissingStates)));
    }
}
