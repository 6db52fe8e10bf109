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

//! Client library for the OpenSky Network live-position REST feed.
//!
//! Two independent layers:
//!
//! - **Protocol layer**: parses the fixed-arity JSON state-vector rows the
//!   API returns into typed [`StateVector`] values, tolerating nulls and
//!   trailing fields.
//! - **Fetch layer**: async HTTP client that queries `states/all` for a
//!   [`BoundingBox`].
//!
//! # Quick Start
//!
//! ```no_run
//! use opensky_client::{BoundingBox, OpenSkyClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = OpenSkyClient::new();
//!     let bbox = BoundingBox::new(32.0, 42.0, -125.0, -114.0);
//!
//!     match client.fetch_states(&bbox).await {
//!         Ok(batch) => println!("{} aircraft in view", batch.len()),
//!         Err(e) => eprintln!("fetch failed: {e}"),
//!     }
//! }
//! ```
//!
//! # Protocol Layer Only
//!
//! ```
//! use opensky_client::protocol::parse_states;
//!
//! let body = r#"{"time": 1700000000, "states": [
//!     ["abc123", "UAL100", "United States", null, null,
//!      -122.0, 37.0, 10000.0, false, 250.0, 90.0, 0.0]
//! ]}"#;
//!
//! let batch = parse_states(body).unwrap();
//! assert_eq!(batch.states[0].icao24, "abc123");
//! ```

pub mod fetch;
pub mod protocol;

pub use fetch::{FetchError, OpenSkyClient, DEFAULT_BASE_URL};
pub use protocol::{parse_states, BoundingBox, ParseError, StateBatch, StateVector};
