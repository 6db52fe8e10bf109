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

//! The flight-entity core: data model, store, reconciliation, synthetic
//! fallback traffic, per-tick motion, and trail buffers.

pub mod entity;
pub mod motion;
pub mod reconciler;
pub mod store;
pub mod synthetic;
pub mod trail;

pub use entity::{FlightEntity, TrailPoint};
pub use motion::AnimationMode;
pub use store::FlightStore;
pub use synthetic::SyntheticGenerator;
pub use trail::{TrailPolicy, TrailSettings};
