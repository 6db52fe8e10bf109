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

//! Application configuration management.
//!
//! Persistent settings stored as TOML via confy. Every field has a serde
//! default so configs written by older builds keep loading. Values the
//! animation depends on are sanitized on load rather than rejected.

use serde::{Deserialize, Serialize};

use crate::flight::{AnimationMode, TrailPolicy, TrailSettings};
use crate::render::TrailStyle;

/// Allowed animation speed multipliers, in cycle order.
pub const SPEED_STEPS: [u32; 4] = [1, 2, 5, 10];

/// Accepted trail capacity range.
pub const TRAIL_POINTS_RANGE: (usize, usize) = (50, 100);

/// Accepted telemetry refresh interval range, seconds.
pub const REFRESH_SECS_RANGE: (u64, u64) = (10, 30);

/// Application configuration stored in TOML format.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version for migrations.
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Active region preset key.
    #[serde(default = "default_region_key")]
    pub region: String,

    /// Draw contrails behind aircraft.
    #[serde(default = "default_true")]
    pub show_trails: bool,

    /// Animation speed multiplier; one of [`SPEED_STEPS`].
    #[serde(default = "default_speed")]
    pub speed_multiplier: u32,

    /// What happens when a flight finishes interpolating.
    #[serde(default = "default_animation_mode")]
    pub animation_mode: AnimationMode,

    /// Contrail paint style.
    #[serde(default = "default_trail_style")]
    pub trail_style: TrailStyle,

    /// When trail samples are recorded.
    #[serde(default = "default_trail_policy")]
    pub trail_policy: TrailPolicy,

    /// Trail capacity per flight (50 - 100).
    #[serde(default = "default_trail_points")]
    pub max_trail_points: usize,

    /// Seed new flights with a backward-projected trail.
    #[serde(default)]
    pub trail_preseed: bool,

    /// Points in the pre-seeded run.
    #[serde(default = "default_preseed_points")]
    pub trail_preseed_points: usize,

    /// Periodic telemetry refresh interval in seconds (10 - 30).
    #[serde(default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,

    /// Synthetic flights generated when the live feed is down.
    #[serde(default = "default_synthetic_count")]
    pub synthetic_count: usize,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_region_key() -> String {
    "california".to_owned()
}

fn default_true() -> bool {
    true
}

fn default_speed() -> u32 {
    1
}

fn default_animation_mode() -> AnimationMode {
    AnimationMode::PointToPoint
}

fn default_trail_style() -> TrailStyle {
    TrailStyle::Glow
}

fn default_trail_policy() -> TrailPolicy {
    TrailPolicy::EveryTick
}

fn default_trail_points() -> usize {
    80
}

fn default_preseed_points() -> usize {
    20
}

fn default_refresh_secs() -> u64 {
    15
}

fn default_synthetic_count() -> usize {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            region: default_region_key(),
            show_trails: true,
            speed_multiplier: default_speed(),
            animation_mode: default_animation_mode(),
            trail_style: default_trail_style(),
            trail_policy: default_trail_policy(),
            max_trail_points: default_trail_points(),
            trail_preseed: false,
            trail_preseed_points: default_preseed_points(),
            refresh_interval_secs: default_refresh_secs(),
            synthetic_count: default_synthetic_count(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, sanitizing out-of-range values.
    pub fn load() -> Result<Self, confy::ConfyError> {
        let mut config: AppConfig = confy::load("flighttrails-desktop", "config")?;
        config.sanitize();
        Ok(config)
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store("flighttrails-desktop", "config", self)
    }

    /// Clamp hand-edited values back into their accepted ranges.
    pub fn sanitize(&mut self) {
        if !SPEED_STEPS.contains(&self.speed_multiplier) {
            self.speed_multiplier = default_speed();
        }
        self.max_trail_points = self
            .max_trail_points
            .clamp(TRAIL_POINTS_RANGE.0, TRAIL_POINTS_RANGE.1);
        self.refresh_interval_secs = self
            .refresh_interval_secs
            .clamp(REFRESH_SECS_RANGE.0, REFRESH_SECS_RANGE.1);
        if crate::regions::find(&self.region).is_none() {
            self.region = default_region_key();
        }
    }

    /// Advance the speed multiplier to the next step, wrapping around.
    pub fn cycle_speed(&mut self) {
        let index = SPEED_STEPS
            .iter()
            .position(|&s| s == self.speed_multiplier)
            .unwrap_or(0);
        self.speed_multiplier = SPEED_STEPS[(index + 1) % SPEED_STEPS.len()];
    }

    /// The trail-manager view of this configuration.
    #[must_use]
    pub fn trail_settings(&self) -> TrailSettings {
        TrailSettings {
            policy: self.trail_policy,
            max_points: self.max_trail_points,
            preseed: self.trail_preseed,
            preseed_points: self.trail_preseed_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.region, "california");
        assert_eq!(config.speed_multiplier, 1);
        assert_eq!(config.animation_mode, AnimationMode::PointToPoint);
        assert_eq!(config.max_trail_points, 80);
        assert!(config.show_trails);
    }

    #[test]
    fn test_cycle_speed_wraps() {
        let mut config = AppConfig::default();
        let mut seen = vec![config.speed_multiplier];
        for _ in 0..4 {
            config.cycle_speed();
            seen.push(config.speed_multiplier);
        }
        assert_eq!(seen, vec![1, 2, 5, 10, 1]);
    }

    #[test]
    fn test_sanitize_rejects_bad_values() {
        let mut config = AppConfig {
            speed_multiplier: 3,
            max_trail_points: 500,
            refresh_interval_secs: 2,
            region: "atlantis".to_owned(),
            ..AppConfig::default()
        };
        config.sanitize();

        assert_eq!(config.speed_multiplier, 1);
        assert_eq!(config.max_trail_points, 100);
        assert_eq!(config.refresh_interval_secs, 10);
        assert_eq!(config.region, "california");
    }

    #[test]
    fn test_trail_settings_projection() {
        let config = AppConfig {
            trail_preseed: true,
            trail_preseed_points: 15,
            ..AppConfig::default()
        };

        let settings = config.trail_settings();
        assert_eq!(settings.max_points, 80);
        assert!(settings.preseed);
        assert_eq!(settings.preseed_points, 15);
    }
}
