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

//! Geographic math: positions, headings, and Web Mercator transforms.
//!
//! Headings follow the compass convention: degrees clockwise from north,
//! normalized to [0, 360). Mercator coordinates are expressed in tile units
//! (one tile = 256 pixels), with fractional zoom supported so the map view
//! can zoom smoothly.

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPos {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPos {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Pixels per map tile edge.
pub const TILE_SIZE: f64 = 256.0;

/// Normalize a heading into [0, 360).
#[must_use]
pub fn normalize_heading(degrees: f64) -> f64 {
    let wrapped = degrees % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Linear interpolation between two positions.
#[must_use]
pub fn lerp(a: GeoPos, b: GeoPos, t: f64) -> GeoPos {
    GeoPos::new(a.lat + (b.lat - a.lat) * t, a.lon + (b.lon - a.lon) * t)
}

/// Offset a position by a distance (in degrees) along a heading.
///
/// Planar approximation: latitude moves with the cosine of the heading,
/// longitude with the sine. Used for the behind-heading origin throw and
/// trail pre-seeding, where sub-degree distances make the error negligible.
#[must_use]
pub fn offset(pos: GeoPos, heading_deg: f64, distance_deg: f64) -> GeoPos {
    let rad = heading_deg.to_radians();
    GeoPos::new(
        pos.lat + rad.cos() * distance_deg,
        pos.lon + rad.sin() * distance_deg,
    )
}

/// Initial great-circle bearing from one position toward another.
#[must_use]
pub fn initial_bearing(from: GeoPos, to: GeoPos) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    normalize_heading(y.atan2(x).to_degrees())
}

/// Longitude to Mercator X in tile units at the given zoom.
#[must_use]
pub fn lon_to_world_x(lon: f64, zoom: f64) -> f64 {
    let n = 2_f64.powf(zoom);
    ((lon + 180.0) / 360.0) * n
}

/// Latitude to Mercator Y in tile units at the given zoom.
#[must_use]
pub fn lat_to_world_y(lat: f64, zoom: f64) -> f64 {
    let n = 2_f64.powf(zoom);
    let lat_rad = lat.to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * n
}

/// Mercator X in tile units back to longitude.
#[must_use]
pub fn world_x_to_lon(x: f64, zoom: f64) -> f64 {
    let n = 2_f64.powf(zoom);
    x / n * 360.0 - 180.0
}

/// Mercator Y in tile units back to latitude.
#[must_use]
pub fn world_y_to_lat(y: f64, zoom: f64) -> f64 {
    let n = 2_f64.powf(zoom);
    (std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees()
}
