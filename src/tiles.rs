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

//! Dark basemap tile loading.
//!
//! Tiles come from the Carto dark CDN, are cached on disk under the platform
//! cache directory, and are uploaded as egui textures from background
//! threads. Failures are non-fatal: a missing tile leaves a gap and is
//! reported through the failure count.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use egui::{ColorImage, TextureHandle};
use log::{debug, warn};

use crate::geo;

const TILE_PIXELS: usize = 256;

/// One slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileId {
    #[must_use]
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// CDN URL, spread across the four Carto subdomains.
    #[must_use]
    pub fn url(&self) -> String {
        let subdomain = ['a', 'b', 'c', 'd'][((self.x + self.y) % 4) as usize];
        format!(
            "https://{}.basemaps.cartocdn.com/dark_all/{}/{}/{}.png",
            subdomain, self.zoom, self.x, self.y
        )
    }

    fn cache_name(&self) -> String {
        format!("{}_{}_{}.png", self.zoom, self.x, self.y)
    }
}

enum TileState {
    Loading,
    Ready(TextureHandle),
    Failed,
}

/// Loads, caches, and serves basemap tiles.
pub struct TileLayer {
    cache_dir: PathBuf,
    tiles: Arc<Mutex<HashMap<TileId, TileState>>>,
}

impl std::fmt::Debug for TileLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLayer")
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl Default for TileLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl TileLayer {
    #[must_use]
    pub fn new() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("flighttrails-desktop")
            .join("tiles");

        if let Err(e) = fs::create_dir_all(&cache_dir) {
            warn!("Failed to create tile cache directory: {}", e);
        }

        Self {
            cache_dir,
            tiles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fetch a tile texture, kicking off a download when it is not cached.
    /// Returns `None` while the tile is loading or after it failed.
    pub fn tile(&self, id: TileId, ctx: &egui::Context) -> Option<TextureHandle> {
        let mut tiles = self.tiles.lock().ok()?;

        match tiles.get(&id) {
            Some(TileState::Ready(texture)) => return Some(texture.clone()),
            Some(TileState::Loading | TileState::Failed) => return None,
            None => {}
        }

        let cache_path = self.cache_dir.join(id.cache_name());
        if let Some(texture) = load_cached(&cache_path, id, ctx) {
            tiles.insert(id, TileState::Ready(texture.clone()));
            return Some(texture);
        }

        tiles.insert(id, TileState::Loading);
        self.spawn_download(id, cache_path, ctx.clone());
        None
    }

    fn spawn_download(&self, id: TileId, cache_path: PathBuf, ctx: egui::Context) {
        let tiles = Arc::clone(&self.tiles);

        std::thread::spawn(move || {
            let state = match download_tile(id, &cache_path, &ctx) {
                Some(texture) => TileState::Ready(texture),
                None => TileState::Failed,
            };
            if let Ok(mut tiles) = tiles.lock() {
                tiles.insert(id, state);
            }
            ctx.request_repaint();
        });
    }

    /// Tiles currently being downloaded.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.tiles
            .lock()
            .map(|t| {
                t.values()
                    .filter(|s| matches!(s, TileState::Loading))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Tiles that could not be fetched.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.tiles
            .lock()
            .map(|t| {
                t.values()
                    .filter(|s| matches!(s, TileState::Failed))
                    .count()
            })
            .unwrap_or(0)
    }
}

fn load_cached(path: &Path, id: TileId, ctx: &egui::Context) -> Option<TextureHandle> {
    let bytes = fs::read(path).ok()?;
    match decode_texture(&bytes, id, ctx) {
        Some(texture) => Some(texture),
        None => {
            // Corrupt cache entry; drop it and let the download path retry.
            let _ = fs::remove_file(path);
            None
        }
    }
}

fn download_tile(id: TileId, cache_path: &Path, ctx: &egui::Context) -> Option<TextureHandle> {
    let url = id.url();
    debug!("Downloading tile {}", url);

    let response = match reqwest::blocking::get(&url) {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            warn!("Tile {} returned HTTP {}", url, response.status());
            return None;
        }
        Err(e) => {
            warn!("Tile fetch failed for {}: {}", url, e);
            return None;
        }
    };

    let bytes = match response.bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed reading tile body for {}: {}", url, e);
            return None;
        }
    };

    if let Err(e) = fs::write(cache_path, &bytes) {
        warn!("Failed to cache tile {:?}: {}", cache_path, e);
    }

    decode_texture(&bytes, id, ctx)
}

fn decode_texture(bytes: &[u8], id: TileId, ctx: &egui::Context) -> Option<TextureHandle> {
    let rgba = image::load_from_memory(bytes).ok()?.to_rgba8();
    let color_image =
        ColorImage::from_rgba_unmultiplied([TILE_PIXELS, TILE_PIXELS], &rgba.into_raw());

    Some(ctx.load_texture(
        format!("tile_{}_{}_{}", id.zoom, id.x, id.y),
        color_image,
        Default::default(),
    ))
}

/// Tiles covering a viewport, each with its pixel offset from the viewport
/// center.
#[must_use]
pub fn visible_tiles(
    center_lat: f64,
    center_lon: f64,
    zoom: u8,
    viewport_width: f32,
    viewport_height: f32,
) -> Vec<(TileId, f32, f32)> {
    let zoom_f = f64::from(zoom);
    let center_x = geo::lon_to_world_x(center_lon, zoom_f);
    let center_y = geo::lat_to_world_y(center_lat, zoom_f);

    let tiles_wide = (f64::from(viewport_width) / geo::TILE_SIZE).ceil() as i64 + 2;
    let tiles_high = (f64::from(viewport_height) / geo::TILE_SIZE).ceil() as i64 + 2;
    let first_x = center_x.floor() as i64 - tiles_wide / 2;
    let first_y = center_y.floor() as i64 - tiles_high / 2;
    let world_tiles = 1_i64 << zoom;

    let mut tiles = Vec::with_capacity((tiles_wide * tiles_high) as usize);
    for dy in 0..tiles_high {
        let tile_y = first_y + dy;
        // Latitude does not wrap.
        if tile_y < 0 || tile_y >= world_tiles {
            continue;
        }
        for dx in 0..tiles_wide {
            let tile_x = first_x + dx;
            // Longitude wraps around the antimeridian.
            let wrapped_x = tile_x.rem_euclid(world_tiles);

            let offset_x = (tile_x as f64 - center_x) * geo::TILE_SIZE;
            let offset_y = (tile_y as f64 - center_y) * geo::TILE_SIZE;
            tiles.push((
                TileId::new(wrapped_x as u32, tile_y as u32, zoom),
                offset_x as f32,
                offset_y as f32,
            ));
        }
    }

    tiles
}
