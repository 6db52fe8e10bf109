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

mod config;
mod flight;
mod geo;
mod regions;
mod render;
mod status;
mod telemetry;
mod tiles;

use std::time::{Duration, Instant};

use clap::Parser;
use eframe::egui;
use log::{info, warn};
use opensky_client::BoundingBox;

use crate::config::AppConfig;
use crate::flight::{motion, reconciler, trail, FlightStore, SyntheticGenerator};
use crate::geo::GeoPos;
use crate::render::{Projector, RenderOptions};
use crate::status::{FeedStatus, SystemStatus};
use crate::telemetry::TelemetryService;
use crate::tiles::TileLayer;

const MIN_ZOOM: f32 = 3.0;
const MAX_ZOOM: f32 = 10.0;

/// Animated flight trails over a dark world map.
#[derive(Parser, Debug)]
#[command(name = "flighttrails-desktop")]
struct Args {
    /// Region preset to open with (e.g. california, europe, japan)
    #[arg(long)]
    region: Option<String>,

    /// Never fetch live telemetry; show synthetic traffic only
    #[arg(long)]
    offline: bool,

    /// Seed for deterministic synthetic traffic
    #[arg(long)]
    seed: Option<u64>,

    /// Periodic telemetry refresh interval in seconds (10 - 30)
    #[arg(long)]
    refresh_secs: Option<u64>,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("Flight Trails"),
        ..Default::default()
    };

    eframe::run_native(
        "Flight Trails",
        options,
        Box::new(move |cc| Ok(Box::new(TrailsApp::new(cc, &args)))),
    )
}

/// Per-frame screen mapping for the current view. Built fresh each frame so
/// pan and zoom are always reflected; never cached across frames.
struct MapProjector {
    world_center_x: f64,
    world_center_y: f64,
    zoom: f64,
    screen_center: egui::Pos2,
    valid: bool,
}

impl Projector for MapProjector {
    fn project(&self, position: GeoPos) -> Option<egui::Pos2> {
        if !self.valid {
            return None;
        }
        let dx = (geo::lon_to_world_x(position.lon, self.zoom) - self.world_center_x)
            * geo::TILE_SIZE;
        let dy = (geo::lat_to_world_y(position.lat, self.zoom) - self.world_center_y)
            * geo::TILE_SIZE;
        Some(self.screen_center + egui::vec2(dx as f32, dy as f32))
    }
}

struct TrailsApp {
    config: AppConfig,
    store: FlightStore,
    generator: SyntheticGenerator,
    telemetry: Option<TelemetryService>,
    status: SystemStatus,
    tiles: TileLayer,

    center: GeoPos,
    zoom: f32,

    offline: bool,
    /// A view change or user action wants a telemetry refresh.
    refresh_wanted: bool,
    /// Bounds of the last refresh; synthetic generation reuses them.
    last_bounds: Option<BoundingBox>,
    last_synthetic_at: Option<Instant>,
    started: Instant,
}

impl TrailsApp {
    fn new(cc: &eframe::CreationContext<'_>, args: &Args) -> Self {
        let mut config = AppConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            AppConfig::default()
        });

        if let Some(region) = &args.region {
            if regions::find(region).is_some() {
                config.region = region.clone();
            } else {
                warn!("Unknown region '{}', keeping '{}'", region, config.region);
            }
        }
        if let Some(secs) = args.refresh_secs {
            config.refresh_interval_secs = secs;
            config.sanitize();
        }

        let region = regions::find(&config.region).unwrap_or_else(regions::default_region);
        let telemetry = if args.offline {
            info!("Offline mode: synthetic traffic only");
            None
        } else {
            Some(TelemetryService::spawn(
                cc.egui_ctx.clone(),
                Duration::from_secs(config.refresh_interval_secs),
            ))
        };

        info!("Starting over {} ({} airports)", region.name, region.waypoints.len());

        Self {
            config,
            store: FlightStore::new(),
            generator: SyntheticGenerator::new(args.seed),
            telemetry,
            status: SystemStatus::new(),
            tiles: TileLayer::new(),
            center: GeoPos::new(region.center_lat, region.center_lon),
            zoom: region.zoom,
            offline: args.offline,
            refresh_wanted: true,
            last_bounds: None,
            last_synthetic_at: None,
            started: Instant::now(),
        }
    }

    fn tile_zoom(&self) -> u8 {
        self.zoom.round().clamp(MIN_ZOOM, MAX_ZOOM) as u8
    }

    /// Apply one completed fetch: a live batch reconciles, anything else
    /// degrades to synthetic traffic. Never interrupts the animation.
    fn apply_telemetry(&mut self, update: telemetry::TelemetryUpdate) {
        match update.outcome {
            Ok(batch) => {
                let stats = reconciler::apply_batch(
                    &mut self.store,
                    &batch,
                    self.config.animation_mode,
                    &self.config.trail_settings(),
                );
                self.status.record_live_batch(batch.len());
                if stats.created + stats.updated == 0 && !batch.is_empty() {
                    warn!("Batch of {} observations produced no usable flights", batch.len());
                }
            }
            Err(e) => {
                warn!("Telemetry fetch failed: {}", e);
                self.status.record_fallback(&e.to_string());
                self.generate_synthetic();
            }
        }
    }

    fn generate_synthetic(&mut self) {
        let region = regions::find(&self.config.region).unwrap_or_else(regions::default_region);
        let Some(bounds) = self.last_bounds else {
            return;
        };
        self.generator.populate(
            &mut self.store,
            region,
            &bounds,
            self.config.synthetic_count,
            &self.config.trail_settings(),
        );
        self.last_synthetic_at = Some(Instant::now());
    }

    fn change_region(&mut self, key: &str) {
        let Some(region) = regions::find(key) else {
            return;
        };
        self.config.region = key.to_owned();
        self.center = GeoPos::new(region.center_lat, region.center_lon);
        self.zoom = region.zoom;
        // A preset jump is a new area: drop everything and refetch.
        self.store.clear();
        self.refresh_wanted = true;
        self.save_config();
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            warn!("Failed to save config: {}", e);
        }
    }

    /// Visible bounds for the current viewport, used to scope fetches.
    fn visible_bounds(&self, viewport: egui::Rect) -> BoundingBox {
        let zoom = f64::from(self.tile_zoom());
        let cx = geo::lon_to_world_x(self.center.lon, zoom);
        let cy = geo::lat_to_world_y(self.center.lat, zoom);
        let half_w = f64::from(viewport.width()) / 2.0 / geo::TILE_SIZE;
        let half_h = f64::from(viewport.height()) / 2.0 / geo::TILE_SIZE;

        BoundingBox::new(
            geo::world_y_to_lat(cy + half_h, zoom).max(-85.0),
            geo::world_y_to_lat(cy - half_h, zoom).min(85.0),
            geo::world_x_to_lon(cx - half_w, zoom).max(-180.0),
            geo::world_x_to_lon(cx + half_w, zoom).min(180.0),
        )
    }

    fn trigger_refresh(&mut self, viewport: egui::Rect) {
        let bounds = self.visible_bounds(viewport);
        self.last_bounds = Some(bounds);

        if let Some(service) = &self.telemetry {
            service.request_refresh(bounds);
        } else {
            if self.status.feed != FeedStatus::Synthetic {
                self.status.record_fallback("offline mode");
            }
            self.generate_synthetic();
        }
        self.refresh_wanted = false;
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("✈ FLIGHT TRAILS")
                    .color(egui::Color32::from_rgb(120, 200, 255))
                    .strong(),
            );
            ui.separator();

            let mut selected = self.config.region.clone();
            let current_name = regions::find(&selected)
                .unwrap_or_else(regions::default_region)
                .name;
            egui::ComboBox::from_id_salt("region")
                .selected_text(current_name)
                .show_ui(ui, |ui| {
                    for region in regions::REGIONS {
                        ui.selectable_value(&mut selected, region.key.to_owned(), region.name);
                    }
                });
            if selected != self.config.region {
                self.change_region(&selected);
            }

            if ui
                .button(format!("⚡ {}x", self.config.speed_multiplier))
                .on_hover_text("Animation speed")
                .clicked()
            {
                self.config.cycle_speed();
                self.save_config();
            }

            if ui
                .selectable_label(self.config.show_trails, "Trails")
                .clicked()
            {
                self.config.show_trails = !self.config.show_trails;
                self.save_config();
            }

            if ui.button("⟳ Refresh").clicked() {
                self.refresh_wanted = true;
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let feed_color = match self.status.feed {
                    FeedStatus::Live => egui::Color32::from_rgb(100, 255, 100),
                    FeedStatus::Synthetic => egui::Color32::from_rgb(255, 200, 50),
                    FeedStatus::Connecting => egui::Color32::from_rgb(150, 150, 150),
                };
                ui.label(
                    egui::RichText::new(self.status.feed.label())
                        .color(feed_color)
                        .monospace(),
                );
                ui.separator();

                let average = self
                    .status
                    .average_altitude_ft
                    .map_or_else(|| "--".to_owned(), |a| format!("{:.0}", a));
                ui.label(
                    egui::RichText::new(format!(
                        "FLIGHTS {:>3}  AVG ALT {} ft",
                        self.status.flight_count, average
                    ))
                    .color(egui::Color32::from_rgb(180, 180, 180))
                    .monospace(),
                );
            });
        });
    }

    fn draw_map(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(
            egui::vec2(ui.available_width(), ui.available_height()),
            egui::Sense::click_and_drag(),
        );
        let rect = response.rect;

        painter.rect_filled(rect, egui::CornerRadius::ZERO, egui::Color32::from_rgb(12, 15, 20));

        // Pinch / trackpad zoom.
        let zoom_delta = ui.ctx().input(|i| i.zoom_delta());
        if (zoom_delta - 1.0).abs() > 0.001 {
            let old_tile_zoom = self.tile_zoom();
            self.zoom = (self.zoom + zoom_delta.log2()).clamp(MIN_ZOOM, MAX_ZOOM);
            if self.tile_zoom() != old_tile_zoom {
                self.refresh_wanted = true;
            }
        }

        // Drag to pan, in Mercator world units so high latitudes track the
        // cursor correctly.
        if response.dragged() {
            let delta = response.drag_delta();
            let zoom = f64::from(self.tile_zoom());
            let cx = geo::lon_to_world_x(self.center.lon, zoom) - f64::from(delta.x) / geo::TILE_SIZE;
            let cy = geo::lat_to_world_y(self.center.lat, zoom) - f64::from(delta.y) / geo::TILE_SIZE;
            self.center = GeoPos::new(
                geo::world_y_to_lat(cy, zoom).clamp(-85.0, 85.0),
                geo::world_x_to_lon(cx, zoom),
            );
        }
        if response.drag_stopped() {
            self.refresh_wanted = true;
        }

        if self.refresh_wanted && rect.width() > 0.0 {
            self.trigger_refresh(rect);
        }

        // Basemap.
        let tile_zoom = self.tile_zoom();
        for (id, offset_x, offset_y) in
            tiles::visible_tiles(self.center.lat, self.center.lon, tile_zoom, rect.width(), rect.height())
        {
            if let Some(texture) = self.tiles.tile(id, ui.ctx()) {
                let pos = rect.center() + egui::vec2(offset_x, offset_y);
                let tile_rect =
                    egui::Rect::from_min_size(pos, egui::vec2(geo::TILE_SIZE as f32, geo::TILE_SIZE as f32));
                painter.image(
                    texture.id(),
                    tile_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
        }

        // Contrails and aircraft.
        let zoom = f64::from(tile_zoom);
        let projector = MapProjector {
            world_center_x: geo::lon_to_world_x(self.center.lon, zoom),
            world_center_y: geo::lat_to_world_y(self.center.lat, zoom),
            zoom,
            screen_center: rect.center(),
            valid: rect.width() > 0.0 && rect.height() > 0.0,
        };
        render::draw_overlay(
            &painter,
            &projector,
            &self.store,
            &RenderOptions {
                show_trails: self.config.show_trails,
                style: self.config.trail_style,
                zoom: self.zoom,
                pulse_time: self.started.elapsed().as_secs_f64(),
            },
        );

        if self.status.feed == FeedStatus::Connecting && self.store.is_empty() {
            painter.text(
                rect.center_top() + egui::vec2(0.0, 24.0),
                egui::Align2::CENTER_CENTER,
                "Acquiring telemetry...",
                egui::FontId::proportional(13.0),
                egui::Color32::from_rgb(255, 200, 100),
            );
        }

        painter.text(
            rect.left_top() + egui::vec2(10.0, 10.0),
            egui::Align2::LEFT_TOP,
            "Drag to pan | Pinch to zoom",
            egui::FontId::proportional(11.0),
            egui::Color32::from_gray(140),
        );

        // Attribution (required by Carto)
        painter.text(
            rect.right_bottom() + egui::vec2(-8.0, -8.0),
            egui::Align2::RIGHT_BOTTOM,
            "© OpenStreetMap contributors © CARTO",
            egui::FontId::proportional(10.0),
            egui::Color32::from_gray(120),
        );
    }
}

impl eframe::App for TrailsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // The animation never idles.
        ctx.request_repaint();

        // Tick order: apply telemetry, interpolate, record trails, redraw.
        let update = self.telemetry.as_ref().and_then(TelemetryService::try_recv);
        if let Some(update) = update {
            self.apply_telemetry(update);
        }

        // Offline mode has no background fetches; regenerate on the same
        // cadence a live refresh would run at.
        if self.offline {
            let due = self
                .last_synthetic_at
                .map_or(true, |at| at.elapsed().as_secs() >= self.config.refresh_interval_secs);
            if due && self.last_bounds.is_some() {
                if self.status.feed != FeedStatus::Synthetic {
                    self.status.record_fallback("offline mode");
                }
                self.generate_synthetic();
            }
        }

        motion::advance(
            &mut self.store,
            self.config.animation_mode,
            self.config.speed_multiplier,
        );
        trail::record(
            &mut self.store,
            &self.config.trail_settings(),
            chrono::Utc::now(),
        );
        self.status
            .update_flight_stats(self.store.count(), self.store.average_altitude());

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.draw_controls(ui);
        });
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_map(ui);
            });
    }
}
