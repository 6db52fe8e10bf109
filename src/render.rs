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

//! Contrail and aircraft-glyph rendering.
//!
//! A stateless pass over the store: trails first, then every glyph on top so
//! no aircraft is ever occluded by a contrail. Screen positions come from a
//! [`Projector`] and are re-resolved on every frame; a position the view
//! cannot resolve skips that entity for the frame. Nothing here mutates
//! entity state — the only animation input is a frame-local pulse time.

use egui::{Color32, Painter, Pos2, Shape, Stroke};
use serde::{Deserialize, Serialize};

use crate::flight::{FlightEntity, FlightStore};
use crate::geo::GeoPos;

/// Maps geographic positions to screen space for the current view.
pub trait Projector {
    /// `None` when the view cannot resolve the coordinate this frame.
    fn project(&self, position: GeoPos) -> Option<Pos2>;
}

/// How trails are painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrailStyle {
    /// Layered glow strokes over every buffered trail point.
    Glow,
    /// One tapering ramp from the oldest point to the aircraft.
    Gradient,
}

/// Frame-local render inputs.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub show_trails: bool,
    pub style: TrailStyle,
    /// Current map zoom; scales trail opacity.
    pub zoom: f32,
    /// Seconds; drives the glyph pulse only.
    pub pulse_time: f64,
}

/// Opacity decay toward the tail, as distance-from-head ^ exponent.
const FADE_EXPONENT: f32 = 0.6;

/// Concentric glow passes, outermost first: (base width, base alpha).
const GLOW_LAYERS: &[(f32, f32)] = &[(6.0, 0.10), (3.2, 0.28), (1.6, 0.85)];

/// Straight-segment count approximating the gradient ramp.
const GRADIENT_SEGMENTS: usize = 12;

const GRADIENT_WIDTH: f32 = 1.5;

/// Velocity that reaches full trail opacity, in knots.
const FULL_OPACITY_VELOCITY_KT: f64 = 550.0;

/// Aircraft glyph fill.
const GLYPH_COLOR: Color32 = Color32::from_rgb(79, 195, 247);

/// Draw every flight's trail and glyph for this frame.
pub fn draw_overlay(
    painter: &Painter,
    projector: &dyn Projector,
    store: &FlightStore,
    options: &RenderOptions,
) {
    if options.show_trails {
        for flight in store.iter() {
            match options.style {
                TrailStyle::Gradient => draw_gradient_trail(painter, projector, flight),
                TrailStyle::Glow => draw_glow_trail(painter, projector, flight, options.zoom),
            }
        }
    }

    for flight in store.iter() {
        draw_glyph(painter, projector, flight, options.pulse_time);
    }
}

/// One tapering line from the oldest retained point to the aircraft,
/// subdivided so opacity can ramp from invisible at the tail to a visible
/// maximum at the head.
fn draw_gradient_trail(painter: &Painter, projector: &dyn Projector, flight: &FlightEntity) {
    let Some(oldest) = flight.trail.front() else {
        return;
    };
    let (Some(tail), Some(head)) = (
        projector.project(oldest.position),
        projector.project(flight.current),
    ) else {
        return;
    };

    for i in 0..GRADIENT_SEGMENTS {
        let t0 = i as f32 / GRADIENT_SEGMENTS as f32;
        let t1 = (i + 1) as f32 / GRADIENT_SEGMENTS as f32;
        let a = tail + (head - tail) * t0;
        let b = tail + (head - tail) * t1;

        let color = gradient_color(t1);
        painter.line_segment([a, b], Stroke::new(GRADIENT_WIDTH, color));
    }
}

/// Layered glow strokes over the buffered trail, ending at the aircraft.
fn draw_glow_trail(painter: &Painter, projector: &dyn Projector, flight: &FlightEntity, zoom: f32) {
    if flight.trail.is_empty() {
        return;
    }
    if projector.project(flight.current).is_none() {
        return;
    }

    // Trail points plus the live position as the head.
    let screen: Vec<Option<Pos2>> = flight
        .trail
        .iter()
        .map(|point| projector.project(point.position))
        .chain(std::iter::once(projector.project(flight.current)))
        .collect();

    let segments = screen.len() - 1;
    if segments == 0 {
        return;
    }

    let base = altitude_color(flight.altitude);
    let intensity = velocity_opacity(flight.velocity) * zoom_opacity(zoom);

    for &(layer_width, layer_alpha) in GLOW_LAYERS {
        for i in 0..segments {
            let (Some(a), Some(b)) = (screen[i], screen[i + 1]) else {
                continue;
            };

            // 1.0 at the head, falling toward the tail.
            let t = (i + 1) as f32 / segments as f32;
            let fade = t.powf(FADE_EXPONENT);
            let alpha = (layer_alpha * fade * intensity * 255.0).clamp(0.0, 255.0) as u8;
            let width = layer_width * (0.55 + 0.45 * t);

            let color =
                Color32::from_rgba_unmultiplied(base.r(), base.g(), base.b(), alpha);
            painter.line_segment([a, b], Stroke::new(width, color));
        }
    }
}

/// Heading-rotated triangle with a pulsing radial glow underneath.
fn draw_glyph(painter: &Painter, projector: &dyn Projector, flight: &FlightEntity, pulse_time: f64) {
    let Some(pos) = projector.project(flight.current) else {
        return;
    };

    // Soft halo tinted by altitude.
    let halo = altitude_color(flight.altitude);
    painter.circle_filled(
        pos,
        9.0,
        Color32::from_rgba_unmultiplied(halo.r(), halo.g(), halo.b(), 36),
    );

    let pulse = pulse_intensity(pulse_time);
    painter.circle_filled(
        pos,
        4.0,
        Color32::from_rgba_unmultiplied(255, 255, 255, (pulse * 0.8 * 255.0) as u8),
    );

    let heading = flight.heading.to_radians();
    let points = GLYPH_OUTLINE
        .iter()
        .map(|&(x, y)| {
            let (x, y) = rotate_screen(x, y, heading);
            pos + egui::vec2(x, y)
        })
        .collect();

    painter.add(Shape::convex_polygon(points, GLYPH_COLOR, Stroke::NONE));
}

/// Nose-up triangle in local glyph space (screen pixels, y down).
const GLYPH_OUTLINE: &[(f32, f32)] = &[(0.0, -8.0), (-4.0, 6.0), (4.0, 6.0)];

/// Rotate a local glyph point clockwise by a compass heading (radians).
fn rotate_screen(x: f32, y: f32, heading_rad: f64) -> (f32, f32) {
    let (sin, cos) = (heading_rad.sin() as f32, heading_rad.cos() as f32);
    (x * cos - y * sin, x * sin + y * cos)
}

/// Glyph pulse amplitude for a frame-local time in seconds.
fn pulse_intensity(time_secs: f64) -> f64 {
    0.7 + (time_secs * 1000.0 / 150.0).sin() * 0.3
}

/// Trail opacity share contributed by ground speed.
fn velocity_opacity(velocity_kt: f64) -> f32 {
    (velocity_kt / FULL_OPACITY_VELOCITY_KT).clamp(0.35, 1.0) as f32
}

/// Trail opacity share contributed by zoom: zoomed-out views draw fainter.
fn zoom_opacity(zoom: f32) -> f32 {
    (zoom / 8.0).clamp(0.6, 1.0)
}

/// Gradient-trail color at a tail-to-head position, ramping alpha through
/// the stops of the single-segment style.
fn gradient_color(t: f32) -> Color32 {
    // (position, (r, g, b), alpha)
    const STOPS: [(f32, (u8, u8, u8), f32); 4] = [
        (0.0, (100, 180, 255), 0.0),
        (0.5, (100, 180, 255), 0.15),
        (0.85, (120, 200, 255), 0.4),
        (1.0, (150, 220, 255), 0.6),
    ];

    let t = t.clamp(0.0, 1.0);
    for window in STOPS.windows(2) {
        let (p0, c0, a0) = window[0];
        let (p1, c1, a1) = window[1];
        if t >= p0 && t <= p1 {
            let f = if (p1 - p0).abs() < f32::EPSILON {
                0.0
            } else {
                (t - p0) / (p1 - p0)
            };
            let lerp_u8 = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * f) as u8;
            let alpha = a0 + (a1 - a0) * f;
            return Color32::from_rgba_unmultiplied(
                lerp_u8(c0.0, c1.0),
                lerp_u8(c0.1, c1.1),
                lerp_u8(c0.2, c1.2),
                (alpha * 255.0) as u8,
            );
        }
    }
    Color32::TRANSPARENT
}

/// Continuous altitude color ramp: cyan near the ground through orange to
/// purple in the flight levels.
fn altitude_color(altitude_ft: f64) -> Color32 {
    const STOPS: [(f32, (f32, f32, f32)); 6] = [
        (0.0, (0.0, 200.0, 200.0)),
        (10_000.0, (50.0, 150.0, 200.0)),
        (20_000.0, (150.0, 200.0, 0.0)),
        (30_000.0, (255.0, 150.0, 0.0)),
        (40_000.0, (255.0, 50.0, 150.0)),
        (45_000.0, (150.0, 50.0, 255.0)),
    ];

    let alt = (altitude_ft as f32).clamp(0.0, 45_000.0);
    for window in STOPS.windows(2) {
        let (a0, c0) = window[0];
        let (a1, c1) = window[1];
        if alt >= a0 && alt <= a1 {
            let t = (alt - a0) / (a1 - a0);
            return Color32::from_rgb(
                (c0.0 + (c1.0 - c0.0) * t) as u8,
                (c0.1 + (c1.1 - c0.1) * t) as u8,
                (c0.2 + (c1.2 - c0.2) * t) as u8,
            );
        }
    }
    Color32::from_rgb(150, 50, 255)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altitude_color_endpoints() {
        assert_eq!(altitude_color(0.0), Color32::from_rgb(0, 200, 200));
        assert_eq!(altitude_color(45_000.0), Color32::from_rgb(150, 50, 255));
        // Clamped outside the ramp.
        assert_eq!(altitude_color(-500.0), altitude_color(0.0));
        assert_eq!(altitude_color(60_000.0), altitude_color(45_000.0));
    }

    #[test]
    fn test_gradient_alpha_ramps_up() {
        let mut last = -1_i32;
        for i in 0..=10 {
            let alpha = i32::from(gradient_color(i as f32 / 10.0).a());
            assert!(alpha >= last, "alpha must not decrease toward the head");
            last = alpha;
        }
        assert_eq!(gradient_color(0.0).a(), 0);
        assert!(gradient_color(1.0).a() > 140);
    }

    #[test]
    fn test_fade_exponent_brightens_head() {
        let tail = 0.1_f32.powf(FADE_EXPONENT);
        let head = 1.0_f32.powf(FADE_EXPONENT);
        assert!(head > tail);
        // Sub-linear falloff keeps the mid-trail visible.
        assert!(0.5_f32.powf(FADE_EXPONENT) > 0.5);
    }

    #[test]
    fn test_velocity_and_zoom_opacity_bounds() {
        assert!((velocity_opacity(0.0) - 0.35).abs() < 1e-6);
        assert!((velocity_opacity(550.0) - 1.0).abs() < 1e-6);
        assert!((velocity_opacity(900.0) - 1.0).abs() < 1e-6);
        assert!((zoom_opacity(2.0) - 0.6).abs() < 1e-6);
        assert!((zoom_opacity(12.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pulse_stays_in_band() {
        for i in 0..100 {
            let p = pulse_intensity(i as f64 * 0.016);
            assert!((0.4..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_rotate_screen_cardinal_headings() {
        // Nose point (0, -8): north keeps it up, east swings it to +x.
        let (x, y) = rotate_screen(0.0, -8.0, 0.0);
        assert!((x - 0.0).abs() < 1e-4 && (y - (-8.0)).abs() < 1e-4);

        let (x, y) = rotate_screen(0.0, -8.0, std::f64::consts::FRAC_PI_2);
        assert!((x - 8.0).abs() < 1e-4 && y.abs() < 1e-4);
    }
}
