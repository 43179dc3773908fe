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

//! Camera state and the EPSG:3857 ↔ screen transform.

use currents_client::projection::HALF_WORLD_M;
use currents_client::{Coord, View};
use egui::{Pos2, Vec2};

use super::tiles::TILE_SIZE;

/// Pannable, zoomable camera over a web mercator world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapViewport {
    /// Centre in EPSG:3857 metres.
    pub center: Coord,
    /// Fractional zoom; the world is `256 * 2^zoom` pixels wide.
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl MapViewport {
    pub fn new(view: View, min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            center: view.center,
            zoom: view.zoom.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
        }
    }

    /// Screen pixels per projected metre.
    pub fn pixels_per_meter(&self) -> f64 {
        f64::from(TILE_SIZE) * 2_f64.powf(self.zoom) / (2.0 * HALF_WORLD_M)
    }

    /// Screen position of `coord` when the viewport centre is drawn at `screen_center`.
    #[allow(clippy::cast_possible_truncation, reason = "screen coordinates fit f32")]
    pub fn to_screen(&self, coord: Coord, screen_center: Pos2) -> Pos2 {
        let scale = self.pixels_per_meter();
        let dx = (coord.x - self.center.x) * scale;
        let dy = (self.center.y - coord.y) * scale;
        Pos2::new(screen_center.x + dx as f32, screen_center.y + dy as f32)
    }

    /// Inverse of [`Self::to_screen`].
    pub fn to_map(&self, pos: Pos2, screen_center: Pos2) -> Coord {
        let scale = self.pixels_per_meter();
        Coord::new(
            self.center.x + f64::from(pos.x - screen_center.x) / scale,
            self.center.y - f64::from(pos.y - screen_center.y) / scale,
        )
    }

    /// Move the map by a screen-space drag.
    pub fn pan(&mut self, drag: Vec2) {
        let scale = self.pixels_per_meter();
        self.center.x -= f64::from(drag.x) / scale;
        self.center.y += f64::from(drag.y) / scale;

        // Wrap east-west, clamp north-south
        if self.center.x > HALF_WORLD_M {
            self.center.x -= 2.0 * HALF_WORLD_M;
        } else if self.center.x < -HALF_WORLD_M {
            self.center.x += 2.0 * HALF_WORLD_M;
        }
        self.center.y = self.center.y.clamp(-HALF_WORLD_M, HALF_WORLD_M);
    }

    /// Zoom by `delta` levels keeping the map point under `anchor` fixed.
    pub fn zoom_around(&mut self, delta: f64, anchor: Pos2, screen_center: Pos2) {
        let before = self.to_map(anchor, screen_center);
        self.zoom = (self.zoom + delta).clamp(self.min_zoom, self.max_zoom);
        let after = self.to_map(anchor, screen_center);
        self.center.x += before.x - after.x;
        self.center.y += before.y - after.y;
    }

    /// Current camera as a [`View`].
    #[must_use]
    pub fn view(&self) -> View {
        View {
            center: self.center,
            zoom: self.zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(zoom: f64) -> MapViewport {
        MapViewport::new(
            View {
                center: Coord::new(0.0, 0.0),
                zoom,
            },
            0.0,
            18.0,
        )
    }

    #[test]
    fn test_center_maps_to_screen_center() {
        let v = MapViewport::new(View::default(), 2.0, 16.0);
        let p = v.to_screen(v.center, Pos2::new(400.0, 300.0));
        assert!((p.x - 400.0).abs() < 1e-3 && (p.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_world_is_one_tile_at_zoom_zero() {
        let v = viewport(0.0);
        let east = v.to_screen(Coord::new(HALF_WORLD_M, 0.0), Pos2::ZERO);
        assert!((east.x - 128.0).abs() < 1e-3);
        let north = v.to_screen(Coord::new(0.0, HALF_WORLD_M), Pos2::ZERO);
        assert!((north.y + 128.0).abs() < 1e-3);
    }

    #[test]
    fn test_drag_moves_map_with_pointer() {
        let mut v = viewport(4.0);
        let target = Coord::new(1_000_000.0, 500_000.0);
        let before = v.to_screen(target, Pos2::ZERO);
        v.pan(Vec2::new(30.0, -12.0));
        let after = v.to_screen(target, Pos2::ZERO);
        assert!((after.x - before.x - 30.0).abs() < 1e-2);
        assert!((after.y - before.y + 12.0).abs() < 1e-2);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed_and_respects_limits() {
        let mut v = viewport(5.0);
        let center = Pos2::new(200.0, 200.0);
        let anchor = Pos2::new(260.0, 150.0);
        let under_cursor = v.to_map(anchor, center);

        v.zoom_around(1.5, anchor, center);
        let moved = v.to_screen(under_cursor, center);
        assert!((moved.x - anchor.x).abs() < 1e-2 && (moved.y - anchor.y).abs() < 1e-2);

        v.zoom_around(100.0, anchor, center);
        assert!((v.zoom - 18.0).abs() < f64::EPSILON);
    }
    #[test]
    fn test_view_follows_the_camera() {
        let mut v = MapViewport::new(View::default(), 2.0, 16.0);
        v.pan(Vec2::new(0.0, 40.0));
        v.zoom_around(-0.5, Pos2::ZERO, Pos2::ZERO);

        let view = v.view();
        assert!(view.center.y > View::default().center.y);
        assert!((view.center.x - View::default().center.x).abs() < 1e-6);
        assert!((view.zoom - 5.0).abs() < f64::EPSILON);
    }
}
