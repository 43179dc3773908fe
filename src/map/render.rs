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

//! Vector layer drawing.

use currents_client::{CurrentSample, Geometry, VectorSource};
use egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use super::viewport::MapViewport;

const POINT_RADIUS: f32 = 2.5;
const LINE_COLOR: Color32 = Color32::from_rgb(20, 90, 200);
const ARROW_MIN_LENGTH: f32 = 6.0;
const ARROW_MAX_LENGTH: f32 = 22.0;

// Convert current speed to a continuous colour gradient
// Slow (blue) -> fast (red), relative to the fastest current in the dataset
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "channels are clamped to 0..=255")]
pub fn speed_to_color(speed: f64, max_speed: f64) -> Color32 {
    let t = if max_speed > 0.0 {
        (speed / max_speed).clamp(0.0, 1.0) as f32
    } else {
        0.0
    };

    // Each stop is (fraction of max speed, (r, g, b))
    let stops = [
        (0.0, (40.0, 80.0, 220.0)),   // Blue
        (0.25, (0.0, 170.0, 210.0)),  // Cyan
        (0.5, (60.0, 190.0, 80.0)),   // Green
        (0.75, (250.0, 190.0, 0.0)),  // Amber
        (1.0, (220.0, 40.0, 40.0)),   // Red
    ];

    for pair in stops.windows(2) {
        let (t1, c1): (f32, (f32, f32, f32)) = pair[0];
        let (t2, c2) = pair[1];

        if t >= t1 && t <= t2 {
            let f = (t - t1) / (t2 - t1);
            let r = c1.0 + (c2.0 - c1.0) * f;
            let g = c1.1 + (c2.1 - c1.1) * f;
            let b = c1.2 + (c2.2 - c1.2) * f;
            return Color32::from_rgb(r as u8, g as u8, b as u8);
        }
    }

    Color32::from_rgb(220, 40, 40)
}

/// Screen vector of a current arrow: points where the water flows, length by speed.
#[allow(clippy::cast_possible_truncation, reason = "screen lengths fit f32")]
pub fn current_arrow(current: &CurrentSample, max_speed: f64) -> Vec2 {
    if current.speed <= 0.0 {
        return Vec2::ZERO;
    }
    let rel = if max_speed > 0.0 {
        (current.speed / max_speed).clamp(0.0, 1.0) as f32
    } else {
        0.0
    };
    let length = ARROW_MIN_LENGTH + (ARROW_MAX_LENGTH - ARROW_MIN_LENGTH) * rel;
    // Screen y grows downwards, northward flow points up
    let direction = Vec2::new(current.u as f32, -(current.v as f32)).normalized();
    direction * length
}

/// Draws the features of a vector source.
pub struct VectorRenderer<'a> {
    painter: &'a Painter,
    viewport: &'a MapViewport,
    source: &'a VectorSource,
    screen_center: Pos2,
    clip: Rect,
    max_speed: f64,
}

impl<'a> VectorRenderer<'a> {
    pub fn new(painter: &'a Painter, viewport: &'a MapViewport, clip: Rect, source: &'a VectorSource) -> Self {
        Self {
            painter,
            viewport,
            source,
            screen_center: clip.center(),
            clip: clip.expand(ARROW_MAX_LENGTH),
            max_speed: source.max_current_speed().unwrap_or(0.0),
        }
    }

    /// Draw every feature that has a geometry.
    pub fn draw(&self) {
        for feature in self.source.features() {
            if let Some(geometry) = &feature.geometry {
                self.draw_geometry(geometry, feature.current().as_ref());
            }
        }
    }

    fn draw_geometry(&self, geometry: &Geometry, current: Option<&CurrentSample>) {
        match geometry {
            Geometry::Point(c) => self.draw_point(self.project(*c), current),
            Geometry::MultiPoint(points) => {
                for c in points {
                    self.draw_point(self.project(*c), current);
                }
            }
            Geometry::LineString(line) => self.draw_line(line, false),
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    self.draw_line(line, false);
                }
            }
            Geometry::Polygon(rings) => {
                for ring in rings {
                    self.draw_line(ring, true);
                }
            }
            Geometry::MultiPolygon(polygons) => {
                for ring in polygons.iter().flatten() {
                    self.draw_line(ring, true);
                }
            }
            Geometry::GeometryCollection(children) => {
                for child in children {
                    self.draw_geometry(child, current);
                }
            }
        }
    }

    fn project(&self, coord: currents_client::Coord) -> Pos2 {
        self.viewport.to_screen(coord, self.screen_center)
    }

    fn draw_point(&self, pos: Pos2, current: Option<&CurrentSample>) {
        if !self.clip.contains(pos) {
            return;
        }

        match current {
            Some(current) => {
                let color = speed_to_color(current.speed, self.max_speed);
                let arrow = current_arrow(current, self.max_speed);
                if arrow == Vec2::ZERO {
                    self.painter.circle_filled(pos, POINT_RADIUS, color);
                } else {
                    self.painter.arrow(pos - arrow / 2.0, arrow, Stroke::new(1.5, color));
                }
            }
            None => {
                self.painter.circle_filled(pos, POINT_RADIUS, LINE_COLOR);
            }
        }
    }

    fn draw_line(&self, coords: &[currents_client::Coord], closed: bool) {
        if coords.len() < 2 {
            return;
        }
        let points: Vec<Pos2> = coords.iter().map(|c| self.project(*c)).collect();
        if !Rect::from_points(&points).intersects(self.clip) {
            return;
        }

        let stroke = Stroke::new(1.5, LINE_COLOR);
        if closed {
            self.painter.add(egui::Shape::closed_line(points, stroke));
        } else {
            self.painter.add(egui::Shape::line(points, stroke));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use currents_client::{Coord, Feature, View};

    fn current_at(center: Coord) -> Feature {
        Feature {
            id: None,
            geometry: Some(Geometry::Point(center)),
            properties: serde_json::json!({ "u": 0.2, "v": 0.1, "speed": 0.22 })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Run the renderer for one frame and return the number of shapes painted.
    fn painted_shapes(source: &VectorSource) -> usize {
        let ctx = egui::Context::default();
        let viewport = MapViewport::new(View::default(), 2.0, 16.0);
        let clip = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::background());
            VectorRenderer::new(&painter, &viewport, clip, source).draw();
        });
        output.shapes.len()
    }

    #[test]
    fn test_renderer_draws_its_own_source() {
        let visible = VectorSource::new(vec![current_at(View::default().center)]);
        assert!(painted_shapes(&visible) > 0);

        let far_away = VectorSource::new(vec![current_at(Coord::new(-15_000_000.0, -8_000_000.0))]);
        assert_eq!(painted_shapes(&far_away), 0);
    }

    #[test]
    fn test_speed_gradient_ends() {
        assert_eq!(speed_to_color(0.0, 1.0), Color32::from_rgb(40, 80, 220));
        assert_eq!(speed_to_color(1.0, 1.0), Color32::from_rgb(220, 40, 40));
        assert_eq!(speed_to_color(5.0, 1.0), Color32::from_rgb(220, 40, 40));
    }

    #[test]
    fn test_speed_gradient_without_max() {
        assert_eq!(speed_to_color(0.3, 0.0), Color32::from_rgb(40, 80, 220));
    }

    #[test]
    fn test_arrow_points_with_the_flow() {
        let north = CurrentSample { u: 0.0, v: 0.5, speed: 0.5 };
        let arrow = current_arrow(&north, 0.5);
        assert!(arrow.y < 0.0 && arrow.x.abs() < 1e-6);
        assert!((arrow.length() - ARROW_MAX_LENGTH).abs() < 1e-4);

        let east = CurrentSample { u: 0.1, v: 0.0, speed: 0.1 };
        let arrow = current_arrow(&east, 0.5);
        assert!(arrow.x > 0.0);
        assert!(arrow.length() < ARROW_MAX_LENGTH);
    }

    #[test]
    fn test_still_water_has_no_arrow() {
        let still = CurrentSample { u: 0.0, v: 0.0, speed: 0.0 };
        assert_eq!(current_arrow(&still, 1.0), Vec2::ZERO);
    }
}
