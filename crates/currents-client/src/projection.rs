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

//! Coordinate reference systems used by the viewer.
//!
//! Datasets arrive in geographic coordinates (EPSG:4326, degrees) and are
//! drawn in spherical web mercator (EPSG:3857, metres), the projection of
//! every slippy-map tile server.

use std::f64::consts::PI;

/// WGS84 semi-major axis used by spherical mercator.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Half the projected world width: x and y both span `±HALF_WORLD_M`.
pub const HALF_WORLD_M: f64 = PI * EARTH_RADIUS_M;

/// Latitude at which the mercator square ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// A planar coordinate. For EPSG:4326 `x` is longitude and `y` latitude.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Supported spatial references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Projection {
    /// Geographic longitude/latitude in degrees.
    #[default]
    Epsg4326,
    /// Spherical web mercator in metres.
    Epsg3857,
}

impl Projection {
    /// Transform a coordinate from `self` into `target`.
    #[must_use]
    pub fn transform(self, target: Projection, coord: Coord) -> Coord {
        match (self, target) {
            (Projection::Epsg4326, Projection::Epsg3857) => lon_lat_to_mercator(coord.x, coord.y),
            (Projection::Epsg3857, Projection::Epsg4326) => {
                let (lon, lat) = mercator_to_lon_lat(coord);
                Coord::new(lon, lat)
            }
            _ => coord,
        }
    }
}

/// Project longitude/latitude degrees into web mercator metres.
///
/// Latitude is clamped to [`MAX_LATITUDE`] so the poles stay finite.
#[must_use]
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> Coord {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    Coord::new(x, y)
}

/// Inverse of [`lon_lat_to_mercator`], returning `(lon, lat)` in degrees.
#[must_use]
pub fn mercator_to_lon_lat(coord: Coord) -> (f64, f64) {
    let lon = (coord.x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (coord.y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

/// Map a mercator coordinate onto the unit square used by tile pyramids:
/// `(0, 0)` is the north-west corner, `(1, 1)` the south-east one.
#[must_use]
pub fn mercator_to_unit(coord: Coord) -> (f64, f64) {
    let ux = (coord.x + HALF_WORLD_M) / (2.0 * HALF_WORLD_M);
    let uy = (HALF_WORLD_M - coord.y) / (2.0 * HALF_WORLD_M);
    (ux, uy)
}
