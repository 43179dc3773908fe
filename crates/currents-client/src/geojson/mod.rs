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

//! GeoJSON features after projection.
//!
//! The reader in [`reader`] turns raw GeoJSON text into these types; the
//! rest of the crate never sees unprojected coordinates.

pub mod reader;

pub use reader::{GeoJsonReader, ParseError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::projection::Coord;

/// A projected geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    MultiPoint(Vec<Coord>),
    LineString(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    /// Exterior ring first, then holes.
    Polygon(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    GeometryCollection(Vec<Geometry>),
}

/// Feature identifier: GeoJSON allows either a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    String(String),
    Number(serde_json::Number),
}

/// A feature ready for a vector source.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<FeatureId>,
    pub geometry: Option<Geometry>,
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Numeric property lookup.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    /// Current velocity carried by this feature, if it has `u` and `v`.
    #[must_use]
    pub fn current(&self) -> Option<CurrentSample> {
        let u = self.number("u")?;
        let v = self.number("v")?;
        let speed = self.number("speed").unwrap_or_else(|| u.hypot(v));
        Some(CurrentSample { u, v, speed })
    }
}

/// Surface current at one grid point, in metres per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentSample {
    /// Eastward component.
    pub u: f64,
    /// Northward component.
    pub v: f64,
    pub speed: f64,
}
