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

//! GeoJSON text reader with reprojection.
//!
//! Accepts a `FeatureCollection`, a single `Feature`, or a bare geometry at
//! the document root. Positions are read in the data projection (EPSG:4326
//! unless told otherwise) and transformed into the feature projection.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::{Feature, FeatureId, Geometry};
use crate::projection::{Coord, Projection};

/// Errors raised while reading a GeoJSON document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not JSON, or a member has the wrong shape.
    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The root object carries no `type` member.
    #[error("GeoJSON object has no \"type\" member")]
    MissingType,

    /// A position with fewer than two ordinates.
    #[error("position needs at least 2 ordinates, found {0}")]
    ShortPosition(usize),

    /// A position containing NaN or infinity.
    #[error("position contains a non-finite ordinate")]
    NonFinitePosition,
}

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<RawGeometry> },
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<FeatureId>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawFeatureCollection {
    features: Vec<RawFeature>,
}

/// Reads features out of GeoJSON text.
///
/// Document coordinates are always longitude/latitude (EPSG:4326).
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonReader {
    feature_projection: Projection,
}

impl GeoJsonReader {
    /// Reader that keeps coordinates in EPSG:4326.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Projection the returned features are expressed in.
    #[must_use]
    pub fn with_feature_projection(mut self, projection: Projection) -> Self {
        self.feature_projection = projection;
        self
    }

    /// Read every feature in `body`.
    pub fn read_features(&self, body: &[u8]) -> Result<Vec<Feature>, ParseError> {
        let document: Value = serde_json::from_slice(body)?;
        let kind = document
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ParseError::MissingType)?;

        match kind {
            "FeatureCollection" => {
                let collection: RawFeatureCollection = serde_json::from_value(document)?;
                collection
                    .features
                    .into_iter()
                    .map(|f| self.read_feature(f))
                    .collect()
            }
            "Feature" => {
                let feature: RawFeature = serde_json::from_value(document)?;
                Ok(vec![self.read_feature(feature)?])
            }
            _ => {
                let geometry: RawGeometry = serde_json::from_value(document)?;
                Ok(vec![Feature {
                    id: None,
                    geometry: Some(self.read_geometry(geometry)?),
                    properties: Map::new(),
                }])
            }
        }
    }

    fn read_feature(&self, raw: RawFeature) -> Result<Feature, ParseError> {
        let geometry = raw.geometry.map(|g| self.read_geometry(g)).transpose()?;
        Ok(Feature {
            id: raw.id,
            geometry,
            properties: raw.properties.unwrap_or_default(),
        })
    }

    fn read_geometry(&self, raw: RawGeometry) -> Result<Geometry, ParseError> {
        Ok(match raw {
            RawGeometry::Point { coordinates } => Geometry::Point(self.position(&coordinates)?),
            RawGeometry::MultiPoint { coordinates } => Geometry::MultiPoint(self.line(&coordinates)?),
            RawGeometry::LineString { coordinates } => Geometry::LineString(self.line(&coordinates)?),
            RawGeometry::MultiLineString { coordinates } => {
                Geometry::MultiLineString(self.rings(&coordinates)?)
            }
            RawGeometry::Polygon { coordinates } => Geometry::Polygon(self.rings(&coordinates)?),
            RawGeometry::MultiPolygon { coordinates } => Geometry::MultiPolygon(
                coordinates
                    .iter()
                    .map(|polygon| self.rings(polygon))
                    .collect::<Result<_, _>>()?,
            ),
            RawGeometry::GeometryCollection { geometries } => Geometry::GeometryCollection(
                geometries
                    .into_iter()
                    .map(|g| self.read_geometry(g))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    fn rings(&self, rings: &[Vec<Position>]) -> Result<Vec<Vec<Coord>>, ParseError> {
        rings.iter().map(|ring| self.line(ring)).collect()
    }

    fn line(&self, positions: &[Position]) -> Result<Vec<Coord>, ParseError> {
        positions.iter().map(|p| self.position(p)).collect()
    }

    fn position(&self, position: &[f64]) -> Result<Coord, ParseError> {
        // Altitude and measure ordinates are dropped.
        let [x, y, ..] = position else {
            return Err(ParseError::ShortPosition(position.len()));
        };
        if !x.is_finite() || !y.is_finite() {
            return Err(ParseError::NonFinitePosition);
        }
        Ok(Projection::Epsg4326.transform(self.feature_projection, Coord::new(*x, *y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mercator_reader() -> GeoJsonReader {
        GeoJsonReader::new().with_feature_projection(Projection::Epsg3857)
    }

    #[test]
    fn test_reads_current_collection() {
        let body = br#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [37.5, 73.0] },
                    "properties": { "u": 0.12, "v": -0.05, "speed": 0.13 }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [38.0, 73.0] },
                    "properties": { "u": 0.0, "v": 0.2, "speed": 0.2 }
                }
            ]
        }"#;

        let features = mercator_reader().read_features(body).unwrap();
        assert_eq!(features.len(), 2);

        let Some(Geometry::Point(c)) = features[0].geometry else {
            panic!("expected a point");
        };
        assert!((c.x - 4_174_480.9).abs() < 1.0, "x was {}", c.x);
        assert!(c.y > 12_000_000.0);
        assert!((features[0].current().unwrap().u - 0.12).abs() < 1e-9);
    }

    #[test]
    fn test_empty_collection() {
        let body = br#"{ "type": "FeatureCollection", "features": [] }"#;
        assert!(mercator_reader().read_features(body).unwrap().is_empty());
    }

    #[test]
    fn test_single_feature_root() {
        let body = br#"{ "type": "Feature", "id": 7, "geometry": null, "properties": null }"#;
        let features = mercator_reader().read_features(body).unwrap();
        assert_eq!(features.len(), 1);
        assert!(features[0].geometry.is_none());
        assert!(features[0].properties.is_empty());
        assert!(matches!(features[0].id, Some(FeatureId::Number(_))));
    }

    #[test]
    fn test_bare_geometry_root() {
        let body = br#"{ "type": "LineString", "coordinates": [[0, 0], [10, 0, 5]] }"#;
        let features = GeoJsonReader::new().read_features(body).unwrap();
        assert_eq!(
            features[0].geometry,
            Some(Geometry::LineString(vec![Coord::new(0.0, 0.0), Coord::new(10.0, 0.0)]))
        );
    }

    #[test]
    fn test_polygon_rings() {
        let body = br#"{
            "type": "MultiPolygon",
            "coordinates": [[[[0, 0], [1, 0], [1, 1], [0, 0]]], [[[5, 5], [6, 5], [6, 6], [5, 5]]]]
        }"#;
        let features = GeoJsonReader::new().read_features(body).unwrap();
        let Some(Geometry::MultiPolygon(polygons)) = &features[0].geometry else {
            panic!("expected a multipolygon");
        };
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[1][0].len(), 4);
    }

    #[test]
    fn test_malformed_body_is_a_json_error() {
        let err = mercator_reader().read_features(b"{ not json").unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn test_missing_type() {
        let err = mercator_reader().read_features(br#"{ "features": [] }"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingType));
    }

    #[test]
    fn test_unknown_geometry_type() {
        let err = mercator_reader()
            .read_features(br#"{ "type": "Circle", "coordinates": [0, 0] }"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn test_short_position() {
        let err = mercator_reader()
            .read_features(br#"{ "type": "Point", "coordinates": [12.0] }"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::ShortPosition(1)));
    }
}
