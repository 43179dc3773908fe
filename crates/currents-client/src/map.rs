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

//! Map definition: ordered layers plus the initial view.

use crate::geojson::Feature;
use crate::projection::Coord;

/// OpenStreetMap standard tiles.
pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// OpenSeaMap seamark overlay (transparent PNG tiles).
pub const SEAMARK_TILE_URL: &str = "https://tiles.openseamap.org/seamark/{z}/{x}/{y}.png";

/// Initial view centre in EPSG:3857 metres.
pub const DEFAULT_CENTER: Coord = Coord::new(4_185_000.0, 11_000_000.0);

/// Initial zoom, wide enough to show the whole region.
pub const DEFAULT_ZOOM: f64 = 5.5;

/// A raster tile layer fetched from a `{z}/{x}/{y}` URL template.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    /// Short name, also used for the tile cache directory.
    pub name: String,
    pub url_template: String,
    pub attribution: String,
    pub opacity: f32,
    pub max_zoom: u8,
}

impl TileLayer {
    #[must_use]
    pub fn openstreetmap(url_template: impl Into<String>) -> Self {
        Self {
            name: "osm".to_string(),
            url_template: url_template.into(),
            attribution: "© OpenStreetMap contributors".to_string(),
            opacity: 1.0,
            max_zoom: 19,
        }
    }

    #[must_use]
    pub fn seamarks(url_template: impl Into<String>) -> Self {
        Self {
            name: "seamark".to_string(),
            url_template: url_template.into(),
            attribution: "© OpenSeaMap contributors".to_string(),
            opacity: 1.0,
            max_zoom: 18,
        }
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// URL of one tile.
    #[must_use]
    pub fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

/// Features backing a vector layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorSource {
    features: Vec<Feature>,
}

impl VectorSource {
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Largest current speed in the source, used to scale styling.
    #[must_use]
    pub fn max_current_speed(&self) -> Option<f64> {
        self.features
            .iter()
            .filter_map(Feature::current)
            .map(|c| c.speed)
            .fold(None, |max, s| Some(max.map_or(s, |m: f64| m.max(s))))
    }
}

/// One entry of the layer stack, bottom first.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Tile(TileLayer),
    Vector(VectorSource),
}

/// Initial camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    /// Centre in EPSG:3857 metres.
    pub center: Coord,
    pub zoom: f64,
}

impl Default for View {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Literal map parameters, overridable from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub base_tile_url: String,
    pub overlay_tile_url: String,
    pub overlay_opacity: f32,
    pub view: View,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            base_tile_url: OSM_TILE_URL.to_string(),
            overlay_tile_url: SEAMARK_TILE_URL.to_string(),
            overlay_opacity: 1.0,
            view: View::default(),
        }
    }
}

/// A complete map: layer stack plus view.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDefinition {
    pub layers: Vec<Layer>,
    pub view: View,
}

impl MapDefinition {
    /// Base tiles, seamark overlay and the current vectors, in that order.
    #[must_use]
    pub fn currents(source: VectorSource, options: &MapOptions) -> Self {
        Self {
            layers: vec![
                Layer::Tile(TileLayer::openstreetmap(options.base_tile_url.clone())),
                Layer::Tile(
                    TileLayer::seamarks(options.overlay_tile_url.clone())
                        .with_opacity(options.overlay_opacity),
                ),
                Layer::Vector(source),
            ],
            view: options.view,
        }
    }

    pub fn tile_layers(&self) -> impl Iterator<Item = &TileLayer> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Tile(tiles) => Some(tiles),
            Layer::Vector(_) => None,
        })
    }

    pub fn vector_sources(&self) -> impl Iterator<Item = &VectorSource> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Vector(source) => Some(source),
            Layer::Tile(_) => None,
        })
    }

    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.vector_sources().map(VectorSource::len).sum()
    }
}
