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

//! Load pipeline for marine current datasets.
//!
//! This library holds everything the currents viewer does that is not
//! drawing: it fetches a GeoJSON dataset while reporting progress, reads the
//! features with reprojection into web mercator, and assembles the map
//! definition (OpenStreetMap base tiles, OpenSeaMap seamark overlay, the
//! current vectors, and the initial view).
//!
//! - **Transport layer**: [`Transport`] implementations for HTTP and local files
//! - **Reader layer**: [`GeoJsonReader`] and the projected [`Feature`] model
//! - **Map layer**: [`MapDefinition`], [`TileLayer`], [`VectorSource`], [`View`]
//! - **Loader**: [`load_map`] and the background [`Loader`] handle
//!
//! # Quick Start
//!
//! ```no_run
//! use currents_client::{AutoTransport, LoadEvent, LoadRequest, Loader};
//!
//! #[tokio::main]
//! async fn main() {
//!     let request = LoadRequest::new("assets/northwest_russia_currents.geojson");
//!     let mut loader = Loader::spawn(request, AutoTransport::default(), || {});
//!
//!     while let Some(event) = loader.recv().await {
//!         match event {
//!             LoadEvent::Progress(percent) => println!("{percent}%"),
//!             LoadEvent::Loaded(map) => println!("{} features", map.feature_count()),
//!             LoadEvent::Failed(e) => eprintln!("{e}"),
//!         }
//!     }
//! }
//! ```
//!
//! # Reading GeoJSON Only
//!
//! ```
//! use currents_client::{GeoJsonReader, Projection};
//!
//! let body = br#"{"type":"Point","coordinates":[37.5,73.0]}"#;
//! let features = GeoJsonReader::new()
//!     .with_feature_projection(Projection::Epsg3857)
//!     .read_features(body)
//!     .unwrap();
//! assert_eq!(features.len(), 1);
//! ```

pub mod geojson;
pub mod loader;
pub mod map;
pub mod progress;
pub mod projection;
pub mod transport;

pub use geojson::{CurrentSample, Feature, FeatureId, GeoJsonReader, Geometry, ParseError};
pub use loader::{load_map, LoadError, LoadEvent, LoadRequest, Loader};
pub use map::{
    Layer, MapDefinition, MapOptions, TileLayer, VectorSource, View, DEFAULT_CENTER,
    DEFAULT_ZOOM, OSM_TILE_URL, SEAMARK_TILE_URL,
};
pub use progress::{percent_complete, LoadState};
pub use projection::{Coord, Projection};
pub use transport::{
    AutoTransport, FileTransport, HttpTransport, TransferError, TransferProgress, Transport,
};
