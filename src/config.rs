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

//! Application configuration management.
//!
//! Persistent settings are stored in TOML via `confy`. Every map parameter
//! defaults to the built-in constants; the config file and then command-line
//! flags can override them.

use currents_client::{MapOptions, View, DEFAULT_CENTER, DEFAULT_ZOOM, OSM_TILE_URL, SEAMARK_TILE_URL};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "currents-map";
const CONFIG_NAME: &str = "config";

/// Default dataset location, relative to the working directory.
pub const DEFAULT_DATA_LOCATION: &str = "assets/northwest_russia_currents.geojson";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Dataset path or `http(s)://` URL
    #[serde(default = "default_data_location")]
    pub data_location: String,

    /// Base map tile URL template
    #[serde(default = "default_base_tile_url")]
    pub base_tile_url: String,

    /// Nautical overlay tile URL template
    #[serde(default = "default_overlay_tile_url")]
    pub overlay_tile_url: String,

    /// Initial view centre, EPSG:3857 easting
    #[serde(default = "default_center_x")]
    pub center_x: f64,

    /// Initial view centre, EPSG:3857 northing
    #[serde(default = "default_center_y")]
    pub center_y: f64,

    /// Initial zoom level
    #[serde(default = "default_zoom")]
    pub zoom: f64,

    /// Zoom limits for interactive zooming
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,

    /// Show the seamark overlay
    #[serde(default = "default_true")]
    pub show_seamarks: bool,

    /// Show the current vectors
    #[serde(default = "default_true")]
    pub show_currents: bool,

    /// Seamark overlay opacity (0.0 - 1.0)
    #[serde(default = "default_overlay_opacity")]
    pub overlay_opacity: f32,

    /// Keep downloaded tiles on disk
    #[serde(default = "default_true")]
    pub tile_cache_enabled: bool,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_data_location() -> String {
    DEFAULT_DATA_LOCATION.to_string()
}

fn default_base_tile_url() -> String {
    OSM_TILE_URL.to_string()
}

fn default_overlay_tile_url() -> String {
    SEAMARK_TILE_URL.to_string()
}

fn default_center_x() -> f64 {
    DEFAULT_CENTER.x
}

fn default_center_y() -> f64 {
    DEFAULT_CENTER.y
}

fn default_zoom() -> f64 {
    DEFAULT_ZOOM
}

fn default_min_zoom() -> f64 {
    2.0
}

fn default_max_zoom() -> f64 {
    16.0
}

fn default_true() -> bool {
    true
}

fn default_overlay_opacity() -> f32 {
    1.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            data_location: default_data_location(),
            base_tile_url: default_base_tile_url(),
            overlay_tile_url: default_overlay_tile_url(),
            center_x: default_center_x(),
            center_y: default_center_y(),
            zoom: default_zoom(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            show_seamarks: true,
            show_currents: true,
            overlay_opacity: default_overlay_opacity(),
            tile_cache_enabled: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Store `view` as the initial view for the next start
    pub fn remember_view(&mut self, view: View) {
        self.center_x = view.center.x;
        self.center_y = view.center.y;
        self.zoom = view.zoom;
    }

    /// Map parameters for the loader
    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            base_tile_url: self.base_tile_url.clone(),
            overlay_tile_url: self.overlay_tile_url.clone(),
            overlay_opacity: self.overlay_opacity.clamp(0.0, 1.0),
            view: View {
                center: currents_client::Coord::new(self.center_x, self.center_y),
                zoom: self.zoom.clamp(self.min_zoom, self.max_zoom),
            },
        }
    }
}
