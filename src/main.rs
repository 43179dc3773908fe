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

mod app;
mod config;
mod map;

use clap::Parser;
use eframe::egui;
use log::{info, warn};

use app::CurrentsApp;
use config::AppConfig;

/// Marine currents map viewer
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Dataset path or http(s) URL (overrides the config file)
    #[arg(long)]
    data: Option<String>,

    /// Initial zoom level (overrides the config file)
    #[arg(long)]
    zoom: Option<f64>,

    /// Do not read or write the on-disk tile cache
    #[arg(long)]
    no_tile_cache: bool,
}

impl Args {
    fn apply(self, config: &mut AppConfig) {
        if let Some(data) = self.data {
            config.data_location = data;
        }
        if let Some(zoom) = self.zoom {
            config.zoom = zoom;
        }
        if self.no_tile_cache {
            config.tile_cache_enabled = false;
        }
    }
}

type AppCreationError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {e}");
        AppConfig::default()
    });
    if let Ok(path) = AppConfig::get_config_path() {
        info!("Using config file {}", path.display());
    }
    args.apply(&mut config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Currents Map"),
        ..Default::default()
    };

    eframe::run_native(
        "Currents Map",
        options,
        Box::new(|cc: &eframe::CreationContext<'_>| -> Result<Box<dyn eframe::App>, AppCreationError> {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .thread_name("currents-io")
                .build()?;
            Ok(Box::new(CurrentsApp::new(cc, config, runtime)))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "currents-map",
            "--data",
            "https://example.org/currents.geojson",
            "--zoom",
            "7",
            "--no-tile-cache",
        ]);
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.data_location, "https://example.org/currents.geojson");
        assert!((config.zoom - 7.0).abs() < f64::EPSILON);
        assert!(!config.tile_cache_enabled);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = AppConfig::default();
        Args::parse_from(["currents-map"]).apply(&mut config);
        assert_eq!(config, AppConfig::default());
    }
}
