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

//! The map window.
//!
//! On creation the app starts one background load of the currents dataset.
//! Until it finishes a progress bar is shown; once the map definition
//! arrives its tile layers and vector layer are drawn in the central panel.

use currents_client::{
    AutoTransport, FileTransport, HttpTransport, LoadEvent, LoadRequest, LoadState, Loader,
    MapDefinition,
};
use eframe::egui;
use log::{info, warn};

use crate::config::AppConfig;
use crate::map::{MapViewport, TileManager, VectorRenderer};

const USER_AGENT: &str = concat!("currents-map/", env!("CARGO_PKG_VERSION"));
const SEAMARK_LAYER: &str = "seamark";
const WATER_COLOR: egui::Color32 = egui::Color32::from_rgb(170, 211, 223);

pub struct CurrentsApp {
    config: AppConfig,
    // Keeps the loader task alive; dropped with the window.
    _runtime: tokio::runtime::Runtime,
    loader: Option<Loader>,
    state: LoadState,
    map: Option<MapDefinition>,
    tile_managers: Vec<TileManager>,
    viewport: MapViewport,
    tile_status: Option<String>,
}

impl std::fmt::Debug for CurrentsApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentsApp")
            .field("state", &self.state)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

impl CurrentsApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        runtime: tokio::runtime::Runtime,
    ) -> Self {
        let options = config.map_options();
        let viewport = MapViewport::new(options.view, config.min_zoom, config.max_zoom);

        let http = HttpTransport::new(USER_AGENT).unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {e}");
            HttpTransport::default()
        });
        let transport = AutoTransport::new(http, FileTransport::new());

        info!("Loading currents from {}", config.data_location);
        let request = LoadRequest::new(config.data_location.clone()).with_options(options);
        let ctx = cc.egui_ctx.clone();
        let loader = {
            let _guard = runtime.enter();
            Loader::spawn(request, transport, move || ctx.request_repaint())
        };

        Self {
            config,
            _runtime: runtime,
            loader: Some(loader),
            state: LoadState::Loading { percent: 0 },
            map: None,
            tile_managers: Vec::new(),
            viewport,
            tile_status: None,
        }
    }

    /// Drain loader events queued since the last frame.
    fn poll_loader(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };

        while let Some(event) = loader.try_recv() {
            match event {
                LoadEvent::Progress(percent) => {
                    self.state = LoadState::Loading { percent };
                }
                LoadEvent::Loaded(map) => {
                    self.tile_managers = map
                        .tile_layers()
                        .map(|layer| TileManager::new(layer.clone(), self.config.tile_cache_enabled))
                        .collect();
                    self.viewport =
                        MapViewport::new(map.view, self.config.min_zoom, self.config.max_zoom);
                    self.map = Some(map);
                    self.state = LoadState::Loaded;
                }
                LoadEvent::Failed(e) => {
                    self.state = self.state.fail(e.to_string());
                }
            }
        }

        if self.state.is_finished() {
            self.loader = None;
        }
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        if self.state.shows_progress() {
            let fraction = self.state.fraction().unwrap_or(0.0);
            ui.add(
                egui::ProgressBar::new(fraction)
                    .show_percentage()
                    .animate(!self.state.is_finished()),
            );
        }

        ui.horizontal(|ui| {
            match &self.state {
                LoadState::Failed { message, .. } => {
                    ui.colored_label(egui::Color32::from_rgb(220, 50, 50), message);
                }
                LoadState::Loaded => {
                    let count = self.map.as_ref().map_or(0, MapDefinition::feature_count);
                    ui.label(format!("{count} current samples"));
                }
                LoadState::NotLoaded | LoadState::Loading { .. } => {
                    ui.weak(format!("Loading {}", self.config.data_location));
                }
            }

            ui.separator();
            ui.checkbox(&mut self.config.show_seamarks, "Seamarks");
            ui.checkbox(&mut self.config.show_currents, "Currents");

            if ui.button("Save view").clicked() {
                self.save_view();
            }
        });
    }

    fn save_view(&mut self) {
        self.config.remember_view(self.viewport.view());
        match self.config.save() {
            Ok(()) => info!("Saved view to config"),
            Err(e) => warn!("Failed to save config: {e}"),
        }
    }

    fn draw_map(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());

        let rect = response.rect;
        let center = rect.center();

        painter.rect_filled(rect, 0.0, WATER_COLOR);

        // Nothing is attached until the dataset has loaded
        let Some(map) = &self.map else {
            return;
        };

        // Scroll wheel and pinch zoom around the pointer
        if response.hovered() {
            let (scroll, pinch) = ui.ctx().input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
            let delta = if (pinch - 1.0).abs() > 0.001 {
                f64::from(pinch.log2())
            } else {
                f64::from(scroll) / 200.0
            };
            if delta != 0.0 {
                let anchor = response.hover_pos().unwrap_or(center);
                self.viewport.zoom_around(delta, anchor, center);
            }
        }

        if response.dragged() {
            self.viewport.pan(response.drag_delta());
        }

        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        for manager in &self.tile_managers {
            let layer = manager.layer();
            if layer.name == SEAMARK_LAYER && !self.config.show_seamarks {
                continue;
            }
            let tint = egui::Color32::WHITE.gamma_multiply(layer.opacity);

            for tile in manager.visible_tiles(&self.viewport, rect.width(), rect.height()) {
                if let Some(texture) = manager.get_tile(tile.coord, ui.ctx()) {
                    let tile_rect = egui::Rect::from_min_size(
                        center + tile.offset,
                        egui::vec2(tile.size, tile.size),
                    );
                    painter.image(texture.id(), tile_rect, uv, tint);
                }
            }
        }

        if self.config.show_currents {
            for source in map.vector_sources() {
                VectorRenderer::new(&painter, &self.viewport, rect, source).draw();
            }
        }

        // Update status based on tile loading
        let errors: usize = self.tile_managers.iter().map(TileManager::get_error_count).sum();
        self.tile_status = if errors > 0 {
            Some(format!("Failed to load {errors} tiles"))
        } else if self.tile_managers.iter().any(TileManager::has_loading_tiles) {
            Some("Loading map tiles...".to_string())
        } else {
            None
        };

        // Attribution (required by both tile providers)
        let attribution = self
            .tile_managers
            .iter()
            .map(|m| m.layer().attribution.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        painter.text(
            rect.right_bottom() + egui::vec2(-10.0, -10.0),
            egui::Align2::RIGHT_BOTTOM,
            attribution,
            egui::FontId::proportional(10.0),
            egui::Color32::from_black_alpha(180),
        );

        if let Some(status) = &self.tile_status {
            painter.text(
                rect.left_bottom() + egui::vec2(10.0, -10.0),
                egui::Align2::LEFT_BOTTOM,
                status,
                egui::FontId::proportional(11.0),
                egui::Color32::from_black_alpha(200),
            );
        }
    }
}

impl eframe::App for CurrentsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_map(ui);
            });
    }
}
