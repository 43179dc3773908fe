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

//! Raster tile fetching and caching for one tile layer.
//!
//! Tiles are kept in memory as egui textures and on disk under
//! `<cache_dir>/currents-map/tiles/<layer>/`, named by the SHA-256 of their URL.
//! Downloads run on background threads and request a repaint when done.

use currents_client::projection::mercator_to_unit;
use currents_client::TileLayer;
use egui::{ColorImage, TextureHandle, Vec2};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use super::viewport::MapViewport;

pub const TILE_SIZE: u32 = 256;
const CACHE_DURATION_DAYS: u64 = 7;
const USER_AGENT: &str = concat!("currents-map/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }
}

/// A tile to draw this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleTile {
    pub coord: TileCoord,
    /// Top-left corner relative to the viewport centre, in screen pixels.
    pub offset: Vec2,
    /// Edge length on screen; differs from 256 at fractional zoom.
    pub size: f32,
}

pub enum TileState {
    Loading,
    Loaded(TextureHandle),
    Failed,
}

pub struct TileManager {
    layer: TileLayer,
    cache_dir: Option<PathBuf>,
    client: reqwest::blocking::Client,
    tiles: Arc<Mutex<HashMap<TileCoord, TileState>>>,
    in_flight: Arc<Mutex<HashSet<TileCoord>>>,
}

impl std::fmt::Debug for TileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileManager")
            .field("layer", &self.layer.name)
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl TileManager {
    /// Manager for `layer`. With `use_disk_cache` off, tiles live in memory only.
    pub fn new(layer: TileLayer, use_disk_cache: bool) -> Self {
        let cache_dir = use_disk_cache.then(|| Self::cache_dir_for(&layer.name));

        if let Some(dir) = &cache_dir {
            // Create cache directory if it doesn't exist
            if let Err(e) = fs::create_dir_all(dir) {
                warn!("Failed to create tile cache directory {}: {}", dir.display(), e);
            }
            Self::cleanup_old_tiles(dir);
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {e}");
                reqwest::blocking::Client::new()
            });

        Self {
            layer,
            cache_dir,
            client,
            tiles: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn layer(&self) -> &TileLayer {
        &self.layer
    }

    fn cache_dir_for(layer_name: &str) -> PathBuf {
        let mut path = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        path.push("currents-map");
        path.push("tiles");
        path.push(layer_name);
        path
    }

    fn cleanup_old_tiles(cache_dir: &Path) {
        let now = SystemTime::now();
        let max_age = Duration::from_secs(CACHE_DURATION_DAYS * 24 * 60 * 60);

        let Ok(entries) = fs::read_dir(cache_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let age = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            if age.is_some_and(|age| age > max_age) && fs::remove_file(entry.path()).is_ok() {
                debug!("Removed old tile cache: {}", entry.path().display());
            }
        }
    }

    /// Cache file name for a tile URL
    fn cache_filename(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        format!("{:x}.png", hasher.finalize())
    }

    fn tile_url(&self, coord: TileCoord) -> String {
        self.layer.tile_url(coord.zoom, coord.x, coord.y)
    }

    /// Get tile from memory or disk cache, or queue it for download
    pub fn get_tile(&self, coord: TileCoord, ctx: &egui::Context) -> Option<TextureHandle> {
        let mut tiles = self.tiles.lock().unwrap();

        match tiles.get(&coord) {
            Some(TileState::Loaded(texture)) => Some(texture.clone()),
            Some(TileState::Loading | TileState::Failed) => None,
            None => {
                let url = self.tile_url(coord);
                let cached = self
                    .cache_dir
                    .as_ref()
                    .map(|dir| dir.join(Self::cache_filename(&url)))
                    .filter(|path| path.exists());

                if let Some(path) = cached {
                    match fs::read(&path).map_err(|e| e.to_string()).and_then(|bytes| {
                        decode_tile(&bytes, ctx, &self.layer.name, coord)
                    }) {
                        Ok(texture) => {
                            tiles.insert(coord, TileState::Loaded(texture.clone()));
                            return Some(texture);
                        }
                        Err(e) => warn!("Failed to load cached tile {}: {}", path.display(), e),
                    }
                }

                tiles.insert(coord, TileState::Loading);
                drop(tiles);
                self.queue_download(coord, url, ctx.clone());
                None
            }
        }
    }

    fn queue_download(&self, coord: TileCoord, url: String, ctx: egui::Context) {
        if !self.in_flight.lock().unwrap().insert(coord) {
            return;
        }

        let tiles = Arc::clone(&self.tiles);
        let in_flight = Arc::clone(&self.in_flight);
        let cache_dir = self.cache_dir.clone();
        let client = self.client.clone();
        let layer_name = self.layer.name.clone();

        std::thread::spawn(move || {
            let state = match download_tile(&client, &url, cache_dir.as_deref())
                .and_then(|bytes| decode_tile(&bytes, &ctx, &layer_name, coord))
            {
                Ok(texture) => TileState::Loaded(texture),
                Err(e) => {
                    warn!("Failed to fetch tile {url}: {e}");
                    TileState::Failed
                }
            };

            tiles.lock().unwrap().insert(coord, state);
            in_flight.lock().unwrap().remove(&coord);
            ctx.request_repaint();
        });
    }

    /// Get all tiles needed to cover a `width` x `height` viewport
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "tile indices are bounded by 2^zoom"
    )]
    pub fn visible_tiles(&self, viewport: &MapViewport, width: f32, height: f32) -> Vec<VisibleTile> {
        let zoom = viewport.zoom.round().clamp(0.0, f64::from(self.layer.max_zoom)) as u8;
        visible_tiles(viewport, zoom, width, height)
    }

    pub fn has_loading_tiles(&self) -> bool {
        let tiles = self.tiles.lock().unwrap();
        tiles.values().any(|state| matches!(state, TileState::Loading))
    }

    pub fn get_error_count(&self) -> usize {
        let tiles = self.tiles.lock().unwrap();
        tiles.values().filter(|state| matches!(state, TileState::Failed)).count()
    }
}

/// Tiles of pyramid level `zoom` covering the viewport, with screen offsets.
///
/// X wraps around the antimeridian; rows outside the pyramid are skipped.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    reason = "tile indices are bounded by 2^zoom"
)]
pub fn visible_tiles(viewport: &MapViewport, zoom: u8, width: f32, height: f32) -> Vec<VisibleTile> {
    let mut tiles = Vec::new();

    let tile_count = 2_f64.powi(i32::from(zoom));
    let (unit_x, unit_y) = mercator_to_unit(viewport.center);
    let center_tile_x = unit_x * tile_count;
    let center_tile_y = unit_y * tile_count;

    // On-screen tile size at the fractional view zoom
    let tile_px = f64::from(TILE_SIZE) * 2_f64.powf(viewport.zoom - f64::from(zoom));

    let tiles_wide = (f64::from(width) / tile_px).ceil() as i64 + 2;
    let tiles_high = (f64::from(height) / tile_px).ceil() as i64 + 2;

    let start_x = center_tile_x.floor() as i64 - tiles_wide / 2;
    let start_y = center_tile_y.floor() as i64 - tiles_high / 2;

    let max_tile = 1_i64 << zoom;

    for dy in 0..tiles_high {
        for dx in 0..tiles_wide {
            let tile_x = start_x + dx;
            let tile_y = start_y + dy;

            // Clamp Y coordinate (latitude doesn't wrap)
            if tile_y < 0 || tile_y >= max_tile {
                continue;
            }

            // Wrap X coordinate (longitude wraps around)
            let wrapped_x = tile_x.rem_euclid(max_tile);

            let offset_x = (tile_x as f64 - center_tile_x) * tile_px;
            let offset_y = (tile_y as f64 - center_tile_y) * tile_px;

            tiles.push(VisibleTile {
                coord: TileCoord::new(wrapped_x as u32, tile_y as u32, zoom),
                offset: Vec2::new(offset_x as f32, offset_y as f32),
                size: tile_px as f32,
            });
        }
    }

    tiles
}

fn download_tile(
    client: &reqwest::blocking::Client,
    url: &str,
    cache_dir: Option<&Path>,
) -> Result<Vec<u8>, String> {
    debug!("Downloading tile: {url}");
    let response = client.get(url).send().map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let bytes = response.bytes().map_err(|e| e.to_string())?.to_vec();

    if let Some(dir) = cache_dir {
        let cache_path = dir.join(TileManager::cache_filename(url));
        if let Err(e) = fs::write(&cache_path, &bytes) {
            warn!("Failed to save tile to cache: {e}");
        }
    }

    Ok(bytes)
}

fn decode_tile(
    bytes: &[u8],
    ctx: &egui::Context,
    layer_name: &str,
    coord: TileCoord,
) -> Result<TextureHandle, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];

    let color_image = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());

    Ok(ctx.load_texture(
        format!("{}_{}_{}/{}", layer_name, coord.zoom, coord.x, coord.y),
        color_image,
        egui::TextureOptions::LINEAR,
    ))
}
