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

//! The dataset load pipeline.
//!
//! [`load_map`] is the whole operation as a plain async function: fetch with
//! progress, read GeoJSON into EPSG:3857, build the three-layer map.
//! [`Loader`] runs it in a background task and turns the outcome into a
//! stream of [`LoadEvent`]s for a UI to poll.

use log::{error, info};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::geojson::{GeoJsonReader, ParseError};
use crate::map::{MapDefinition, MapOptions, VectorSource};
use crate::progress::percent_complete;
use crate::projection::Projection;
use crate::transport::{TransferError, TransferProgress, Transport};

/// Why a load produced no map.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {location}: {source}")]
    Transfer {
        location: String,
        #[source]
        source: TransferError,
    },

    #[error("failed to read GeoJSON from {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: ParseError,
    },
}

/// Events emitted by a [`Loader`]. `Loaded` or `Failed` is always last.
#[derive(Debug)]
pub enum LoadEvent {
    /// Percentage downloaded so far.
    Progress(u64),
    Loaded(MapDefinition),
    Failed(LoadError),
}

/// What to load and how to present it.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub location: String,
    pub options: MapOptions,
}

impl LoadRequest {
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            options: MapOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: MapOptions) -> Self {
        self.options = options;
        self
    }
}

/// Fetch the dataset at `request.location` and build the currents map.
///
/// `on_progress` receives the percentage after every chunk.
pub async fn load_map<T, F>(
    request: &LoadRequest,
    transport: &T,
    mut on_progress: F,
) -> Result<MapDefinition, LoadError>
where
    T: Transport,
    F: FnMut(u64) + Send,
{
    let location = request.location.as_str();
    let mut report = |p: TransferProgress| on_progress(percent_complete(p.loaded, p.total));

    let body = transport
        .fetch(location, &mut report)
        .await
        .map_err(|source| LoadError::Transfer {
            location: location.to_string(),
            source,
        })?;

    let features = GeoJsonReader::new()
        .with_feature_projection(Projection::Epsg3857)
        .read_features(&body)
        .map_err(|source| LoadError::Parse {
            location: location.to_string(),
            source,
        })?;

    info!("Loaded {} features from {location}", features.len());
    Ok(MapDefinition::currents(VectorSource::new(features), &request.options))
}

/// Handle to a load running in the background.
///
/// Dropping the handle cancels a load that is still in flight.
pub struct Loader {
    event_rx: mpsc::UnboundedReceiver<LoadEvent>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl Loader {
    /// Start loading on the current tokio runtime.
    ///
    /// `notify` is called after every event is queued, so a UI can request
    /// a repaint.
    #[must_use]
    pub fn spawn<T, N>(request: LoadRequest, transport: T, notify: N) -> Self
    where
        T: Transport,
        N: Fn() + Send + Sync + 'static,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let task_cancel = cancel_token.clone();

        tokio::spawn(async move {
            let progress_tx = event_tx.clone();
            let notify_progress = &notify;
            let load = load_map(&request, &transport, move |percent| {
                let _ = progress_tx.send(LoadEvent::Progress(percent));
                notify_progress();
            });

            let outcome = tokio::select! {
                result = load => result,
                () = task_cancel.cancelled() => {
                    info!("Load of {} cancelled", request.location);
                    return;
                }
            };

            let event = match outcome {
                Ok(map) => LoadEvent::Loaded(map),
                Err(e) => {
                    error!("Failed to load currents dataset: {e}");
                    LoadEvent::Failed(e)
                }
            };
            let _ = event_tx.send(event);
            notify();
        });

        Self {
            event_rx,
            cancel_token,
        }
    }

    /// Wait for the next event; `None` once the load has finished and every
    /// event was received.
    pub async fn recv(&mut self) -> Option<LoadEvent> {
        self.event_rx.recv().await
    }

    /// Next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<LoadEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Abandon the load.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Layer;
    use crate::transport::ProgressFn;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Once};

    thread_local! {
        static RECORDS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    /// Keeps log records per thread. `#[tokio::test]` runs spawned tasks on
    /// the test's own thread, so each test sees only its own records.
    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            RECORDS.with(|r| r.borrow_mut().push((record.level(), record.args().to_string())));
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    fn capture_logs() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            log::set_logger(&LOGGER).expect("no other logger in tests");
            log::set_max_level(log::LevelFilter::Trace);
        });
        RECORDS.with(|r| r.borrow_mut().clear());
    }

    fn error_logs() -> Vec<String> {
        RECORDS.with(|r| {
            r.borrow()
                .iter()
                .filter(|(level, _)| *level == log::Level::Error)
                .map(|(_, message)| message.clone())
                .collect()
        })
    }

    /// Canned transport: delivers `chunks` with an optional declared total,
    /// or fails outright.
    enum MockTransport {
        Body { chunks: Vec<&'static [u8]>, total: Option<u64> },
        Broken,
        Stalled,
    }

    impl Transport for MockTransport {
        async fn fetch<'a>(
            &'a self,
            location: &'a str,
            progress: &'a mut ProgressFn<'a>,
        ) -> Result<Vec<u8>, TransferError> {
            match self {
                MockTransport::Body { chunks, total } => {
                    let mut body = Vec::new();
                    for chunk in chunks {
                        body.extend_from_slice(chunk);
                        progress(TransferProgress {
                            loaded: body.len() as u64,
                            total: *total,
                        });
                    }
                    Ok(body)
                }
                MockTransport::Broken => Err(TransferError::Io {
                    path: PathBuf::from(location),
                    source: std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
                }),
                MockTransport::Stalled => std::future::pending().await,
            }
        }
    }

    const EMPTY: &[u8] = br#"{ "type": "FeatureCollection", "features": [] }"#;

    async fn drain(mut loader: Loader) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while let Some(event) = loader.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_progress_then_map() {
        let transport = MockTransport::Body {
            chunks: vec![&EMPTY[..12], &EMPTY[12..24], &EMPTY[24..]],
            total: Some(EMPTY.len() as u64),
        };
        let mut percents = Vec::new();
        let map = load_map(&LoadRequest::new("assets/x.geojson"), &transport, |p| {
            percents.push(p);
        })
        .await
        .unwrap();

        assert_eq!(percents.len(), 3);
        assert_eq!(percents.last(), Some(&100));
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(map.feature_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_collection_still_builds_every_layer() {
        let transport = MockTransport::Body { chunks: vec![EMPTY], total: None };
        let map = load_map(&LoadRequest::new("empty.geojson"), &transport, |_| {})
            .await
            .unwrap();

        assert_eq!(map.tile_layers().count(), 2);
        let Layer::Vector(source) = &map.layers[2] else {
            panic!("top layer should be the vector layer");
        };
        assert!(source.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_parse_error() {
        let transport = MockTransport::Body {
            chunks: vec![&b"<html>not found</html>"[..]],
            total: None,
        };
        let err = load_map(&LoadRequest::new("bad.geojson"), &transport, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_emits_one_failure_and_no_map() {
        capture_logs();
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let loader = Loader::spawn(
            LoadRequest::new("assets/northwest_russia_currents.geojson"),
            MockTransport::Broken,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        let events = drain(loader).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            LoadEvent::Failed(LoadError::Transfer { .. })
        ));
        assert_eq!(notified.load(Ordering::SeqCst), 1);

        let errors = error_logs();
        assert_eq!(errors.len(), 1, "errors logged: {errors:?}");
        assert!(errors[0].contains("assets/northwest_russia_currents.geojson"));
    }

    #[tokio::test]
    async fn test_malformed_body_fails_once_through_the_loader() {
        capture_logs();
        let transport = MockTransport::Body {
            chunks: vec![&b"<html>not found</html>"[..]],
            total: None,
        };
        let events = drain(Loader::spawn(LoadRequest::new("bad.geojson"), transport, || {})).await;

        let failures: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, LoadEvent::Failed(_)))
            .collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            events.last(),
            Some(LoadEvent::Failed(LoadError::Parse { .. }))
        ));
        assert!(!events.iter().any(|e| matches!(e, LoadEvent::Loaded(_))));

        let errors = error_logs();
        assert_eq!(errors.len(), 1, "errors logged: {errors:?}");
        assert!(errors[0].contains("bad.geojson"));
    }

    #[tokio::test]
    async fn test_loader_streams_progress_before_completion() {
        let transport = MockTransport::Body {
            chunks: vec![&EMPTY[..20], &EMPTY[20..]],
            total: Some(EMPTY.len() as u64),
        };
        let events = drain(Loader::spawn(LoadRequest::new("x"), transport, || {})).await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], LoadEvent::Progress(p) if p < 100));
        assert!(matches!(events[1], LoadEvent::Progress(100)));
        assert!(matches!(events[2], LoadEvent::Loaded(_)));
    }

    #[tokio::test]
    async fn test_cancelled_load_emits_nothing() {
        let loader = Loader::spawn(LoadRequest::new("slow"), MockTransport::Stalled, || {});
        loader.cancel();
        assert!(drain(loader).await.is_empty());
    }
}
