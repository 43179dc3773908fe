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

//! Progress-reporting byte transports.
//!
//! A [`Transport`] fetches one resource and reports each received chunk
//! through a callback. The loader is generic over the transport so tests
//! can inject canned bodies and failures.

pub mod file;
pub mod http;

pub use file::FileTransport;
pub use http::HttpTransport;

use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

/// Bytes received so far, and the expected size when the transport knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Network failure or a non-success HTTP status.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Callback receiving transfer progress.
pub type ProgressFn<'a> = dyn FnMut(TransferProgress) + Send + 'a;

/// A way of fetching a resource by location.
pub trait Transport: Send + Sync + 'static {
    /// Fetch `location`, calling `progress` after every received chunk.
    fn fetch<'a>(
        &'a self,
        location: &'a str,
        progress: &'a mut ProgressFn<'a>,
    ) -> impl Future<Output = Result<Vec<u8>, TransferError>> + Send + 'a;
}

/// Picks HTTP for `http(s)://` locations and the filesystem for the rest.
#[derive(Debug, Clone, Default)]
pub struct AutoTransport {
    http: HttpTransport,
    file: FileTransport,
}

impl AutoTransport {
    #[must_use]
    pub fn new(http: HttpTransport, file: FileTransport) -> Self {
        Self { http, file }
    }

    /// Whether `location` names a remote resource.
    #[must_use]
    pub fn is_remote(location: &str) -> bool {
        let lower = location.trim_start().to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

impl Transport for AutoTransport {
    async fn fetch<'a>(
        &'a self,
        location: &'a str,
        progress: &'a mut ProgressFn<'a>,
    ) -> Result<Vec<u8>, TransferError> {
        if Self::is_remote(location) {
            self.http.fetch(location, progress).await
        } else {
            self.file.fetch(location, progress).await
        }
    }
}
