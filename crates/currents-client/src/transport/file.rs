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

//! Local filesystem transport.
//!
//! Reads the file in fixed-size chunks so large datasets report progress the
//! same way a download does.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::{ProgressFn, TransferError, TransferProgress, Transport};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Reads resources from disk, resolving relative locations against a root.
#[derive(Debug, Clone)]
pub struct FileTransport {
    root: Option<PathBuf>,
    chunk_size: usize,
}

impl Default for FileTransport {
    fn default() -> Self {
        Self {
            root: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl FileTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locations against `root` instead of the working directory.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn resolve(&self, location: &str) -> PathBuf {
        let path = Path::new(location.strip_prefix("file://").unwrap_or(location));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Transport for FileTransport {
    async fn fetch<'a>(
        &'a self,
        location: &'a str,
        progress: &'a mut ProgressFn<'a>,
    ) -> Result<Vec<u8>, TransferError> {
        let path = self.resolve(location);
        let io_error = |source| TransferError::Io {
            path: path.clone(),
            source,
        };

        let mut file = File::open(&path).await.map_err(io_error)?;
        let total = file.metadata().await.map_err(io_error)?.len();

        let mut body = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
        let mut chunk = vec![0; self.chunk_size];
        loop {
            let read = file.read(&mut chunk).await.map_err(io_error)?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
            progress(TransferProgress {
                loaded: body.len() as u64,
                total: Some(total),
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_in_chunks_with_progress() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&[7u8; 10]).unwrap();

        let transport = FileTransport::new().with_chunk_size(4);
        let mut seen = Vec::new();
        let body = transport
            .fetch(tmp.path().to_str().unwrap(), &mut |p| seen.push(p))
            .await
            .unwrap();

        assert_eq!(body.len(), 10);
        let loaded: Vec<u64> = seen.iter().map(|p| p.loaded).collect();
        assert_eq!(loaded, vec![4, 8, 10]);
        assert!(seen.iter().all(|p| p.total == Some(10)));
    }

    #[tokio::test]
    async fn test_relative_location_uses_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/data.geojson"), b"{}").unwrap();

        let transport = FileTransport::new().with_root(dir.path());
        let body = transport
            .fetch("assets/data.geojson", &mut |_| {})
            .await
            .unwrap();
        assert_eq!(body, b"{}");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FileTransport::new().with_root(dir.path());
        let err = transport.fetch("nope.geojson", &mut |_| {}).await.unwrap_err();
        assert!(matches!(err, TransferError::Io { .. }));
    }
}
