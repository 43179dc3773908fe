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

//! Streaming HTTP transport.

use log::debug;

use super::{ProgressFn, TransferError, TransferProgress, Transport};

/// Fetches resources over HTTP(S), reporting progress per body chunk.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Transport with its own client identifying itself as `user_agent`.
    pub fn new(user_agent: &str) -> Result<Self, TransferError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn fetch<'a>(
        &'a self,
        location: &'a str,
        progress: &'a mut ProgressFn<'a>,
    ) -> Result<Vec<u8>, TransferError> {
        let mut response = self.client.get(location).send().await?.error_for_status()?;
        let total = response.content_length();
        debug!("GET {location}: {} ({total:?} bytes)", response.status());

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            progress(TransferProgress {
                loaded: body.len() as u64,
                total,
            });
        }

        Ok(body)
    }
}
