//! HTTP implementation of the state store client
// Copyright 2025 Reelvault Contributors
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


use async_trait::async_trait;
use reelvault_types::JobState;
use serde_json::json;
use tracing::info;

use crate::error::{Result, StateStoreError};
use crate::traits::StateStore;

/// State store client backed by the media server's internal HTTP endpoint
pub struct HttpStateStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStateStore {
    /// Create a new HTTP state store client
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();

        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn state_url(&self, job_id: u64) -> String {
        format!("{}/internal/posts/{}/state", self.base_url, job_id)
    }
}

#[async_trait]
impl StateStore for HttpStateStore {
    async fn set_state(&self, job_id: u64, state: JobState) -> Result<()> {
        let url = self.state_url(job_id);

        let response = self
            .client
            .put(&url)
            .json(&json!({ "state": state }))
            .send()
            .await
            .map_err(StateStoreError::Request)?;

        if !response.status().is_success() {
            return Err(StateStoreError::Endpoint(response.status().as_u16()));
        }

        info!(
            job_id = job_id,
            state = %state,
            "Job state recorded"
        );

        Ok(())
    }

    fn client_type(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_url_shape() {
        let store = HttpStateStore::new("http://localhost:8300/");
        assert_eq!(
            store.state_url(42),
            "http://localhost:8300/internal/posts/42/state"
        );
    }
}
