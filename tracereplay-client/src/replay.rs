// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Replay endpoint client
//!
//! Posts a request body whose `history` holds the replayed messages. The
//! endpoint's answer is returned as data whatever its status; only transport
//! failures are errors.

use crate::client::{ClientError, Result};
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;
use tracereplay_core::replay::build_replay_request;
use tracereplay_core::Message;
use tracing::info;

/// Replay service location used when none is configured.
pub const DEFAULT_REPLAY_URL: &str = "http://localhost:9001/api/v1/replay";

/// Status and raw body of a replay call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayResponse {
    pub status: u16,
    pub body: String,
}

impl ReplayResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

pub struct ReplayClient {
    endpoint: String,
    http_client: HttpClient,
}

impl ReplayClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into();
        reqwest::Url::parse(&endpoint).map_err(|e| {
            ClientError::InvalidConfig(format!("invalid replay URL {:?}: {}", endpoint, e))
        })?;
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST a prepared request body.
    pub async fn send(&self, body: &Value) -> Result<ReplayResponse> {
        let payload = serde_json::to_vec(body)?;
        info!(endpoint = %self.endpoint, bytes = payload.len(), "Sending replay request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        info!(status, "Replay endpoint answered");
        Ok(ReplayResponse { status, body })
    }

    /// Fill `template`'s `history` with `messages` and send it.
    pub async fn send_messages(
        &self,
        template: &Value,
        messages: &[Message],
    ) -> Result<ReplayResponse> {
        let body = build_replay_request(template, messages)?;
        self.send(&body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_helpers() {
        let ok = ReplayResponse {
            status: 200,
            body: r#"{"reply":"hi"}"#.into(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.json().unwrap()["reply"], "hi");

        let failed = ReplayResponse {
            status: 502,
            body: "bad gateway".into(),
        };
        assert!(!failed.is_success());
        assert!(failed.json().is_none());
    }

    #[test]
    fn test_rejects_invalid_endpoint() {
        let err = ReplayClient::new("::", Duration::from_secs(1)).err().unwrap();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }
}
