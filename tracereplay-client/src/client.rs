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

//! Tracing backend client
//!
//! Read-only access to the public trace API. Credentials are passed through as
//! HTTP basic auth; there is no retry.

use crate::types::*;
use reqwest::{Client as HttpClient, Url};
use std::time::Duration;
use thiserror::Error;
use tracereplay_core::replay::ContextBuilder;
use tracereplay_core::{extract_session_turns, ReplayError, TraceDocument};
use tracing::{debug, info};

/// Default backend location when `LANGFUSE_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "https://cloud.langfuse.com";

pub const ENV_BASE_URL: &str = "LANGFUSE_BASE_URL";
pub const ENV_PUBLIC_KEY: &str = "LANGFUSE_PUBLIC_KEY";
pub const ENV_SECRET_KEY: &str = "LANGFUSE_SECRET_KEY";

/// Client errors.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error(transparent)]
    Core(#[from] ReplayError),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Backend client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the tracing backend
    pub base_url: String,
    pub public_key: Option<String>,
    pub secret_key: Option<String>,
    /// Request timeout (default: 30 seconds)
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            public_key: None,
            secret_key: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Read `LANGFUSE_BASE_URL`, `LANGFUSE_PUBLIC_KEY` and `LANGFUSE_SECRET_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let present = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let mut config =
            Self::new(present(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()));
        config.public_key = present(ENV_PUBLIC_KEY);
        config.secret_key = present(ENV_SECRET_KEY);
        config.validate()?;
        Ok(config)
    }

    pub fn with_credentials(
        mut self,
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.public_key = Some(public_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the base URL parses and credentials come in pairs.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidConfig(format!("invalid base URL {:?}: {}", self.base_url, e))
        })?;
        match (&self.public_key, &self.secret_key) {
            (Some(_), None) => Err(ClientError::InvalidConfig(format!(
                "{} is set but {} is not",
                ENV_PUBLIC_KEY, ENV_SECRET_KEY
            ))),
            (None, Some(_)) => Err(ClientError::InvalidConfig(format!(
                "{} is set but {} is not",
                ENV_SECRET_KEY, ENV_PUBLIC_KEY
            ))),
            _ => Ok(()),
        }
    }
}

/// Client for the tracing backend's public API.
///
/// # Example
///
/// ```no_run
/// use tracereplay_client::{ClientConfig, TraceClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = TraceClient::new(ClientConfig::from_env()?)?;
///     let trace = client.get_trace("7ee0b92d-4b98-4022-b10a-5929f7b62ec8").await?;
///     println!("{} observations", trace.observations.len());
///     Ok(())
/// }
/// ```
pub struct TraceClient {
    config: ClientConfig,
    http_client: HttpClient,
}

impl TraceClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(16)
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            ClientError::InvalidConfig(format!("invalid base URL {:?}: {}", self.config.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidConfig(format!(
                    "base URL {:?} cannot carry a path",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON document from the backend.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");

        let mut request = self
            .http_client
            .get(url)
            .header("Accept", "application/json");
        if let Some(public_key) = &self.config.public_key {
            request = request.basic_auth(public_key, self.config.secret_key.as_ref());
        }
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch one trace with its full observation list.
    pub async fn get_trace(&self, trace_id: &str) -> Result<TraceDocument> {
        let trace: TraceDocument = self
            .get(&["api", "public", "traces", trace_id], &[])
            .await?;
        info!(
            trace_id = %trace.id,
            observations = trace.observations.len(),
            "Fetched trace"
        );
        Ok(trace)
    }

    /// Fetch a session and its traces. Observation detail is not guaranteed.
    pub async fn get_session(&self, session_id: &str) -> Result<SessionDocument> {
        let session: SessionDocument = self
            .get(&["api", "public", "sessions", session_id], &[])
            .await?;
        info!(
            session_id = %session.id,
            traces = session.traces.len(),
            "Fetched session"
        );
        Ok(session)
    }

    /// Fetch one page of traces.
    pub async fn list_traces(&self, params: &ListTracesParams) -> Result<TraceList> {
        let list: TraceList = self
            .get(&["api", "public", "traces"], &params.query_pairs())
            .await?;
        debug!(
            page = list.meta.page,
            total_pages = list.meta.total_pages,
            returned = list.data.len(),
            "Listed traces"
        );
        Ok(list)
    }

    /// Rebuild a session's conversation into `builder`.
    ///
    /// Fetches every trace of the session in full, orders them by timestamp
    /// and appends one turn per trace that has a generation, numbering rounds
    /// after the builder's existing history. Sets the builder's session id
    /// when it has none. Returns the number of turns appended.
    pub async fn session_replay_context(
        &self,
        session_id: &str,
        builder: &mut ContextBuilder,
    ) -> Result<usize> {
        let session = self.get_session(session_id).await?;

        let mut traces = Vec::with_capacity(session.traces.len());
        for summary in &session.traces {
            traces.push(self.get_trace(&summary.id).await?);
        }
        traces.sort_by_key(|trace| trace.timestamp);

        let offset = builder.next_round() - 1;
        let turns = extract_session_turns(&traces);
        let appended = turns.len();

        if builder.session_id().is_empty() {
            builder.set_session_id(session.id.clone());
        }
        for mut turn in turns {
            turn.round += offset;
            builder.add_conversation_turn(turn);
        }

        info!(
            session_id = %session.id,
            traces = traces.len(),
            turns = appended,
            "Reconstructed session"
        );
        Ok(appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.public_key.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup_reads_credentials() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://localhost:3000"),
            (ENV_PUBLIC_KEY, "pk-lf-1"),
            (ENV_SECRET_KEY, "sk-lf-1"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.public_key.as_deref(), Some("pk-lf-1"));
        assert_eq!(config.secret_key.as_deref(), Some("sk-lf-1"));
    }

    #[test]
    fn test_half_credentials_are_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_PUBLIC_KEY, "pk-lf-1")])).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = TraceClient::new(ClientConfig::new("not a url")).err().unwrap();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn test_endpoint_escapes_ids() {
        let client = TraceClient::new(ClientConfig::new("http://localhost:3000/")).unwrap();
        let url = client.endpoint(&["api", "public", "traces", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/public/traces/a%20b%2Fc");
    }
}
