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

//! # Tracereplay client
//!
//! Fetches traces and sessions from the tracing backend and posts replay
//! requests.
//!
//! ## Rebuilding a session
//!
//! ```no_run
//! use tracereplay_client::{ClientConfig, TraceClient};
//! use tracereplay_core::replay::{self, ContextBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TraceClient::new(ClientConfig::from_env()?)?;
//!
//! let mut builder = ContextBuilder::new("user-1", "https://api.deepseek.com/v1", "deepseek-chat");
//! builder.set_system_prompt("You are a helpful assistant.", None);
//! client.session_replay_context("session-id", &mut builder).await?;
//!
//! let ctx = builder.build("latest-trace-id");
//! println!("{}", replay::encode_pretty(&ctx)?);
//! # Ok(())
//! # }
//! ```

mod client;
mod replay;
mod types;

pub use client::{
    ClientConfig, ClientError, Result, TraceClient, DEFAULT_BASE_URL, ENV_BASE_URL,
    ENV_PUBLIC_KEY, ENV_SECRET_KEY,
};
pub use replay::{ReplayClient, ReplayResponse, DEFAULT_REPLAY_URL};
pub use types::*;
