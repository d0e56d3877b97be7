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

//! Tracereplay Core
//!
//! Turns trace records from an LLM tracing backend into replayable
//! conversation contexts.
//!
//! Pipeline: [`TraceDocument`] → [`turn::extract_generation`] (via
//! [`normalize::normalize`]) → [`ContextBuilder`] → [`ReplayContext`] →
//! [`replay::encode`] or [`replay::to_canonical_messages`].
//!
//! Everything here is synchronous and does no I/O.

pub mod config;
pub mod error;
pub mod message;
pub mod normalize;
pub mod observation;
pub mod replay;
pub mod serde_helpers;
pub mod tool;
pub mod trace;
pub mod turn;

pub use config::ContextDefaults;
pub use error::{ReplayError, Result};
pub use message::Message;
pub use normalize::{normalize, FieldRole, ObservationPayload};
pub use observation::{ObservationLevel, ObservationRecord, ObservationType, Usage};
pub use replay::{
    ContextBuilder, ModelConfig, ReplayContext, SessionMetadata, SystemPrompt, ToolDefinition,
};
pub use tool::{ToolCallExecution, ToolCallRecorder, ToolInvocation};
pub use trace::{Score, TraceDocument};
pub use turn::{
    extract_first_generation, extract_generation, extract_session_turns, ConversationTurn,
    GenerationExtract, TokenUsage,
};
