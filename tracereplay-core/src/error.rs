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

//! Replay pipeline error types

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for replay operations
pub type Result<T> = std::result::Result<T, ReplayError>;

/// Errors raised while assembling or decoding a replay context.
///
/// Shape mismatches in observation payloads are never errors; the normalizer
/// degrades instead. Everything here is a hard failure for the caller.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The trace has no observation of type GENERATION
    #[error("No generation observation found in trace {trace_id}")]
    NoGenerationFound { trace_id: String },

    /// A tool call ended before it started
    #[error("Tool call {tool_id} ends at {end} before it starts at {start}")]
    InvalidToolTiming {
        tool_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A successful tool call was given an error message
    #[error("Tool call {tool_id} is marked successful but carries error: {error}")]
    InconsistentToolOutcome { tool_id: String, error: String },

    /// Neither `replay_context` nor `replay_context_json` is present
    #[error("Trace output carries no replay context")]
    MissingReplayContext,

    /// Trace output is not a JSON object
    #[error("Trace output must be a JSON object, got {0}")]
    InvalidOutput(&'static str),

    /// Replay request template is not a JSON object
    #[error("Replay request template must be a JSON object, got {0}")]
    InvalidTemplate(&'static str),

    /// A float parameter is NaN or infinite and cannot be encoded
    #[error("Parameter {field} must be finite, got {value}")]
    NonFiniteParameter { field: &'static str, value: f64 },

    /// Malformed replay context document
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Human-readable name of a JSON value's kind, used in error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
