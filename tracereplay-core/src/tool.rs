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

//! Tool execution records
//!
//! Tool failures are data: a failed call is recorded with `success = false`
//! and still belongs to its turn. Only contract violations (negative duration,
//! a successful call with an error) are rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ReplayError, Result};
use crate::observation::ObservationRecord;

/// Error text used when a failed tool observation has no status message.
pub const DEFAULT_TOOL_ERROR: &str = "tool observation reported level ERROR";

/// What the model asked to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub tool_id: String,
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    pub fn new(
        tool_name: impl Into<String>,
        tool_id: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_id: tool_id.into(),
            arguments,
        }
    }

    /// Parse one entry of an assistant message's `tool_calls` array.
    ///
    /// Expects `{"id", "function": {"name", "arguments"}}` where `arguments`
    /// is a JSON-encoded object or an object. Returns `None` when the entry
    /// has no function name.
    pub fn from_openai_tool_call(call: &Value) -> Option<Self> {
        let function = call.get("function")?;
        let tool_name = function.get("name")?.as_str()?.to_string();
        let tool_id = call
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let arguments = parse_arguments(&tool_name, function.get("arguments"));
        Some(Self {
            tool_name,
            tool_id,
            arguments,
        })
    }
}

/// One tool invocation with its result, timing and outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallExecution {
    pub tool_name: String,
    pub tool_id: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    #[serde(default)]
    pub result: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCallExecution {
    /// Record a finished tool call.
    ///
    /// `end_time` must not precede `start_time`, and a successful call must
    /// not carry an error.
    pub fn record(
        invocation: ToolInvocation,
        result: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        success: bool,
        error: Option<String>,
    ) -> Result<Self> {
        if end_time < start_time {
            return Err(ReplayError::InvalidToolTiming {
                tool_id: invocation.tool_id,
                start: start_time,
                end: end_time,
            });
        }
        if success {
            if let Some(error) = error {
                return Err(ReplayError::InconsistentToolOutcome {
                    tool_id: invocation.tool_id,
                    error,
                });
            }
        }
        Ok(Self::assemble(
            invocation,
            result.into(),
            start_time,
            end_time,
            success,
            error,
        ))
    }

    pub fn succeeded(
        invocation: ToolInvocation,
        result: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self> {
        Self::record(invocation, result, start_time, end_time, true, None)
    }

    pub fn failed(
        invocation: ToolInvocation,
        error: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self> {
        Self::record(
            invocation,
            String::new(),
            start_time,
            end_time,
            false,
            Some(error.into()),
        )
    }

    /// Convert a TOOL observation into an execution record.
    ///
    /// Reads `tool_name`, `tool_id` and `arguments` from an object input and
    /// `result` from an object output, falling back to the observation's name,
    /// id and raw output. Level ERROR marks the call failed with the status
    /// message as its error.
    pub fn from_observation(observation: &ObservationRecord) -> Self {
        let input = observation.input.as_object();
        let field = |key: &str| input.and_then(|map| map.get(key)).and_then(Value::as_str);

        let tool_name = field("tool_name")
            .map(str::to_string)
            .or_else(|| observation.name.clone())
            .unwrap_or_default();
        let tool_id = field("tool_id")
            .map(str::to_string)
            .unwrap_or_else(|| observation.id.clone());
        let arguments = match input {
            Some(map) if map.contains_key("arguments") => {
                parse_arguments(&tool_name, map.get("arguments"))
            }
            Some(map) => {
                let mut rest = map.clone();
                rest.shift_remove("tool_name");
                rest.shift_remove("tool_id");
                rest
            }
            None => Map::new(),
        };
        let result = match observation.output.get("result") {
            Some(result) => value_text(result),
            None => value_text(&observation.output),
        };

        let start_time = observation.start_time;
        let mut end_time = observation.end_time.unwrap_or(start_time);
        if end_time < start_time {
            warn!(
                observation_id = %observation.id,
                "Tool observation ends before it starts; clamping duration to zero"
            );
            end_time = start_time;
        }

        let (success, error) = if observation.is_error() {
            let message = observation
                .status_message
                .clone()
                .unwrap_or_else(|| DEFAULT_TOOL_ERROR.to_string());
            (false, Some(message))
        } else {
            (true, None)
        };

        Self::assemble(
            ToolInvocation {
                tool_name,
                tool_id,
                arguments,
            },
            result,
            start_time,
            end_time,
            success,
            error,
        )
    }

    fn assemble(
        invocation: ToolInvocation,
        result: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        success: bool,
        error: Option<String>,
    ) -> Self {
        let duration_ms = (end_time - start_time).num_milliseconds().max(0) as u64;
        Self {
            tool_name: invocation.tool_name,
            tool_id: invocation.tool_id,
            arguments: invocation.arguments,
            result,
            start_time,
            end_time,
            duration_ms,
            success,
            error,
        }
    }
}

/// Live handle for a tool call in flight.
///
/// Captures the start time on [`ToolCallRecorder::start`] and the end time
/// when finished or failed, so call sites never compute timings by hand.
#[derive(Debug)]
pub struct ToolCallRecorder {
    invocation: ToolInvocation,
    start_time: DateTime<Utc>,
}

impl ToolCallRecorder {
    pub fn start(invocation: ToolInvocation) -> Self {
        Self {
            invocation,
            start_time: Utc::now(),
        }
    }

    pub fn invocation(&self) -> &ToolInvocation {
        &self.invocation
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn finish(self, result: impl Into<String>) -> ToolCallExecution {
        let end_time = self.end_time();
        ToolCallExecution::assemble(
            self.invocation,
            result.into(),
            self.start_time,
            end_time,
            true,
            None,
        )
    }

    pub fn fail(self, error: impl Into<String>) -> ToolCallExecution {
        let end_time = self.end_time();
        ToolCallExecution::assemble(
            self.invocation,
            String::new(),
            self.start_time,
            end_time,
            false,
            Some(error.into()),
        )
    }

    // The wall clock may step backwards between start and finish.
    fn end_time(&self) -> DateTime<Utc> {
        Utc::now().max(self.start_time)
    }
}

fn parse_arguments(tool_name: &str, raw: Option<&Value>) -> Map<String, Value> {
    match raw {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(text)) if text.trim().is_empty() => Map::new(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            _ => {
                warn!(tool = %tool_name, "Tool arguments are not a JSON object; recording none");
                Map::new()
            }
        },
        Some(Value::Null) | None => Map::new(),
        Some(_) => {
            warn!(tool = %tool_name, "Tool arguments are not a JSON object; recording none");
            Map::new()
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
