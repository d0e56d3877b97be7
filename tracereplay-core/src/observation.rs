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

//! Observation records as fetched from the tracing backend
//!
//! Type and level names are contract strings of the backend and are matched
//! exactly (case-sensitive). Unknown values are kept rather than rejected so a
//! newer backend does not break trace decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::serde_helpers::null_to_default;

/// Kind of an observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObservationType {
    Span,
    Generation,
    Event,
    Tool,
    Agent,
    Chain,
    Retriever,
    Evaluator,
    Embedding,
    Guardrail,
    /// Type name this crate does not know about.
    Other(String),
}

impl ObservationType {
    pub fn as_str(&self) -> &str {
        match self {
            ObservationType::Span => "SPAN",
            ObservationType::Generation => "GENERATION",
            ObservationType::Event => "EVENT",
            ObservationType::Tool => "TOOL",
            ObservationType::Agent => "AGENT",
            ObservationType::Chain => "CHAIN",
            ObservationType::Retriever => "RETRIEVER",
            ObservationType::Evaluator => "EVALUATOR",
            ObservationType::Embedding => "EMBEDDING",
            ObservationType::Guardrail => "GUARDRAIL",
            ObservationType::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for ObservationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObservationType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "SPAN" => ObservationType::Span,
            "GENERATION" => ObservationType::Generation,
            "EVENT" => ObservationType::Event,
            "TOOL" => ObservationType::Tool,
            "AGENT" => ObservationType::Agent,
            "CHAIN" => ObservationType::Chain,
            "RETRIEVER" => ObservationType::Retriever,
            "EVALUATOR" => ObservationType::Evaluator,
            "EMBEDDING" => ObservationType::Embedding,
            "GUARDRAIL" => ObservationType::Guardrail,
            other => ObservationType::Other(other.to_string()),
        })
    }
}

impl From<String> for ObservationType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<ObservationType> for String {
    fn from(kind: ObservationType) -> Self {
        kind.as_str().to_string()
    }
}

/// Severity the backend attaches to an observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObservationLevel {
    Debug,
    Default,
    Warning,
    Error,
    Other(String),
}

impl ObservationLevel {
    pub fn as_str(&self) -> &str {
        match self {
            ObservationLevel::Debug => "DEBUG",
            ObservationLevel::Default => "DEFAULT",
            ObservationLevel::Warning => "WARNING",
            ObservationLevel::Error => "ERROR",
            ObservationLevel::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for ObservationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for ObservationLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "DEBUG" => ObservationLevel::Debug,
            "DEFAULT" => ObservationLevel::Default,
            "WARNING" => ObservationLevel::Warning,
            "ERROR" => ObservationLevel::Error,
            _ => ObservationLevel::Other(s),
        }
    }
}

impl From<ObservationLevel> for String {
    fn from(level: ObservationLevel) -> Self {
        level.as_str().to_string()
    }
}

/// Token counts reported on a generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default, alias = "promptTokens", skip_serializing_if = "Option::is_none")]
    pub input: Option<u64>,
    #[serde(default, alias = "completionTokens", skip_serializing_if = "Option::is_none")]
    pub output: Option<u64>,
    #[serde(default, alias = "totalTokens", skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// One observation inside a trace. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub trace_id: String,
    #[serde(rename = "type")]
    pub kind: ObservationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<ObservationLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_observation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ObservationRecord {
    /// Minimal record, mostly useful for building fixtures.
    pub fn new(
        id: impl Into<String>,
        trace_id: impl Into<String>,
        kind: ObservationType,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            trace_id: trace_id.into(),
            kind,
            name: None,
            start_time,
            end_time: None,
            completion_start_time: None,
            input: Value::Null,
            output: Value::Null,
            model: None,
            model_parameters: None,
            usage: None,
            level: None,
            status_message: None,
            parent_observation_id: None,
            metadata: None,
        }
    }

    pub fn is_generation(&self) -> bool {
        self.kind == ObservationType::Generation
    }

    pub fn is_tool(&self) -> bool {
        self.kind == ObservationType::Tool
    }

    pub fn is_error(&self) -> bool {
        self.level == Some(ObservationLevel::Error)
    }

    /// Wall-clock duration in milliseconds, if the observation has ended.
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
    }
}
