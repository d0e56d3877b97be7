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

//! Fetched trace documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::observation::ObservationRecord;
use crate::serde_helpers::null_to_default;

/// Score attached to a trace by an evaluator or a human.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A trace with its full observation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default, deserialize_with = "null_to_default")]
    pub tags: Vec<String>,
    /// Observations in the order the backend stored them
    #[serde(default, deserialize_with = "null_to_default")]
    pub observations: Vec<ObservationRecord>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub scores: Vec<Score>,
}

impl TraceDocument {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: None,
            user_id: None,
            session_id: None,
            timestamp,
            input: Value::Null,
            output: Value::Null,
            metadata: Value::Null,
            tags: Vec::new(),
            observations: Vec::new(),
            scores: Vec::new(),
        }
    }

    /// First GENERATION observation in stored order.
    pub fn first_generation(&self) -> Option<&ObservationRecord> {
        self.observations.iter().find(|obs| obs.is_generation())
    }

    /// TOOL observations in stored order.
    pub fn tool_observations(&self) -> impl Iterator<Item = &ObservationRecord> {
        self.observations.iter().filter(|obs| obs.is_tool())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::ObservationType;
    use serde_json::json;

    #[test]
    fn test_decode_trace_with_null_collections() {
        let trace: TraceDocument = serde_json::from_value(json!({
            "id": "trace-1",
            "name": "chat",
            "userId": "u-1",
            "sessionId": "s-1",
            "timestamp": "2024-05-01T10:00:00Z",
            "input": "Q",
            "output": {"answer": "A"},
            "metadata": null,
            "tags": null,
            "observations": null,
            "scores": null
        }))
        .unwrap();

        assert_eq!(trace.user_id.as_deref(), Some("u-1"));
        assert_eq!(trace.session_id.as_deref(), Some("s-1"));
        assert!(trace.tags.is_empty());
        assert!(trace.observations.is_empty());
        assert!(trace.first_generation().is_none());
    }

    #[test]
    fn test_first_generation_is_stable() {
        let ts = Utc::now();
        let mut trace = TraceDocument::new("trace-1", ts);
        trace.observations = vec![
            ObservationRecord::new("span", "trace-1", ObservationType::Span, ts),
            ObservationRecord::new("gen-a", "trace-1", ObservationType::Generation, ts),
            ObservationRecord::new("tool", "trace-1", ObservationType::Tool, ts),
            ObservationRecord::new("gen-b", "trace-1", ObservationType::Generation, ts),
        ];

        assert_eq!(trace.first_generation().map(|g| g.id.as_str()), Some("gen-a"));
        assert_eq!(trace.tool_observations().count(), 1);
    }
}
