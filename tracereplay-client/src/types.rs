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

//! Tracing backend API documents
//!
//! Full traces use [`tracereplay_core::TraceDocument`]; this module covers
//! the listing and session endpoints, whose traces may carry observation ids
//! instead of full records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracereplay_core::serde_helpers::null_to_default;
use tracereplay_core::ObservationRecord;

/// Observation entry of a listed trace: an id or a full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationRef {
    Id(String),
    Full(Box<ObservationRecord>),
}

impl ObservationRef {
    pub fn id(&self) -> &str {
        match self {
            ObservationRef::Id(id) => id,
            ObservationRef::Full(record) => &record.id,
        }
    }
}

/// Trace as returned by list and session endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSummary {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default, deserialize_with = "null_to_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub observations: Vec<ObservationRef>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
}

/// Session with its traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub traces: Vec<TraceSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

/// One page of `GET /api/public/traces`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceList {
    #[serde(default, deserialize_with = "null_to_default")]
    pub data: Vec<TraceSummary>,
    pub meta: PageMeta,
}

impl TraceList {
    pub fn has_next_page(&self) -> bool {
        self.meta.page < self.meta.total_pages
    }
}

/// Filters for listing traces. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTracesParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub session_id: Option<String>,
    /// Sent as repeated `tags` parameters
    pub tags: Vec<String>,
}

impl ListTracesParams {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(user_id) = &self.user_id {
            pairs.push(("userId", user_id.clone()));
        }
        if let Some(name) = &self.name {
            pairs.push(("name", name.clone()));
        }
        if let Some(session_id) = &self.session_id {
            pairs.push(("sessionId", session_id.clone()));
        }
        for tag in &self.tags {
            pairs.push(("tags", tag.clone()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_pairs() {
        let params = ListTracesParams {
            page: Some(2),
            limit: Some(10),
            session_id: Some("s-1".into()),
            tags: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        assert_eq!(
            params.query_pairs(),
            vec![
                ("page", "2".to_string()),
                ("limit", "10".to_string()),
                ("sessionId", "s-1".to_string()),
                ("tags", "a".to_string()),
                ("tags", "b".to_string()),
            ]
        );
        assert!(ListTracesParams::default().query_pairs().is_empty());
    }

    #[test]
    fn test_observation_refs_accept_ids_and_records() {
        let summary: TraceSummary = serde_json::from_value(json!({
            "id": "trace-1",
            "timestamp": "2024-05-01T10:00:00Z",
            "observations": [
                "obs-1",
                {"id": "obs-2", "type": "GENERATION", "startTime": "2024-05-01T10:00:00Z"}
            ],
            "tags": null
        }))
        .unwrap();

        assert_eq!(summary.observations.len(), 2);
        assert!(matches!(summary.observations[0], ObservationRef::Id(_)));
        assert!(matches!(summary.observations[1], ObservationRef::Full(_)));
        assert_eq!(summary.observations[1].id(), "obs-2");
        assert!(summary.tags.is_empty());
    }

    #[test]
    fn test_trace_list_paging() {
        let list: TraceList = serde_json::from_value(json!({
            "data": [],
            "meta": {"page": 1, "limit": 50, "totalItems": 120, "totalPages": 3}
        }))
        .unwrap();
        assert!(list.has_next_page());
        assert_eq!(list.meta.total_items, 120);
    }
}
