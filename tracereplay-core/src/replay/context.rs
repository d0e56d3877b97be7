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

//! Replay context value types
//!
//! A [`ReplayContext`] is a self-contained snapshot of one conversation: the
//! model settings, system prompt, tool definitions and every turn so far.
//! Field names are the serialized contract and must not change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ReplayError, Result};
use crate::message::ROLE_SYSTEM;
use crate::turn::ConversationTurn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(default)]
    pub top_p: f64,
    #[serde(default)]
    pub frequency_penalty: f64,
    #[serde(default)]
    pub presence_penalty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_params: Option<Map<String, Value>>,
}

impl ModelConfig {
    pub fn new(
        model: impl Into<String>,
        base_url: impl Into<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            base_url: base_url.into(),
            temperature,
            max_tokens,
            top_p: 0.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            extra_params: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPrompt {
    #[serde(default)]
    pub content: String,
    #[serde(default = "system_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl SystemPrompt {
    pub fn new(content: impl Into<String>, metadata: Option<Map<String, Value>>) -> Self {
        Self {
            content: content.into(),
            role: system_role(),
            metadata,
        }
    }
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self::new(String::new(), None)
    }
}

fn system_role() -> String {
    ROLE_SYSTEM.to_string()
}

/// Tool made available to the model, in OpenAI `tools` layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    #[serde(default)]
    pub function: Map<String, Value>,
}

impl ToolDefinition {
    /// A `"function"` tool with name, description and JSON-schema parameters.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        let mut function = Map::new();
        function.insert("name".into(), Value::String(name.into()));
        function.insert("description".into(), Value::String(description.into()));
        function.insert("parameters".into(), parameters);
        Self {
            tool_type: "function".to_string(),
            function,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.function.get("name").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Map<String, Value>>,
    #[serde(default)]
    pub response_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<Map<String, Value>>,
}

/// Immutable snapshot of a conversation, produced by
/// [`ContextBuilder::build`](crate::replay::ContextBuilder::build).
///
/// `history[i].round == i + 1` holds when the caller numbered rounds
/// correctly; the builder does not enforce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayContext {
    pub session_id: String,
    pub user_id: String,
    pub trace_id: String,
    pub timestamp: DateTime<Utc>,
    pub model_config: ModelConfig,
    #[serde(default)]
    pub system_prompt: SystemPrompt,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    #[serde(rename = "conversation_history", alias = "history", default)]
    pub history: Vec<ConversationTurn>,
    #[serde(default)]
    pub metadata: SessionMetadata,
}

impl ReplayContext {
    /// Total token usage across all turns.
    pub fn total_tokens(&self) -> u64 {
        self.history
            .iter()
            .map(|turn| turn.token_usage.total_tokens)
            .sum()
    }

    /// Number of recorded tool calls across all turns.
    pub fn tool_call_count(&self) -> usize {
        self.history.iter().map(|turn| turn.tool_calls.len()).sum()
    }

    /// Check every float parameter is finite. JSON has no NaN or infinity,
    /// so a non-finite value would be written as `null` and not read back.
    pub fn validate(&self) -> Result<()> {
        let config = &self.model_config;
        let params = [
            ("model_config.temperature", Some(config.temperature)),
            ("model_config.top_p", Some(config.top_p)),
            ("model_config.frequency_penalty", Some(config.frequency_penalty)),
            ("model_config.presence_penalty", Some(config.presence_penalty)),
            ("metadata.total_cost", self.metadata.total_cost),
        ];
        for (field, value) in params {
            if let Some(value) = value.filter(|v| !v.is_finite()) {
                return Err(ReplayError::NonFiniteParameter { field, value });
            }
        }
        Ok(())
    }
}
