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

//! Append-only accumulator for replay contexts
//!
//! One builder belongs to one conversation. It is not synchronized: callers
//! sharing it across threads must wrap it themselves. Configuration setters
//! overwrite (last write wins). Turns are appended as given; the builder does
//! not renumber or validate rounds.

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ContextDefaults;
use crate::message::Message;
use crate::tool::ToolCallExecution;
use crate::turn::{ConversationTurn, TokenUsage};

use super::context::{ModelConfig, ReplayContext, SessionMetadata, SystemPrompt, ToolDefinition};

#[derive(Debug, Clone)]
pub struct ContextBuilder {
    session_id: String,
    user_id: String,
    model_config: ModelConfig,
    system_prompt: SystemPrompt,
    tools: Vec<ToolDefinition>,
    history: Vec<ConversationTurn>,
    metadata: SessionMetadata,
}

impl ContextBuilder {
    /// New builder with temperature 0.7 and a 2000 token limit.
    pub fn new(
        user_id: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::with_defaults(user_id, base_url, model, &ContextDefaults::default())
    }

    pub fn with_defaults(
        user_id: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        defaults: &ContextDefaults,
    ) -> Self {
        Self {
            session_id: String::new(),
            user_id: user_id.into(),
            model_config: ModelConfig::new(
                model,
                base_url,
                defaults.temperature,
                defaults.max_tokens,
            ),
            system_prompt: SystemPrompt::default(),
            tools: Vec::new(),
            history: Vec::new(),
            metadata: SessionMetadata {
                environment: defaults.environment.clone(),
                tags: defaults.tags.clone(),
                ..SessionMetadata::default()
            },
        }
    }

    pub fn set_session_id(&mut self, session_id: impl Into<String>) -> &mut Self {
        self.session_id = session_id.into();
        self
    }

    pub fn set_system_prompt(
        &mut self,
        content: impl Into<String>,
        metadata: Option<Map<String, Value>>,
    ) -> &mut Self {
        self.system_prompt = SystemPrompt::new(content, metadata);
        self
    }

    /// Replace the tool list. Order is kept verbatim.
    pub fn set_tools(&mut self, tools: Vec<ToolDefinition>) -> &mut Self {
        self.tools = tools;
        self
    }

    pub fn set_model_params(&mut self, temperature: f64, max_tokens: u32) -> &mut Self {
        self.model_config.temperature = temperature;
        self.model_config.max_tokens = max_tokens;
        self
    }

    pub fn set_model_config(&mut self, model_config: ModelConfig) -> &mut Self {
        self.model_config = model_config;
        self
    }

    pub fn set_metadata(&mut self, metadata: SessionMetadata) -> &mut Self {
        self.metadata = metadata;
        self
    }

    /// Append a turn stamped with the current time.
    ///
    /// `round` is taken as given; callers increment it by one per call.
    pub fn add_turn(
        &mut self,
        round: u32,
        user_input: impl Into<String>,
        assistant_output: impl Into<String>,
        tool_calls: Vec<ToolCallExecution>,
        token_usage: TokenUsage,
        turn_id: impl Into<String>,
    ) -> &mut Self {
        self.add_conversation_turn(ConversationTurn {
            round,
            timestamp: Utc::now(),
            turn_id: turn_id.into(),
            user_input: Message::user(user_input.into()),
            llm_response: Message::assistant(assistant_output.into()),
            tool_calls,
            token_usage,
        })
    }

    /// Append an already-assembled turn, e.g. from the turn extractor.
    pub fn add_conversation_turn(&mut self, turn: ConversationTurn) -> &mut Self {
        debug!(
            round = turn.round,
            turn_id = %turn.turn_id,
            tool_calls = turn.tool_calls.len(),
            "Appending turn"
        );
        self.history.push(turn);
        self
    }

    /// Round number that follows the turns recorded so far.
    pub fn next_round(&self) -> u32 {
        self.history.len() as u32 + 1
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Snapshot the current state. Later mutation of the builder does not
    /// affect snapshots already taken.
    pub fn build(&self, trace_id: impl Into<String>) -> ReplayContext {
        ReplayContext {
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
            trace_id: trace_id.into(),
            timestamp: Utc::now(),
            model_config: self.model_config.clone(),
            system_prompt: self.system_prompt.clone(),
            tools: self.tools.clone(),
            history: self.history.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> ContextBuilder {
        ContextBuilder::new("user-1", "https://api.example.com/v1", "chat-model")
    }

    #[test]
    fn test_new_seeds_model_config() {
        let ctx = builder().build("trace-0");
        assert_eq!(ctx.user_id, "user-1");
        assert_eq!(ctx.model_config.model, "chat-model");
        assert_eq!(ctx.model_config.base_url, "https://api.example.com/v1");
        assert_eq!(ctx.model_config.temperature, 0.7);
        assert_eq!(ctx.model_config.max_tokens, 2000);
        assert_eq!(ctx.metadata.tags, vec!["replay", "chat"]);
        assert_eq!(ctx.system_prompt.role, "system");
    }

    #[test]
    fn test_rounds_in_sequence() {
        let mut b = builder();
        for round in 1..=3 {
            b.add_turn(
                round,
                format!("q{round}"),
                format!("a{round}"),
                Vec::new(),
                TokenUsage::default(),
                format!("trace-{round}"),
            );
        }
        let ctx = b.build("trace-3");
        assert_eq!(ctx.history.len(), 3);
        for (i, turn) in ctx.history.iter().enumerate() {
            assert_eq!(turn.round as usize, i + 1);
        }
        assert_eq!(b.next_round(), 4);
    }

    #[test]
    fn test_out_of_order_rounds_are_accepted() {
        let mut b = builder();
        b.add_turn(2, "q", "a", Vec::new(), TokenUsage::default(), "t")
            .add_turn(2, "q", "a", Vec::new(), TokenUsage::default(), "t");
        let rounds: Vec<u32> = b.history().iter().map(|t| t.round).collect();
        assert_eq!(rounds, vec![2, 2]);
    }

    #[test]
    fn test_setters_overwrite() {
        let mut b = builder();
        b.set_session_id("s-1")
            .set_session_id("s-2")
            .set_system_prompt("first", None)
            .set_system_prompt("second", Some(Map::from_iter([("v".to_string(), json!("1.0"))])))
            .set_model_params(0.1, 64)
            .set_tools(vec![ToolDefinition::function("a", "", json!({}))])
            .set_tools(vec![
                ToolDefinition::function("b", "", json!({})),
                ToolDefinition::function("c", "", json!({})),
            ]);

        let ctx = b.build("t");
        assert_eq!(ctx.session_id, "s-2");
        assert_eq!(ctx.system_prompt.content, "second");
        assert!(ctx.system_prompt.metadata.is_some());
        assert_eq!(ctx.model_config.temperature, 0.1);
        assert_eq!(ctx.model_config.max_tokens, 64);
        let names: Vec<_> = ctx.tools.iter().filter_map(ToolDefinition::name).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_snapshots_are_independent() {
        let mut b = builder();
        b.add_turn(1, "Hi", "Hello", Vec::new(), TokenUsage::default(), "t1");
        let first = b.build("t1");

        b.add_turn(2, "Bye", "Goodbye", Vec::new(), TokenUsage::default(), "t2")
            .set_system_prompt("changed", None);
        let second = b.build("t2");

        assert_eq!(first.history.len(), 1);
        assert_eq!(first.system_prompt.content, "");
        assert_eq!(second.history.len(), 2);
        assert_eq!(second.system_prompt.content, "changed");
    }

    #[test]
    fn test_set_metadata_replaces_default_tags() {
        let mut b = builder();
        b.set_metadata(SessionMetadata {
            environment: "prod".into(),
            tags: vec!["custom".into()],
            ..SessionMetadata::default()
        });
        let ctx = b.build("t");
        assert_eq!(ctx.metadata.tags, vec!["custom"]);
        assert_eq!(ctx.metadata.environment, "prod");
    }

    #[test]
    fn test_with_defaults() {
        let defaults = ContextDefaults {
            temperature: 0.0,
            max_tokens: 128,
            ..ContextDefaults::for_environment("ci")
        };
        let ctx = ContextBuilder::with_defaults("u", "http://x", "m", &defaults).build("t");
        assert_eq!(ctx.model_config.temperature, 0.0);
        assert_eq!(ctx.model_config.max_tokens, 128);
        assert_eq!(ctx.metadata.environment, "ci");
    }
}
