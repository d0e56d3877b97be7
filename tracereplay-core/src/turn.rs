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

//! Conversation turns and the turn extractor
//!
//! A trace holds one generation observation per LLM call. The extractor takes
//! the first GENERATION in stored order, normalizes its input and output, and
//! collapses them to one representative user message and one assistant
//! message. The full concatenated message array is kept on
//! [`GenerationExtract`] for callers that export the exact history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ReplayError, Result};
use crate::message::{Message, ROLE_ASSISTANT, ROLE_USER};
use crate::normalize::{normalize, FieldRole};
use crate::observation::{ObservationRecord, Usage};
use crate::tool::ToolCallExecution;
use crate::trace::TraceDocument;

/// Token counts for one turn. Absent counts are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64, total_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

impl From<&Usage> for TokenUsage {
    fn from(usage: &Usage) -> Self {
        Self {
            prompt_tokens: usage.input.unwrap_or(0),
            completion_tokens: usage.output.unwrap_or(0),
            total_tokens: usage.total.unwrap_or(0),
        }
    }
}

/// One round of a conversation. Never mutated after it joins a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub round: u32,
    pub timestamp: DateTime<Utc>,
    /// Trace that produced this turn
    pub turn_id: String,
    pub user_input: Message,
    pub llm_response: Message,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallExecution>,
    #[serde(default)]
    pub token_usage: TokenUsage,
}

/// Everything the extractor derives from a trace's generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationExtract {
    pub observation_id: String,
    pub model: Option<String>,
    /// Normalized input followed by normalized output
    pub messages: Vec<Message>,
    pub turn: ConversationTurn,
}

/// Extract the turn of the trace's first generation as round 1.
pub fn extract_first_generation(trace: &TraceDocument) -> Result<ConversationTurn> {
    extract_generation(trace, 1).map(|extract| extract.turn)
}

/// Extract the first generation of `trace` as turn `round`.
pub fn extract_generation(trace: &TraceDocument, round: u32) -> Result<GenerationExtract> {
    let generation = trace
        .first_generation()
        .ok_or_else(|| ReplayError::NoGenerationFound {
            trace_id: trace.id.clone(),
        })?;

    let inputs = normalize(&generation.input, FieldRole::Input);
    let outputs = normalize(&generation.output, FieldRole::Output);

    let user_input = representative(&inputs, ROLE_USER);
    let llm_response = representative(&outputs, ROLE_ASSISTANT);
    let tool_calls: Vec<ToolCallExecution> = trace
        .tool_observations()
        .map(ToolCallExecution::from_observation)
        .collect();
    let token_usage = generation_usage(generation);

    debug!(
        trace_id = %trace.id,
        observation_id = %generation.id,
        input_messages = inputs.len(),
        output_messages = outputs.len(),
        tool_calls = tool_calls.len(),
        "Extracted generation"
    );

    let mut messages = inputs;
    messages.extend(outputs);

    Ok(GenerationExtract {
        observation_id: generation.id.clone(),
        model: generation.model.clone(),
        messages,
        turn: ConversationTurn {
            round,
            timestamp: generation.start_time,
            turn_id: trace.id.clone(),
            user_input,
            llm_response,
            tool_calls,
            token_usage,
        },
    })
}

/// Extract one turn per trace, numbering rounds over the traces that have a
/// generation. Traces without one are skipped.
pub fn extract_session_turns(traces: &[TraceDocument]) -> Vec<ConversationTurn> {
    let mut turns = Vec::with_capacity(traces.len());
    for trace in traces {
        let round = turns.len() as u32 + 1;
        match extract_generation(trace, round) {
            Ok(extract) => turns.push(extract.turn),
            Err(err) => warn!(trace_id = %trace.id, error = %err, "Skipping trace"),
        }
    }
    turns
}

/// Token usage of a generation, zero where the backend reported none.
pub fn generation_usage(generation: &ObservationRecord) -> TokenUsage {
    generation
        .usage
        .as_ref()
        .map(TokenUsage::from)
        .unwrap_or_default()
}

// First message whose role (defaulted to `role` when absent) is `role`; an
// empty message with that role when none matches.
fn representative(messages: &[Message], role: &str) -> Message {
    messages
        .iter()
        .find(|message| message.role_or(role) == role)
        .cloned()
        .unwrap_or_else(|| Message::new(role, ""))
}
