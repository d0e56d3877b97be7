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

//! Replay context codec
//!
//! Encoding is plain serde JSON over the context types; nothing derived is
//! stored, so `decode(encode(ctx)) == ctx` for every context `encode`
//! accepts. Decoding is all-or-nothing.
//!
//! [`to_canonical_messages`] flattens a context into the chat message list a
//! replay sends: the system prompt, then per turn the user message, the
//! assistant message and one `tool` message per recorded tool call.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{json_kind, ReplayError, Result};
use crate::message::{Message, ROLE_ASSISTANT, ROLE_USER};

use super::context::ReplayContext;

/// Trace output key holding the nested context document
pub const REPLAY_CONTEXT_KEY: &str = "replay_context";

/// Trace output key holding the string-encoded copy
pub const REPLAY_CONTEXT_JSON_KEY: &str = "replay_context_json";

/// Request body key replaced with the replayed messages
pub const HISTORY_KEY: &str = "history";

/// Fails with `NonFiniteParameter` for a context that would not decode back.
pub fn encode(ctx: &ReplayContext) -> Result<String> {
    ctx.validate()?;
    Ok(serde_json::to_string(ctx)?)
}

/// Indented encoding, for files meant to be read by people.
pub fn encode_pretty(ctx: &ReplayContext) -> Result<String> {
    ctx.validate()?;
    Ok(serde_json::to_string_pretty(ctx)?)
}

pub fn decode(document: &str) -> Result<ReplayContext> {
    Ok(serde_json::from_str(document)?)
}

pub fn encode_value(ctx: &ReplayContext) -> Result<Value> {
    ctx.validate()?;
    Ok(serde_json::to_value(ctx)?)
}

pub fn decode_value(document: Value) -> Result<ReplayContext> {
    Ok(serde_json::from_value(document)?)
}

/// Flatten a context into the message sequence sent on replay.
pub fn to_canonical_messages(ctx: &ReplayContext) -> Vec<Message> {
    let tool_messages = ctx.tool_call_count();
    let mut messages = Vec::with_capacity(1 + ctx.history.len() * 2 + tool_messages);

    messages.push(Message::new(
        ctx.system_prompt.role.clone(),
        ctx.system_prompt.content.clone(),
    ));
    for turn in &ctx.history {
        messages.push(turn.user_input.with_role(ROLE_USER));
        messages.push(turn.llm_response.with_role(ROLE_ASSISTANT));
        for call in &turn.tool_calls {
            messages.push(Message::tool_result(call.result.clone(), call.tool_id.clone()));
        }
    }
    messages
}

/// Store `ctx` in a trace output object under `replay_context`, and a
/// string-encoded copy under `replay_context_json` when `with_string_copy`.
///
/// A null output starts a fresh object; any other non-object is rejected.
pub fn embed_in_output(ctx: &ReplayContext, output: Value, with_string_copy: bool) -> Result<Value> {
    let mut object = match output {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => return Err(ReplayError::InvalidOutput(json_kind(&other))),
    };
    object.insert(REPLAY_CONTEXT_KEY.to_string(), encode_value(ctx)?);
    if with_string_copy {
        object.insert(REPLAY_CONTEXT_JSON_KEY.to_string(), Value::String(encode(ctx)?));
    }
    Ok(Value::Object(object))
}

/// Read a context back from a trace output, preferring the nested copy.
pub fn extract_from_output(output: &Value) -> Result<ReplayContext> {
    if let Some(nested) = output.get(REPLAY_CONTEXT_KEY).filter(|v| !v.is_null()) {
        return decode_value(nested.clone());
    }
    match output.get(REPLAY_CONTEXT_JSON_KEY) {
        Some(Value::String(document)) => {
            debug!("Decoding replay context from its string-encoded copy");
            decode(document)
        }
        _ => Err(ReplayError::MissingReplayContext),
    }
}

/// Copy of `template` with `history` replaced by `messages`.
pub fn build_replay_request(template: &Value, messages: &[Message]) -> Result<Value> {
    let mut body = match template {
        Value::Object(map) => map.clone(),
        other => return Err(ReplayError::InvalidTemplate(json_kind(other))),
    };
    body.insert(HISTORY_KEY.to_string(), serde_json::to_value(messages)?);
    Ok(Value::Object(body))
}
