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

//! Canonical chat message
//!
//! A [`Message`] is the unit every stage after the normalizer works with. It
//! mirrors the OpenAI chat message layout but keeps unknown keys (`name`,
//! `function_call`, ...) so an exported history is byte-faithful to what the
//! application actually sent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";
pub const ROLE_TOOL: &str = "tool";

/// One chat message.
///
/// `role` is optional on purpose: a source object without a role keeps that
/// absence. `content` is `None` only when the source had no `content` key; an
/// explicit `null` is kept and written back as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Message {
    pub role: Option<String>,

    pub content: Option<Value>,

    pub tool_calls: Option<Value>,

    pub tool_call_id: Option<String>,

    /// Any other keys of the source object, in source order
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<Value>) -> Self {
        Self {
            role: Some(role.into()),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            extra: Map::new(),
        }
    }

    pub fn system(content: impl Into<Value>) -> Self {
        Self::new(ROLE_SYSTEM, content)
    }

    pub fn user(content: impl Into<Value>) -> Self {
        Self::new(ROLE_USER, content)
    }

    pub fn assistant(content: impl Into<Value>) -> Self {
        Self::new(ROLE_ASSISTANT, content)
    }

    /// Result of a tool invocation, answering the call identified by `tool_call_id`.
    pub fn tool_result(content: impl Into<Value>, tool_call_id: impl Into<String>) -> Self {
        let mut message = Self::new(ROLE_TOOL, content);
        message.tool_call_id = Some(tool_call_id.into());
        message
    }

    /// Build a message from a JSON object taken as-is.
    ///
    /// Never fails. A `role` or `tool_call_id` that is not a string stays
    /// among the extra keys untouched. Explicit `null` values are kept.
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        let role = take_string(&mut object, "role");
        let content = object.shift_remove("content");
        let tool_calls = object.shift_remove("tool_calls");
        let tool_call_id = take_string(&mut object, "tool_call_id");

        Self {
            role,
            content,
            tool_calls,
            tool_call_id,
            extra: object,
        }
    }

    /// The message role, or `default` when the source carried none.
    pub fn role_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.role.as_deref().unwrap_or(default)
    }

    /// Copy of this message with its role replaced. A non-string `role` kept
    /// among the extra keys is dropped.
    pub fn with_role(&self, role: &str) -> Self {
        let mut message = self.clone();
        message.role = Some(role.to_string());
        message.extra.shift_remove("role");
        message
    }

    /// Content rendered as text: strings verbatim, anything else as compact JSON.
    pub fn content_text(&self) -> String {
        match &self.content {
            Some(Value::String(text)) => text.clone(),
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Render back to a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.clone().into())
    }
}

impl From<Map<String, Value>> for Message {
    fn from(object: Map<String, Value>) -> Self {
        Self::from_object(object)
    }
}

// Typed fields win over an extra key of the same name, so every key is
// written once.
impl From<Message> for Map<String, Value> {
    fn from(message: Message) -> Self {
        let mut object = Map::new();
        if let Some(role) = message.role {
            object.insert("role".into(), Value::String(role));
        }
        if let Some(content) = message.content {
            object.insert("content".into(), content);
        }
        if let Some(calls) = message.tool_calls {
            object.insert("tool_calls".into(), calls);
        }
        if let Some(id) = message.tool_call_id {
            object.insert("tool_call_id".into(), Value::String(id));
        }
        for (key, value) in message.extra {
            if !object.contains_key(&key) {
                object.insert(key, value);
            }
        }
        object
    }
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !matches!(object.get(key), Some(Value::String(_))) {
        return None;
    }
    match object.shift_remove(key) {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_from_object_keeps_missing_role() {
        let message = Message::from_object(object(json!({"content": "hi"})));
        assert_eq!(message.role, None);
        assert_eq!(message.content, Some(json!("hi")));
        assert_eq!(message.role_or(ROLE_USER), "user");
    }

    #[test]
    fn test_from_object_keeps_extra_keys_in_order() {
        let message = Message::from_object(object(json!({
            "role": "assistant",
            "name": "planner",
            "content": "ok",
            "refusal": null
        })));
        assert_eq!(message.role.as_deref(), Some("assistant"));
        let keys: Vec<&str> = message.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "refusal"]);
    }

    #[test]
    fn test_non_string_role_stays_in_extra() {
        let message = Message::from_object(object(json!({"role": 7, "tool_call_id": false})));
        assert_eq!(message.role, None);
        assert_eq!(message.tool_call_id, None);
        assert_eq!(message.extra.get("role"), Some(&json!(7)));
        assert_eq!(message.extra.get("tool_call_id"), Some(&json!(false)));

        let encoded = serde_json::to_string(&message).unwrap();
        let decoded: Message = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_tool_result_shape() {
        let message = Message::tool_result("ok", "t1");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"role": "tool", "content": "ok", "tool_call_id": "t1"})
        );
        assert_eq!(message.to_value(), serde_json::to_value(&message).unwrap());
    }

    #[test]
    fn test_explicit_nulls_are_kept() {
        let source = json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{"id": "call_1"}]
        });
        let message = Message::from_object(object(source.clone()));
        assert_eq!(message.content, Some(Value::Null));
        assert_eq!(serde_json::to_value(&message).unwrap(), source);

        let null_calls = json!({"role": "assistant", "content": "x", "tool_calls": null});
        let message = Message::from_object(object(null_calls.clone()));
        assert_eq!(message.tool_calls, Some(Value::Null));
        assert_eq!(message.to_value(), null_calls);
    }

    #[test]
    fn test_missing_content_stays_missing() {
        let message = Message::from_object(object(json!({"role": "user"})));
        assert_eq!(message.content, None);
        assert_eq!(message.to_value(), json!({"role": "user"}));
    }

    #[test]
    fn test_with_role_replaces_non_string_role() {
        let message = Message::from_object(object(json!({"role": 7, "content": "hi"})));
        let forced = message.with_role(ROLE_USER);
        assert!(forced.extra.get("role").is_none());

        let encoded = serde_json::to_string(&forced).unwrap();
        assert_eq!(encoded, r#"{"role":"user","content":"hi"}"#);
        assert_eq!(forced.to_value()["role"], json!("user"));
    }

    #[test]
    fn test_typed_role_wins_over_extra_role() {
        let mut message = Message::user("hi");
        message.extra.insert("role".into(), json!(7));
        let encoded = serde_json::to_string(&message).unwrap();
        assert_eq!(encoded.matches("\"role\"").count(), 1);
        assert_eq!(message.to_value()["role"], json!("user"));
    }

    #[test]
    fn test_content_text() {
        assert_eq!(Message::user("Hello").content_text(), "Hello");
        assert_eq!(Message::user(json!([1, 2])).content_text(), "[1,2]");
        assert_eq!(Message::from_object(Map::new()).content_text(), "");
    }
}
