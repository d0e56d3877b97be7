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

//! Observation payload normalization
//!
//! An observation's `input`/`output` can be a string, a message object, an
//! array of messages, or null. [`ObservationPayload::classify`] inspects the
//! JSON once; everything downstream only sees [`Message`] sequences.
//!
//! Mapping:
//! - array: object elements become messages as-is, other elements are dropped
//! - object: exactly one message, role left absent if the object has none
//! - scalar: one message with the role implied by the field
//! - null: no messages
//!
//! Normalization never fails.

use serde_json::{Map, Value};
use tracing::debug;

use crate::message::{Message, ROLE_ASSISTANT, ROLE_USER};

/// Which side of an observation a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Input,
    Output,
}

impl FieldRole {
    /// Role given to synthesized messages for this field.
    pub fn default_role(self) -> &'static str {
        match self {
            FieldRole::Input => ROLE_USER,
            FieldRole::Output => ROLE_ASSISTANT,
        }
    }
}

/// Closed classification of an untyped payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationPayload<'a> {
    Null,
    Scalar(&'a Value),
    SingleObject(&'a Map<String, Value>),
    ObjectArray(&'a [Value]),
}

impl<'a> ObservationPayload<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Null => ObservationPayload::Null,
            Value::Object(map) => ObservationPayload::SingleObject(map),
            Value::Array(items) => ObservationPayload::ObjectArray(items),
            scalar => ObservationPayload::Scalar(scalar),
        }
    }

    pub fn into_messages(self, field: FieldRole) -> Vec<Message> {
        match self {
            ObservationPayload::Null => Vec::new(),
            ObservationPayload::Scalar(scalar) => {
                vec![Message::new(field.default_role(), scalar.clone())]
            }
            ObservationPayload::SingleObject(map) => vec![Message::from_object(map.clone())],
            ObservationPayload::ObjectArray(items) => {
                let messages: Vec<Message> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => Some(Message::from_object(map.clone())),
                        _ => None,
                    })
                    .collect();
                let dropped = items.len() - messages.len();
                if dropped > 0 {
                    debug!(
                        field = ?field,
                        dropped,
                        kept = messages.len(),
                        "Dropped non-object elements from message array"
                    );
                }
                messages
            }
        }
    }
}

/// Normalize one observation field into an ordered message list.
pub fn normalize(value: &Value, field: FieldRole) -> Vec<Message> {
    ObservationPayload::classify(value).into_messages(field)
}
