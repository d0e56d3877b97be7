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

//! Replay context assembly
//!
//! [`ContextBuilder`] accumulates turns into a [`ReplayContext`] snapshot;
//! [`codec`] serializes snapshots and projects them back into messages.

pub mod builder;
pub mod codec;
pub mod context;

pub use builder::ContextBuilder;
pub use codec::{
    build_replay_request, decode, decode_value, embed_in_output, encode, encode_pretty,
    encode_value, extract_from_output, to_canonical_messages,
};
pub use context::{ModelConfig, ReplayContext, SessionMetadata, SystemPrompt, ToolDefinition};
