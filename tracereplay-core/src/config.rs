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

//! Defaults applied when a replay context builder is created
//!
//! Loaded from the `[context]` table of the CLI configuration; library users
//! normally rely on [`ContextDefaults::default`].

use serde::{Deserialize, Serialize};

/// Sampling temperature seeded into a new model config
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Completion token limit seeded into a new model config
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Tags every snapshot carries unless the caller replaces the metadata
pub const DEFAULT_TAGS: [&str; 2] = ["replay", "chat"];

/// Builder seed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextDefaults {
    pub temperature: f64,
    pub max_tokens: u32,
    /// Empty means "not recorded"
    pub environment: String,
    pub tags: Vec<String>,
}

impl Default for ContextDefaults {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            environment: String::new(),
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl ContextDefaults {
    /// Defaults tagged with a deployment environment.
    pub fn for_environment(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            ..Self::default()
        }
    }
}
