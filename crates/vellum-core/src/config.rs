// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runtime settings for a [`RenderContext`](crate::RenderContext).

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// A collection of settings that tune how a render context manages uploads and waits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// When a staging ring must be (re)allocated, it is sized to
    /// `staging_growth_factor * requested bytes`, capped at the main buffer size.
    pub staging_growth_factor: u64,
    /// The longest single client wait a device should issue while servicing
    /// a longer `wait_signal` timeout.
    pub wait_poll_interval_nanos: u64,
    /// If `true`, every dispatched command is logged at `trace` level.
    pub trace_commands: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            staging_growth_factor: 3,
            wait_poll_interval_nanos: 1_000_000,
            trace_commands: false,
        }
    }
}

impl ContextConfig {
    /// Parses a configuration from a JSON document.
    ///
    /// Missing fields fall back to their [`Default`] values.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse render context configuration")?;
        if config.staging_growth_factor == 0 {
            anyhow::bail!("staging_growth_factor must be at least 1");
        }
        Ok(config)
    }
}
