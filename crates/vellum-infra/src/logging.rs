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

//! Logging setup on top of `env_logger`.

use env_logger::{Builder, Env, WriteStyle};

/// When log output is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogWriteStyle {
    /// Color when writing to a terminal.
    #[default]
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

/// How the global logger is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// The default filter, in `env_logger` syntax. `RUST_LOG` overrides it.
    pub filter: String,
    /// When output is colored.
    pub write_style: LogWriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            write_style: LogWriteStyle::Auto,
        }
    }
}

impl From<LogWriteStyle> for WriteStyle {
    fn from(style: LogWriteStyle) -> Self {
        match style {
            LogWriteStyle::Auto => WriteStyle::Auto,
            LogWriteStyle::Always => WriteStyle::Always,
            LogWriteStyle::Never => WriteStyle::Never,
        }
    }
}

/// Installs the global logger.
///
/// Returns `false` if a logger was already installed, in which case nothing changes.
pub fn init_logging(config: &LoggingConfig) -> bool {
    Builder::from_env(Env::default().default_filter_or(config.filter.as_str()))
        .write_style(config.write_style.into())
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_a_no_op() {
        let config = LoggingConfig {
            filter: "debug".to_owned(),
            ..Default::default()
        };
        // Another test may already have installed a logger in this process.
        init_logging(&config);
        assert!(!init_logging(&config));
        log::debug!("logging is installed");
    }
}
