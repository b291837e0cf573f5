//! Demo configuration
//!
//! Loaded from `.reflaction-demo.toml` in the current directory, falling back
//! to the same file in the home directory, then to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CONFIG_FILE: &str = ".reflaction-demo.toml";

/// Settings for the counter host
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DemoConfig {
    /// Counter value the store starts with
    #[serde(default = "default_initial_count")]
    pub initial_count: i64,

    /// Amount used by `inc`/`dec` without an argument
    #[serde(default = "default_step")]
    pub step: i64,

    /// Increments that would pass this value are blocked by middleware
    #[serde(default = "default_max_count")]
    pub max_count: i64,

    /// Pause between dispatches in async flows
    #[serde(default = "default_flow_delay_ms")]
    pub flow_delay_ms: u64,

    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_initial_count() -> i64 {
    0
}

fn default_step() -> i64 {
    1
}

fn default_max_count() -> i64 {
    1_000
}

fn default_flow_delay_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            initial_count: default_initial_count(),
            step: default_step(),
            max_count: default_max_count(),
            flow_delay_ms: default_flow_delay_ms(),
            log_level: default_log_level(),
        }
    }
}

impl DemoConfig {
    /// Load config from CWD first, then home directory, or use defaults
    ///
    /// A missing file yields the defaults; a file that fails to parse is an
    /// error. Runs before logging is set up, so callers report the error.
    pub fn load() -> Result<Self> {
        Self::from_content(load_config_file())
    }

    fn from_content(content: Option<String>) -> Result<Self> {
        match content {
            Some(content) => {
                Self::parse(&content).with_context(|| format!("Invalid {}", CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse demo config")
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Config file content from CWD first, then the home directory
fn load_config_file() -> Option<String> {
    if let Ok(content) = std::fs::read_to_string(CONFIG_FILE) {
        return Some(content);
    }

    let home_config = home_config_path()?;
    std::fs::read_to_string(home_config).ok()
}

fn home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE))
}
