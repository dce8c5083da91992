//! Settings file handling: defaults, JSON file merge, environment overrides.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_max_elements() -> usize {
    1000
}
fn default_loop_limit() -> u32 {
    20
}
fn default_max_history() -> usize {
    10
}
fn default_wait_time_secs() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_oracle_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_oracle_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_oracle_timeout_secs() -> u64 {
    60
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
    #[serde(default = "default_loop_limit")]
    pub loop_limit: u32,
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,
    #[serde(default = "default_true")]
    pub headless_mode: bool,
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default = "default_oracle_base_url")]
    pub oracle_base_url: String,
    #[serde(default = "default_oracle_model")]
    pub oracle_model: String,
    #[serde(default = "default_oracle_timeout_secs")]
    pub oracle_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_elements: default_max_elements(),
            loop_limit: default_loop_limit(),
            max_history: default_max_history(),
            wait_time_secs: default_wait_time_secs(),
            headless_mode: true,
            debug_mode: false,
            oracle_base_url: default_oracle_base_url(),
            oracle_model: default_oracle_model(),
            oracle_timeout_secs: default_oracle_timeout_secs(),
        }
    }
}

impl Settings {
    /// Defaults, overlaid by the settings file when present, overlaid by
    /// `PAGEPILOT_*` environment variables.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading settings file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing settings file {}", path.display()))?
        } else {
            debug!(path = %path.display(), "no settings file, using defaults");
            Self::default()
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("writing settings file {}", path.display()))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<usize>("PAGEPILOT_MAX_ELEMENTS") {
            self.max_elements = v;
        }
        if let Some(v) = env_parse::<u32>("PAGEPILOT_LOOP_LIMIT") {
            self.loop_limit = v;
        }
        if let Some(v) = env_parse::<usize>("PAGEPILOT_MAX_HISTORY") {
            self.max_history = v;
        }
        if let Some(v) = env_parse::<u64>("PAGEPILOT_WAIT_TIME_SECS") {
            self.wait_time_secs = v;
        }
        if let Some(v) = env_parse::<bool>("PAGEPILOT_HEADLESS") {
            self.headless_mode = v;
        }
        if let Some(v) = env_parse::<bool>("PAGEPILOT_DEBUG") {
            self.debug_mode = v;
        }
        if let Ok(v) = std::env::var("PAGEPILOT_ORACLE_BASE_URL") {
            self.oracle_base_url = v;
        }
        if let Ok(v) = std::env::var("PAGEPILOT_ORACLE_MODEL") {
            self.oracle_model = v;
        }
        if let Some(v) = env_parse::<u64>("PAGEPILOT_ORACLE_TIMEOUT_SECS") {
            self.oracle_timeout_secs = v;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
