use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::scoring::ScoringConfig;

pub const DEFAULT_DATA_DIR: &str = "sample_data";
pub const DEFAULT_OUT_DIR: &str = "reports";

pub const DEFAULT_BRIEFING_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_BRIEFING_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";
pub const DEFAULT_BRIEFING_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_MAX_TOKENS: u32 = 300;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub paths: Option<PathsConfig>,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,

    #[serde(default)]
    pub briefing: Option<BriefingConfig>,
}

/// Where inputs are read from and reports are written to.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub out_dir: Option<PathBuf>,
}

impl PathsConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    pub fn out_dir(&self) -> PathBuf {
        self.out_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR))
    }
}

/// AI committee briefing settings (OpenAI-compatible chat completions endpoint).
///
/// Example YAML:
/// ```yaml
/// briefing:
///   enabled: true
///   model: "llama3-8b-8192"
///   api_key_env: "GROQ_API_KEY"
///   timeout: "20s"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BriefingConfig {
    /// Request a briefing when the appetite report is built (default: true)
    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    /// Environment variable holding the API key (default: GROQ_API_KEY)
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Whole-request timeout as a humantime string, e.g. "20s" or "1m"
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl BriefingConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_BRIEFING_ENDPOINT)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_BRIEFING_MODEL)
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    /// Configured timeout; an unparseable value (rejected at startup) falls back to the default.
    pub fn timeout(&self) -> Duration {
        self.timeout
            .as_deref()
            .and_then(|s| humantime::parse_duration(s).ok())
            .unwrap_or(DEFAULT_BRIEFING_TIMEOUT)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}
