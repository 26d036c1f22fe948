mod schema;

pub use schema::{
    BriefingConfig, Config, PathsConfig, DEFAULT_BRIEFING_MODEL, DEFAULT_DATA_DIR, DEFAULT_OUT_DIR,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/risk-bro/)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("risk-bro"))
}

/// Get the default config file path (~/.config/risk-bro/config.yaml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// An explicit `path` must exist. Without one, the default path is used if
/// present; otherwise every setting takes its built-in default.
///
/// # Errors
///
/// Returns an error if:
/// - An explicit config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed or contains unknown keys
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found at {}", p.display());
            }
            p
        }
        None => match get_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };

    read_config(&config_path)
}

fn read_config(config_path: &Path) -> Result<Config> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!("Failed to parse config: invalid YAML in {}", config_path.display())
    })?;

    Ok(config)
}

/// Validate the whole configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref scoring) = config.scoring {
        if let Err(scoring_errors) = crate::scoring::validate_scoring(scoring) {
            errors.extend(scoring_errors);
        }
    }

    if let Some(ref briefing) = config.briefing {
        if let Some(ref timeout) = briefing.timeout {
            match humantime::parse_duration(timeout) {
                Ok(d) if d.is_zero() => {
                    errors.push("briefing.timeout: must be greater than zero".to_string())
                }
                Ok(_) => {}
                Err(e) => errors.push(format!("briefing.timeout: invalid '{}' - {}", timeout, e)),
            }
        }
        if briefing.max_tokens == Some(0) {
            errors.push("briefing.max_tokens: must be at least 1".to_string());
        }
        if let Some(ref endpoint) = briefing.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                errors.push(format!(
                    "briefing.endpoint: '{}' must be an http(s) URL",
                    endpoint
                ));
            }
        }
        if briefing.api_key_env.as_deref().is_some_and(|v| v.trim().is_empty()) {
            errors.push("briefing.api_key_env: must not be empty".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
