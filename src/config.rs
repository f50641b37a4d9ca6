use anyhow::Result;
use std::path::PathBuf;

use crate::database::Database;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub const API_KEY_CONFIG: &str = "gemini_api_key";
pub const MODEL_CONFIG: &str = "gemini_model";
pub const BASE_URL_CONFIG: &str = "gemini_base_url";

pub const KNOWN_CONFIG_KEYS: [&str; 3] = [API_KEY_CONFIG, MODEL_CONFIG, BASE_URL_CONFIG];

/// Connection settings for the completion service. The key may be absent;
/// that only becomes an error when a request is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl AiConfig {
    /// Environment first, then the config table, then defaults.
    pub fn resolve(db: &Database) -> Result<Self> {
        Self::from_sources(|name| std::env::var(name).ok(), db)
    }

    fn from_sources(env: impl Fn(&str) -> Option<String>, db: &Database) -> Result<Self> {
        let lookup = |env_name: &str, config_key: &str| -> Result<Option<String>> {
            if let Some(value) = env(env_name).filter(|v| !v.trim().is_empty()) {
                return Ok(Some(value));
            }
            Ok(db.get_config(config_key)?.filter(|v| !v.trim().is_empty()))
        };

        Ok(AiConfig {
            api_key: lookup("GEMINI_API_KEY", API_KEY_CONFIG)?,
            model: lookup("GEMINI_MODEL", MODEL_CONFIG)?.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup("GEMINI_BASE_URL", BASE_URL_CONFIG)?
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}

pub fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}

pub fn database_path() -> PathBuf {
    match std::env::var("TASKPILOT_DB") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => home_dir().join(".taskpilot.db"),
    }
}

pub fn log_dir() -> PathBuf {
    home_dir().join(".taskpilot").join("logs")
}

pub fn log_level() -> String {
    std::env::var("TASKPILOT_LOG").unwrap_or_else(|_| "info".to_string())
}

/// Hides all but the last four characters of secrets in listings.
pub fn display_value(key: &str, value: &str) -> String {
    if key != API_KEY_CONFIG {
        return value.to_string();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
