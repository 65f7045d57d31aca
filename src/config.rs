use std::collections::HashMap;
use std::env::{self, VarError};
use std::str::FromStr;

use tracing::warn;

use crate::error::{AppError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Keys issued for project-scoped access all carry this prefix.
pub const API_KEY_PREFIX: &str = "sk-proj-";

const API_KEY_VAR: &str = "OPENAI_API_KEY";

const ENV_KEYS: [&str; 5] = [
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "SUMMARY_MODEL",
    "PAPER_URL",
    "SUMMARY_FORMAT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(AppError::ConfigError(format!(
                "Invalid SUMMARY_FORMAT '{}', expected 'markdown' or 'json'",
                other
            ))),
        }
    }
}

/// Settings read once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub paper_url: Option<String>,
    pub output: OutputFormat,
}

impl Config {
    pub fn load() -> Result<Self> {
        // A missing .env file is fine; the process environment may carry everything.
        dotenv::dotenv().ok();

        Self::from_env(|key| env::var(key))
    }

    /// Build from an `env::var`-shaped reader. A non-unicode credential is
    /// dropped with a warning; non-unicode values for other keys are errors.
    pub fn from_env<R>(read: R) -> Result<Self>
    where
        R: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let mut vars = HashMap::new();
        for key in ENV_KEYS {
            match read(key) {
                Ok(value) => {
                    vars.insert(key, value);
                }
                Err(VarError::NotPresent) => {}
                Err(VarError::NotUnicode(_)) if key == API_KEY_VAR => {
                    warn!("{} is not valid unicode; continuing without an API key", API_KEY_VAR);
                }
                Err(e) => return Err(AppError::from(e)),
            }
        }

        Self::from_lookup(|key| vars.get(key).cloned())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let output = match non_empty("SUMMARY_FORMAT") {
            Some(raw) => raw.parse()?,
            None => OutputFormat::default(),
        };

        let api_base = non_empty("OPENAI_BASE_URL")
            .map(|base| base.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Config {
            // The key is kept exactly as given so the whitespace check can see it.
            api_key: lookup(API_KEY_VAR).filter(|k| !k.is_empty()),
            api_base,
            model: non_empty("SUMMARY_MODEL")
                .map(|m| m.trim().to_string())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            paper_url: non_empty("PAPER_URL").map(|u| u.trim().to_string()),
            output,
        })
    }
}

/// Weak sanity checks on the credential. Passing them says nothing about
/// whether the service will accept the key.
pub fn check_api_key(api_key: Option<&str>) -> Result<()> {
    let key = match api_key {
        Some(key) if !key.is_empty() => key,
        _ => {
            return Err(AppError::ConfigError(
                "No API key was found; set OPENAI_API_KEY in the environment or a .env file"
                    .to_string(),
            ));
        }
    };

    if !key.starts_with(API_KEY_PREFIX) {
        return Err(AppError::ConfigError(format!(
            "An API key was found, but it does not start with {}",
            API_KEY_PREFIX
        )));
    }

    if key.trim() != key {
        return Err(AppError::ConfigError(
            "An API key was found, but it has whitespace at the start or end".to_string(),
        ));
    }

    Ok(())
}
