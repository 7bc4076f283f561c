//! Configuration management.
//!
//! Configuration is read from environment variables once at startup:
//! - `OPENAI_API_KEY` - API key (takes precedence over the key file)
//! - `OPENAI_API_KEY_PATH` - File holding the API key. Defaults to `api.key.txt`
//! - `OPENAI_ORGANIZATION` - Optional organization identifier
//! - `OPENAI_BASE_URL` - Service base URL. Defaults to `https://api.openai.com/v1`
//! - `FORGE_MODEL` - Model used for every stage. Defaults to `gpt-4`
//! - `FORGE_COST_PER_1K_TOKENS` - Cost rate. Defaults to `0.03`
//! - `FORGE_MAX_COST` - Budget ceiling before confirmation. Defaults to `1.0`
//! - `FORGE_RETRIES` - Attempts per call. Defaults to `3`
//! - `FORGE_RETRY_DELAY_SECS` - Delay between attempts. Defaults to `10`
//! - `FORGE_OUTPUT_DIR` - Artifact directory. Defaults to `articles`

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::llm::ServiceCredentials;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_COST_PER_1K_TOKENS: f64 = 0.03;
pub const DEFAULT_MAX_COST: f64 = 1.0;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 10;
pub const DEFAULT_KEY_PATH: &str = "api.key.txt";
pub const DEFAULT_OUTPUT_DIR: &str = "articles";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing API key: set OPENAI_API_KEY or put the key in {0}")]
    MissingApiKey(PathBuf),

    #[error("Failed to read API key file {path}: {message}")]
    KeyFile { path: PathBuf, message: String },

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Retry behaviour for a single completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Fixed wait between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRIES,
            delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

/// Cost accounting parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetConfig {
    /// Currency units per 1000 tokens.
    pub cost_per_1k_tokens: f64,
    /// Projected cost above which the user must confirm.
    pub max_cost: f64,
}

impl BudgetConfig {
    /// Replace the ceiling, applying the same checks as `FORGE_MAX_COST`.
    pub fn with_max_cost(self, max_cost: f64) -> Result<Self, ConfigError> {
        let budget = Self { max_cost, ..self };
        validate_budget(&budget)?;
        Ok(budget)
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            cost_per_1k_tokens: DEFAULT_COST_PER_1K_TOKENS,
            max_cost: DEFAULT_MAX_COST,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: ServiceCredentials,
    pub model: String,
    pub budget: BudgetConfig,
    pub retry: RetryPolicy,
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let key_path = PathBuf::from(
            std::env::var("OPENAI_API_KEY_PATH").unwrap_or_else(|_| DEFAULT_KEY_PATH.to_string()),
        );
        let api_key = match non_empty_var("OPENAI_API_KEY") {
            Some(key) => key,
            None => read_key_file(&key_path)?,
        };

        let credentials = ServiceCredentials {
            api_key,
            organization: non_empty_var("OPENAI_ORGANIZATION"),
            base_url: non_empty_var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };

        let budget = BudgetConfig {
            cost_per_1k_tokens: parse_var("FORGE_COST_PER_1K_TOKENS", DEFAULT_COST_PER_1K_TOKENS)?,
            max_cost: parse_var("FORGE_MAX_COST", DEFAULT_MAX_COST)?,
        };
        validate_budget(&budget)?;

        let attempts: u32 = parse_var("FORGE_RETRIES", DEFAULT_RETRIES)?;
        if attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "FORGE_RETRIES".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let retry = RetryPolicy {
            attempts,
            delay: Duration::from_secs(parse_var("FORGE_RETRY_DELAY_SECS", DEFAULT_RETRY_DELAY_SECS)?),
        };

        Ok(Self {
            credentials,
            model: non_empty_var("FORGE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            budget,
            retry,
            output_dir: PathBuf::from(
                non_empty_var("FORGE_OUTPUT_DIR").unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            ),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw.to_string()))
}

fn validate_budget(budget: &BudgetConfig) -> Result<(), ConfigError> {
    if !(budget.cost_per_1k_tokens.is_finite() && budget.cost_per_1k_tokens >= 0.0) {
        return Err(ConfigError::InvalidValue(
            "FORGE_COST_PER_1K_TOKENS".to_string(),
            budget.cost_per_1k_tokens.to_string(),
        ));
    }
    if !(budget.max_cost.is_finite() && budget.max_cost >= 0.0) {
        return Err(ConfigError::InvalidValue(
            "FORGE_MAX_COST".to_string(),
            budget.max_cost.to_string(),
        ));
    }
    Ok(())
}

/// Read the API key from a file, ignoring surrounding whitespace.
pub fn read_key_file(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingApiKey(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::KeyFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let key = raw.trim();
    if key.is_empty() {
        return Err(ConfigError::MissingApiKey(path.to_path_buf()));
    }
    Ok(key.to_string())
}
