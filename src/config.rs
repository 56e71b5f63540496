//! Configuration management for llm_cascade.
//!
//! Configuration can be set via environment variables:
//! - `LLM_TIERS_PATH` - Optional. Tier catalog YAML. Defaults to `config/llm_tiers.yaml`.
//! - `LLM_PRICING_PATH` - Optional. Pricing YAML. Defaults to `config/pricing.yaml`.
//! - `DAILY_BUDGET_USD` - Optional. Daily spend limit in dollars. Defaults to `10.0`.
//! - `BUDGET_DB_PATH` - Optional. SQLite file for the expense ledger. No ledger when unset.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

pub const DEFAULT_TIERS_PATH: &str = "config/llm_tiers.yaml";
pub const DEFAULT_PRICING_PATH: &str = "config/pricing.yaml";
pub const DEFAULT_DAILY_BUDGET_USD: f64 = 10.0;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Tier catalog file
    pub tiers_path: PathBuf,

    /// Model pricing file
    pub pricing_path: PathBuf,

    /// Daily spend limit (USD)
    pub daily_budget_usd: f64,

    /// Expense ledger database, if persistence is wanted
    pub budget_db_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `DAILY_BUDGET_USD` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let tiers_path = std::env::var("LLM_TIERS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TIERS_PATH));

        let pricing_path = std::env::var("LLM_PRICING_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PRICING_PATH));

        let daily_budget_usd = match std::env::var("DAILY_BUDGET_USD") {
            Ok(raw) => parse_budget(&raw)?,
            Err(_) => DEFAULT_DAILY_BUDGET_USD,
        };

        let budget_db_path = std::env::var("BUDGET_DB_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            tiers_path,
            pricing_path,
            daily_budget_usd,
            budget_db_path,
        })
    }

    /// Create a config with custom paths (useful for testing).
    pub fn new(tiers_path: PathBuf, pricing_path: PathBuf, daily_budget_usd: f64) -> Self {
        Self {
            tiers_path,
            pricing_path,
            daily_budget_usd,
            budget_db_path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            PathBuf::from(DEFAULT_TIERS_PATH),
            PathBuf::from(DEFAULT_PRICING_PATH),
            DEFAULT_DAILY_BUDGET_USD,
        )
    }
}

fn parse_budget(raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue("DAILY_BUDGET_USD".to_string(), format!("{}", e)))?;
    if !value.is_finite() {
        return Err(ConfigError::InvalidValue(
            "DAILY_BUDGET_USD".to_string(),
            "must be a finite number".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_budget() {
        assert_eq!(parse_budget("25").unwrap(), 25.0);
        assert_eq!(parse_budget(" 2.5 ").unwrap(), 2.5);
        assert!(parse_budget("ten").is_err());
        assert!(parse_budget("inf").is_err());
    }

    #[test]
    fn test_default_paths() {
        let config = Config::default();
        assert_eq!(config.tiers_path, PathBuf::from("config/llm_tiers.yaml"));
        assert_eq!(config.daily_budget_usd, DEFAULT_DAILY_BUDGET_USD);
        assert!(config.budget_db_path.is_none());
    }
}
