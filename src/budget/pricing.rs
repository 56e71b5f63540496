//! Model pricing for cost estimation.
//!
//! Prices are USD per 1000 tokens, given separately for prompt (input) and
//! completion (output) tokens:
//!
//! ```yaml
//! models:
//!   gpt-4o-mini: {prompt: 0.00015, completion: 0.0006}
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Price of one model, per 1000 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenPrice {
    pub prompt: f64,
    pub completion: f64,
}

/// Which side of a call a token was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceKind {
    Prompt,
    Completion,
}

impl std::fmt::Display for PriceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prompt => write!(f, "prompt"),
            Self::Completion => write!(f, "completion"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PricingFile {
    #[serde(default)]
    models: HashMap<String, TokenPrice>,
}

/// Immutable price list keyed by model name.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    models: HashMap<String, TokenPrice>,
}

impl PricingTable {
    pub fn new(models: HashMap<String, TokenPrice>) -> Self {
        Self { models }
    }

    /// Prices for the models of the builtin tier catalog.
    pub fn builtin() -> Self {
        let defaults = [
            ("gpt-3.5-turbo", 0.0005, 0.0015),
            ("llama-3.1-8b-instruct", 0.00005, 0.00008),
            ("gpt-4o-mini", 0.00015, 0.0006),
            ("claude-3-haiku", 0.00025, 0.00125),
            ("gpt-4o", 0.0025, 0.01),
            ("claude-3-sonnet", 0.003, 0.015),
        ];

        Self::new(
            defaults
                .into_iter()
                .map(|(id, prompt, completion)| (id.to_string(), TokenPrice { prompt, completion }))
                .collect(),
        )
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, PricingError> {
        let file: PricingFile = serde_yaml::from_str(contents)?;
        Ok(Self::new(file.models))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PricingError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_yaml_str(&contents)?;
        tracing::info!(path = %path.display(), models = table.models.len(), "Loaded pricing table");
        Ok(table)
    }

    /// Look up a model, falling back to the name without a `provider/` prefix.
    pub fn get(&self, model: &str) -> Option<&TokenPrice> {
        self.models.get(model).or_else(|| {
            model
                .rsplit_once('/')
                .and_then(|(_, bare)| self.models.get(bare))
        })
    }

    /// Price of a single token in USD.
    pub fn price_per_token(&self, model: &str, kind: PriceKind) -> Result<f64, PricingError> {
        let price = self.get(model).ok_or_else(|| PricingError::UnknownModel {
            model: model.to_string(),
            kind,
        })?;
        let per_thousand = match kind {
            PriceKind::Prompt => price.prompt,
            PriceKind::Completion => price.completion,
        };
        Ok(per_thousand / 1000.0)
    }

    /// Cost of one call in USD.
    pub fn estimate_cost(
        &self,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
    ) -> Result<f64, PricingError> {
        let prompt = self.price_per_token(model, PriceKind::Prompt)?;
        let completion = self.price_per_token(model, PriceKind::Completion)?;
        Ok(prompt_tokens as f64 * prompt + completion_tokens as f64 * completion)
    }

    /// Cost when only the total is known: split evenly, odd token to completion.
    pub fn estimate_by_total(&self, model: &str, total_tokens: u64) -> Result<f64, PricingError> {
        let half = total_tokens / 2;
        self.estimate_cost(model, half, total_tokens - half)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Pricing-related errors.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("No pricing info for {model}::{kind}")]
    UnknownModel { model: String, kind: PriceKind },

    #[error("Failed to read pricing file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse pricing file: {0}")]
    Parse(#[from] serde_yaml::Error),
}
