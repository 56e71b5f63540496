//! Tier catalog: the ordered candidate models for each tier.
//!
//! # Invariants
//! - Every tier in [`Tier::ORDER`] has at least one model (checked at load)
//! - The catalog is never mutated after construction
//!
//! # Format
//! ```yaml
//! tiers:
//!   cheap:    [ {model: gpt-3.5-turbo, provider: openrouter}, ... ]
//!   standard: [ ... ]
//!   premium:  [ ... ]
//! max_retries: 3
//! ```
//! Order within a tier list is significant: the attempt number indexes it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{CascadeError, Tier};

/// Retry ceiling used when the catalog does not set `max_retries`.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A concrete model to call: model identifier plus provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Model identifier as the provider knows it (e.g. "gpt-4o-mini")
    #[serde(alias = "name")]
    pub model: String,

    /// Provider identifier (e.g. "openrouter", "openai")
    pub provider: String,

    /// Endpoint override for the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Output token cap for calls made with this config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ModelConfig {
    pub fn new(model: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            provider: provider.into(),
            base_url: None,
            max_tokens: None,
        }
    }
}

impl std::fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// On-disk shape of the catalog. Tier keys stay strings here so that an
/// unknown key can be reported as such instead of as a generic parse error.
#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    tiers: BTreeMap<String, Option<Vec<ModelConfig>>>,
    #[serde(default)]
    max_retries: Option<u32>,
}

/// Immutable mapping from tier to its ordered candidate models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierCatalog {
    /// Indexed by [`Tier::index`]
    tiers: [Vec<ModelConfig>; 3],
    max_retries: u32,
}

impl TierCatalog {
    /// Build a catalog from explicit tier lists.
    ///
    /// Tiers not mentioned are left empty. No validation happens here, so a
    /// catalog built this way reports `EmptyTier` on first use of an empty
    /// tier rather than at construction; call [`TierCatalog::validate`] to
    /// fail earlier.
    pub fn new(tiers: impl IntoIterator<Item = (Tier, Vec<ModelConfig>)>) -> Self {
        let mut catalog = Self {
            tiers: Default::default(),
            max_retries: DEFAULT_MAX_RETRIES,
        };
        for (tier, models) in tiers {
            catalog.tiers[tier.index()] = models;
        }
        catalog
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Fallback catalog used when no catalog file is available.
    pub fn builtin() -> Self {
        Self::new([
            (
                Tier::Cheap,
                vec![
                    ModelConfig::new("gpt-3.5-turbo", "openrouter"),
                    ModelConfig::new("llama-3.1-8b-instruct", "openrouter"),
                ],
            ),
            (
                Tier::Standard,
                vec![
                    ModelConfig::new("gpt-4o-mini", "openrouter"),
                    ModelConfig::new("claude-3-haiku", "openrouter"),
                ],
            ),
            (
                Tier::Premium,
                vec![
                    ModelConfig::new("gpt-4o", "openrouter"),
                    ModelConfig::new("claude-3-sonnet", "openrouter"),
                ],
            ),
        ])
    }

    /// Parse and validate a YAML catalog.
    pub fn from_yaml_str(contents: &str) -> Result<Self, CascadeError> {
        let raw: RawCatalog = serde_yaml::from_str(contents)?;

        let mut tiers: Vec<(Tier, Vec<ModelConfig>)> = Vec::with_capacity(raw.tiers.len());
        for (name, models) in raw.tiers {
            let tier: Tier = name.parse()?;
            tiers.push((tier, models.unwrap_or_default()));
        }

        let catalog = Self::new(tiers).with_max_retries(raw.max_retries.unwrap_or(DEFAULT_MAX_RETRIES));
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read, parse and validate a YAML catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CascadeError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_yaml_str(&contents)?;
        tracing::info!(
            path = %path.display(),
            models = catalog.len(),
            max_retries = catalog.max_retries,
            "Loaded tier catalog"
        );
        Ok(catalog)
    }

    /// Check that every tier has at least one model.
    pub fn validate(&self) -> Result<(), CascadeError> {
        match Tier::ORDER.into_iter().find(|t| self.models(*t).is_empty()) {
            Some(tier) => Err(CascadeError::EmptyTier(tier)),
            None => Ok(()),
        }
    }

    /// Candidate models for a tier, in attempt order.
    pub fn models(&self, tier: Tier) -> &[ModelConfig] {
        &self.tiers[tier.index()]
    }

    /// Retry ceiling for escalation.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total number of models across all tiers.
    pub fn len(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All `(tier, model)` pairs in cascade order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &ModelConfig)> {
        Tier::ORDER
            .into_iter()
            .flat_map(move |tier| self.models(tier).iter().map(move |m| (tier, m)))
    }
}

impl Default for TierCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
tiers:
  cheap:
    - name: gpt-3.5-turbo
      provider: openrouter
    - model: llama3-8b-instruct
      provider: openrouter
  standard:
    - model: gpt-4o
      provider: openrouter
  premium:
    - model: claude-3-opus
      provider: anthropic
      base_url: https://api.anthropic.com
      max_tokens: 4096
max_retries: 2
"#;

    #[test]
    fn test_load_sample() {
        let catalog = TierCatalog::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(catalog.max_retries(), 2);
        assert_eq!(catalog.len(), 4);
        // `name` is accepted as an alias for `model`
        assert_eq!(catalog.models(Tier::Cheap)[0].model, "gpt-3.5-turbo");
        assert_eq!(catalog.models(Tier::Cheap)[1].model, "llama3-8b-instruct");

        let premium = &catalog.models(Tier::Premium)[0];
        assert_eq!(premium.base_url.as_deref(), Some("https://api.anthropic.com"));
        assert_eq!(premium.max_tokens, Some(4096));
    }

    #[test]
    fn test_max_retries_defaults_to_three() {
        let yaml = r#"
tiers:
  cheap: [{model: a, provider: p}]
  standard: [{model: b, provider: p}]
  premium: [{model: c, provider: p}]
"#;
        let catalog = TierCatalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.max_retries(), DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_unknown_tier_key_rejected() {
        let yaml = r#"
tiers:
  cheap: [{model: a, provider: p}]
  standard: [{model: b, provider: p}]
  premium: [{model: c, provider: p}]
  luxury: [{model: d, provider: p}]
"#;
        match TierCatalog::from_yaml_str(yaml) {
            Err(CascadeError::UnknownTier(name)) => assert_eq!(name, "luxury"),
            other => panic!("Expected UnknownTier, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_or_missing_tier_rejected() {
        let empty = r#"
tiers:
  cheap: [{model: a, provider: p}]
  standard: []
  premium: [{model: c, provider: p}]
"#;
        assert!(matches!(
            TierCatalog::from_yaml_str(empty),
            Err(CascadeError::EmptyTier(Tier::Standard))
        ));

        let missing = r#"
tiers:
  cheap: [{model: a, provider: p}]
  standard: [{model: b, provider: p}]
"#;
        assert!(matches!(
            TierCatalog::from_yaml_str(missing),
            Err(CascadeError::EmptyTier(Tier::Premium))
        ));
    }

    #[test]
    fn test_unknown_model_field_rejected() {
        let yaml = r#"
tiers:
  cheap: [{model: a, provider: p, temprature: 0.2}]
  standard: [{model: b, provider: p}]
  premium: [{model: c, provider: p}]
"#;
        assert!(matches!(
            TierCatalog::from_yaml_str(yaml),
            Err(CascadeError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm_tiers.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let catalog = TierCatalog::load(&path).unwrap();
        assert_eq!(catalog.models(Tier::Standard)[0].model, "gpt-4o");

        assert!(matches!(
            TierCatalog::load(dir.path().join("missing.yaml")),
            Err(CascadeError::Io(_))
        ));
    }

    #[test]
    fn test_shipped_catalog_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/llm_tiers.yaml");
        let catalog = TierCatalog::load(path).unwrap();

        assert_eq!(catalog.max_retries(), 3);
        assert_eq!(catalog.models(Tier::Cheap)[0].model, "gpt-3.5-turbo");
        assert_eq!(catalog.models(Tier::Premium)[1].max_tokens, Some(4096));
    }

    #[test]
    fn test_builtin_is_valid() {
        let catalog = TierCatalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.max_retries(), 3);

        let order: Vec<Tier> = catalog.iter().map(|(t, _)| t).collect();
        assert_eq!(order.first(), Some(&Tier::Cheap));
        assert_eq!(order.last(), Some(&Tier::Premium));
        assert_eq!(order.len(), 6);
    }
}
