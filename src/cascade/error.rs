//! Cascade error types.

use super::Tier;

/// Errors raised while loading a catalog or selecting a model.
///
/// None of these are retryable: they all point at a bad catalog or a
/// programming error in the caller.
#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Tier {0} has no model configs")]
    EmptyTier(Tier),

    #[error("Failed to read tier catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse tier catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
}
