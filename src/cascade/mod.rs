//! Cascade module - tier catalog and escalation policy.
//!
//! # Key Concepts
//! - Tier: a cost/quality band (`cheap` < `standard` < `premium`)
//! - Catalog: ordered candidate models per tier, loaded once
//! - Cascade: picks `(tier, attempt)` configs and escalates on failure
//! - State: the caller-held `(tier, attempt)` pair for one task

mod catalog;
mod error;
mod selector;
mod state;
mod tier;

pub use catalog::{ModelConfig, TierCatalog, DEFAULT_MAX_RETRIES};
pub use error::CascadeError;
pub use selector::{Selection, TierCascade};
pub use state::EscalationState;
pub use tier::Tier;
