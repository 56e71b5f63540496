//! # llm_cascade
//!
//! Budget-aware LLM model selection for multi-agent orchestrators.
//!
//! This library provides:
//! - A tier catalog (`cheap` → `standard` → `premium`) loaded once from YAML
//! - A cascade that picks a model for `(tier, attempt)` and escalates on failure
//! - A rolling daily budget gate that vetoes escalation near the limit
//!
//! ## Decision Flow
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │      Orchestrator (external)     │
//!        └───────┬──────────────────┬───────┘
//!                │ pick / escalate  │ add_expense / needs_downgrade
//!                ▼                  ▼
//!        ┌───────────────┐   ┌───────────────┐
//!        │  TierCascade  │   │  BudgetGate   │
//!        └───────┬───────┘   └───────┬───────┘
//!                │                   │
//!                ▼                   ▼
//!        ┌───────────────┐   ┌───────────────┐
//!        │  TierCatalog  │   │ ExpenseLedger │
//!        └───────────────┘   └───────────────┘
//! ```
//!
//! ## Task Flow
//! 1. Start every task at `(cheap, 0)`
//! 2. Call the model returned by the cascade, record its cost in the gate
//! 3. On failure, escalate unless the gate says the budget is nearly spent
//!
//! ## Modules
//! - `cascade`: tiers, catalog, escalation policy and per-task state
//! - `budget`: daily budget gate, pricing and expense ledgers
//! - `router`: the orchestrator contract tying cascade and budget together

pub mod budget;
pub mod cascade;
pub mod config;
pub mod router;

pub use budget::{BudgetGate, PricingTable, SharedBudgetGate};
pub use cascade::{CascadeError, ModelConfig, Selection, Tier, TierCascade, TierCatalog};
pub use config::Config;
pub use router::{CascadeRouter, RouteDecision};
