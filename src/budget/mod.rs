//! Budget module - daily spend tracking and model pricing.
//!
//! # Key Concepts
//! - Gate: rolling 24h spend against a daily limit, with an 80% threshold
//! - Shared gate: the same gate behind a lock for concurrent tasks
//! - Pricing: per-1K-token prices used to turn usage into dollars
//! - Ledger: durable per-day spend totals

mod gate;
mod ledger;
mod pricing;
mod shared;

pub use gate::{BudgetGate, DOWNGRADE_THRESHOLD, RESET_WINDOW_HOURS};
pub use ledger::{day_key, ExpenseLedger, LedgerError, MemoryLedger, SqliteLedger, RETENTION_DAYS};
pub use pricing::{PriceKind, PricingError, PricingTable, TokenPrice};
pub use shared::SharedBudgetGate;
