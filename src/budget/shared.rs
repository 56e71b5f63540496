//! Budget gate shared between concurrent tasks.
//!
//! `add_expense` and `needs_downgrade` are read-check-modify sequences (the
//! window rollover mutates state). Two unsynchronized callers can lose an
//! expense or read a stale total, so the shared handle runs every operation
//! under one lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{BudgetGate, ExpenseLedger, PricingError, PricingTable};

/// Cloneable handle to one budget scope.
#[derive(Clone)]
pub struct SharedBudgetGate {
    gate: Arc<Mutex<BudgetGate>>,
    ledger: Option<Arc<dyn ExpenseLedger>>,
}

impl SharedBudgetGate {
    pub fn new(gate: BudgetGate) -> Self {
        Self {
            gate: Arc::new(Mutex::new(gate)),
            ledger: None,
        }
    }

    /// Append every accepted expense to `ledger` as well.
    pub fn with_ledger(mut self, ledger: Arc<dyn ExpenseLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub async fn add_expense(&self, amount: f64) {
        self.add_expense_at(amount, Utc::now()).await;
    }

    /// Record an expense at `now`. Returns whether it was accepted.
    ///
    /// Ledger failures are logged and do not undo the in-memory update.
    pub async fn add_expense_at(&self, amount: f64, now: DateTime<Utc>) -> bool {
        let accepted = self.gate.lock().await.add_expense_at(amount, now);

        if accepted {
            if let Some(ledger) = &self.ledger {
                if let Err(e) = ledger.record(now, amount).await {
                    tracing::warn!(amount, error = %e, "Failed to persist expense to ledger");
                }
            }
        }
        accepted
    }

    /// Price a call's token usage, record it, and return its cost (USD).
    pub async fn add_usage(
        &self,
        pricing: &PricingTable,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
    ) -> Result<f64, PricingError> {
        let cost = pricing.estimate_cost(model, prompt_tokens, completion_tokens)?;
        self.add_expense(cost).await;
        Ok(cost)
    }

    pub async fn needs_downgrade(&self) -> bool {
        self.gate.lock().await.needs_downgrade()
    }

    pub async fn needs_downgrade_at(&self, now: DateTime<Utc>) -> bool {
        self.gate.lock().await.needs_downgrade_at(now)
    }

    /// Copy of the gate's current state.
    pub async fn snapshot(&self) -> BudgetGate {
        self.gate.lock().await.clone()
    }
}

impl std::fmt::Debug for SharedBudgetGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBudgetGate")
            .field("gate", &self.gate)
            .field("has_ledger", &self.ledger.is_some())
            .finish()
    }
}

impl From<BudgetGate> for SharedBudgetGate {
    fn from(gate: BudgetGate) -> Self {
        Self::new(gate)
    }
}
