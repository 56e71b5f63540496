//! Rolling daily budget gate.
//!
//! # Invariants
//! - `spent_today` is the sum of accepted expenses since `last_reset`
//! - `last_reset` only moves forward, and only when a full window has passed
//!
//! The window is a fixed 24h duration measured from the previous reset, not
//! aligned to midnight. It is re-checked lazily on every call; nothing runs
//! in the background.

use chrono::{DateTime, Utc};
use super::{PricingError, PricingTable};

/// Fraction of the daily limit at which callers should stop escalating.
pub const DOWNGRADE_THRESHOLD: f64 = 0.8;

/// Length of the spend window in hours.
pub const RESET_WINDOW_HOURS: i64 = 24;

/// Daily spend accounting for one budget scope (organization, deployment...).
///
/// Single owner: every operation takes `&mut self`. Use
/// [`super::SharedBudgetGate`] to share one scope between concurrent tasks.
#[derive(Debug, Clone)]
pub struct BudgetGate {
    /// Daily limit (USD)
    daily_limit: f64,

    /// Spend since `last_reset` (USD)
    spent_today: f64,

    /// Start of the current window
    last_reset: DateTime<Utc>,
}

impl BudgetGate {
    /// Create a gate with nothing spent and the window starting now.
    ///
    /// A `daily_limit <= 0` is accepted; the gate then always reports that a
    /// downgrade is needed.
    pub fn new(daily_limit: f64) -> Self {
        Self::with_last_reset(daily_limit, Utc::now())
    }

    /// Create a gate whose current window started at `last_reset`.
    pub fn with_last_reset(daily_limit: f64, last_reset: DateTime<Utc>) -> Self {
        if daily_limit <= 0.0 {
            tracing::warn!(daily_limit, "Non-positive daily limit; every check will ask for a downgrade");
        }
        Self {
            daily_limit,
            spent_today: 0.0,
            last_reset,
        }
    }

    /// Start the current window with `spent` already counted, e.g. a total
    /// restored from an expense ledger after a restart.
    ///
    /// Negative or non-finite amounts are logged and ignored.
    pub fn with_spent(mut self, spent: f64) -> Self {
        if spent.is_finite() && spent >= 0.0 {
            self.spent_today = spent;
        } else {
            tracing::warn!(spent, "Ignoring invalid starting spend");
        }
        self
    }

    // Getters

    pub fn daily_limit(&self) -> f64 {
        self.daily_limit
    }

    /// Spend in the current window, as of the last call that checked it.
    pub fn spent_today(&self) -> f64 {
        self.spent_today
    }

    pub fn last_reset(&self) -> DateTime<Utc> {
        self.last_reset
    }

    /// Unspent part of the daily limit, never negative.
    pub fn remaining(&self) -> f64 {
        (self.daily_limit - self.spent_today).max(0.0)
    }

    /// Spend as a fraction of the limit (`1.0` = limit reached).
    pub fn utilization(&self) -> f64 {
        if self.daily_limit > 0.0 {
            self.spent_today / self.daily_limit
        } else {
            1.0
        }
    }

    // Mutations

    /// Record a billed call.
    ///
    /// # Precondition
    /// `amount >= 0`. Negative or non-finite amounts are logged and dropped.
    ///
    /// # Postcondition
    /// `spent_today` increases by `amount`, after any pending window reset.
    pub fn add_expense(&mut self, amount: f64) {
        self.add_expense_at(amount, Utc::now());
    }

    /// [`BudgetGate::add_expense`] with an explicit clock reading.
    ///
    /// Returns whether the expense was accepted.
    pub fn add_expense_at(&mut self, amount: f64, now: DateTime<Utc>) -> bool {
        self.reset_if_needed(now);
        if !amount.is_finite() || amount < 0.0 {
            tracing::warn!(amount, "Ignoring invalid expense amount");
            return false;
        }
        self.spent_today += amount;
        tracing::debug!(
            amount,
            spent_today = self.spent_today,
            daily_limit = self.daily_limit,
            "Recorded expense"
        );
        true
    }

    /// Price a call's token usage, record it, and return its cost (USD).
    pub fn add_usage(
        &mut self,
        pricing: &PricingTable,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
    ) -> Result<f64, PricingError> {
        let cost = pricing.estimate_cost(model, prompt_tokens, completion_tokens)?;
        self.add_expense(cost);
        Ok(cost)
    }

    /// Whether spend has reached [`DOWNGRADE_THRESHOLD`] of the daily limit.
    pub fn needs_downgrade(&mut self) -> bool {
        self.needs_downgrade_at(Utc::now())
    }

    /// [`BudgetGate::needs_downgrade`] with an explicit clock reading.
    pub fn needs_downgrade_at(&mut self, now: DateTime<Utc>) -> bool {
        self.reset_if_needed(now);
        self.spent_today >= DOWNGRADE_THRESHOLD * self.daily_limit
    }

    /// Start a new window if a full one has elapsed since the last reset.
    fn reset_if_needed(&mut self, now: DateTime<Utc>) {
        if now - self.last_reset >= chrono::Duration::hours(RESET_WINDOW_HOURS) {
            tracing::info!(
                previous_spend = self.spent_today,
                last_reset = %self.last_reset,
                "Daily budget window elapsed; resetting spend"
            );
            self.spent_today = 0.0;
            self.last_reset = now;
        }
    }
}
