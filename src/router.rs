//! Budget-aware routing: the contract between an orchestrator, the tier
//! cascade and the budget gate.
//!
//! 1. `select` returns the model for the task's current state, one tier
//!    lower while the budget gate is tripped.
//! 2. After each billed call the orchestrator reports usage.
//! 3. On a failed attempt `on_failure` escalates, unless the gate vetoes it.

use serde::Serialize;

use crate::budget::{PricingError, PricingTable, SharedBudgetGate};
use crate::cascade::{CascadeError, EscalationState, Selection, Tier, TierCascade};

/// What happened on a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    /// The cascade's escalation policy was applied
    Escalated(Selection),
    /// The budget gate vetoed escalation; the task retries with the
    /// budget-downgraded pick for its unchanged state
    Blocked(Selection),
}

impl RouteDecision {
    pub fn selection(&self) -> &Selection {
        match self {
            RouteDecision::Escalated(s) | RouteDecision::Blocked(s) => s,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, RouteDecision::Blocked(_))
    }
}

/// Cascade plus budget for one budget scope.
#[derive(Debug, Clone)]
pub struct CascadeRouter {
    cascade: TierCascade,
    budget: SharedBudgetGate,
    pricing: PricingTable,
}

impl CascadeRouter {
    pub fn new(cascade: TierCascade, budget: SharedBudgetGate, pricing: PricingTable) -> Self {
        Self {
            cascade,
            budget,
            pricing,
        }
    }

    pub fn cascade(&self) -> &TierCascade {
        &self.cascade
    }

    pub fn budget(&self) -> &SharedBudgetGate {
        &self.budget
    }

    /// Model for the task's current state.
    ///
    /// While the budget gate is tripped the pick comes from one tier below
    /// the state's tier (never below `cheap`). The state itself is untouched.
    pub async fn select(&self, state: &EscalationState) -> Result<Selection, CascadeError> {
        let tripped = self.budget.needs_downgrade().await;
        self.pick_for(state, tripped)
    }

    fn pick_for(&self, state: &EscalationState, tripped: bool) -> Result<Selection, CascadeError> {
        if tripped && state.tier != Tier::Cheap {
            let lower = state.tier.previous();
            tracing::warn!(
                from = %state.tier,
                to = %lower,
                attempt = state.attempt,
                "Budget threshold reached; selecting from lower tier"
            );
            return self.cascade.pick(lower, state.attempt);
        }
        self.cascade.pick(state.tier, state.attempt)
    }

    /// Handle a failed attempt and advance `state`.
    ///
    /// The gate is consulted first: when it is tripped the cascade is not
    /// asked to escalate at all, `state` is left as is, and the returned
    /// selection is the one [`CascadeRouter::select`] gives for it.
    pub async fn on_failure(&self, state: &mut EscalationState) -> Result<RouteDecision, CascadeError> {
        tracing::info!(tier = %state.tier, attempt = state.attempt, "LLM attempt failed");

        if self.budget.needs_downgrade().await {
            let selection = self.pick_for(state, true)?;
            tracing::warn!(
                tier = %selection.tier,
                attempt = selection.attempt,
                model = %selection.model,
                "Escalation blocked by budget gate"
            );
            return Ok(RouteDecision::Blocked(selection));
        }

        let selection = state.record_failure(&self.cascade)?;
        tracing::info!(
            tier = %selection.tier,
            attempt = selection.attempt,
            model = %selection.model,
            "Escalated"
        );
        Ok(RouteDecision::Escalated(selection))
    }

    /// Record a billed call's token usage against the budget. Returns its cost (USD).
    pub async fn record_usage(
        &self,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
    ) -> Result<f64, PricingError> {
        self.budget
            .add_usage(&self.pricing, model, prompt_tokens, completion_tokens)
            .await
    }
}
