//! Tier cascade: model selection and escalation over a [`TierCatalog`].
//!
//! # Escalation policy
//! ```text
//! escalate(tier, attempt):
//!     attempt <  max_retries  →  (next_tier(tier), 0)
//!     attempt >= max_retries  →  (tier, attempt)        (clamped to last model)
//! ```
//! `next_tier` saturates at `premium`, so a task that keeps failing below
//! the retry ceiling ends up re-selecting the first premium model.

use std::sync::Arc;

use serde::Serialize;

use super::{CascadeError, ModelConfig, Tier, TierCatalog};
use crate::budget::BudgetGate;

/// The outcome of a selection: which tier and attempt index were used and
/// the model they resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub tier: Tier,
    /// Attempt number that drove the lookup (before clamping)
    pub attempt: u32,
    pub model: ModelConfig,
}

/// Stateless selection policy over an immutable catalog.
///
/// Cheap to clone and safe to share across tasks: the catalog sits behind an
/// `Arc` and is never mutated.
#[derive(Debug, Clone)]
pub struct TierCascade {
    catalog: Arc<TierCatalog>,
}

impl TierCascade {
    pub fn new(catalog: TierCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    pub fn from_shared(catalog: Arc<TierCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    pub fn max_retries(&self) -> u32 {
        self.catalog.max_retries()
    }

    /// Model for `attempt` within `tier`.
    ///
    /// The attempt indexes the tier's list and is clamped to its last entry,
    /// so repeated failures keep retrying the last model of the tier.
    ///
    /// # Errors
    /// `EmptyTier` if the tier has no models.
    pub fn pick(&self, tier: Tier, attempt: u32) -> Result<Selection, CascadeError> {
        let models = self.catalog.models(tier);
        if models.is_empty() {
            return Err(CascadeError::EmptyTier(tier));
        }
        let index = (attempt as usize).min(models.len() - 1);
        Ok(Selection {
            tier,
            attempt,
            model: models[index].clone(),
        })
    }

    /// String-keyed form of [`TierCascade::pick`].
    ///
    /// # Errors
    /// `UnknownTier` for a name outside `cheap`/`standard`/`premium`.
    pub fn pick_config(&self, tier: &str, attempt: u32) -> Result<Selection, CascadeError> {
        self.pick(tier.parse()?, attempt)
    }

    /// Name of the tier above `current`; `premium` stays `premium`.
    pub fn next_tier(&self, current: &str) -> Result<Tier, CascadeError> {
        Ok(current.parse::<Tier>()?.next())
    }

    /// Name of the tier below `current`; `cheap` stays `cheap`.
    pub fn previous_tier(&self, current: &str) -> Result<Tier, CascadeError> {
        Ok(current.parse::<Tier>()?.previous())
    }

    /// Select a better model after an unsatisfactory attempt.
    ///
    /// Below the retry ceiling this climbs one tier and restarts at attempt
    /// 0. At or past the ceiling it stays in `current` and re-picks with the
    /// given attempt (clamped), which caps spend instead of climbing forever.
    ///
    /// NOTE: the ceiling check reads inverted at first glance (tiers are
    /// climbed while retries remain, and climbing stops once they run out).
    /// It is kept as-is until the intended semantics are confirmed; callers
    /// that want a full sweep must move tiers themselves.
    pub fn escalate(&self, current: Tier, attempt: u32) -> Result<Selection, CascadeError> {
        if attempt >= self.max_retries() {
            tracing::warn!(
                tier = %current,
                attempt,
                max_retries = self.max_retries(),
                "Retry limit reached; staying at current tier"
            );
            return self.pick(current, attempt);
        }

        let next = current.next();
        tracing::debug!(from = %current, to = %next, attempt, "Escalating tier");
        self.pick(next, 0)
    }

    /// String-keyed form of [`TierCascade::escalate`].
    pub fn escalate_named(&self, current: &str, attempt: u32) -> Result<Selection, CascadeError> {
        self.escalate(current.parse()?, attempt)
    }

    /// Pick from one tier lower when the budget gate asks for a downgrade.
    ///
    /// `cheap` is never downgraded further.
    pub fn downgrade_with_budget(
        &self,
        current: Tier,
        gate: &mut BudgetGate,
        attempt: u32,
    ) -> Result<Selection, CascadeError> {
        if current != Tier::Cheap && gate.needs_downgrade() {
            let lower = current.previous();
            tracing::warn!(
                from = %current,
                to = %lower,
                spent_today = gate.spent_today(),
                daily_limit = gate.daily_limit(),
                "Budget threshold reached; downgrading tier"
            );
            return self.pick(lower, attempt);
        }
        self.pick(current, attempt)
    }
}

impl Default for TierCascade {
    fn default() -> Self {
        Self::new(TierCatalog::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(name: &str) -> ModelConfig {
        ModelConfig::new(name, "test")
    }

    /// `{cheap: [A, B], standard: [C], premium: [D, E]}`, max_retries = 2
    fn scenario_cascade() -> TierCascade {
        TierCascade::new(
            TierCatalog::new([
                (Tier::Cheap, vec![m("A"), m("B")]),
                (Tier::Standard, vec![m("C")]),
                (Tier::Premium, vec![m("D"), m("E")]),
            ])
            .with_max_retries(2),
        )
    }

    #[test]
    fn test_pick_clamps_attempt() {
        let cascade = scenario_cascade();

        for tier in Tier::ORDER {
            let models = cascade.catalog().models(tier);
            assert_eq!(cascade.pick(tier, 0).unwrap().model, models[0]);
            assert_eq!(
                cascade.pick(tier, 1_000_000).unwrap().model,
                models[models.len() - 1]
            );
            for attempt in 0..5u32 {
                let expected = &models[(attempt as usize).min(models.len() - 1)];
                assert_eq!(&cascade.pick(tier, attempt).unwrap().model, expected);
            }
        }
    }

    #[test]
    fn test_pick_config_by_name() {
        let cascade = scenario_cascade();

        let sel = cascade.pick_config("cheap", 1).unwrap();
        assert_eq!(sel.tier, Tier::Cheap);
        assert_eq!(sel.model.model, "B");

        assert!(matches!(
            cascade.pick_config("gold", 0),
            Err(CascadeError::UnknownTier(_))
        ));
    }

    #[test]
    fn test_pick_empty_tier_fails_fast() {
        let cascade = TierCascade::new(TierCatalog::new([(Tier::Cheap, vec![m("A")])]));

        assert!(cascade.pick(Tier::Cheap, 0).is_ok());
        assert!(matches!(
            cascade.pick(Tier::Standard, 0),
            Err(CascadeError::EmptyTier(Tier::Standard))
        ));
    }

    #[test]
    fn test_next_and_previous_tier() {
        let cascade = scenario_cascade();

        assert_eq!(cascade.next_tier("cheap").unwrap(), Tier::Standard);
        assert_eq!(cascade.next_tier("standard").unwrap(), Tier::Premium);
        assert_eq!(cascade.next_tier("premium").unwrap(), Tier::Premium);
        assert_eq!(cascade.previous_tier("cheap").unwrap(), Tier::Cheap);
        assert_eq!(cascade.previous_tier("premium").unwrap(), Tier::Standard);

        assert!(matches!(
            cascade.next_tier("platinum"),
            Err(CascadeError::UnknownTier(_))
        ));
        assert!(cascade.previous_tier("").is_err());
    }

    #[test]
    fn test_escalate_below_ceiling_moves_up() {
        let cascade = scenario_cascade();

        for tier in Tier::ORDER {
            for attempt in 0..cascade.max_retries() {
                let sel = cascade.escalate(tier, attempt).unwrap();
                assert_eq!(sel.tier, tier.next());
                assert_eq!(sel.attempt, 0);
                assert_eq!(sel.model, cascade.catalog().models(tier.next())[0]);
            }
        }
    }

    #[test]
    fn test_escalate_at_ceiling_stays() {
        let cascade = scenario_cascade();

        let sel = cascade.escalate(Tier::Cheap, 2).unwrap();
        assert_eq!(sel.tier, Tier::Cheap);
        assert_eq!(sel.model.model, "B");

        let sel = cascade.escalate(Tier::Standard, 7).unwrap();
        assert_eq!(sel.tier, Tier::Standard);
        assert_eq!(sel.model.model, "C");

        assert!(matches!(
            cascade.escalate_named("bronze", 0),
            Err(CascadeError::UnknownTier(_))
        ));
    }

    #[test]
    fn test_downgrade_with_budget() {
        let cascade = scenario_cascade();
        let mut gate = BudgetGate::new(100.0);

        let sel = cascade.downgrade_with_budget(Tier::Premium, &mut gate, 0).unwrap();
        assert_eq!(sel.tier, Tier::Premium);

        gate.add_expense(80.0);
        let sel = cascade.downgrade_with_budget(Tier::Premium, &mut gate, 0).unwrap();
        assert_eq!(sel.tier, Tier::Standard);
        assert_eq!(sel.model.model, "C");

        // Nothing below cheap
        let sel = cascade.downgrade_with_budget(Tier::Cheap, &mut gate, 1).unwrap();
        assert_eq!(sel.tier, Tier::Cheap);
        assert_eq!(sel.model.model, "B");
    }
}
