//! Per-task escalation state.

use serde::{Deserialize, Serialize};

use super::{CascadeError, Selection, Tier, TierCascade};

/// The `(tier, attempt)` pair a caller carries for one task.
///
/// Created fresh per task, advanced on each failure, dropped when the task
/// completes or is abandoned. The cascade itself holds no per-task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationState {
    pub tier: Tier,
    pub attempt: u32,
}

impl EscalationState {
    /// Every task starts at `(cheap, 0)`.
    pub fn start() -> Self {
        Self {
            tier: Tier::Cheap,
            attempt: 0,
        }
    }

    /// Model for the current state.
    pub fn current(&self, cascade: &TierCascade) -> Result<Selection, CascadeError> {
        cascade.pick(self.tier, self.attempt)
    }

    /// Apply a failed attempt: escalate and move to whatever was selected.
    pub fn record_failure(&mut self, cascade: &TierCascade) -> Result<Selection, CascadeError> {
        let selection = cascade.escalate(self.tier, self.attempt)?;
        self.apply(&selection);
        Ok(selection)
    }

    /// Adopt the tier and attempt of a selection.
    pub fn apply(&mut self, selection: &Selection) {
        self.tier = selection.tier;
        self.attempt = selection.attempt;
    }
}

impl Default for EscalationState {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{ModelConfig, TierCatalog};

    fn cascade() -> TierCascade {
        let m = |name: &str| ModelConfig::new(name, "test");
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
    fn test_full_failure_walk() {
        let cascade = cascade();
        let mut state = EscalationState::start();

        assert_eq!(state.current(&cascade).unwrap().model.model, "A");

        let sel = state.record_failure(&cascade).unwrap();
        assert_eq!((sel.tier, sel.model.model.as_str()), (Tier::Standard, "C"));

        let sel = state.record_failure(&cascade).unwrap();
        assert_eq!((sel.tier, sel.model.model.as_str()), (Tier::Premium, "D"));

        // premium is the ceiling and the attempt resets to 0 on every climb,
        // so further failures keep landing on D
        for _ in 0..3 {
            let sel = state.record_failure(&cascade).unwrap();
            assert_eq!((sel.tier, sel.model.model.as_str()), (Tier::Premium, "D"));
            assert_eq!(state, EscalationState { tier: Tier::Premium, attempt: 0 });
        }
    }

    #[test]
    fn test_capped_state_stays_in_tier() {
        let cascade = cascade();
        let mut state = EscalationState {
            tier: Tier::Cheap,
            attempt: 2,
        };

        let sel = state.record_failure(&cascade).unwrap();
        assert_eq!(sel.tier, Tier::Cheap);
        assert_eq!(sel.model.model, "B");
        assert_eq!(state.attempt, 2);
    }
}
