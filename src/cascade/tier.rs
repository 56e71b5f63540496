//! Cost/quality tiers.

use serde::{Deserialize, Serialize};

use super::CascadeError;

/// A cost/quality band of models, ordered cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Cheap,
    Standard,
    Premium,
}

impl Tier {
    /// All tiers in escalation order.
    pub const ORDER: [Tier; 3] = [Tier::Cheap, Tier::Standard, Tier::Premium];

    /// Position of this tier in [`Tier::ORDER`].
    pub fn index(self) -> usize {
        match self {
            Tier::Cheap => 0,
            Tier::Standard => 1,
            Tier::Premium => 2,
        }
    }

    /// The tier directly above, saturating at `premium`.
    pub fn next(self) -> Tier {
        Self::ORDER[(self.index() + 1).min(Self::ORDER.len() - 1)]
    }

    /// The tier directly below, saturating at `cheap`.
    pub fn previous(self) -> Tier {
        Self::ORDER[self.index().saturating_sub(1)]
    }

    pub fn is_top(self) -> bool {
        self == Tier::Premium
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Cheap => "cheap",
            Tier::Standard => "standard",
            Tier::Premium => "premium",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = CascadeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cheap" => Ok(Tier::Cheap),
            "standard" => Ok(Tier::Standard),
            "premium" => Ok(Tier::Premium),
            other => Err(CascadeError::UnknownTier(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_saturates_at_premium() {
        assert_eq!(Tier::Cheap.next(), Tier::Standard);
        assert_eq!(Tier::Standard.next(), Tier::Premium);
        assert_eq!(Tier::Premium.next(), Tier::Premium);
    }

    #[test]
    fn test_previous_saturates_at_cheap() {
        assert_eq!(Tier::Premium.previous(), Tier::Standard);
        assert_eq!(Tier::Standard.previous(), Tier::Cheap);
        assert_eq!(Tier::Cheap.previous(), Tier::Cheap);
    }

    #[test]
    fn test_parse() {
        assert_eq!("standard".parse::<Tier>().unwrap(), Tier::Standard);
        // Names are case sensitive, matching the catalog keys
        assert!(matches!(
            "Premium".parse::<Tier>(),
            Err(CascadeError::UnknownTier(name)) if name == "Premium"
        ));
        assert!("ultra".parse::<Tier>().is_err());
    }

    #[test]
    fn test_order_matches_ord() {
        assert!(Tier::Cheap < Tier::Standard);
        assert!(Tier::Standard < Tier::Premium);
        for (i, tier) in Tier::ORDER.iter().enumerate() {
            assert_eq!(tier.index(), i);
        }
    }
}
