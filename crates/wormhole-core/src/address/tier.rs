// ============================================
// File: crates/wormhole-core/src/address/tier.rs
// ============================================
//! # Network Tiers
//!
//! Ten ordered tiers, physical through resonance. The index drives routing
//! penalties; the numeric code is what appears in rendered addresses and
//! feeds the check digit. Not OSI-compliant, just ordered.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Number of tiers.
pub const TIER_COUNT: usize = 10;

/// One of the ten ordered network tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Index 0, code 100.
    Physical,
    /// Index 1, code 200.
    Link,
    /// Index 2, code 300.
    Network,
    /// Index 3, code 400.
    Transport,
    /// Index 4, code 500.
    Session,
    /// Index 5, code 600.
    Presentation,
    /// Index 6, code 700.
    Application,
    /// Index 7, code 800.
    Overlay,
    /// Index 8, code 900.
    Consensus,
    /// Index 9, code 1000.
    Resonance,
}

impl Tier {
    /// All tiers in index order.
    pub const ALL: [Tier; TIER_COUNT] = [
        Tier::Physical,
        Tier::Link,
        Tier::Network,
        Tier::Transport,
        Tier::Session,
        Tier::Presentation,
        Tier::Application,
        Tier::Overlay,
        Tier::Consensus,
        Tier::Resonance,
    ];

    /// Index 0..=9.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Numeric code used in rendered addresses.
    #[must_use]
    pub const fn code(self) -> u32 {
        (self as u32 + 1) * 100
    }

    /// Looks up a tier by index.
    ///
    /// # Errors
    /// `InvalidTier` if `index > 9`.
    pub fn from_index(index: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(CoreError::InvalidTier(u32::from(index)))
    }

    /// Looks up a tier by its numeric code.
    ///
    /// # Errors
    /// `InvalidTier` if no tier has that code.
    pub fn from_code(code: u32) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or(CoreError::InvalidTier(code))
    }

    /// Lowercase tier name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Link => "link",
            Self::Network => "network",
            Self::Transport => "transport",
            Self::Session => "session",
            Self::Presentation => "presentation",
            Self::Application => "application",
            Self::Overlay => "overlay",
            Self::Consensus => "consensus",
            Self::Resonance => "resonance",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Tier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(index) = s.parse::<u8>() {
            return Self::from_index(index);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::invalid_address(s, "unknown tier name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_and_code() {
        assert_eq!(Tier::Physical.index(), 0);
        assert_eq!(Tier::Physical.code(), 100);
        assert_eq!(Tier::Resonance.index(), 9);
        assert_eq!(Tier::Resonance.code(), 1000);
    }

    #[test]
    fn test_lookup_roundtrip() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_index(tier.index()).unwrap(), tier);
            assert_eq!(Tier::from_code(tier.code()).unwrap(), tier);
            assert_eq!(tier.name().parse::<Tier>().unwrap(), tier);
        }
        assert!(Tier::from_index(10).is_err());
        assert!(Tier::from_code(150).is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(Tier::Link < Tier::Overlay);
    }
}
