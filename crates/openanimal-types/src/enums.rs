//! Enumeration types for the OpenAnimal wire format.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Lifecycle phase
// ---------------------------------------------------------------------------

/// Age in ticks at which each phase begins, in lifecycle order.
pub const PHASE_THRESHOLDS: [(Phase, u64); 4] = [
    (Phase::Infancy, 0),
    (Phase::EarlyGrowth, 500),
    (Phase::Adolescence, 2500),
    (Phase::Maturity, 7000),
];

/// Ordered lifecycle stage of an animal.
///
/// The phase is a monotonic function of `age_ticks` and never regresses.
/// The derived `Ord` follows lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Phase {
    /// Newly born.
    Infancy,
    /// Growing, not yet independent.
    EarlyGrowth,
    /// Nearly grown.
    Adolescence,
    /// Fully grown.
    Maturity,
}

impl Phase {
    /// Parse a phase as the server spells it.
    ///
    /// Two vocabularies appear on the wire: the lifecycle names
    /// (`infancy`, `early_growth`, `adolescence`, `maturity`) and the
    /// short names (`infant`, `juvenile`, `mature`, `elder`). Anything
    /// else yields `None` so callers can echo the raw value.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "infancy" | "infant" => Some(Self::Infancy),
            "early_growth" | "juvenile" => Some(Self::EarlyGrowth),
            "adolescence" | "mature" => Some(Self::Adolescence),
            "maturity" | "elder" => Some(Self::Maturity),
            _ => None,
        }
    }

    /// The phase an animal of the given age is in.
    pub fn for_age(age_ticks: u64) -> Self {
        PHASE_THRESHOLDS
            .iter()
            .rev()
            .find(|(_, threshold)| age_ticks >= *threshold)
            .map_or(Self::Infancy, |(phase, _)| *phase)
    }

    /// Human-readable stage name.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Infancy => "Infant",
            Self::EarlyGrowth => "Juvenile",
            Self::Adolescence => "Mature",
            Self::Maturity => "Elder",
        }
    }

    /// Canonical wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Infancy => "infancy",
            Self::EarlyGrowth => "early_growth",
            Self::Adolescence => "adolescence",
            Self::Maturity => "maturity",
        }
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_vocabularies_parse() {
        assert_eq!(Phase::from_wire("infancy"), Some(Phase::Infancy));
        assert_eq!(Phase::from_wire("infant"), Some(Phase::Infancy));
        assert_eq!(Phase::from_wire("early_growth"), Some(Phase::EarlyGrowth));
        assert_eq!(Phase::from_wire("juvenile"), Some(Phase::EarlyGrowth));
        assert_eq!(Phase::from_wire("adolescence"), Some(Phase::Adolescence));
        assert_eq!(Phase::from_wire("mature"), Some(Phase::Adolescence));
        assert_eq!(Phase::from_wire("maturity"), Some(Phase::Maturity));
        assert_eq!(Phase::from_wire("elder"), Some(Phase::Maturity));
        assert_eq!(Phase::from_wire("hatchling"), None);
    }

    #[test]
    fn boundaries() {
        assert_eq!(Phase::for_age(0), Phase::Infancy);
        assert_eq!(Phase::for_age(499), Phase::Infancy);
        assert_eq!(Phase::for_age(500), Phase::EarlyGrowth);
        assert_eq!(Phase::for_age(2499), Phase::EarlyGrowth);
        assert_eq!(Phase::for_age(2500), Phase::Adolescence);
        assert_eq!(Phase::for_age(7000), Phase::Maturity);
        assert_eq!(Phase::for_age(u64::MAX), Phase::Maturity);
    }

    #[test]
    fn phase_never_regresses_with_age() {
        let mut previous = Phase::for_age(0);
        for age in (0..10_000_u64).step_by(7) {
            let phase = Phase::for_age(age);
            assert!(phase >= previous, "phase regressed at age {age}");
            previous = phase;
        }
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&Phase::EarlyGrowth).ok();
        assert_eq!(json.as_deref(), Some("\"early_growth\""));
        for phase in [Phase::Infancy, Phase::EarlyGrowth, Phase::Adolescence, Phase::Maturity] {
            assert_eq!(Phase::from_wire(phase.as_str()), Some(phase));
        }
    }
}
