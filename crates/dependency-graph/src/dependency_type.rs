//! Precedence semantics of a dependency edge.
//!
//! Every per-variant fact lives in one constant policy table so the six-way
//! semantics are defined once and matched exhaustively.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a prerequisite task constrains its dependent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DependencyType {
    /// Prerequisite must finish before the dependent starts.
    #[default]
    FinishToStart,
    /// Prerequisite must start before the dependent starts.
    StartToStart,
    /// Prerequisite must finish before the dependent finishes.
    FinishToFinish,
    /// Prerequisite must start before the dependent finishes.
    StartToFinish,
    /// Strict hard block.
    Blocking,
    /// Advisory ordering only; never blocks and never constrains dates.
    Soft,
}

/// Constant facts about one dependency type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DependencyPolicy {
    /// Symbolic name, e.g. `FINISH_TO_START`.
    pub name: &'static str,
    /// Display name, e.g. `Finish-to-Start`.
    pub display_name: &'static str,
    /// Short code, e.g. `FS`.
    pub short_code: &'static str,
    /// One-line explanation.
    pub description: &'static str,
    /// Whether the dependency can block its dependent.
    pub hard_constraint: bool,
    /// Whether the dependency participates in critical-path analysis.
    pub critical_path_relevant: bool,
    /// Ranking weight for critical-path analysis.
    pub weight: f64,
}

const FINISH_TO_START: DependencyPolicy = DependencyPolicy {
    name: "FINISH_TO_START",
    display_name: "Finish-to-Start",
    short_code: "FS",
    description: "Prerequisite must finish before the dependent can start",
    hard_constraint: true,
    critical_path_relevant: true,
    weight: 5.0,
};

const START_TO_START: DependencyPolicy = DependencyPolicy {
    name: "START_TO_START",
    display_name: "Start-to-Start",
    short_code: "SS",
    description: "Prerequisite must start before the dependent can start",
    hard_constraint: true,
    critical_path_relevant: true,
    weight: 3.0,
};

const FINISH_TO_FINISH: DependencyPolicy = DependencyPolicy {
    name: "FINISH_TO_FINISH",
    display_name: "Finish-to-Finish",
    short_code: "FF",
    description: "Prerequisite must finish before the dependent can finish",
    hard_constraint: true,
    critical_path_relevant: true,
    weight: 3.0,
};

const START_TO_FINISH: DependencyPolicy = DependencyPolicy {
    name: "START_TO_FINISH",
    display_name: "Start-to-Finish",
    short_code: "SF",
    description: "Prerequisite must start before the dependent can finish",
    hard_constraint: true,
    critical_path_relevant: true,
    weight: 2.0,
};

const BLOCKING: DependencyPolicy = DependencyPolicy {
    name: "BLOCKING",
    display_name: "Blocking",
    short_code: "BLOCK",
    description: "Dependent is blocked until the prerequisite is complete",
    hard_constraint: true,
    critical_path_relevant: true,
    weight: 10.0,
};

const SOFT: DependencyPolicy = DependencyPolicy {
    name: "SOFT",
    display_name: "Soft",
    short_code: "SOFT",
    description: "Recommended ordering that never blocks the dependent",
    hard_constraint: false,
    critical_path_relevant: false,
    weight: 0.0,
};

impl DependencyType {
    /// Every variant, in policy table order.
    pub const ALL: [Self; 6] = [
        Self::FinishToStart,
        Self::StartToStart,
        Self::FinishToFinish,
        Self::StartToFinish,
        Self::Blocking,
        Self::Soft,
    ];

    /// The policy row for this variant.
    #[must_use]
    pub const fn policy(self) -> &'static DependencyPolicy {
        match self {
            Self::FinishToStart => &FINISH_TO_START,
            Self::StartToStart => &START_TO_START,
            Self::FinishToFinish => &FINISH_TO_FINISH,
            Self::StartToFinish => &START_TO_FINISH,
            Self::Blocking => &BLOCKING,
            Self::Soft => &SOFT,
        }
    }

    /// Symbolic name, e.g. `FINISH_TO_START`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.policy().name
    }

    /// Display name, e.g. `Finish-to-Start`.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        self.policy().display_name
    }

    /// Short code, e.g. `FS`.
    #[must_use]
    pub const fn short_code(self) -> &'static str {
        self.policy().short_code
    }

    /// One-line explanation.
    #[must_use]
    pub const fn description(self) -> &'static str {
        self.policy().description
    }

    /// True for every variant except [`DependencyType::Soft`].
    #[must_use]
    pub const fn is_hard_constraint(self) -> bool {
        self.policy().hard_constraint
    }

    /// True for every variant except [`DependencyType::Soft`].
    #[must_use]
    pub const fn is_critical_path_relevant(self) -> bool {
        self.policy().critical_path_relevant
    }

    /// Critical-path weight of an active edge of this type.
    #[must_use]
    pub const fn weight(self) -> f64 {
        self.policy().weight
    }

    /// Looks a variant up by symbolic name, short code or display name, ignoring case.
    ///
    /// Returns `None` for unrecognised input so callers can choose their own fallback.
    #[must_use]
    pub fn from_string(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|variant| {
            let policy = variant.policy();
            value.eq_ignore_ascii_case(policy.name)
                || value.eq_ignore_ascii_case(policy.short_code)
                || value.eq_ignore_ascii_case(policy.display_name)
        })
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for DependencyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s).ok_or_else(|| Error::UnknownDependencyType {
            value: s.to_string(),
        })
    }
}

impl TryFrom<String> for DependencyType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DependencyType> for String {
    fn from(value: DependencyType) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_soft_is_advisory() {
        for variant in DependencyType::ALL {
            let soft = variant == DependencyType::Soft;
            assert_eq!(variant.is_hard_constraint(), !soft, "{variant}");
            assert_eq!(variant.is_critical_path_relevant(), !soft, "{variant}");
        }
    }

    #[test]
    fn test_weight_ranking() {
        let weight = DependencyType::weight;
        assert!(weight(DependencyType::Blocking) > weight(DependencyType::FinishToStart));
        assert!(weight(DependencyType::FinishToStart) > weight(DependencyType::StartToStart));
        assert!(
            (weight(DependencyType::StartToStart) - weight(DependencyType::FinishToFinish)).abs()
                < f64::EPSILON
        );
        assert!(weight(DependencyType::FinishToFinish) > weight(DependencyType::StartToFinish));
        assert!(weight(DependencyType::StartToFinish) > weight(DependencyType::Soft));
    }

    #[test]
    fn test_from_string_accepts_all_spellings() {
        assert_eq!(
            DependencyType::from_string("FINISH_TO_START"),
            Some(DependencyType::FinishToStart)
        );
        assert_eq!(DependencyType::from_string("ss"), Some(DependencyType::StartToStart));
        assert_eq!(
            DependencyType::from_string("finish-to-finish"),
            Some(DependencyType::FinishToFinish)
        );
        assert_eq!(DependencyType::from_string(" Block "), Some(DependencyType::Blocking));
        assert_eq!(DependencyType::from_string("blocking"), Some(DependencyType::Blocking));
        assert_eq!(DependencyType::from_string("soft"), Some(DependencyType::Soft));
        assert_eq!(DependencyType::from_string("sideways"), None);
        assert_eq!(DependencyType::from_string(""), None);
    }

    #[test]
    fn test_from_str_reports_unknown_value() {
        let err = "XX".parse::<DependencyType>().unwrap_err();
        assert!(matches!(err, Error::UnknownDependencyType { ref value } if value == "XX"));
    }

    #[test]
    fn test_serde_uses_symbolic_name_and_lenient_lookup() {
        let json = serde_json::to_string(&DependencyType::StartToFinish).unwrap();
        assert_eq!(json, "\"START_TO_FINISH\"");

        let parsed: DependencyType = serde_json::from_str("\"FS\"").unwrap();
        assert_eq!(parsed, DependencyType::FinishToStart);

        assert!(serde_json::from_str::<DependencyType>("\"nope\"").is_err());
    }

    #[test]
    fn test_default_is_finish_to_start() {
        assert_eq!(DependencyType::default(), DependencyType::FinishToStart);
        assert_eq!(DependencyType::default().short_code(), "FS");
    }
}
