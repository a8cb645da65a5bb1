//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// ABO/Rh blood group label
///
/// The variant order is the canonical enumeration order used by every
/// per-type report and tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-", alias = "O−")]
    ONegative,
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-", alias = "A−")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-", alias = "B−")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-", alias = "AB−")]
    AbNegative,
}

impl BloodType {
    /// All blood types in canonical order
    pub const ALL: [BloodType; 8] = [
        BloodType::OPositive,
        BloodType::ONegative,
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
        }
    }
}

impl std::fmt::Display for BloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Error returned when a blood type label cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown blood type: {0}")]
pub struct ParseBloodTypeError(pub String);

impl std::str::FromStr for BloodType {
    type Err = ParseBloodTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the typographic minus sign used on printed labels
        let normalized = s.trim().replace('−', "-").to_ascii_uppercase();
        BloodType::ALL
            .into_iter()
            .find(|bt| bt.label() == normalized)
            .ok_or_else(|| ParseBloodTypeError(s.to_string()))
    }
}
