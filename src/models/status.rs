use serde::Deserialize;
use std::fmt;
use std::fmt::{Display, Formatter};

/// The decision the backend reached for a transaction.
///
/// Anything outside the three known outcomes is kept verbatim as `Unknown`
/// so that a data-quality defect is counted rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Status {
    Approved,
    Review,
    Declined,
    Unknown(String)
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Approved => "approved",
            Status::Review => "review",
            Status::Declined => "declined",
            Status::Unknown(raw) => raw
        }
    }

    /// Case-insensitive, whitespace-trimmed comparison against a filter value.
    pub fn matches(&self, filter: &str) -> bool {
        self.as_str().trim().eq_ignore_ascii_case(filter.trim())
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Unknown(String::new())
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "approved" => Status::Approved,
            "review" => Status::Review,
            "declined" => Status::Declined,
            _ => Status::Unknown(value)
        }
    }
}

impl From<&str> for Status {
    fn from(value: &str) -> Self {
        Status::from(value.to_string())
    }
}

impl Display for Status {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Display band of a fraud score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskClass {
    Low,
    Medium,
    High
}

impl RiskClass {
    pub const MEDIUM_THRESHOLD: f64 = 0.40;
    pub const HIGH_THRESHOLD: f64 = 0.75;

    pub fn from_score(score: f64) -> Self {
        if score < Self::MEDIUM_THRESHOLD {
            RiskClass::Low
        } else if score < Self::HIGH_THRESHOLD {
            RiskClass::Medium
        } else {
            RiskClass::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskClass::Low => "Low",
            RiskClass::Medium => "Medium",
            RiskClass::High => "High"
        }
    }
}
