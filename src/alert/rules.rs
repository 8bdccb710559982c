use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Normal,
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Normal => "✅",
            Self::Warning => "⚠️",
            Self::Critical => "🚨",
        }
    }
}

impl Display for AlertLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Normal => "NORMAL",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        };
        write!(f, "{display}")
    }
}

/// Utilization percentages above which an entity is classified. Both bounds
/// are exclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    #[serde(with = "rust_decimal::serde::float")]
    pub warning: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub critical: Decimal,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning: dec!(90),
            critical: dec!(95),
        }
    }
}

impl Thresholds {
    pub fn classify(&self, utilization_percent: Decimal) -> AlertLevel {
        if utilization_percent > self.critical {
            AlertLevel::Critical
        } else if utilization_percent > self.warning {
            AlertLevel::Warning
        } else {
            AlertLevel::Normal
        }
    }
}
