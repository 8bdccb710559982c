pub mod calculator;
pub mod normalize;

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reserve-style sources lend the principal out as debt, vault-style sources
/// deploy it into underlying markets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Reserve,
    Vault,
}

impl EntityKind {
    pub fn total_label(&self) -> &'static str {
        match self {
            Self::Reserve => "Total Liquidity",
            Self::Vault => "Total Deposits",
        }
    }

    pub fn debt_label(&self) -> &'static str {
        match self {
            Self::Reserve => "Total Debt",
            Self::Vault => "Deployed",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reserve => write!(f, "reserve"),
            Self::Vault => write!(f, "vault"),
        }
    }
}

/// Snapshot of one pool or vault, in display units.
///
/// `total_debt` is whatever the adapter reports; it is not required to equal
/// `total_liquidity - available_liquidity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    pub entity_id: String,
    pub display_name: String,
    pub kind: EntityKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_liquidity: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub available_liquidity: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_debt: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub supply_apy_percent: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl Reading {
    pub fn new(entity_id: impl Into<String>, display_name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            entity_id: entity_id.into(),
            display_name: display_name.into(),
            kind,
            total_liquidity: Decimal::ZERO,
            available_liquidity: Decimal::ZERO,
            total_debt: Decimal::ZERO,
            supply_apy_percent: Decimal::ZERO,
            observed_at: Utc::now(),
        }
    }

    pub fn with_liquidity(mut self, total: Decimal, available: Decimal, debt: Decimal) -> Self {
        self.total_liquidity = total;
        self.available_liquidity = available;
        self.total_debt = debt;
        self
    }

    pub fn with_apy(mut self, supply_apy_percent: Decimal) -> Self {
        self.supply_apy_percent = supply_apy_percent;
        self
    }

    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = at;
        self
    }
}

/// A reading together with the figures derived from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assessment {
    pub reading: Reading,
    #[serde(with = "rust_decimal::serde::str")]
    pub utilization_percent: Decimal,
}
