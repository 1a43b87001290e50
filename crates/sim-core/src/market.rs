//! Macro market conditions shared by both companies.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Structural type of the market.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Stable,
    Volatile,
    Regulated,
    Emerging,
    Declining,
}

impl MarketType {
    pub const ALL: [MarketType; 5] = [
        MarketType::Stable,
        MarketType::Volatile,
        MarketType::Regulated,
        MarketType::Emerging,
        MarketType::Declining,
    ];

    /// Level volatility reverts toward.
    pub fn baseline_volatility(self) -> f64 {
        match self {
            MarketType::Stable => 0.15,
            MarketType::Volatile => 0.6,
            MarketType::Regulated => 0.2,
            MarketType::Emerging => 0.45,
            MarketType::Declining => 0.35,
        }
    }

    /// Multiplier on the random-walk step size.
    pub fn walk_scale(self) -> f64 {
        match self {
            MarketType::Stable => 0.5,
            MarketType::Volatile => 1.6,
            MarketType::Regulated => 0.6,
            MarketType::Emerging => 1.2,
            MarketType::Declining => 1.0,
        }
    }
}

/// Macro-economic regime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EconomicCondition {
    Growth,
    Inflation,
    Recession,
    Stagflation,
}

impl EconomicCondition {
    pub const ALL: [EconomicCondition; 4] = [
        EconomicCondition::Growth,
        EconomicCondition::Inflation,
        EconomicCondition::Recession,
        EconomicCondition::Stagflation,
    ];

    /// Revenue multiplier applied to share-based income.
    pub fn revenue_factor(self) -> f64 {
        match self {
            EconomicCondition::Growth => 1.1,
            EconomicCondition::Inflation => 1.0,
            EconomicCondition::Recession => 0.8,
            EconomicCondition::Stagflation => 0.85,
        }
    }

    /// Multiplier on the market impact of investment.
    pub fn invest_factor(self) -> f64 {
        match self {
            EconomicCondition::Growth => 1.1,
            EconomicCondition::Inflation => 0.95,
            EconomicCondition::Recession => 0.85,
            EconomicCondition::Stagflation => 0.8,
        }
    }
}

/// Calendar quarter within the fiscal year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuarterOfYear {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl QuarterOfYear {
    pub fn from_date(date: NaiveDate) -> Self {
        match date.month() {
            1..=3 => QuarterOfYear::Q1,
            4..=6 => QuarterOfYear::Q2,
            7..=9 => QuarterOfYear::Q3,
            _ => QuarterOfYear::Q4,
        }
    }
}

/// One-off external event affecting a single quarter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketShock {
    /// Innovation gain boosts R&D impact.
    TechBreakthrough,
    /// Liquidity drop and increased stress.
    MarketCrash,
    /// Market becomes regulated; legal defenses strengthen.
    RegulatoryChange,
}

impl MarketShock {
    pub const ALL: [MarketShock; 3] = [
        MarketShock::TechBreakthrough,
        MarketShock::MarketCrash,
        MarketShock::RegulatoryChange,
    ];

    pub fn description(self) -> &'static str {
        match self {
            MarketShock::TechBreakthrough => "Tech breakthrough: innovation gain boosts R&D impact",
            MarketShock::MarketCrash => "Market crash: liquidity drop and increased stress",
            MarketShock::RegulatoryChange => "Regulatory change: legal costs and protections increase",
        }
    }
}

/// Market state for the current quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketEnvironment {
    pub market_type: MarketType,
    pub economy: EconomicCondition,
    /// Volatility in [0,1].
    pub volatility: f64,
    /// Market-wide liquidity in [0,1].
    pub liquidity: f64,
    /// Market sentiment in [-1,1].
    pub sentiment: f64,
    /// Quarters elapsed since campaign start; monotonically increasing.
    pub cycle: u32,
    /// First day of the current quarter.
    pub date: NaiveDate,
    /// Shock drawn for this quarter, if any.
    pub shock: Option<MarketShock>,
}

impl MarketEnvironment {
    pub fn quarter(&self) -> QuarterOfYear {
        QuarterOfYear::from_date(self.date)
    }

    /// Fear index in [0,1] derived from sentiment.
    pub fn fear_index(&self) -> f64 {
        ((1.0 - self.sentiment) / 2.0).clamp(0.0, 1.0)
    }
}
