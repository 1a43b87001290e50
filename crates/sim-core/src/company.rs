//! Companies, business units and their static profiles.

use crate::{clamp_unit, SHARE_TOTAL};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The two sides of a campaign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// Human-controlled company.
    User,
    /// AI-controlled rival.
    Competitor,
}

impl Party {
    /// Both parties in canonical order.
    pub const BOTH: [Party; 2] = [Party::User, Party::Competitor];

    pub fn opponent(self) -> Party {
        match self {
            Party::User => Party::Competitor,
            Party::Competitor => Party::User,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::User => write!(f, "You"),
            Party::Competitor => write!(f, "Competitor"),
        }
    }
}

/// Functional departments a company allocates budget to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Sales,
    Marketing,
    #[serde(rename = "rnd", alias = "r&d")]
    RnD,
    Legal,
    Finance,
    Analytics,
    MarketIntelligence,
}

/// Coarse grouping of units used by counter rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Commercial,
    Innovation,
    Protection,
    Intelligence,
}

/// Static characteristics of a unit kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitProfile {
    /// Market influence when used offensively.
    pub impact: f64,
    /// Protection against rival pressure.
    pub resilience: f64,
    /// Speed of action/innovation.
    pub agility: f64,
    /// Marketing-style units scale with brand strength.
    pub brand_boost: bool,
}

impl UnitKind {
    /// All unit kinds in canonical order.
    pub const ALL: [UnitKind; 7] = [
        UnitKind::Sales,
        UnitKind::Marketing,
        UnitKind::RnD,
        UnitKind::Legal,
        UnitKind::Finance,
        UnitKind::Analytics,
        UnitKind::MarketIntelligence,
    ];

    pub fn profile(self) -> UnitProfile {
        let (impact, resilience, agility, brand_boost) = match self {
            UnitKind::Sales => (8.0, 6.0, 7.0, false),
            UnitKind::Marketing => (10.0, 5.0, 6.0, true),
            UnitKind::RnD => (15.0, 8.0, 5.0, false),
            UnitKind::Legal => (4.0, 13.0, 3.0, false),
            UnitKind::Finance => (6.0, 10.0, 4.0, false),
            UnitKind::Analytics => (5.0, 7.0, 4.0, false),
            UnitKind::MarketIntelligence => (2.0, 2.0, 7.0, false),
        };
        UnitProfile {
            impact,
            resilience,
            agility,
            brand_boost,
        }
    }

    pub fn asset_class(self) -> AssetClass {
        match self {
            UnitKind::Sales | UnitKind::Marketing => AssetClass::Commercial,
            UnitKind::RnD | UnitKind::Analytics => AssetClass::Innovation,
            UnitKind::Legal | UnitKind::Finance => AssetClass::Protection,
            UnitKind::MarketIntelligence => AssetClass::Intelligence,
        }
    }

    /// Human-readable label for event text and reports.
    pub fn label(self) -> &'static str {
        match self {
            UnitKind::Sales => "Sales",
            UnitKind::Marketing => "Marketing",
            UnitKind::RnD => "R&D",
            UnitKind::Legal => "Legal",
            UnitKind::Finance => "Finance",
            UnitKind::Analytics => "Analytics",
            UnitKind::MarketIntelligence => "Market Intelligence",
        }
    }
}

/// A department with its budget and allocation history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessUnit {
    pub kind: UnitKind,
    /// Current budget (>= 0).
    pub budget: Decimal,
    /// Talent level in [0,1].
    pub talent: f64,
    /// Allocation received in each resolved turn, oldest first.
    pub history: Vec<Decimal>,
}

impl BusinessUnit {
    pub fn new(kind: UnitKind, budget: Decimal) -> Self {
        Self {
            kind,
            budget,
            talent: 0.5,
            history: Vec::new(),
        }
    }

    /// Offensive effectiveness multiplier under the given stress and brand.
    pub fn effectiveness(&self, stress: f64, brand_strength: f64) -> f64 {
        let p = self.kind.profile();
        let mut eff =
            p.impact / 10.0 * (1.0 - clamp_unit(stress) * 0.5) * (1.0 + clamp_unit(self.talent) * 0.2);
        if p.brand_boost {
            eff *= 1.2 + brand_strength.clamp(0.0, 100.0) / 500.0;
        }
        eff
    }

    /// Defensive multiplier under the given stress.
    pub fn resilience(&self, stress: f64) -> f64 {
        self.kind.profile().resilience / 10.0 * (1.0 - clamp_unit(stress) * 0.5)
    }

    /// Mean allocation over the last `window` turns (0 when no history).
    pub fn recent_allocation(&self, window: usize) -> f64 {
        let n = self.history.len().min(window);
        if n == 0 {
            return 0.0;
        }
        let sum: Decimal = self.history[self.history.len() - n..].iter().copied().sum();
        sum.to_f64().unwrap_or(0.0) / n as f64
    }
}

/// One side of the campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub party: Party,
    pub name: String,
    /// Cash pool (>= 0).
    pub cash: Decimal,
    /// Investment points (>= 0).
    pub investment_points: Decimal,
    /// Brand strength in [0,100].
    pub brand_strength: f64,
    pub units: BTreeMap<UnitKind, BusinessUnit>,
    /// Market share in percentage points [0,100].
    pub market_share: f64,
    /// Organisational stress in [0,1].
    pub stress: f64,
    /// Liquidity in [0,1].
    pub liquidity: f64,
    /// Company sentiment in [-1,1].
    pub sentiment: f64,
    /// Leadership quality in [0,1].
    pub leadership: f64,
}

impl Company {
    pub fn unit(&self, kind: UnitKind) -> Option<&BusinessUnit> {
        self.units.get(&kind)
    }

    /// Sum of all unit budgets.
    pub fn total_budget(&self) -> Decimal {
        self.units.values().map(|u| u.budget).sum()
    }

    /// Budget share of each unit. All zeros when the company has no budget.
    pub fn budget_distribution(&self) -> BTreeMap<UnitKind, f64> {
        let total = self.total_budget().to_f64().unwrap_or(0.0);
        self.units
            .iter()
            .map(|(k, u)| {
                let frac = if total > 0.0 {
                    u.budget.to_f64().unwrap_or(0.0) / total
                } else {
                    0.0
                };
                (*k, frac)
            })
            .collect()
    }

    /// Budget held by the market intelligence unit, as f64.
    pub fn intelligence_budget(&self) -> f64 {
        self.unit(UnitKind::MarketIntelligence)
            .and_then(|u| u.budget.to_f64())
            .unwrap_or(0.0)
    }

    pub fn is_bankrupt(&self) -> bool {
        self.cash <= Decimal::ZERO
    }

    /// What the rival is allowed to observe.
    pub fn public_view(&self) -> OpponentView {
        OpponentView {
            party: self.party,
            market_share: self.market_share,
            brand_strength: self.brand_strength,
            stress: self.stress,
            distribution: self.budget_distribution(),
        }
    }

    /// Share not held by this company.
    pub fn residual_share(&self) -> f64 {
        SHARE_TOTAL - self.market_share
    }
}

/// Read-only public state of the opponent handed to the AI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpponentView {
    pub party: Party,
    pub market_share: f64,
    pub brand_strength: f64,
    pub stress: f64,
    pub distribution: BTreeMap<UnitKind, f64>,
}

impl OpponentView {
    /// Unit with the largest budget share; ties resolve to canonical order.
    pub fn dominant_unit(&self) -> Option<UnitKind> {
        let mut best: Option<(UnitKind, f64)> = None;
        for (k, v) in &self.distribution {
            match best {
                Some((_, b)) if *v <= b => {}
                _ => best = Some((*k, *v)),
            }
        }
        best.filter(|(_, v)| *v > 0.0).map(|(k, _)| k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company() -> Company {
        let mut units = BTreeMap::new();
        units.insert(UnitKind::Sales, BusinessUnit::new(UnitKind::Sales, Decimal::new(300, 0)));
        units.insert(
            UnitKind::Marketing,
            BusinessUnit::new(UnitKind::Marketing, Decimal::new(100, 0)),
        );
        Company {
            party: Party::User,
            name: "TestCo".into(),
            cash: Decimal::new(1000, 0),
            investment_points: Decimal::new(300, 0),
            brand_strength: 0.0,
            units,
            market_share: 40.0,
            stress: 0.0,
            liquidity: 1.0,
            sentiment: 0.0,
            leadership: 0.8,
        }
    }

    #[test]
    fn opponent_is_involution() {
        for p in Party::BOTH {
            assert_eq!(p.opponent().opponent(), p);
            assert_ne!(p.opponent(), p);
        }
    }

    #[test]
    fn distribution_sums_to_one() {
        let c = company();
        let d = c.budget_distribution();
        let s: f64 = d.values().sum();
        assert!((s - 1.0).abs() < 1e-12);
        assert!((d[&UnitKind::Sales] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn dominant_unit_from_view() {
        let v = company().public_view();
        assert_eq!(v.dominant_unit(), Some(UnitKind::Sales));
    }

    #[test]
    fn stress_weakens_units() {
        let u = BusinessUnit::new(UnitKind::RnD, Decimal::new(100, 0));
        assert!(u.effectiveness(1.0, 0.0) < u.effectiveness(0.0, 0.0));
        assert!(u.resilience(1.0) < u.resilience(0.0));
    }

    #[test]
    fn brand_boosts_marketing_only() {
        let m = BusinessUnit::new(UnitKind::Marketing, Decimal::ONE);
        let s = BusinessUnit::new(UnitKind::Sales, Decimal::ONE);
        assert!(m.effectiveness(0.0, 100.0) > m.effectiveness(0.0, 0.0));
        assert_eq!(s.effectiveness(0.0, 100.0), s.effectiveness(0.0, 0.0));
    }

    #[test]
    fn recent_allocation_window() {
        let mut u = BusinessUnit::new(UnitKind::Legal, Decimal::ZERO);
        assert_eq!(u.recent_allocation(3), 0.0);
        u.history = vec![Decimal::new(10, 0), Decimal::new(20, 0), Decimal::new(40, 0)];
        assert!((u.recent_allocation(2) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn zero_cash_is_bankrupt() {
        let mut c = company();
        assert!(!c.is_bankrupt());
        c.cash = Decimal::ZERO;
        assert!(c.is_bankrupt());
    }
}
