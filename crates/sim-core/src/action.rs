//! Actions and the user command accepted at the input boundary.

use crate::company::{AssetClass, Company, Party, UnitKind};
use crate::error::{ConfigError, InputError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a company does with its committed budget this quarter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Grow unit budgets; modest market pressure.
    Invest,
    /// Campaign against the rival's position.
    Attack,
    /// Shield the targeted asset classes.
    Defend,
    /// Spread budget across units; light pressure and light cover.
    Diversify,
    /// Intelligence operation: sabotage rival liquidity.
    Exploit,
    /// Commit nothing.
    Hold,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Invest,
        ActionKind::Attack,
        ActionKind::Defend,
        ActionKind::Diversify,
        ActionKind::Exploit,
        ActionKind::Hold,
    ];

    /// Share of allocation converted into market pressure.
    pub fn offense_coefficient(self) -> f64 {
        match self {
            ActionKind::Attack => 1.0,
            ActionKind::Exploit => 0.7,
            ActionKind::Invest => 0.4,
            ActionKind::Diversify => 0.2,
            ActionKind::Defend | ActionKind::Hold => 0.0,
        }
    }

    /// Whether allocated money is retained in unit budgets.
    pub fn retains_budget(self) -> bool {
        matches!(
            self,
            ActionKind::Invest | ActionKind::Defend | ActionKind::Diversify
        )
    }

    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::Invest => "invests",
            ActionKind::Attack => "attacks",
            ActionKind::Defend => "defends",
            ActionKind::Diversify => "diversifies",
            ActionKind::Exploit => "runs an intelligence operation",
            ActionKind::Hold => "holds position",
        }
    }
}

/// A resolved-ready action with per-unit allocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub actor: Party,
    pub kind: ActionKind,
    pub allocation: BTreeMap<UnitKind, Decimal>,
    /// Bluff flag; eligible for the misread bonus.
    #[serde(default)]
    pub feint: bool,
}

impl Action {
    pub fn hold(actor: Party) -> Self {
        Self {
            actor,
            kind: ActionKind::Hold,
            allocation: BTreeMap::new(),
            feint: false,
        }
    }

    /// Total committed amount.
    pub fn magnitude(&self) -> Decimal {
        self.allocation.values().copied().sum()
    }

    pub fn targets(&self) -> impl Iterator<Item = UnitKind> + '_ {
        self.allocation
            .iter()
            .filter(|(_, v)| **v > Decimal::ZERO)
            .map(|(k, _)| *k)
    }

    /// Asset classes receiving a positive allocation.
    pub fn asset_classes(&self) -> BTreeSet<AssetClass> {
        self.targets().map(UnitKind::asset_class).collect()
    }

    pub fn allocated(&self, unit: UnitKind) -> Decimal {
        self.allocation.get(&unit).copied().unwrap_or(Decimal::ZERO)
    }

    /// Check the resolver's input contract against the acting company.
    pub fn check_contract(&self, company: &Company) -> Result<(), ConfigError> {
        if self.actor != company.party {
            return Err(ConfigError::ActionContract(format!(
                "{:?} action submitted for {:?}",
                self.actor, company.party
            )));
        }
        for (unit, amount) in &self.allocation {
            if *amount < Decimal::ZERO {
                return Err(ConfigError::ActionContract(format!(
                    "negative magnitude {amount} on {unit:?}"
                )));
            }
            if !company.units.contains_key(unit) {
                return Err(ConfigError::ActionContract(format!(
                    "{unit:?} is not owned by {:?}",
                    company.party
                )));
            }
        }
        if self.magnitude() > company.cash {
            return Err(ConfigError::ActionContract(format!(
                "magnitude {} exceeds cash {}",
                self.magnitude(),
                company.cash
            )));
        }
        Ok(())
    }
}

/// Per-turn allocation command coming from the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserCommand {
    pub kind: ActionKind,
    #[serde(default)]
    pub allocation: BTreeMap<UnitKind, Decimal>,
    #[serde(default)]
    pub feint: bool,
}

impl UserCommand {
    pub fn hold() -> Self {
        Self {
            kind: ActionKind::Hold,
            allocation: BTreeMap::new(),
            feint: false,
        }
    }

    pub fn new(kind: ActionKind, allocation: BTreeMap<UnitKind, Decimal>) -> Self {
        Self {
            kind,
            allocation,
            feint: false,
        }
    }

    /// Split `total` across units by integer percentage weights.
    /// Amounts are rounded down to cents so the sum never exceeds `total`.
    pub fn from_percentages(kind: ActionKind, total: Decimal, weights: &[(UnitKind, u32)]) -> Self {
        let sum: u32 = weights.iter().map(|(_, w)| *w).sum();
        let mut allocation = BTreeMap::new();
        if sum > 0 && kind != ActionKind::Hold {
            for (unit, w) in weights {
                if *w == 0 {
                    continue;
                }
                let amount = (total * Decimal::from(*w) / Decimal::from(sum))
                    .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::ToZero);
                *allocation.entry(*unit).or_insert(Decimal::ZERO) += amount;
            }
        }
        Self::new(kind, allocation)
    }

    /// Validate against the user's company and turn the command into an
    /// action. Nothing is mutated on rejection.
    pub fn validate(&self, company: &Company) -> Result<Action, InputError> {
        for (unit, amount) in &self.allocation {
            if *amount < Decimal::ZERO {
                return Err(InputError::NegativeAllocation {
                    unit: *unit,
                    amount: *amount,
                });
            }
            if !company.units.contains_key(unit) {
                return Err(InputError::UnknownUnit(*unit));
            }
        }
        let requested: Decimal = self.allocation.values().copied().sum();
        if requested > company.cash {
            return Err(InputError::OverBudget {
                requested,
                available: company.cash,
            });
        }
        match self.kind {
            ActionKind::Hold if requested > Decimal::ZERO => Err(InputError::HoldWithAllocation),
            ActionKind::Hold => Ok(Action::hold(company.party)),
            kind if requested <= Decimal::ZERO => Err(InputError::EmptyAllocation(kind)),
            kind => Ok(Action {
                actor: company.party,
                kind,
                allocation: self
                    .allocation
                    .iter()
                    .filter(|(_, v)| **v > Decimal::ZERO)
                    .map(|(k, v)| (*k, *v))
                    .collect(),
                feint: self.feint,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::BusinessUnit;

    fn company(cash: i64) -> Company {
        let units = UnitKind::ALL
            .iter()
            .map(|k| (*k, BusinessUnit::new(*k, Decimal::new(100, 0))))
            .collect();
        Company {
            party: Party::User,
            name: "U".into(),
            cash: Decimal::new(cash, 0),
            investment_points: Decimal::ZERO,
            brand_strength: 0.0,
            units,
            market_share: 50.0,
            stress: 0.0,
            liquidity: 1.0,
            sentiment: 0.0,
            leadership: 0.5,
        }
    }

    #[test]
    fn over_budget_rejected() {
        let c = company(100);
        let cmd = UserCommand::new(
            ActionKind::Invest,
            BTreeMap::from([(UnitKind::Sales, Decimal::new(101, 0))]),
        );
        assert!(matches!(
            cmd.validate(&c),
            Err(InputError::OverBudget { .. })
        ));
    }

    #[test]
    fn exact_cash_accepted() {
        let c = company(100);
        let cmd = UserCommand::new(
            ActionKind::Attack,
            BTreeMap::from([
                (UnitKind::Sales, Decimal::new(60, 0)),
                (UnitKind::Marketing, Decimal::new(40, 0)),
            ]),
        );
        let a = cmd.validate(&c).unwrap();
        assert_eq!(a.magnitude(), Decimal::new(100, 0));
        assert_eq!(a.actor, Party::User);
    }

    #[test]
    fn negative_and_empty_rejected() {
        let c = company(100);
        let neg = UserCommand::new(
            ActionKind::Invest,
            BTreeMap::from([(UnitKind::Legal, Decimal::new(-1, 0))]),
        );
        assert!(matches!(
            neg.validate(&c),
            Err(InputError::NegativeAllocation { .. })
        ));
        let empty = UserCommand::new(ActionKind::Attack, BTreeMap::new());
        assert_eq!(
            empty.validate(&c),
            Err(InputError::EmptyAllocation(ActionKind::Attack))
        );
        let bad_hold = UserCommand::new(
            ActionKind::Hold,
            BTreeMap::from([(UnitKind::Sales, Decimal::ONE)]),
        );
        assert_eq!(bad_hold.validate(&c), Err(InputError::HoldWithAllocation));
    }

    #[test]
    fn percentages_never_exceed_total() {
        let cmd = UserCommand::from_percentages(
            ActionKind::Invest,
            Decimal::new(1000, 0),
            &[
                (UnitKind::Sales, 30),
                (UnitKind::Marketing, 20),
                (UnitKind::RnD, 15),
                (UnitKind::Legal, 10),
                (UnitKind::Finance, 15),
                (UnitKind::Analytics, 5),
                (UnitKind::MarketIntelligence, 5),
            ],
        );
        let total: Decimal = cmd.allocation.values().copied().sum();
        assert!(total <= Decimal::new(1000, 0));
        assert_eq!(cmd.allocation[&UnitKind::Sales], Decimal::new(300, 0));
    }

    #[test]
    fn contract_rejects_wrong_actor() {
        let c = company(100);
        let a = Action::hold(Party::Competitor);
        assert!(a.check_contract(&c).is_err());
        assert!(Action::hold(Party::User).check_contract(&c).is_ok());
    }
}
