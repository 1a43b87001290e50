//! Error taxonomy for campaign setup and the per-turn input boundary.

use crate::company::UnitKind;
use crate::action::ActionKind;
use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed campaign setup. Raised at construction, never mid-run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Scenario text could not be parsed (includes unknown enum values).
    #[error("scenario parse error: {0}")]
    Parse(String),
    /// Monetary value must be non-negative.
    #[error("negative monetary value for {0}")]
    NegativeMoney(String),
    /// Numeric field outside its domain.
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Thresholds that contradict each other.
    #[error("inconsistent thresholds: {0}")]
    InconsistentThresholds(String),
    /// Counts and windows must be at least one.
    #[error("{0} must be at least 1")]
    ZeroCount(String),
    /// A company was configured without business units.
    #[error("company {0} has no business units")]
    NoUnits(String),
    /// Resolver input that breaks the action contract (negative magnitude,
    /// duplicate actor, action/company mismatch).
    #[error("action contract violated: {0}")]
    ActionContract(String),
}

/// User allocation rejected at the input boundary. The turn does not advance.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    /// Allocation amounts must be non-negative.
    #[error("negative allocation {amount} for {unit:?}")]
    NegativeAllocation { unit: UnitKind, amount: Decimal },
    /// Total allocation exceeds available cash.
    #[error("allocation {requested} exceeds available cash {available}")]
    OverBudget { requested: Decimal, available: Decimal },
    /// The company does not own the targeted unit.
    #[error("company has no {0:?} unit")]
    UnknownUnit(UnitKind),
    /// A non-hold action needs a positive allocation.
    #[error("{0:?} requires a positive allocation")]
    EmptyAllocation(ActionKind),
    /// Hold commits nothing.
    #[error("hold cannot carry an allocation")]
    HoldWithAllocation,
}
