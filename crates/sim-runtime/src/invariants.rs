//! Post-resolution consistency checks.
//!
//! A failure here means the resolver produced an impossible state. The
//! campaign is aborted rather than allowed to carry corrupt numbers forward.

use rust_decimal::Decimal;
use sim_core::{Company, MarketEnvironment, TurnRecord, SHARE_TOTAL};
use thiserror::Error;

/// Tolerance for float sums that should be exact up to rounding.
pub const SHARE_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("raw share deltas do not cancel: {user} vs {competitor}")]
    RawShareImbalance { user: f64, competitor: f64 },
    #[error("applied share deltas do not cancel: {user} vs {competitor}")]
    AppliedShareImbalance { user: f64, competitor: f64 },
    #[error("combined market share {0} exceeds the total")]
    ShareOverflow(f64),
    #[error("{company}: {metric} = {value} is out of bounds")]
    OutOfBounds {
        company: String,
        metric: &'static str,
        value: f64,
    },
    #[error("{company}: {what} went negative ({value})")]
    NegativeMoney {
        company: String,
        what: String,
        value: Decimal,
    },
    #[error("turn index {found} does not follow {expected}")]
    TurnSkipped { expected: u32, found: u32 },
    #[error("environment {metric} = {value} is out of bounds")]
    Environment { metric: &'static str, value: f64 },
}

fn bounded(
    company: &Company,
    metric: &'static str,
    value: f64,
    lo: f64,
    hi: f64,
) -> Result<(), InvariantViolation> {
    if value.is_nan() || value < lo || value > hi {
        return Err(InvariantViolation::OutOfBounds {
            company: company.name.clone(),
            metric,
            value,
        });
    }
    Ok(())
}

fn non_negative(company: &Company, what: &str, value: Decimal) -> Result<(), InvariantViolation> {
    if value < Decimal::ZERO {
        return Err(InvariantViolation::NegativeMoney {
            company: company.name.clone(),
            what: what.to_string(),
            value,
        });
    }
    Ok(())
}

/// Domain checks for one company.
pub fn check_company(c: &Company) -> Result<(), InvariantViolation> {
    bounded(c, "market_share", c.market_share, 0.0, SHARE_TOTAL)?;
    bounded(c, "stress", c.stress, 0.0, 1.0)?;
    bounded(c, "liquidity", c.liquidity, 0.0, 1.0)?;
    bounded(c, "sentiment", c.sentiment, -1.0, 1.0)?;
    bounded(c, "brand_strength", c.brand_strength, 0.0, 100.0)?;
    non_negative(c, "cash", c.cash)?;
    non_negative(c, "investment_points", c.investment_points)?;
    for unit in c.units.values() {
        non_negative(c, unit.kind.label(), unit.budget)?;
    }
    Ok(())
}

pub fn check_environment(env: &MarketEnvironment) -> Result<(), InvariantViolation> {
    for (metric, value, lo) in [
        ("volatility", env.volatility, 0.0),
        ("liquidity", env.liquidity, 0.0),
        ("sentiment", env.sentiment, -1.0),
    ] {
        if value.is_nan() || value < lo || value > 1.0 {
            return Err(InvariantViolation::Environment { metric, value });
        }
    }
    Ok(())
}

/// Every check a freshly built record must pass. `expected_turn` is the
/// index the record should carry.
pub fn check_record(record: &TurnRecord, expected_turn: u32) -> Result<(), InvariantViolation> {
    if record.turn != expected_turn {
        return Err(InvariantViolation::TurnSkipped {
            expected: expected_turn,
            found: record.turn,
        });
    }
    let d = &record.deltas;
    if d.user.raw_share != -d.competitor.raw_share {
        return Err(InvariantViolation::RawShareImbalance {
            user: d.user.raw_share,
            competitor: d.competitor.raw_share,
        });
    }
    if (d.user.share + d.competitor.share).abs() > SHARE_EPSILON {
        return Err(InvariantViolation::AppliedShareImbalance {
            user: d.user.share,
            competitor: d.competitor.share,
        });
    }
    let total = record.user.market_share + record.competitor.market_share;
    if total > SHARE_TOTAL + SHARE_EPSILON {
        return Err(InvariantViolation::ShareOverflow(total));
    }
    check_company(&record.user)?;
    check_company(&record.competitor)?;
    check_environment(&record.environment)
}
