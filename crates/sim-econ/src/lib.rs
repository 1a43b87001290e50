#![deny(warnings)]

//! Market environment engine: evolves macro conditions each quarter.
//!
//! This module provides:
//! - The economic-regime transition table keyed by (condition, market type)
//! - Bounded random walks for volatility and liquidity
//! - Sentiment persistence with decay toward the previous turn's push
//! - Market-type drift and one-quarter external shocks
//!
//! `advance` never fails: every output is clamped into its domain. Malformed
//! configuration is rejected earlier, at campaign construction.

use chrono::Months;
use sim_core::{
    clamp_signed, clamp_unit, EconomicCondition, Event, EventKind, MarketConfig,
    MarketEnvironment, MarketShock, MarketType, SimRng,
};
use tracing::debug;

/// Strength of mean reversion toward the market type's baseline volatility.
const VOLATILITY_REVERSION: f64 = 0.1;
/// Volatility added by a crash.
const CRASH_VOLATILITY: f64 = 0.2;
/// Market liquidity removed by a crash.
const CRASH_LIQUIDITY: f64 = 0.3;

/// Result of advancing the environment by one quarter.
#[derive(Clone, Debug, PartialEq)]
pub struct Advance {
    pub environment: MarketEnvironment,
    /// Market-wide events for the audit trail.
    pub events: Vec<Event>,
}

/// Transition weights from `current` to each condition, in
/// `EconomicCondition::ALL` order.
pub fn transition_weights(current: EconomicCondition, market: MarketType) -> [u32; 4] {
    use EconomicCondition::*;
    let mut w: [u32; 4] = match current {
        Growth => [70, 15, 10, 5],
        Inflation => [20, 55, 10, 15],
        Recession => [25, 5, 60, 10],
        Stagflation => [10, 20, 20, 50],
    };
    let stay = EconomicCondition::ALL
        .iter()
        .position(|c| *c == current)
        .unwrap_or(0);
    match market {
        MarketType::Stable => w[stay] *= 2,
        MarketType::Volatile => w.iter_mut().for_each(|x| *x += 20),
        MarketType::Regulated => w[stay] += 20,
        MarketType::Emerging => {
            w[0] += 20;
            w[1] += 10;
        }
        MarketType::Declining => {
            w[2] += 20;
            w[3] += 10;
        }
    }
    w
}

/// Strategic tension in [0,1]: fear, volatility and illiquidity combined.
pub fn risk_tension(env: &MarketEnvironment) -> f64 {
    clamp_unit(0.4 * env.fear_index() + 0.3 * env.volatility + 0.3 * (1.0 - env.liquidity))
}

fn liquidity_drift(economy: EconomicCondition) -> f64 {
    match economy {
        EconomicCondition::Growth => 0.02,
        EconomicCondition::Inflation => -0.01,
        EconomicCondition::Recession => -0.03,
        EconomicCondition::Stagflation => -0.02,
    }
}

/// Advance the environment to the quarter played at `turn`.
///
/// `push` is the previous turn's resolved market push (0 on the first turn).
/// Draw order from `rng` is fixed, so the result is a pure function of the
/// inputs and the stream position.
pub fn advance(
    env: &MarketEnvironment,
    turn: u32,
    push: f64,
    cfg: &MarketConfig,
    rng: &mut SimRng,
) -> Advance {
    let mut events = Vec::new();
    let mut next = env.clone();
    next.cycle = turn + 1;
    next.date = env
        .date
        .checked_add_months(Months::new(3))
        .unwrap_or(env.date);
    next.shock = None;

    if rng.chance(cfg.market_shift_chance) {
        let idx = rng.weighted_index(&[1u32; 5]).unwrap_or(0);
        let drawn = MarketType::ALL[idx];
        if drawn != next.market_type {
            events.push(Event::market(
                EventKind::Environment,
                format!("Market shifted from {:?} to {:?}.", next.market_type, drawn),
            ));
            next.market_type = drawn;
        }
    }

    let weights = transition_weights(env.economy, next.market_type);
    let idx = rng.weighted_index(&weights).unwrap_or(0);
    let economy = EconomicCondition::ALL[idx];
    if economy != env.economy {
        events.push(Event::market(
            EventKind::Environment,
            format!("Economy moved from {:?} to {:?}.", env.economy, economy),
        ));
    }
    next.economy = economy;

    let vol_u = rng.uniform(-1.0, 1.0);
    let liq_u = rng.uniform(-1.0, 1.0);
    let baseline = next.market_type.baseline_volatility();
    next.volatility = clamp_unit(
        env.volatility
            + cfg.volatility_step * next.market_type.walk_scale() * vol_u
            + VOLATILITY_REVERSION * (baseline - env.volatility),
    );
    next.liquidity =
        clamp_unit(env.liquidity + cfg.liquidity_step * liq_u + liquidity_drift(economy));

    let decay = cfg.sentiment_decay;
    next.sentiment = clamp_signed(env.sentiment * decay + clamp_signed(push) * (1.0 - decay));

    if rng.chance(cfg.shock_chance) {
        let idx = rng.weighted_index(&[1u32; 3]).unwrap_or(0);
        let shock = MarketShock::ALL[idx];
        match shock {
            MarketShock::MarketCrash => {
                next.liquidity = clamp_unit(next.liquidity - CRASH_LIQUIDITY);
                next.volatility = clamp_unit(next.volatility + CRASH_VOLATILITY);
            }
            MarketShock::RegulatoryChange => next.market_type = MarketType::Regulated,
            MarketShock::TechBreakthrough => {}
        }
        events.push(Event::market(EventKind::Environment, shock.description()));
        next.shock = Some(shock);
    }

    debug!(
        turn,
        economy = ?next.economy,
        market = ?next.market_type,
        volatility = next.volatility,
        liquidity = next.liquidity,
        sentiment = next.sentiment,
        "environment advanced"
    );
    Advance {
        environment: next,
        events,
    }
}
