#![deny(warnings)]

//! Core domain model for the rivalry campaign simulation.
//!
//! This crate defines the serializable types shared by the market engine,
//! the competitor AI and the turn runtime, with validation helpers that guard
//! invariants at campaign construction and at the per-turn input boundary.

pub mod action;
pub mod ai;
pub mod company;
pub mod config;
pub mod error;
pub mod market;
pub mod record;
pub mod rng;

pub use action::{Action, ActionKind, UserCommand};
pub use ai::{AiState, OutcomeSample, Personality, Phase, Vocabulary};
pub use company::{AssetClass, BusinessUnit, Company, OpponentView, Party, UnitKind, UnitProfile};
pub use config::{
    AiConfig, CampaignConfig, CompanyConfig, CompetitorPolicy, MarketConfig, ResolverConfig,
};
pub use error::{ConfigError, InputError};
pub use market::{EconomicCondition, MarketEnvironment, MarketShock, MarketType, QuarterOfYear};
pub use record::{Event, EventKind, SideDelta, TurnDeltas, TurnRecord};
pub use rng::{RngPosition, SimRng};

/// Total addressable market in percentage points.
pub const SHARE_TOTAL: f64 = 100.0;

/// Clamp into [0, 1]. NaN collapses to 0.
pub fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Clamp into [-1, 1]. NaN collapses to 0.
pub fn clamp_signed(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(-1.0, 1.0)
    }
}

/// Clamp into [0, 100]. NaN collapses to 0.
pub fn clamp_share(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, SHARE_TOTAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nan_collapses_to_zero() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_signed(f64::NAN), 0.0);
        assert_eq!(clamp_share(f64::NAN), 0.0);
    }

    #[test]
    fn company_snapshot_roundtrip() {
        let cfg = CampaignConfig::default();
        let c = cfg.user.build(Party::User);
        let s = serde_json::to_string_pretty(&c).unwrap();
        let back: Company = serde_json::from_str(&s).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.units.len(), 7);
    }

    proptest! {
        #[test]
        fn clamps_stay_in_domain(v in proptest::num::f64::ANY) {
            prop_assert!((0.0..=1.0).contains(&clamp_unit(v)));
            prop_assert!((-1.0..=1.0).contains(&clamp_signed(v)));
            prop_assert!((0.0..=100.0).contains(&clamp_share(v)));
        }
    }
}
