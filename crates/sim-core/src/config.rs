//! Campaign configuration and its validation.
//!
//! Every field has a default, so a scenario file only needs to name what it
//! changes. Validation runs once at campaign construction; a configuration
//! that passes it never produces a configuration error mid-run.

use crate::ai::{Personality, Vocabulary};
use crate::company::{BusinessUnit, Company, Party, UnitKind};
use crate::error::ConfigError;
use crate::market::{EconomicCondition, MarketEnvironment, MarketType};
use crate::SHARE_TOTAL;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// How the competitor chooses its actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitorPolicy {
    /// Adaptive strategy engine.
    #[default]
    Adaptive,
    /// Observes and adapts its state but always holds.
    Passive,
}

/// Starting position of one company.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyConfig {
    pub name: String,
    pub cash: Decimal,
    pub investment_points: Decimal,
    pub brand_strength: f64,
    pub market_share: f64,
    pub stress: f64,
    pub liquidity: f64,
    pub sentiment: f64,
    pub leadership: f64,
    pub talent: f64,
    pub units: BTreeMap<UnitKind, Decimal>,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self::user_default()
    }
}

impl CompanyConfig {
    pub fn user_default() -> Self {
        Self {
            name: "Your Company".into(),
            cash: Decimal::new(2000, 0),
            investment_points: Decimal::new(300, 0),
            brand_strength: 0.0,
            market_share: 50.0,
            stress: 0.0,
            liquidity: 1.0,
            sentiment: 0.7,
            leadership: 0.85,
            talent: 0.5,
            units: Self::budgets([3000, 1500, 800, 400, 1000, 300, 100]),
        }
    }

    pub fn competitor_default() -> Self {
        Self {
            name: "Rival Corp".into(),
            sentiment: 0.6,
            leadership: 0.8,
            units: Self::budgets([2800, 1400, 700, 350, 900, 250, 90]),
            ..Self::user_default()
        }
    }

    /// Unit budgets in `UnitKind::ALL` order.
    pub fn budgets(values: [i64; 7]) -> BTreeMap<UnitKind, Decimal> {
        UnitKind::ALL
            .iter()
            .zip(values)
            .map(|(k, v)| (*k, Decimal::new(v, 0)))
            .collect()
    }

    pub fn build(&self, party: Party) -> Company {
        let units = self
            .units
            .iter()
            .map(|(k, b)| {
                let mut u = BusinessUnit::new(*k, *b);
                u.talent = self.talent;
                (*k, u)
            })
            .collect();
        Company {
            party,
            name: self.name.clone(),
            cash: self.cash,
            investment_points: self.investment_points,
            brand_strength: self.brand_strength,
            units,
            market_share: self.market_share,
            stress: self.stress,
            liquidity: self.liquidity,
            sentiment: self.sentiment,
            leadership: self.leadership,
        }
    }
}

/// Initial market and environment-engine tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub market_type: MarketType,
    pub economy: EconomicCondition,
    pub volatility: f64,
    pub liquidity: f64,
    pub sentiment: f64,
    pub start_date: NaiveDate,
    /// Sentiment persistence: new = old*decay + push*(1-decay).
    pub sentiment_decay: f64,
    /// Maximum volatility random-walk step before market-type scaling.
    pub volatility_step: f64,
    /// Maximum liquidity random-walk step.
    pub liquidity_step: f64,
    /// Probability per quarter that the market type is redrawn.
    pub market_shift_chance: f64,
    /// Probability per quarter of an external shock.
    pub shock_chance: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            market_type: MarketType::Stable,
            economy: EconomicCondition::Growth,
            volatility: 0.2,
            liquidity: 0.75,
            sentiment: 0.0,
            start_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default(),
            sentiment_decay: 0.8,
            volatility_step: 0.07,
            liquidity_step: 0.05,
            market_shift_chance: 0.12,
            shock_chance: 0.15,
        }
    }
}

impl MarketConfig {
    pub fn initial_environment(&self) -> MarketEnvironment {
        MarketEnvironment {
            market_type: self.market_type,
            economy: self.economy,
            volatility: self.volatility,
            liquidity: self.liquidity,
            sentiment: self.sentiment,
            cycle: 0,
            date: self.start_date,
            shock: None,
        }
    }
}

/// Competitor AI tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub policy: CompetitorPolicy,
    pub vocabulary: Vocabulary,
    /// Starting personality; drawn from the seed when absent.
    pub personality: Option<Personality>,
    /// Keep the starting personality for the whole campaign.
    pub lock_personality: bool,
    /// Outcome history window length W.
    pub window: usize,
    /// Personality is reconsidered every `cadence` observed turns.
    pub cadence: u32,
    /// Hard cap on the share of cash committed in one turn.
    pub max_commit_fraction: f64,
    /// Smallest commitment worth acting on; below it the AI holds.
    pub min_commitment: Decimal,
    /// Mean share delta per turn counted as a strong trend.
    pub strong_trend: f64,
    /// Share-delta standard deviation counted as mixed results.
    pub mixed_dispersion: f64,
    pub confidence_high: f64,
    pub confidence_low: f64,
    /// Turns spent in the opening phase.
    pub opening_turns: u32,
    /// Fraction of the campaign after which endgame begins.
    pub endgame_fraction: f64,
    /// Share variance under which the market counts as settled.
    pub stability_variance: f64,
    /// Single-turn share swing that reopens contention.
    pub recontest_swing: f64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            policy: CompetitorPolicy::Adaptive,
            vocabulary: Vocabulary::Business,
            personality: None,
            lock_personality: false,
            window: 5,
            cadence: 2,
            max_commit_fraction: 0.4,
            min_commitment: Decimal::new(50, 0),
            strong_trend: 1.0,
            mixed_dispersion: 1.5,
            confidence_high: 0.75,
            confidence_low: 0.25,
            opening_turns: 2,
            endgame_fraction: 0.75,
            stability_variance: 0.25,
            recontest_swing: 3.0,
        }
    }
}

/// Action-resolution tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Money per unit of pressure weight.
    pub money_scale: f64,
    /// Largest share transfer in one turn (percentage points).
    pub max_swing: f64,
    /// Pressure difference that yields ~76% of `max_swing`.
    pub pressure_norm: f64,
    /// Fraction of attack pressure removed by a matching defend.
    pub mitigation: f64,
    pub volatility_amplifier: f64,
    pub liquidity_amplifier: f64,
    pub feint_bonus: f64,
    pub misread_chance: f64,
    /// Revenue per quarter at 100% share.
    pub base_revenue: Decimal,
    pub brand_upkeep: Decimal,
    /// Stress added per share point lost.
    pub stress_per_point: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            money_scale: 100.0,
            max_swing: 6.0,
            pressure_norm: 10.0,
            mitigation: 0.5,
            volatility_amplifier: 0.5,
            liquidity_amplifier: 0.5,
            feint_bonus: 0.25,
            misread_chance: 0.3,
            base_revenue: Decimal::new(400, 0),
            brand_upkeep: Decimal::new(50, 0),
            stress_per_point: 0.02,
        }
    }
}

/// Everything needed to start a campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub seed: u64,
    pub max_quarters: u32,
    /// Share at or above which a company has won outright.
    pub win_share: f64,
    /// Share at or below which a company has lost outright.
    pub loss_share: f64,
    /// Consecutive rejected commands tolerated before giving up on a turn.
    pub max_rejections: u32,
    pub market: MarketConfig,
    pub ai: AiConfig,
    pub resolver: ResolverConfig,
    pub user: CompanyConfig,
    pub competitor: CompanyConfig,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_quarters: 8,
            win_share: 70.0,
            loss_share: 5.0,
            max_rejections: 3,
            market: MarketConfig::default(),
            ai: AiConfig::default(),
            resolver: ResolverConfig::default(),
            user: CompanyConfig::user_default(),
            competitor: CompanyConfig::competitor_default(),
        }
    }
}

impl CampaignConfig {
    /// Parse a YAML scenario and validate it.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: CampaignConfig =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        debug!(seed = cfg.seed, quarters = cfg.max_quarters, "scenario loaded");
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_quarters == 0 {
            return Err(ConfigError::ZeroCount("max_quarters".into()));
        }
        check_range("win_share", self.win_share, 0.0, SHARE_TOTAL)?;
        check_range("loss_share", self.loss_share, 0.0, SHARE_TOTAL)?;
        if self.loss_share >= self.win_share {
            return Err(ConfigError::InconsistentThresholds(format!(
                "loss_share {} must be below win_share {}",
                self.loss_share, self.win_share
            )));
        }
        validate_company("user", &self.user)?;
        validate_company("competitor", &self.competitor)?;
        let total = self.user.market_share + self.competitor.market_share;
        if total > SHARE_TOTAL {
            return Err(ConfigError::OutOfRange {
                field: "user.market_share + competitor.market_share".into(),
                value: total,
                min: 0.0,
                max: SHARE_TOTAL,
            });
        }
        validate_market(&self.market)?;
        validate_ai(&self.ai, self.max_quarters)?;
        validate_resolver(&self.resolver)?;
        Ok(())
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_money(field: &str, value: Decimal) -> Result<(), ConfigError> {
    if value < Decimal::ZERO {
        return Err(ConfigError::NegativeMoney(field.to_string()));
    }
    Ok(())
}

/// Validate one company's starting position.
pub fn validate_company(who: &str, c: &CompanyConfig) -> Result<(), ConfigError> {
    check_money(&format!("{who}.cash"), c.cash)?;
    check_money(&format!("{who}.investment_points"), c.investment_points)?;
    if c.units.is_empty() {
        return Err(ConfigError::NoUnits(who.to_string()));
    }
    for (k, b) in &c.units {
        check_money(&format!("{who}.units.{k:?}"), *b)?;
    }
    check_range(&format!("{who}.market_share"), c.market_share, 0.0, SHARE_TOTAL)?;
    check_range(&format!("{who}.brand_strength"), c.brand_strength, 0.0, 100.0)?;
    check_range(&format!("{who}.stress"), c.stress, 0.0, 1.0)?;
    check_range(&format!("{who}.liquidity"), c.liquidity, 0.0, 1.0)?;
    check_range(&format!("{who}.sentiment"), c.sentiment, -1.0, 1.0)?;
    check_range(&format!("{who}.leadership"), c.leadership, 0.0, 1.0)?;
    check_range(&format!("{who}.talent"), c.talent, 0.0, 1.0)?;
    Ok(())
}

fn validate_market(m: &MarketConfig) -> Result<(), ConfigError> {
    check_range("market.volatility", m.volatility, 0.0, 1.0)?;
    check_range("market.liquidity", m.liquidity, 0.0, 1.0)?;
    check_range("market.sentiment", m.sentiment, -1.0, 1.0)?;
    // A decay of exactly 1 would freeze sentiment forever.
    check_range("market.sentiment_decay", m.sentiment_decay, 0.0, 0.999)?;
    check_range("market.volatility_step", m.volatility_step, 0.0, 1.0)?;
    check_range("market.liquidity_step", m.liquidity_step, 0.0, 1.0)?;
    check_range("market.market_shift_chance", m.market_shift_chance, 0.0, 1.0)?;
    check_range("market.shock_chance", m.shock_chance, 0.0, 1.0)?;
    Ok(())
}

fn validate_ai(a: &AiConfig, max_quarters: u32) -> Result<(), ConfigError> {
    if a.window == 0 {
        return Err(ConfigError::ZeroCount("ai.window".into()));
    }
    if a.cadence == 0 {
        return Err(ConfigError::ZeroCount("ai.cadence".into()));
    }
    check_range("ai.max_commit_fraction", a.max_commit_fraction, 0.0, 1.0)?;
    check_money("ai.min_commitment", a.min_commitment)?;
    check_range("ai.confidence_high", a.confidence_high, 0.0, 1.0)?;
    check_range("ai.confidence_low", a.confidence_low, 0.0, 1.0)?;
    if a.confidence_low >= a.confidence_high {
        return Err(ConfigError::InconsistentThresholds(
            "ai.confidence_low must be below ai.confidence_high".into(),
        ));
    }
    check_range("ai.endgame_fraction", a.endgame_fraction, 0.0, 1.0)?;
    if a.opening_turns > max_quarters {
        return Err(ConfigError::InconsistentThresholds(format!(
            "ai.opening_turns {} exceeds max_quarters {}",
            a.opening_turns, max_quarters
        )));
    }
    check_range("ai.strong_trend", a.strong_trend, f64::MIN_POSITIVE, SHARE_TOTAL)?;
    check_range("ai.mixed_dispersion", a.mixed_dispersion, f64::MIN_POSITIVE, SHARE_TOTAL)?;
    check_range("ai.stability_variance", a.stability_variance, 0.0, f64::MAX)?;
    check_range("ai.recontest_swing", a.recontest_swing, 0.0, SHARE_TOTAL)?;
    Ok(())
}

fn validate_resolver(r: &ResolverConfig) -> Result<(), ConfigError> {
    check_range("resolver.money_scale", r.money_scale, f64::MIN_POSITIVE, f64::MAX)?;
    check_range("resolver.max_swing", r.max_swing, 0.0, SHARE_TOTAL)?;
    check_range("resolver.pressure_norm", r.pressure_norm, f64::MIN_POSITIVE, f64::MAX)?;
    check_range("resolver.mitigation", r.mitigation, 0.0, 0.9)?;
    check_range("resolver.volatility_amplifier", r.volatility_amplifier, 0.0, 10.0)?;
    check_range("resolver.liquidity_amplifier", r.liquidity_amplifier, 0.0, 10.0)?;
    check_range("resolver.feint_bonus", r.feint_bonus, 0.0, 10.0)?;
    check_range("resolver.misread_chance", r.misread_chance, 0.0, 1.0)?;
    check_money("resolver.base_revenue", r.base_revenue)?;
    check_money("resolver.brand_upkeep", r.brand_upkeep)?;
    check_range("resolver.stress_per_point", r.stress_per_point, 0.0, 1.0)?;
    Ok(())
}
