//! Simultaneous resolution of both companies' actions.
//!
//! Neither side sees the other's action before committing. Inputs are
//! canonicalized by party (user first) and every random roll is drawn by the
//! caller per party, so resolving with the operands swapped yields the same
//! output.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sim_core::{
    clamp_share, clamp_signed, clamp_unit, Action, ActionKind, AssetClass, Company, ConfigError,
    EconomicCondition, Event, EventKind, MarketEnvironment, MarketShock, Party, QuarterOfYear,
    ResolverConfig, SideDelta, SimRng, TurnDeltas, UnitKind,
};
use tracing::debug;

/// Ceiling on any single mitigation factor.
const MAX_MITIGATION: f64 = 0.9;
/// Extra mitigation for legal-backed defenses under a regulatory shock.
const REGULATORY_MITIGATION: f64 = 0.1;
const BREAKTHROUGH_RND_BOOST: f64 = 1.3;

/// Random rolls for one party, drawn before resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SideRolls {
    /// Compared against the misread threshold when this side feints.
    pub misread: f64,
    /// Liquidity this side strips from the rival when exploiting.
    pub sabotage: f64,
    /// Compared against the liquidity-event threshold for this side.
    pub liquidity_event: f64,
    /// Stress added to this side by a liquidity event.
    pub liquidity_stress: f64,
}

impl SideRolls {
    /// Draw in fixed order: misread, sabotage, liquidity event, event stress.
    pub fn draw(rng: &mut SimRng) -> Self {
        let misread = rng.unit();
        let sabotage = rng.uniform(0.05, 0.12);
        let liquidity_event = rng.unit();
        let liquidity_stress = rng.uniform(0.1, 0.2);
        Self {
            misread,
            sabotage,
            liquidity_event,
            liquidity_stress,
        }
    }

    /// Rolls under which no chance-based effect fires.
    pub fn quiet() -> Self {
        Self {
            misread: 1.0,
            sabotage: 0.05,
            liquidity_event: 1.0,
            liquidity_stress: 0.1,
        }
    }
}

/// One party's input to resolution.
#[derive(Clone, Copy, Debug)]
pub struct Side<'a> {
    pub company: &'a Company,
    pub action: &'a Action,
    pub rolls: SideRolls,
    /// Strategy-engine confidence of this side when reading the rival.
    /// `None` for a human player.
    pub read_confidence: Option<f64>,
}

/// Resolved companies, deltas and audit events.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub user: Company,
    pub competitor: Company,
    pub deltas: TurnDeltas,
    pub events: Vec<Event>,
}

impl Resolution {
    pub fn company(&self, party: Party) -> &Company {
        match party {
            Party::User => &self.user,
            Party::Competitor => &self.competitor,
        }
    }
}

/// Resolve both actions at once.
///
/// Fails only when the inputs break the action contract: both sides from
/// the same party, an action that does not belong to its company, negative
/// amounts, unknown units or a commitment above cash.
pub fn resolve(
    a: Side<'_>,
    b: Side<'_>,
    env: &MarketEnvironment,
    cfg: &ResolverConfig,
) -> Result<Resolution, ConfigError> {
    if a.company.party == b.company.party {
        return Err(ConfigError::ActionContract(format!(
            "both sides belong to {:?}",
            a.company.party
        )));
    }
    a.action.check_contract(a.company)?;
    b.action.check_contract(b.company)?;
    let (user, rival) = if a.company.party == Party::User {
        (a, b)
    } else {
        (b, a)
    };

    let (user_pressure, user_misread) = pressure(&user, &rival, env, cfg);
    let (rival_pressure, rival_misread) = pressure(&rival, &user, env, cfg);
    let raw = cfg.max_swing * ((user_pressure - rival_pressure) / cfg.pressure_norm).tanh();
    let applied = raw
        .max(-user.company.market_share)
        .min(rival.company.market_share);

    let mut events = Vec::new();
    let (user_after, user_delta) = settle(
        &user,
        &rival,
        Transfer {
            raw,
            applied,
            pressure: user_pressure,
            misread: user_misread,
        },
        env,
        cfg,
        &mut events,
    );
    let (rival_after, rival_delta) = settle(
        &rival,
        &user,
        Transfer {
            raw: -raw,
            applied: -applied,
            pressure: rival_pressure,
            misread: rival_misread,
        },
        env,
        cfg,
        &mut events,
    );

    if applied > 0.0 {
        events.push(Event::party(
            EventKind::Success,
            Party::User,
            format!("{} gains {:.2} share points.", user.company.name, applied),
        ));
    } else if applied < 0.0 {
        events.push(Event::party(
            EventKind::Success,
            Party::Competitor,
            format!("{} gains {:.2} share points.", rival.company.name, -applied),
        ));
    } else {
        events.push(Event::market(EventKind::Info, "Market shares unchanged."));
    }

    let market_push = (user_delta.sentiment + rival_delta.sentiment) / 2.0;
    debug!(
        user_pressure,
        rival_pressure, raw, applied, market_push, "actions resolved"
    );
    Ok(Resolution {
        user: user_after,
        competitor: rival_after,
        deltas: TurnDeltas {
            user: user_delta,
            competitor: rival_delta,
            market_push,
        },
        events,
    })
}

/// Misread probability for a feint by `company` against an observer with
/// `read_confidence`. An unsure reader is fooled more often; a human reader
/// counts as middling confidence.
pub fn misread_threshold(
    company: &Company,
    read_confidence: Option<f64>,
    cfg: &ResolverConfig,
) -> f64 {
    let base = cfg.misread_chance + 0.15 * (company.intelligence_budget() / 1500.0).min(1.0);
    let unsure = 1.5 - clamp_unit(read_confidence.unwrap_or(0.5));
    clamp_unit(base * unsure)
}

/// Fraction of pressure on `class` absorbed by the opponent's action.
pub fn mitigation(
    class: AssetClass,
    opponent: &Action,
    env: &MarketEnvironment,
    cfg: &ResolverConfig,
) -> f64 {
    let strength = match opponent.kind {
        ActionKind::Defend => 1.0,
        ActionKind::Diversify => 0.5,
        _ => return 0.0,
    };
    if !opponent.asset_classes().contains(&class) {
        return 0.0;
    }
    let mut m = cfg.mitigation * (1.0 + cfg.liquidity_amplifier * (env.liquidity - 0.5));
    if env.shock == Some(MarketShock::RegulatoryChange)
        && opponent.allocated(UnitKind::Legal) > Decimal::ZERO
    {
        m += REGULATORY_MITIGATION;
    }
    (m * strength).clamp(0.0, MAX_MITIGATION)
}

/// Market pressure generated by `side`, and whether its feint was misread.
fn pressure(
    side: &Side<'_>,
    opponent: &Side<'_>,
    env: &MarketEnvironment,
    cfg: &ResolverConfig,
) -> (f64, bool) {
    let kind = side.action.kind;
    let coefficient = kind.offense_coefficient();
    if coefficient <= 0.0 {
        return (0.0, false);
    }
    let company = side.company;
    let mut total = 0.0;
    for (kind_of_unit, amount) in &side.action.allocation {
        let Some(unit) = company.unit(*kind_of_unit) else {
            continue;
        };
        let mut p = amount.to_f64().unwrap_or(0.0) / cfg.money_scale
            * unit.effectiveness(company.stress, company.brand_strength)
            * coefficient;
        match kind {
            ActionKind::Attack | ActionKind::Exploit => {
                p *= 1.0 + cfg.volatility_amplifier * env.volatility
            }
            ActionKind::Invest => p *= env.economy.invest_factor(),
            _ => {}
        }
        if env.shock == Some(MarketShock::TechBreakthrough) && *kind_of_unit == UnitKind::RnD {
            p *= BREAKTHROUGH_RND_BOOST;
        }
        p *= 1.0 - mitigation(kind_of_unit.asset_class(), opponent.action, env, cfg);
        total += p;
    }
    let misread = side.action.feint
        && total > 0.0
        && side.rolls.misread < misread_threshold(company, opponent.read_confidence, cfg);
    if misread {
        total *= 1.0 + cfg.feint_bonus;
    }
    (total, misread)
}

struct Transfer {
    raw: f64,
    applied: f64,
    pressure: f64,
    misread: bool,
}

fn decimal(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO)
}

fn describe(company: &Company, action: &Action) -> Event {
    let kind = match action.kind {
        ActionKind::Invest | ActionKind::Diversify => EventKind::Investment,
        ActionKind::Exploit => EventKind::Sabotage,
        _ => EventKind::Info,
    };
    if action.kind == ActionKind::Hold {
        return Event::party(
            kind,
            company.party,
            format!("{} {}.", company.name, action.kind.verb()),
        );
    }
    let targets: Vec<&str> = action.targets().map(UnitKind::label).collect();
    Event::party(
        kind,
        company.party,
        format!(
            "{} {} with {} via {}.",
            company.name,
            action.kind.verb(),
            action.magnitude(),
            targets.join(", ")
        ),
    )
}

/// Apply the resolved transfer and side-metric rules to one company.
fn settle(
    side: &Side<'_>,
    opponent: &Side<'_>,
    t: Transfer,
    env: &MarketEnvironment,
    cfg: &ResolverConfig,
    events: &mut Vec<Event>,
) -> (Company, SideDelta) {
    let before = side.company;
    let action = side.action;
    let mut c = before.clone();
    events.push(describe(before, action));
    if t.misread {
        events.push(Event::party(
            EventKind::Intel,
            before.party,
            format!("{} misread {}'s feint.", opponent.company.name, before.name),
        ));
    }

    let opponent_exploits = opponent.action.kind == ActionKind::Exploit;
    let crash = env.shock == Some(MarketShock::MarketCrash);
    let spend = action.magnitude();

    // share
    c.market_share = clamp_share(before.market_share + t.applied);
    let loss = (-t.applied).max(0.0);

    // cash
    let mut stress = before.stress;
    c.cash = before.cash - spend;
    let revenue = cfg.base_revenue * decimal(c.market_share / 100.0 * env.economy.revenue_factor());
    c.cash += revenue.max(Decimal::ZERO).round_dp(2);
    if before.brand_strength > 0.0 {
        if c.cash >= cfg.brand_upkeep {
            c.cash -= cfg.brand_upkeep;
            stress -= 0.02;
        } else {
            stress += 0.05;
            events.push(Event::party(
                EventKind::Failure,
                before.party,
                format!("{} cannot cover brand upkeep.", before.name),
            ));
        }
    }
    c.cash = c.cash.max(Decimal::ZERO);

    // unit budgets
    for (kind, unit) in c.units.iter_mut() {
        let allocated = action.allocated(*kind);
        if action.kind.retains_budget() {
            unit.budget += allocated;
        }
        unit.history.push(allocated);
    }
    if env.economy == EconomicCondition::Inflation {
        if let Some(m) = c.units.get_mut(&UnitKind::Marketing) {
            m.budget -= m.budget.min(Decimal::TEN);
        }
    }
    if loss > 0.0 && before.market_share > 0.0 {
        let ratio = (loss / before.market_share).min(1.0) * 0.5;
        let keep = decimal(1.0 - ratio);
        for unit in c.units.values_mut() {
            unit.budget = (unit.budget * keep).round_dp(2).max(Decimal::ZERO);
        }
    }

    // brand
    let marketing = action.allocated(UnitKind::Marketing).to_f64().unwrap_or(0.0);
    c.brand_strength = (before.brand_strength + 0.5 * marketing / cfg.money_scale).clamp(0.0, 100.0);

    // stress
    stress += cfg.stress_per_point * loss;
    if env.quarter() == QuarterOfYear::Q4 {
        stress += 0.05;
    }
    if crash {
        stress += 0.2;
    }
    let event_chance = 0.1 + opponent.company.intelligence_budget() / 2000.0;
    if before.liquidity < 0.6 && side.rolls.liquidity_event < event_chance {
        stress += side.rolls.liquidity_stress;
        events.push(Event::party(
            EventKind::Failure,
            before.party,
            format!(
                "{} suffers a liquidity crunch (+{:.2} stress).",
                before.name, side.rolls.liquidity_stress
            ),
        ));
    }
    if opponent_exploits {
        stress += 0.03;
    }
    stress -= 0.03;
    if action.kind == ActionKind::Defend {
        stress -= 0.05;
    }
    c.stress = clamp_unit(stress);

    // liquidity
    let mut liquidity = before.liquidity;
    if env.economy == EconomicCondition::Growth {
        liquidity += 0.1;
    }
    if before.cash > Decimal::ZERO {
        liquidity -= 0.2 * (spend / before.cash).to_f64().unwrap_or(0.0);
    }
    if opponent_exploits {
        liquidity -= opponent.rolls.sabotage;
        events.push(Event::party(
            EventKind::Sabotage,
            before.party,
            format!(
                "{} loses {:.2} liquidity to {}'s intelligence operation.",
                before.name, opponent.rolls.sabotage, opponent.company.name
            ),
        ));
    }
    if crash {
        liquidity -= 0.3;
    }
    liquidity += 0.04;
    c.liquidity = clamp_unit(liquidity);

    // sentiment
    let mut sentiment = before.sentiment * 0.9
        + 0.1 * t.applied / cfg.max_swing
        + (before.leadership - 0.5) * 0.05;
    if opponent_exploits {
        sentiment -= 0.05;
    }
    sentiment -= 0.05 * c.stress;
    c.sentiment = clamp_signed(sentiment);

    // investment points
    let earned = decimal((t.applied * 10.0).round());
    c.investment_points = (before.investment_points + earned).max(Decimal::ZERO);

    let delta = SideDelta {
        raw_share: t.raw,
        share: t.applied,
        cash: c.cash - before.cash,
        investment_points: c.investment_points - before.investment_points,
        brand_strength: c.brand_strength - before.brand_strength,
        stress: c.stress - before.stress,
        liquidity: c.liquidity - before.liquidity,
        sentiment: c.sentiment - before.sentiment,
        pressure: t.pressure,
    };
    (c, delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{CampaignConfig, MarketType, UserCommand};
    use std::collections::BTreeMap;

    fn setup() -> (CampaignConfig, Company, Company, MarketEnvironment) {
        let cfg = CampaignConfig::default();
        let user = cfg.user.build(Party::User);
        let rival = cfg.competitor.build(Party::Competitor);
        let env = cfg.market.initial_environment();
        (cfg, user, rival, env)
    }

    fn act(party: Party, kind: ActionKind, units: &[(UnitKind, i64)]) -> Action {
        Action {
            actor: party,
            kind,
            allocation: units
                .iter()
                .map(|(u, v)| (*u, Decimal::new(*v, 0)))
                .collect::<BTreeMap<_, _>>(),
            feint: false,
        }
    }

    fn side<'a>(company: &'a Company, action: &'a Action) -> Side<'a> {
        Side {
            company,
            action,
            rolls: SideRolls::quiet(),
            read_confidence: None,
        }
    }

    #[test]
    fn holds_move_nothing() {
        let (cfg, user, rival, env) = setup();
        let hu = Action::hold(Party::User);
        let hc = Action::hold(Party::Competitor);
        let r = resolve(side(&user, &hu), side(&rival, &hc), &env, &cfg.resolver).unwrap();
        assert_eq!(r.user.market_share, 50.0);
        assert_eq!(r.competitor.market_share, 50.0);
        assert_eq!(r.deltas.user.raw_share, 0.0);
    }

    #[test]
    fn attack_moves_share_to_attacker() {
        let (cfg, user, rival, env) = setup();
        let attack = act(Party::User, ActionKind::Attack, &[(UnitKind::Sales, 500)]);
        let hold = Action::hold(Party::Competitor);
        let r = resolve(side(&user, &attack), side(&rival, &hold), &env, &cfg.resolver).unwrap();
        assert!(r.deltas.user.share > 0.0);
        assert_eq!(r.deltas.user.raw_share, -r.deltas.competitor.raw_share);
        assert!(r.user.market_share + r.competitor.market_share <= 100.0 + 1e-9);
        assert!(r.user.cash < user.cash);
    }

    #[test]
    fn defend_on_same_class_mitigates() {
        let (cfg, user, rival, env) = setup();
        let attack = act(Party::User, ActionKind::Attack, &[(UnitKind::Sales, 500)]);
        let hold = Action::hold(Party::Competitor);
        let shield = act(Party::Competitor, ActionKind::Defend, &[(UnitKind::Marketing, 100)]);
        let off_class = act(Party::Competitor, ActionKind::Defend, &[(UnitKind::Legal, 100)]);
        let open = resolve(side(&user, &attack), side(&rival, &hold), &env, &cfg.resolver).unwrap();
        let guarded =
            resolve(side(&user, &attack), side(&rival, &shield), &env, &cfg.resolver).unwrap();
        let missed =
            resolve(side(&user, &attack), side(&rival, &off_class), &env, &cfg.resolver).unwrap();
        assert!(guarded.deltas.user.pressure < open.deltas.user.pressure);
        assert_eq!(missed.deltas.user.pressure, open.deltas.user.pressure);
    }

    #[test]
    fn volatility_amplifies_attacks() {
        let (cfg, user, rival, mut env) = setup();
        let attack = act(Party::User, ActionKind::Attack, &[(UnitKind::Sales, 500)]);
        let hold = Action::hold(Party::Competitor);
        env.volatility = 0.0;
        let calm = resolve(side(&user, &attack), side(&rival, &hold), &env, &cfg.resolver).unwrap();
        env.volatility = 1.0;
        env.market_type = MarketType::Volatile;
        let wild = resolve(side(&user, &attack), side(&rival, &hold), &env, &cfg.resolver).unwrap();
        assert!(wild.deltas.user.pressure > calm.deltas.user.pressure);
    }

    #[test]
    fn misread_feint_gains_bonus() {
        let (cfg, user, rival, env) = setup();
        let mut feint = act(Party::User, ActionKind::Attack, &[(UnitKind::Sales, 500)]);
        feint.feint = true;
        let hold = Action::hold(Party::Competitor);
        let plain = resolve(side(&user, &feint), side(&rival, &hold), &env, &cfg.resolver).unwrap();
        let mut lucky = side(&user, &feint);
        lucky.rolls.misread = 0.0;
        let r = resolve(lucky, side(&rival, &hold), &env, &cfg.resolver).unwrap();
        assert!(r.deltas.user.pressure > plain.deltas.user.pressure);
        assert!(r.events.iter().any(|e| e.kind == EventKind::Intel));
    }

    #[test]
    fn unsure_reader_falls_for_feints_more_often() {
        let (cfg, user, rival, env) = setup();
        let mut feint = act(Party::User, ActionKind::Attack, &[(UnitKind::Sales, 500)]);
        feint.feint = true;
        let hold = Action::hold(Party::Competitor);
        let unsure = misread_threshold(&user, Some(0.1), &cfg.resolver);
        let sure = misread_threshold(&user, Some(0.9), &cfg.resolver);
        assert!(unsure > misread_threshold(&user, None, &cfg.resolver));
        assert!(sure < misread_threshold(&user, None, &cfg.resolver));

        let mut rng = SimRng::new(11);
        let (mut fooled_unsure, mut fooled_sure) = (0, 0);
        for _ in 0..200 {
            let mut attacker = side(&user, &feint);
            attacker.rolls.misread = rng.unit();
            for (confidence, count) in [(0.1, &mut fooled_unsure), (0.9, &mut fooled_sure)] {
                let mut reader = side(&rival, &hold);
                reader.read_confidence = Some(confidence);
                let r = resolve(attacker, reader, &env, &cfg.resolver).unwrap();
                if r.events.iter().any(|e| e.kind == EventKind::Intel) {
                    *count += 1;
                }
            }
        }
        assert!(fooled_unsure > fooled_sure, "{fooled_unsure} vs {fooled_sure}");
    }

    #[test]
    fn exploit_drains_rival_liquidity() {
        let (cfg, user, mut rival, mut env) = setup();
        env.economy = EconomicCondition::Recession;
        rival.liquidity = 0.5;
        let op = act(Party::User, ActionKind::Exploit, &[(UnitKind::MarketIntelligence, 100)]);
        let hold = Action::hold(Party::Competitor);
        let mut s = side(&user, &op);
        s.rolls.sabotage = 0.1;
        let r = resolve(s, side(&rival, &hold), &env, &cfg.resolver).unwrap();
        assert!((r.competitor.liquidity - (0.5 - 0.1 + 0.04)).abs() < 1e-12);
        assert!(r.events.iter().any(|e| e.kind == EventKind::Sabotage));
    }

    #[test]
    fn invest_retains_budget() {
        let (cfg, user, rival, env) = setup();
        let invest = act(Party::User, ActionKind::Invest, &[(UnitKind::RnD, 200)]);
        let hold = Action::hold(Party::Competitor);
        let r = resolve(side(&user, &invest), side(&rival, &hold), &env, &cfg.resolver).unwrap();
        let before = user.units[&UnitKind::RnD].budget;
        assert_eq!(r.user.units[&UnitKind::RnD].budget, before + Decimal::new(200, 0));
        assert_eq!(r.user.units[&UnitKind::RnD].history, vec![Decimal::new(200, 0)]);
        assert_eq!(r.user.units[&UnitKind::Sales].history, vec![Decimal::ZERO]);
    }

    #[test]
    fn bankrupting_spend_floors_cash_at_zero() {
        let (mut cfg, mut user, rival, env) = setup();
        cfg.resolver.base_revenue = Decimal::ZERO;
        user.cash = Decimal::new(500, 0);
        let all_in = UserCommand::new(
            ActionKind::Attack,
            BTreeMap::from([(UnitKind::Sales, Decimal::new(500, 0))]),
        )
        .validate(&user)
        .unwrap();
        let hold = Action::hold(Party::Competitor);
        let r = resolve(side(&user, &all_in), side(&rival, &hold), &env, &cfg.resolver).unwrap();
        assert_eq!(r.user.cash, Decimal::ZERO);
        assert!(r.user.is_bankrupt());
    }

    #[test]
    fn contract_violations_are_config_errors() {
        let (cfg, user, rival, env) = setup();
        let hold = Action::hold(Party::User);
        let same = resolve(side(&user, &hold), side(&user, &hold), &env, &cfg.resolver);
        assert!(matches!(same, Err(ConfigError::ActionContract(_))));
        let mut negative = act(Party::User, ActionKind::Attack, &[(UnitKind::Sales, 10)]);
        negative.allocation.insert(UnitKind::Legal, Decimal::new(-5, 0));
        let hc = Action::hold(Party::Competitor);
        let r = resolve(side(&user, &negative), side(&rival, &hc), &env, &cfg.resolver);
        assert!(matches!(r, Err(ConfigError::ActionContract(_))));
    }

    #[test]
    fn shares_cannot_go_negative() {
        let (cfg, mut user, mut rival, env) = setup();
        user.market_share = 99.5;
        rival.market_share = 0.5;
        let attack = act(Party::User, ActionKind::Attack, &[(UnitKind::RnD, 2000)]);
        let hold = Action::hold(Party::Competitor);
        let r = resolve(side(&user, &attack), side(&rival, &hold), &env, &cfg.resolver).unwrap();
        assert_eq!(r.competitor.market_share, 0.0);
        assert!(r.deltas.user.raw_share > r.deltas.user.share);
        assert!((r.user.market_share - 100.0).abs() < 1e-9);
    }

    fn kinds() -> impl Strategy<Value = ActionKind> {
        prop::sample::select(ActionKind::ALL.to_vec())
    }

    fn allocation() -> impl Strategy<Value = Vec<(UnitKind, i64)>> {
        prop::collection::vec(
            (prop::sample::select(UnitKind::ALL.to_vec()), 1i64..300),
            1..4,
        )
    }

    fn build(party: Party, kind: ActionKind, units: &[(UnitKind, i64)], feint: bool) -> Action {
        if kind == ActionKind::Hold {
            return Action::hold(party);
        }
        let mut a = act(party, kind, &[]);
        for (u, v) in units {
            *a.allocation.entry(*u).or_insert(Decimal::ZERO) += Decimal::new(*v, 0);
        }
        a.feint = feint;
        a
    }

    proptest! {
        #[test]
        fn conservation_and_bounds(
            uk in kinds(), ck in kinds(), ua in allocation(), ca in allocation(),
            share in 0.0f64..100.0, vol in 0.0f64..=1.0, liq in 0.0f64..=1.0,
            feint in any::<bool>(), seed in any::<u64>(),
        ) {
            let (cfg, mut user, mut rival, mut env) = setup();
            user.market_share = share;
            rival.market_share = 100.0 - share;
            user.liquidity = liq;
            env.volatility = vol;
            env.liquidity = liq;
            let a = build(Party::User, uk, &ua, feint);
            let b = build(Party::Competitor, ck, &ca, !feint);
            let mut rng = SimRng::new(seed);
            let su = Side { company: &user, action: &a, rolls: SideRolls::draw(&mut rng), read_confidence: None };
            let sc = Side { company: &rival, action: &b, rolls: SideRolls::draw(&mut rng), read_confidence: Some(0.5) };
            let r = resolve(su, sc, &env, &cfg.resolver).unwrap();
            prop_assert_eq!(r.deltas.user.raw_share, -r.deltas.competitor.raw_share);
            prop_assert!((r.deltas.user.share + r.deltas.competitor.share).abs() < 1e-12);
            prop_assert!(r.user.market_share + r.competitor.market_share <= 100.0 + 1e-9);
            for c in [&r.user, &r.competitor] {
                prop_assert!((0.0..=100.0).contains(&c.market_share));
                prop_assert!((0.0..=1.0).contains(&c.liquidity));
                prop_assert!((0.0..=1.0).contains(&c.stress));
                prop_assert!((-1.0..=1.0).contains(&c.sentiment));
                prop_assert!(c.cash >= Decimal::ZERO);
                prop_assert!(c.units.values().all(|u| u.budget >= Decimal::ZERO));
            }
        }

        #[test]
        fn swapping_operands_swaps_nothing(
            uk in kinds(), ck in kinds(), ua in allocation(), ca in allocation(),
            seed in any::<u64>(),
        ) {
            let (cfg, user, rival, env) = setup();
            let a = build(Party::User, uk, &ua, true);
            let b = build(Party::Competitor, ck, &ca, true);
            let mut rng = SimRng::new(seed);
            let ru = SideRolls::draw(&mut rng);
            let rc = SideRolls::draw(&mut rng);
            let su = Side { company: &user, action: &a, rolls: ru, read_confidence: None };
            let sc = Side { company: &rival, action: &b, rolls: rc, read_confidence: Some(0.3) };
            let forward = resolve(su, sc, &env, &cfg.resolver).unwrap();
            let backward = resolve(sc, su, &env, &cfg.resolver).unwrap();
            prop_assert_eq!(forward, backward);
        }
    }
}
