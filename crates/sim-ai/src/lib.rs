#![deny(warnings)]

//! Competitor AI strategy engine.
//!
//! The engine is a pure function of its inputs: it takes the AI's own state,
//! the opponent's public view, the environment and the resolved history, and
//! returns an action plus the next state. All memory lives in [`AiState`];
//! nothing is kept on the engine itself besides configuration.
//!
//! A decision runs four steps:
//! - observe the most recent resolved turn into the rolling window
//! - recompute personality on cadence or when confidence crosses a threshold
//! - advance the campaign phase
//! - pick a kind from the (personality, phase) table, size it, target it

pub mod table;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use sim_core::{
    clamp_unit, Action, ActionKind, AiConfig, AiState, Company, CompetitorPolicy, MarketEnvironment,
    OpponentView, OutcomeSample, Personality, Phase, SimRng, TurnRecord,
};
use tracing::{debug, info};

/// Score difference below which personalities count as tied.
const TIE_EPSILON: f64 = 1e-9;

/// Output of one decision.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub next_state: AiState,
}

/// Adaptive competitor. Holds configuration only.
#[derive(Clone, Debug)]
pub struct StrategyEngine {
    cfg: AiConfig,
    max_quarters: u32,
}

impl StrategyEngine {
    pub fn new(cfg: AiConfig, max_quarters: u32) -> Self {
        Self { cfg, max_quarters }
    }

    pub fn config(&self) -> &AiConfig {
        &self.cfg
    }

    /// Starting state. An unset personality is drawn from `rng`; a configured
    /// one consumes no draw.
    pub fn initial_state(&self, rng: &mut SimRng) -> AiState {
        let personality = match self.cfg.personality {
            Some(p) => p,
            None => {
                let idx = rng.weighted_index(&[1, 1, 1]).unwrap_or(0);
                Personality::ALL[idx]
            }
        };
        AiState::new(personality, self.cfg.window, self.cfg.lock_personality)
    }

    /// Decide the action for the turn that follows `history`.
    ///
    /// `own` is the AI's company (for budget), `view` is the opponent's
    /// public state. Falls back to hold when nothing affordable remains.
    pub fn decide(
        &self,
        state: &AiState,
        own: &Company,
        view: &OpponentView,
        env: &MarketEnvironment,
        history: &[TurnRecord],
        rng: &mut SimRng,
    ) -> Decision {
        let turn = history.len() as u32;
        let mut next = state.clone();
        let previous_confidence = next.confidence;

        if let Some(last) = history.last() {
            if next.last_observed_turn != Some(last.turn) {
                observe(&mut next, last, own.party);
            }
        }

        if !next.locked && self.should_reassess(&next, previous_confidence) {
            let chosen = select_personality(&next, &self.cfg);
            if chosen != next.personality {
                info!(
                    turn,
                    from = next.personality.label(self.cfg.vocabulary),
                    to = chosen.label(self.cfg.vocabulary),
                    confidence = next.confidence,
                    "competitor personality shift"
                );
                next.personality = chosen;
            }
        }
        next.record_personality();

        let phase = next_phase(&next, turn, &self.cfg, self.max_quarters);
        if phase != next.phase {
            info!(turn, from = ?next.phase, to = ?phase, "competitor phase change");
            if phase == Phase::MidGame && matches!(next.phase, Phase::Endgame | Phase::Stability) {
                next.recontested_at = Some(turn);
            }
            next.phase = phase;
        }

        let action = match self.cfg.policy {
            CompetitorPolicy::Passive => Action::hold(own.party),
            CompetitorPolicy::Adaptive => self.choose_action(&next, own, view, env, rng),
        };
        debug!(
            turn,
            kind = ?action.kind,
            magnitude = %action.magnitude(),
            feint = action.feint,
            "competitor decided"
        );
        Decision {
            action,
            next_state: next,
        }
    }

    fn should_reassess(&self, state: &AiState, previous_confidence: f64) -> bool {
        let on_cadence = state.window_full()
            && state.turns_observed > 0
            && state.turns_observed % self.cfg.cadence.max(1) == 0;
        let crossed_high =
            previous_confidence < self.cfg.confidence_high && state.confidence >= self.cfg.confidence_high;
        let crossed_low =
            previous_confidence > self.cfg.confidence_low && state.confidence <= self.cfg.confidence_low;
        on_cadence || crossed_high || crossed_low
    }

    fn choose_action(
        &self,
        state: &AiState,
        own: &Company,
        view: &OpponentView,
        env: &MarketEnvironment,
        rng: &mut SimRng,
    ) -> Action {
        let options = table::candidates(state.personality, state.phase, predictability(state));
        let weights: Vec<u32> = options.iter().map(|(_, w)| *w).collect();
        let kind = match rng.weighted_index(&weights) {
            Some(i) => options[i].0,
            None => return Action::hold(own.party),
        };

        let magnitude = self.commitment(state, own, env);
        if magnitude < self.cfg.min_commitment {
            debug!(%magnitude, "commitment below minimum, holding");
            return Action::hold(own.party);
        }
        let targets = table::target_weights(kind, own, view, state);
        let allocation = table::split(magnitude, &targets);
        if allocation.is_empty() {
            return Action::hold(own.party);
        }
        Action {
            actor: own.party,
            kind,
            allocation,
            feint: state.personality == Personality::Deceptive,
        }
    }

    /// Confidence-scaled commitment, never above the per-turn cash cap.
    pub fn commitment(&self, state: &AiState, own: &Company, env: &MarketEnvironment) -> Decimal {
        if own.cash <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let fraction = self.cfg.max_commit_fraction.clamp(0.0, 1.0);
        let cap = (own.cash * Decimal::from_f64(fraction).unwrap_or(Decimal::ZERO))
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);
        let cash = own.cash.to_f64().unwrap_or(0.0);
        let scaled = cash
            * fraction
            * (0.35 + 0.65 * clamp_unit(state.confidence))
            * (1.0 - 0.3 * sim_econ::risk_tension(env))
            * table::phase_factor(state.phase);
        let wanted = Decimal::from_f64(scaled)
            .unwrap_or(Decimal::ZERO)
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);
        wanted.min(cap).min(own.cash).max(Decimal::ZERO)
    }
}

/// Fold the latest resolved turn into the window and refresh confidence.
fn observe(state: &mut AiState, record: &TurnRecord, own: sim_core::Party) {
    let share_delta = record.deltas.get(own).share;
    let opponent_action = record.action(own.opponent());
    let opponent_offense = if opponent_action.kind.offense_coefficient() > 0.0 {
        opponent_action.asset_classes().into_iter().collect()
    } else {
        Vec::new()
    };
    state.push_sample(OutcomeSample {
        turn: record.turn,
        share_delta,
        won: share_delta > 0.0,
        opponent_kind: opponent_action.kind,
        opponent_offense,
    });
    state.confidence = confidence(state);
}

/// Blend of recent win rate and mean share change.
pub fn confidence(state: &AiState) -> f64 {
    let n = state.window.len();
    if n == 0 {
        return state.confidence;
    }
    let wins = state.window.iter().filter(|s| s.won).count() as f64;
    let win_rate = wins / n as f64;
    let mean_delta = state.share_deltas().sum::<f64>() / n as f64;
    clamp_unit(win_rate * 0.6 + clamp_unit(0.5 + mean_delta / 10.0) * 0.4)
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var)
}

/// Pick a personality from the window. A mean share change of at least
/// `strong_trend` either way qualifies aggressive or defensive; a spread of
/// at least `mixed_dispersion` qualifies deceptive. The best-scoring
/// qualifier wins, ties going to the least recently used. With no strong
/// signal the AI turns deceptive.
pub fn select_personality(state: &AiState, cfg: &AiConfig) -> Personality {
    let deltas: Vec<f64> = state.share_deltas().collect();
    let (trend, var) = mean_and_variance(&deltas);
    let dispersion = var.sqrt();
    let score = |p: Personality| match p {
        Personality::Aggressive => trend / cfg.strong_trend,
        Personality::Defensive => -trend / cfg.strong_trend,
        Personality::Deceptive => dispersion / cfg.mixed_dispersion,
    };
    let qualifies = |p: Personality| match p {
        Personality::Aggressive => trend >= cfg.strong_trend,
        Personality::Defensive => trend <= -cfg.strong_trend,
        Personality::Deceptive => dispersion >= cfg.mixed_dispersion,
    };

    let mut best: Option<(Personality, f64)> = None;
    for p in Personality::ALL.into_iter().filter(|p| qualifies(*p)) {
        let s = score(p);
        best = match best {
            None => Some((p, s)),
            Some((b, bs))
                if s > bs + TIE_EPSILON
                    || ((s - bs).abs() <= TIE_EPSILON && state.usage(p) < state.usage(b)) =>
            {
                Some((p, s))
            }
            keep => keep,
        };
    }
    best.map_or(Personality::Deceptive, |(p, _)| p)
}

/// Phase for the turn about to be played.
pub fn next_phase(state: &AiState, turn: u32, cfg: &AiConfig, max_quarters: u32) -> Phase {
    let swing = state
        .window
        .back()
        .map(|s| s.share_delta.abs())
        .unwrap_or(0.0);
    let recently_recontested = state
        .recontested_at
        .map_or(false, |at| turn < at + state.window_len as u32);
    let deltas: Vec<f64> = state.share_deltas().collect();
    let settled = state.window_full() && mean_and_variance(&deltas).1 < cfg.stability_variance;
    let late = turn as f64 >= cfg.endgame_fraction * max_quarters as f64;

    match state.phase {
        Phase::Opening if turn >= cfg.opening_turns => Phase::MidGame,
        Phase::Opening => Phase::Opening,
        Phase::Endgame | Phase::Stability if swing >= cfg.recontest_swing => Phase::MidGame,
        Phase::MidGame | Phase::Endgame if settled => Phase::Stability,
        Phase::MidGame if late && !recently_recontested => Phase::Endgame,
        other => other,
    }
}

/// How often the opponent repeated its favourite action kind in the window.
/// 0.5 when nothing has been observed.
pub fn predictability(state: &AiState) -> f64 {
    let n = state.window.len();
    if n == 0 {
        return 0.5;
    }
    let mut best = 0usize;
    for kind in ActionKind::ALL {
        let c = state
            .window
            .iter()
            .filter(|s| s.opponent_kind == kind)
            .count();
        best = best.max(c);
    }
    best as f64 / n as f64
}
