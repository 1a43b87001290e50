//! Turn engine: owns the campaign state and drives one quarter at a time.
//!
//! Each turn runs strictly in order: validate the user's command, advance the
//! environment, let the competitor decide, draw per-party rolls, resolve,
//! check invariants, commit. Work happens on copies so a rejected or failed
//! turn never leaves partial state behind.

use crate::boundary::{TurnObserver, UserActionSource};
use crate::invariants;
use crate::resolver::{self, Side, SideRolls};
use crate::SimError;
use serde::{Deserialize, Serialize};
use sim_ai::StrategyEngine;
use sim_core::{
    AiState, CampaignConfig, Company, ConfigError, Event, EventKind, MarketEnvironment, Party,
    SimRng, TurnRecord, UserCommand,
};
use tracing::{error, info, warn};

/// Why a campaign stopped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    MaxQuarters,
    /// `party` crossed the win or loss share threshold.
    ShareThreshold { party: Party },
    /// Every listed party ended the quarter with no cash.
    Bankruptcy { parties: Vec<Party> },
    Aborted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Winner(Party),
    Draw,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub reason: TerminationReason,
    /// `None` only for aborted campaigns.
    pub verdict: Option<Verdict>,
    /// Number of resolved turns.
    pub turns: u32,
}

/// Turn engine state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Idle,
    TurnInProgress,
    TurnResolved,
    CampaignEnded(Outcome),
    /// An invariant broke; no further turns are accepted.
    Aborted(String),
}

/// Everything handed to reporting at the end of a campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignReport {
    pub records: Vec<TurnRecord>,
    pub user: Company,
    pub competitor: Company,
    pub ai: AiState,
    pub environment: MarketEnvironment,
    pub outcome: Option<Outcome>,
}

/// A running campaign. Exclusively owns both companies, the environment,
/// the AI state and the history.
#[derive(Clone, Debug)]
pub struct Campaign {
    pub(crate) config: CampaignConfig,
    pub(crate) strategy: StrategyEngine,
    pub(crate) rng: SimRng,
    pub(crate) environment: MarketEnvironment,
    pub(crate) user: Company,
    pub(crate) competitor: Company,
    pub(crate) ai: AiState,
    pub(crate) history: Vec<TurnRecord>,
    pub(crate) turn: u32,
    pub(crate) market_push: f64,
    pub(crate) lifecycle: Lifecycle,
}

impl Campaign {
    /// Validate the configuration and set up turn 0.
    pub fn new(config: CampaignConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy = StrategyEngine::new(config.ai.clone(), config.max_quarters);
        let mut rng = SimRng::new(config.seed);
        let ai = strategy.initial_state(&mut rng);
        let environment = config.market.initial_environment();
        let user = config.user.build(Party::User);
        let competitor = config.competitor.build(Party::Competitor);
        info!(
            seed = config.seed,
            quarters = config.max_quarters,
            personality = ai.personality.label(config.ai.vocabulary),
            "campaign created"
        );
        Ok(Self {
            strategy,
            rng,
            environment,
            user,
            competitor,
            ai,
            history: Vec::new(),
            turn: 0,
            market_push: 0.0,
            lifecycle: Lifecycle::Idle,
            config,
        })
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn user(&self) -> &Company {
        &self.user
    }

    pub fn competitor(&self) -> &Company {
        &self.competitor
    }

    pub fn company(&self, party: Party) -> &Company {
        match party {
            Party::User => &self.user,
            Party::Competitor => &self.competitor,
        }
    }

    pub fn environment(&self) -> &MarketEnvironment {
        &self.environment
    }

    pub fn ai_state(&self) -> &AiState {
        &self.ai
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        match &self.lifecycle {
            Lifecycle::CampaignEnded(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.lifecycle,
            Lifecycle::CampaignEnded(_) | Lifecycle::Aborted(_)
        )
    }

    /// Play one quarter with the given user command.
    ///
    /// An invalid command is returned as [`SimError::Input`] and leaves every
    /// piece of state untouched, turn index included.
    pub fn play_turn(&mut self, command: &UserCommand) -> Result<&TurnRecord, SimError> {
        if self.is_finished() {
            return Err(SimError::Finished);
        }
        let user_action = command.validate(&self.user).map_err(|e| {
            warn!(turn = self.turn, error = %e, "user command rejected");
            SimError::Input(e)
        })?;
        self.lifecycle = Lifecycle::TurnInProgress;

        let mut rng = self.rng.clone();
        let advance = sim_econ::advance(
            &self.environment,
            self.turn,
            self.market_push,
            &self.config.market,
            &mut rng,
        );
        let env = advance.environment;
        let decision = self.strategy.decide(
            &self.ai,
            &self.competitor,
            &self.user.public_view(),
            &env,
            &self.history,
            &mut rng,
        );
        let user_rolls = SideRolls::draw(&mut rng);
        let rival_rolls = SideRolls::draw(&mut rng);

        let resolution = resolver::resolve(
            Side {
                company: &self.user,
                action: &user_action,
                rolls: user_rolls,
                read_confidence: None,
            },
            Side {
                company: &self.competitor,
                action: &decision.action,
                rolls: rival_rolls,
                read_confidence: Some(decision.next_state.confidence),
            },
            &env,
            &self.config.resolver,
        )
        .map_err(|e| {
            error!(turn = self.turn, error = %e, "resolver rejected turn inputs");
            self.lifecycle = Lifecycle::Aborted(e.to_string());
            SimError::Config(e)
        })?;

        let mut events = advance.events;
        events.push(Event::party(
            EventKind::Info,
            Party::Competitor,
            format!(
                "{} is {} ({:?}).",
                self.competitor.name,
                decision.next_state.personality.label(self.config.ai.vocabulary),
                decision.next_state.phase
            ),
        ));
        events.extend(resolution.events);

        let record = TurnRecord {
            turn: self.turn,
            date: env.date,
            environment: env.clone(),
            user: resolution.user,
            competitor: resolution.competitor,
            user_action,
            competitor_action: decision.action,
            ai: decision.next_state,
            deltas: resolution.deltas,
            events,
        };

        if let Err(violation) = invariants::check_record(&record, self.turn) {
            error!(turn = self.turn, %violation, "invariant violated, aborting campaign");
            self.lifecycle = Lifecycle::Aborted(violation.to_string());
            return Err(SimError::Invariant {
                turn: self.turn,
                violation,
                last_consistent: self.history.last().cloned().map(Box::new),
            });
        }

        self.rng = rng;
        self.environment = env;
        self.user = record.user.clone();
        self.competitor = record.competitor.clone();
        self.ai = record.ai.clone();
        self.market_push = record.deltas.market_push;
        let index = self.history.len();
        self.history.push(record);
        self.turn += 1;
        self.lifecycle = Lifecycle::TurnResolved;
        info!(
            turn = self.turn,
            user_share = self.user.market_share,
            competitor_share = self.competitor.market_share,
            user_cash = %self.user.cash,
            competitor_cash = %self.competitor.cash,
            "turn resolved"
        );

        self.lifecycle = match self.termination() {
            Some(outcome) => {
                info!(reason = ?outcome.reason, verdict = ?outcome.verdict, "campaign ended");
                Lifecycle::CampaignEnded(outcome)
            }
            None => Lifecycle::Idle,
        };
        Ok(&self.history[index])
    }

    /// Terminal outcome after the latest commit, if any.
    fn termination(&self) -> Option<Outcome> {
        let bankrupt: Vec<Party> = Party::BOTH
            .into_iter()
            .filter(|p| self.company(*p).is_bankrupt())
            .collect();
        let reason = if !bankrupt.is_empty() {
            TerminationReason::Bankruptcy { parties: bankrupt }
        } else if let Some(party) = Party::BOTH.into_iter().find(|p| {
            let share = self.company(*p).market_share;
            share >= self.config.win_share || share <= self.config.loss_share
        }) {
            TerminationReason::ShareThreshold { party }
        } else if self.turn >= self.config.max_quarters {
            TerminationReason::MaxQuarters
        } else {
            return None;
        };
        let verdict = self.verdict(&reason);
        Some(Outcome {
            reason,
            verdict: Some(verdict),
            turns: self.turn,
        })
    }

    fn verdict(&self, reason: &TerminationReason) -> Verdict {
        if let TerminationReason::Bankruptcy { parties } = reason {
            return match parties.as_slice() {
                [only] => Verdict::Winner(only.opponent()),
                _ => Verdict::Draw,
            };
        }
        let (u, c) = (self.user.market_share, self.competitor.market_share);
        if u > c {
            Verdict::Winner(Party::User)
        } else if c > u {
            Verdict::Winner(Party::Competitor)
        } else {
            Verdict::Draw
        }
    }

    /// End the campaign between turns. No verdict is declared.
    pub fn abort(&mut self) {
        if self.is_finished() {
            return;
        }
        info!(turn = self.turn, "campaign aborted");
        self.lifecycle = Lifecycle::CampaignEnded(Outcome {
            reason: TerminationReason::Aborted,
            verdict: None,
            turns: self.turn,
        });
    }

    /// Drive the campaign to its end, asking `source` for every command and
    /// handing each record to `observer`. A source that keeps sending invalid
    /// commands is re-prompted up to `max_rejections` times per turn.
    pub fn run(
        &mut self,
        source: &mut dyn UserActionSource,
        observer: &mut dyn TurnObserver,
    ) -> Result<CampaignReport, SimError> {
        while !self.is_finished() {
            let mut attempts = 0u32;
            loop {
                let command = source.next_command(self.turn, &self.user, &self.environment);
                match self.play_turn(&command) {
                    Ok(record) => {
                        observer.on_turn(record);
                        break;
                    }
                    Err(SimError::Input(e)) => {
                        attempts += 1;
                        source.rejected(self.turn, &e);
                        if attempts > self.config.max_rejections {
                            return Err(SimError::TooManyRejections {
                                turn: self.turn,
                                attempts,
                            });
                        }
                    }
                    Err(other) => return Err(other),
                }
            }
        }
        Ok(self.report())
    }

    /// Ordered history plus final snapshots. Complete only once the
    /// campaign has ended.
    pub fn report(&self) -> CampaignReport {
        CampaignReport {
            records: self.history.clone(),
            user: self.user.clone(),
            competitor: self.competitor.clone(),
            ai: self.ai.clone(),
            environment: self.environment.clone(),
            outcome: self.outcome().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::ScriptedUser;
    use rust_decimal::Decimal;
    use sim_core::{ActionKind, CompetitorPolicy, InputError, UnitKind};
    use std::collections::BTreeMap;

    fn passive() -> CampaignConfig {
        let mut cfg = CampaignConfig::default();
        cfg.ai.policy = CompetitorPolicy::Passive;
        cfg
    }

    #[test]
    fn turn_index_advances_by_one() {
        let mut c = Campaign::new(CampaignConfig::default()).unwrap();
        for expected in 0..3 {
            let r = c.play_turn(&UserCommand::hold()).unwrap();
            assert_eq!(r.turn, expected);
        }
        assert_eq!(c.turn(), 3);
        assert_eq!(c.history().len(), 3);
    }

    #[test]
    fn first_quarter_is_one_quarter_after_start() {
        let mut c = Campaign::new(passive()).unwrap();
        let start = c.environment().date;
        let r = c.play_turn(&UserCommand::hold()).unwrap();
        assert!(r.date > start);
        assert_eq!(r.environment.cycle, 1);
    }

    #[test]
    fn rejected_command_mutates_nothing() {
        let mut c = Campaign::new(CampaignConfig::default()).unwrap();
        let before_user = c.user().clone();
        let before_rng = c.rng.clone();
        let cmd = UserCommand::new(
            ActionKind::Attack,
            BTreeMap::from([(UnitKind::Sales, before_user.cash + Decimal::ONE)]),
        );
        let err = c.play_turn(&cmd).unwrap_err();
        assert!(matches!(err, SimError::Input(InputError::OverBudget { .. })));
        assert_eq!(c.turn(), 0);
        assert_eq!(c.user(), &before_user);
        assert_eq!(c.rng, before_rng);
        assert_eq!(c.lifecycle(), &Lifecycle::Idle);
    }

    #[test]
    fn max_quarters_ends_campaign() {
        let mut cfg = passive();
        cfg.max_quarters = 2;
        let mut c = Campaign::new(cfg).unwrap();
        c.play_turn(&UserCommand::hold()).unwrap();
        assert_eq!(c.lifecycle(), &Lifecycle::Idle);
        c.play_turn(&UserCommand::hold()).unwrap();
        let outcome = c.outcome().unwrap();
        assert_eq!(outcome.reason, TerminationReason::MaxQuarters);
        assert_eq!(outcome.verdict, Some(Verdict::Draw));
        assert!(matches!(
            c.play_turn(&UserCommand::hold()),
            Err(SimError::Finished)
        ));
    }

    #[test]
    fn abort_has_no_verdict() {
        let mut c = Campaign::new(CampaignConfig::default()).unwrap();
        c.play_turn(&UserCommand::hold()).unwrap();
        c.abort();
        let o = c.outcome().unwrap();
        assert_eq!(o.reason, TerminationReason::Aborted);
        assert_eq!(o.verdict, None);
        assert_eq!(o.turns, 1);
    }

    #[test]
    fn run_gives_up_after_repeated_rejections() {
        let mut cfg = passive();
        cfg.max_rejections = 2;
        let mut c = Campaign::new(cfg).unwrap();
        let bad = UserCommand::new(ActionKind::Attack, BTreeMap::new());
        let mut source = ScriptedUser::repeating(bad, 10);
        let err = c.run(&mut source, &mut |_: &TurnRecord| {}).unwrap_err();
        assert!(matches!(err, SimError::TooManyRejections { turn: 0, attempts: 3 }));
        assert_eq!(source.rejections.len(), 3);
        assert_eq!(c.turn(), 0);
    }

    #[test]
    fn run_reports_every_turn_to_observer() {
        let mut c = Campaign::new(passive()).unwrap();
        let mut seen = Vec::new();
        let report = c
            .run(&mut ScriptedUser::default(), &mut |r: &TurnRecord| seen.push(r.turn))
            .unwrap();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
        assert_eq!(report.records.len(), 8);
        assert!(report.outcome.is_some());
    }

    #[test]
    fn equal_bankruptcy_is_a_draw() {
        let mut c = Campaign::new(passive()).unwrap();
        let both = TerminationReason::Bankruptcy {
            parties: vec![Party::User, Party::Competitor],
        };
        assert_eq!(c.verdict(&both), Verdict::Draw);
        let one = TerminationReason::Bankruptcy {
            parties: vec![Party::User],
        };
        assert_eq!(c.verdict(&one), Verdict::Winner(Party::Competitor));
        c.user.market_share = 51.0;
        assert_eq!(
            c.verdict(&TerminationReason::MaxQuarters),
            Verdict::Winner(Party::User)
        );
    }
}
