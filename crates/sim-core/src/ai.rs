//! Behavioural state owned by the competitor AI.

use crate::action::ActionKind;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Behavioural mode governing action-selection bias.
///
/// The market vocabulary (bullish/bearish/sideways) maps onto the same three
/// modes and is accepted wherever a personality is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    #[serde(alias = "bullish")]
    Aggressive,
    #[serde(alias = "bearish")]
    Defensive,
    #[serde(alias = "sideways")]
    Deceptive,
}

impl Personality {
    pub const ALL: [Personality; 3] = [
        Personality::Aggressive,
        Personality::Defensive,
        Personality::Deceptive,
    ];

    pub fn label(self, vocabulary: Vocabulary) -> &'static str {
        match (vocabulary, self) {
            (Vocabulary::Business, Personality::Aggressive) => "aggressive",
            (Vocabulary::Business, Personality::Defensive) => "defensive",
            (Vocabulary::Business, Personality::Deceptive) => "deceptive",
            (Vocabulary::Market, Personality::Aggressive) => "bullish",
            (Vocabulary::Market, Personality::Defensive) => "bearish",
            (Vocabulary::Market, Personality::Deceptive) => "sideways",
        }
    }

    /// Chart encoding: 1 aggressive, 0.5 deceptive, 0 defensive.
    pub fn chart_value(self) -> f64 {
        match self {
            Personality::Aggressive => 1.0,
            Personality::Deceptive => 0.5,
            Personality::Defensive => 0.0,
        }
    }
}

/// Naming used when presenting personalities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    /// aggressive / defensive / deceptive
    #[default]
    Business,
    /// bullish / bearish / sideways
    Market,
}

/// Coarse campaign-progress indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Opening,
    MidGame,
    Endgame,
    Stability,
}

/// What the AI remembers about one resolved turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSample {
    pub turn: u32,
    /// Applied share change for the AI's own company.
    pub share_delta: f64,
    pub won: bool,
    /// Kind of action the opponent played.
    pub opponent_kind: ActionKind,
    /// Asset classes the opponent targeted offensively.
    pub opponent_offense: Vec<crate::company::AssetClass>,
}

/// The AI's complete behavioural state. Mutated once per turn, only by the
/// strategy engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiState {
    pub personality: Personality,
    pub phase: Phase,
    /// Confidence in [0,1].
    pub confidence: f64,
    /// Most recent outcomes, oldest first, at most `window_len` long.
    pub window: VecDeque<OutcomeSample>,
    pub window_len: usize,
    /// Personality in force on each of the last `window_len` turns.
    pub recent_personalities: VecDeque<Personality>,
    pub turns_observed: u32,
    pub last_observed_turn: Option<u32>,
    /// Turn at which the phase last regressed to mid-game.
    pub recontested_at: Option<u32>,
    /// When set, personality never changes.
    pub locked: bool,
}

impl AiState {
    pub fn new(personality: Personality, window_len: usize, locked: bool) -> Self {
        Self {
            personality,
            phase: Phase::Opening,
            confidence: 0.5,
            window: VecDeque::with_capacity(window_len),
            window_len,
            recent_personalities: VecDeque::with_capacity(window_len),
            turns_observed: 0,
            last_observed_turn: None,
            recontested_at: None,
            locked,
        }
    }

    pub fn window_full(&self) -> bool {
        self.window.len() >= self.window_len
    }

    /// Append a sample, evicting the oldest beyond the window length.
    pub fn push_sample(&mut self, sample: OutcomeSample) {
        self.last_observed_turn = Some(sample.turn);
        self.window.push_back(sample);
        while self.window.len() > self.window_len {
            self.window.pop_front();
        }
        self.turns_observed += 1;
    }

    pub fn record_personality(&mut self) {
        self.recent_personalities.push_back(self.personality);
        while self.recent_personalities.len() > self.window_len {
            self.recent_personalities.pop_front();
        }
    }

    /// How often `p` was in force across the recent window.
    pub fn usage(&self, p: Personality) -> usize {
        self.recent_personalities.iter().filter(|x| **x == p).count()
    }

    pub fn share_deltas(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().map(|s| s.share_delta)
    }
}
