//! Immutable per-turn audit entries.

use crate::action::Action;
use crate::ai::AiState;
use crate::company::{Company, Party};
use crate::market::MarketEnvironment;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category of an audit event, used by reporting for colouring and filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Info,
    Success,
    Failure,
    Investment,
    Sabotage,
    Intel,
    Environment,
}

/// A human-readable line in the audit trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    /// `None` for market-wide events.
    pub party: Option<Party>,
    pub message: String,
}

impl Event {
    pub fn market(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            party: None,
            message: message.into(),
        }
    }

    pub fn party(kind: EventKind, party: Party, message: impl Into<String>) -> Self {
        Self {
            kind,
            party: Some(party),
            message: message.into(),
        }
    }
}

/// Resolved change for one company.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SideDelta {
    /// Raw share transfer before clamping.
    pub raw_share: f64,
    /// Share change actually applied.
    pub share: f64,
    pub cash: Decimal,
    pub investment_points: Decimal,
    pub brand_strength: f64,
    pub stress: f64,
    pub liquidity: f64,
    pub sentiment: f64,
    /// Market pressure this side generated.
    pub pressure: f64,
}

/// Resolved changes for both companies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnDeltas {
    pub user: SideDelta,
    pub competitor: SideDelta,
    /// Push applied to market sentiment on the next advance.
    pub market_push: f64,
}

impl TurnDeltas {
    pub fn get(&self, party: Party) -> &SideDelta {
        match party {
            Party::User => &self.user,
            Party::Competitor => &self.competitor,
        }
    }
}

/// Audit entry for one resolved turn. Never modified once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Zero-based turn index.
    pub turn: u32,
    pub date: NaiveDate,
    pub environment: MarketEnvironment,
    /// End-of-turn company states.
    pub user: Company,
    pub competitor: Company,
    pub user_action: Action,
    pub competitor_action: Action,
    /// AI state after this turn's decision.
    pub ai: AiState,
    pub deltas: TurnDeltas,
    pub events: Vec<Event>,
}

impl TurnRecord {
    pub fn company(&self, party: Party) -> &Company {
        match party {
            Party::User => &self.user,
            Party::Competitor => &self.competitor,
        }
    }

    pub fn action(&self, party: Party) -> &Action {
        match party {
            Party::User => &self.user_action,
            Party::Competitor => &self.competitor_action,
        }
    }
}
