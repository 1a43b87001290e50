#![deny(warnings)]

//! Campaign runtime: action resolution, the turn engine and everything that
//! reads or rebuilds its history.
//!
//! The engine is single-threaded and synchronous. One [`Campaign`] owns all
//! mutable state; several campaigns never share anything.

pub mod analytics;
pub mod boundary;
pub mod engine;
pub mod invariants;
pub mod replay;
pub mod resolver;
pub mod snapshot;

pub use boundary::{ScriptedUser, TurnObserver, UserActionSource};
pub use engine::{Campaign, CampaignReport, Lifecycle, Outcome, TerminationReason, Verdict};
pub use invariants::InvariantViolation;
pub use replay::ReplayError;
pub use snapshot::CampaignSnapshot;

use sim_core::{ConfigError, InputError, TurnRecord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Recoverable: the turn did not advance.
    #[error(transparent)]
    Input(#[from] InputError),
    /// Fatal. Carries the last consistent record for diagnosis.
    #[error("invariant violated at turn {turn}: {violation}")]
    Invariant {
        turn: u32,
        violation: InvariantViolation,
        last_consistent: Option<Box<TurnRecord>>,
    },
    #[error("campaign has already ended")]
    Finished,
    #[error("user command rejected {attempts} times at turn {turn}")]
    TooManyRejections { turn: u32, attempts: u32 },
}
