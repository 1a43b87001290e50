//! Collaborators at the edge of the turn engine.

use sim_core::{Company, InputError, MarketEnvironment, TurnRecord, UserCommand};
use std::collections::VecDeque;

/// Supplies the user's command for each turn. Called synchronously; the
/// engine waits for the answer before proceeding.
pub trait UserActionSource {
    fn next_command(&mut self, turn: u32, own: &Company, env: &MarketEnvironment) -> UserCommand;

    /// The last command was rejected; the source will be asked again.
    fn rejected(&mut self, _turn: u32, _error: &InputError) {}
}

/// Receives every record as soon as it is appended.
pub trait TurnObserver {
    fn on_turn(&mut self, record: &TurnRecord);
}

impl<F: FnMut(&TurnRecord)> TurnObserver for F {
    fn on_turn(&mut self, record: &TurnRecord) {
        self(record)
    }
}

/// Replays a fixed list of commands, then holds forever.
#[derive(Clone, Debug, Default)]
pub struct ScriptedUser {
    plan: VecDeque<UserCommand>,
    /// Rejections received so far.
    pub rejections: Vec<(u32, InputError)>,
}

impl ScriptedUser {
    pub fn new(plan: impl IntoIterator<Item = UserCommand>) -> Self {
        Self {
            plan: plan.into_iter().collect(),
            rejections: Vec::new(),
        }
    }

    /// The same command every turn.
    pub fn repeating(command: UserCommand, turns: u32) -> Self {
        Self::new((0..turns).map(|_| command.clone()))
    }
}

impl UserActionSource for ScriptedUser {
    fn next_command(&mut self, _turn: u32, _own: &Company, _env: &MarketEnvironment) -> UserCommand {
        self.plan.pop_front().unwrap_or_else(UserCommand::hold)
    }

    fn rejected(&mut self, turn: u32, error: &InputError) {
        self.rejections.push((turn, error.clone()));
    }
}
