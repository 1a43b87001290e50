//! Rebuild a campaign by folding its recorded history from turn 0.

use crate::engine::Campaign;
use crate::SimError;
use sim_core::{Action, CampaignConfig, ConfigError, TurnRecord, UserCommand};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("replay failed at turn {turn}: {source}")]
    Sim {
        turn: u32,
        #[source]
        source: SimError,
    },
    /// The regenerated record differs from the stored one.
    #[error("replay diverged at turn {turn}")]
    Diverged { turn: u32 },
    /// Saved state that contradicts its own history or configuration.
    #[error("inconsistent snapshot: {0}")]
    Snapshot(String),
}

/// The command that produced a recorded user action.
pub fn command_for(action: &Action) -> UserCommand {
    UserCommand {
        kind: action.kind,
        allocation: action.allocation.clone(),
        feint: action.feint,
    }
}

/// Re-run every recorded user command against a fresh campaign built from
/// `config`, checking each regenerated record against the stored one.
pub fn fold(config: CampaignConfig, records: &[TurnRecord]) -> Result<Campaign, ReplayError> {
    let mut campaign = Campaign::new(config)?;
    for (i, stored) in records.iter().enumerate() {
        let turn = i as u32;
        if stored.turn != turn {
            return Err(ReplayError::Diverged { turn });
        }
        let produced = campaign
            .play_turn(&command_for(&stored.user_action))
            .map_err(|source| ReplayError::Sim { turn, source })?;
        if produced != stored {
            return Err(ReplayError::Diverged { turn });
        }
    }
    debug!(turns = records.len(), "replay matched");
    Ok(campaign)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use sim_core::{ActionKind, UnitKind};

    fn plan() -> Vec<UserCommand> {
        vec![
            UserCommand::from_percentages(
                ActionKind::Attack,
                Decimal::new(400, 0),
                &[(UnitKind::Sales, 60), (UnitKind::Marketing, 40)],
            ),
            UserCommand::hold(),
            UserCommand::from_percentages(
                ActionKind::Defend,
                Decimal::new(300, 0),
                &[(UnitKind::Marketing, 50), (UnitKind::Sales, 50)],
            ),
        ]
    }

    #[test]
    fn fold_reproduces_live_campaign() {
        let cfg = CampaignConfig::default();
        let mut live = Campaign::new(cfg.clone()).unwrap();
        for cmd in plan() {
            live.play_turn(&cmd).unwrap();
        }
        let rebuilt = fold(cfg, live.history()).unwrap();
        assert_eq!(rebuilt.user(), live.user());
        assert_eq!(rebuilt.competitor(), live.competitor());
        assert_eq!(rebuilt.environment(), live.environment());
        assert_eq!(rebuilt.ai_state(), live.ai_state());
        assert_eq!(rebuilt.snapshot(), live.snapshot());
    }

    #[test]
    fn tampered_history_diverges() {
        let cfg = CampaignConfig::default();
        let mut live = Campaign::new(cfg.clone()).unwrap();
        for cmd in plan() {
            live.play_turn(&cmd).unwrap();
        }
        let mut records = live.history().to_vec();
        records[1].user.market_share += 0.5;
        assert!(matches!(
            fold(cfg, &records),
            Err(ReplayError::Diverged { turn: 1 })
        ));
    }
}
