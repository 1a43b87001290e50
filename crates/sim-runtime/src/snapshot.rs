//! Complete, flat campaign state for save and resume.

use crate::engine::{Campaign, Lifecycle};
use crate::replay::ReplayError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sim_ai::StrategyEngine;
use sim_core::{AiState, CampaignConfig, Company, MarketEnvironment, Party, SimRng, TurnRecord};
use std::path::Path;

/// Everything needed to resume a campaign deterministically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub config: CampaignConfig,
    pub user: Company,
    pub competitor: Company,
    pub environment: MarketEnvironment,
    pub ai: AiState,
    pub history: Vec<TurnRecord>,
    pub turn: u32,
    pub market_push: f64,
    /// Seed plus stream position.
    pub rng: SimRng,
    pub lifecycle: Lifecycle,
}

impl Campaign {
    pub fn snapshot(&self) -> CampaignSnapshot {
        CampaignSnapshot {
            config: self.config.clone(),
            user: self.user.clone(),
            competitor: self.competitor.clone(),
            environment: self.environment.clone(),
            ai: self.ai.clone(),
            history: self.history.clone(),
            turn: self.turn,
            market_push: self.market_push,
            rng: self.rng.clone(),
            lifecycle: self.lifecycle.clone(),
        }
    }

    /// Rebuild a campaign from a snapshot. The embedded configuration is
    /// validated again and the live state must agree with the last record;
    /// a snapshot taken mid-turn resumes as idle.
    pub fn restore(snapshot: CampaignSnapshot) -> Result<Self, ReplayError> {
        snapshot.config.validate()?;
        check_consistency(&snapshot)?;
        let lifecycle = match snapshot.lifecycle {
            Lifecycle::TurnInProgress | Lifecycle::TurnResolved => Lifecycle::Idle,
            other => other,
        };
        Ok(Self {
            strategy: StrategyEngine::new(snapshot.config.ai.clone(), snapshot.config.max_quarters),
            rng: snapshot.rng,
            environment: snapshot.environment,
            user: snapshot.user,
            competitor: snapshot.competitor,
            ai: snapshot.ai,
            history: snapshot.history,
            turn: snapshot.turn,
            market_push: snapshot.market_push,
            lifecycle,
            config: snapshot.config,
        })
    }

    /// Write the snapshot through the persistence collaborator.
    pub fn save(&self, path: &Path) -> Result<()> {
        let hash = persistence::config_hash(&self.config)?;
        persistence::save_json(path, &hash, &self.snapshot())
    }

    /// Load a save, refusing it unless it was produced under `config`.
    pub fn load(path: &Path, config: &CampaignConfig) -> Result<Self> {
        let file = persistence::load_json::<CampaignSnapshot>(path)?;
        file.verify_config(&persistence::config_hash(config)?)?;
        Campaign::restore(file.payload).context("restoring campaign from save")
    }
}

/// The live state must be exactly what the history and seed say it is.
fn check_consistency(s: &CampaignSnapshot) -> Result<(), ReplayError> {
    if s.rng.seed() != s.config.seed {
        return Err(ReplayError::Snapshot(format!(
            "rng seed {} differs from configured seed {}",
            s.rng.seed(),
            s.config.seed
        )));
    }
    if s.history.len() != s.turn as usize {
        return Err(ReplayError::Snapshot(format!(
            "snapshot turn {} does not match {} recorded turns",
            s.turn,
            s.history.len()
        )));
    }
    for (i, record) in s.history.iter().enumerate() {
        if record.turn as usize != i {
            return Err(ReplayError::Snapshot(format!(
                "record {i} is labelled turn {}",
                record.turn
            )));
        }
    }
    let Some(last) = s.history.last() else {
        if s.user != s.config.user.build(Party::User)
            || s.competitor != s.config.competitor.build(Party::Competitor)
        {
            return Err(ReplayError::Snapshot("companies differ from the configured start".into()));
        }
        return Ok(());
    };
    if s.user != last.user || s.competitor != last.competitor {
        return Err(ReplayError::Snapshot(format!(
            "companies differ from record {}",
            last.turn
        )));
    }
    if s.environment != last.environment {
        return Err(ReplayError::Snapshot(format!(
            "environment differs from record {}",
            last.turn
        )));
    }
    if s.ai != last.ai {
        return Err(ReplayError::Snapshot(format!("AI state differs from record {}", last.turn)));
    }
    if s.market_push != last.deltas.market_push {
        return Err(ReplayError::Snapshot(format!(
            "market push differs from record {}",
            last.turn
        )));
    }
    Ok(())
}
