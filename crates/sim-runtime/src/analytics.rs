//! Read-only chart series over completed history.

use serde::{Deserialize, Serialize};
use sim_core::{Party, TurnRecord, UnitKind};
use std::collections::BTreeMap;

/// Per-quarter series, one entry per record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub turns: Vec<u32>,
    pub user_share: Vec<f64>,
    pub competitor_share: Vec<f64>,
    pub market_sentiment: Vec<f64>,
    pub user_stress: Vec<f64>,
    pub competitor_stress: Vec<f64>,
    pub user_liquidity: Vec<f64>,
    pub competitor_liquidity: Vec<f64>,
    /// AI personality as 1.0 aggressive, 0.5 deceptive, 0.0 defensive.
    pub personality: Vec<f64>,
}

pub fn series(records: &[TurnRecord]) -> Series {
    let mut s = Series::default();
    for r in records {
        s.turns.push(r.turn);
        s.user_share.push(r.user.market_share);
        s.competitor_share.push(r.competitor.market_share);
        s.market_sentiment.push(r.environment.sentiment);
        s.user_stress.push(r.user.stress);
        s.competitor_stress.push(r.competitor.stress);
        s.user_liquidity.push(r.user.liquidity);
        s.competitor_liquidity.push(r.competitor.liquidity);
        s.personality.push(r.ai.personality.chart_value());
    }
    s
}

/// Budget share of each unit per quarter for one company.
pub fn unit_composition(records: &[TurnRecord], party: Party) -> BTreeMap<UnitKind, Vec<f64>> {
    let mut out: BTreeMap<UnitKind, Vec<f64>> = BTreeMap::new();
    for r in records {
        for (kind, frac) in r.company(party).budget_distribution() {
            out.entry(kind).or_default().push(frac);
        }
    }
    out
}

/// Headline numbers for the latest quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub turn: u32,
    pub user_share: f64,
    pub competitor_share: f64,
    /// Mean per-quarter share change for the user.
    pub user_momentum: f64,
    /// Quarters in which the user gained share.
    pub user_wins: usize,
    pub competitor_wins: usize,
}

pub fn kpis(records: &[TurnRecord]) -> Option<Kpis> {
    let last = records.last()?;
    let changes: Vec<f64> = records.iter().map(|r| r.deltas.user.share).collect();
    Some(Kpis {
        turn: last.turn,
        user_share: last.user.market_share,
        competitor_share: last.competitor.market_share,
        user_momentum: changes.iter().sum::<f64>() / changes.len() as f64,
        user_wins: changes.iter().filter(|d| **d > 0.0).count(),
        competitor_wins: changes.iter().filter(|d| **d < 0.0).count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Campaign;
    use sim_core::{CampaignConfig, UserCommand};

    fn history() -> Vec<TurnRecord> {
        let mut c = Campaign::new(CampaignConfig::default()).unwrap();
        for _ in 0..4 {
            c.play_turn(&UserCommand::hold()).unwrap();
        }
        c.history().to_vec()
    }

    #[test]
    fn series_has_one_point_per_record() {
        let h = history();
        let s = series(&h);
        assert_eq!(s.turns, vec![0, 1, 2, 3]);
        assert_eq!(s.user_share.len(), 4);
        assert!(s
            .personality
            .iter()
            .all(|p| [0.0, 0.5, 1.0].contains(p)));
    }

    #[test]
    fn composition_sums_to_one() {
        let h = history();
        let comp = unit_composition(&h, Party::Competitor);
        assert_eq!(comp.len(), 7);
        for i in 0..h.len() {
            let total: f64 = comp.values().map(|v| v[i]).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn kpis_summarise_history() {
        assert_eq!(kpis(&[]), None);
        let h = history();
        let k = kpis(&h).unwrap();
        assert_eq!(k.turn, 3);
        assert!(k.user_wins + k.competitor_wins <= 4);
    }
}
