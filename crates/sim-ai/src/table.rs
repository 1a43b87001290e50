//! Dispatch table from (personality, phase) to weighted action kinds, plus
//! the targeting rules that turn a kind into a per-unit allocation.

use rust_decimal::{Decimal, RoundingStrategy};
use sim_core::{ActionKind, AiState, AssetClass, Company, OpponentView, Personality, Phase, UnitKind};
use std::collections::BTreeMap;

/// Weighted candidate kinds for a personality in a phase.
///
/// `predictability` in [0,1] only matters for the deceptive row: the more
/// predictable the opponent, the more the AI leans on attack.
pub fn candidates(
    personality: Personality,
    phase: Phase,
    predictability: f64,
) -> Vec<(ActionKind, u32)> {
    use ActionKind::*;
    match (personality, phase) {
        (Personality::Aggressive, Phase::Opening) => vec![(Invest, 3), (Attack, 2)],
        (Personality::Aggressive, Phase::MidGame) => vec![(Attack, 3), (Exploit, 1), (Invest, 1)],
        (Personality::Aggressive, Phase::Endgame) => vec![(Attack, 4), (Invest, 1)],
        (Personality::Aggressive, Phase::Stability) => {
            vec![(Invest, 2), (Attack, 2), (Diversify, 1)]
        }
        (Personality::Defensive, Phase::Opening) => vec![(Defend, 2), (Diversify, 2)],
        (Personality::Defensive, Phase::MidGame) | (Personality::Defensive, Phase::Endgame) => {
            vec![(Defend, 3), (Diversify, 1)]
        }
        (Personality::Defensive, Phase::Stability) => vec![(Diversify, 3), (Defend, 1)],
        (Personality::Deceptive, _) => {
            let p = predictability.clamp(0.0, 1.0);
            let attack = (100.0 * (0.5 + 0.4 * p)).round() as u32;
            vec![(Attack, attack), (Defend, 100 - attack)]
        }
    }
}

/// Phase multiplier on commitment.
pub fn phase_factor(phase: Phase) -> f64 {
    match phase {
        Phase::Opening => 0.8,
        Phase::Stability => 0.6,
        Phase::MidGame | Phase::Endgame => 1.0,
    }
}

/// Units that counter the opponent's dominant budget line.
pub fn counter_units(dominant: Option<UnitKind>) -> [UnitKind; 2] {
    match dominant {
        Some(UnitKind::Sales) => [UnitKind::Marketing, UnitKind::RnD],
        Some(UnitKind::Marketing) | Some(UnitKind::RnD) => [UnitKind::Sales, UnitKind::Legal],
        _ => [UnitKind::Sales, UnitKind::Marketing],
    }
}

/// Asset class the opponent hit most often across the window. Ties resolve
/// to canonical order; an empty window defaults to commercial.
pub fn most_attacked_class(state: &AiState) -> AssetClass {
    let mut counts: BTreeMap<AssetClass, usize> = BTreeMap::new();
    for sample in &state.window {
        for class in &sample.opponent_offense {
            *counts.entry(*class).or_default() += 1;
        }
    }
    let mut best = (AssetClass::Commercial, 0usize);
    for (class, n) in counts {
        if n > best.1 {
            best = (class, n);
        }
    }
    best.0
}

/// Integer weights per unit for the chosen kind, restricted to units `own`
/// actually has.
pub fn target_weights(
    kind: ActionKind,
    own: &Company,
    view: &OpponentView,
    state: &AiState,
) -> Vec<(UnitKind, u32)> {
    let [first, second] = counter_units(view.dominant_unit());
    let raw: Vec<(UnitKind, u32)> = match kind {
        ActionKind::Attack | ActionKind::Invest => vec![(first, 60), (second, 40)],
        ActionKind::Exploit => vec![(UnitKind::MarketIntelligence, 70), (first, 30)],
        ActionKind::Defend => {
            let class = most_attacked_class(state);
            UnitKind::ALL
                .iter()
                .filter(|u| u.asset_class() == class)
                .map(|u| (*u, 1))
                .collect()
        }
        ActionKind::Diversify => UnitKind::ALL.iter().map(|u| (*u, 1)).collect(),
        ActionKind::Hold => Vec::new(),
    };
    raw.into_iter()
        .filter(|(u, _)| own.units.contains_key(u))
        .collect()
}

/// Split `total` across weighted units. Parts are rounded down to cents and
/// the remainder goes to the first unit, so the parts sum to `total` exactly.
pub fn split(total: Decimal, weights: &[(UnitKind, u32)]) -> BTreeMap<UnitKind, Decimal> {
    let sum: u32 = weights.iter().map(|(_, w)| *w).sum();
    let mut out = BTreeMap::new();
    if sum == 0 || total <= Decimal::ZERO {
        return out;
    }
    let mut assigned = Decimal::ZERO;
    for (unit, w) in weights {
        let part = (total * Decimal::from(*w) / Decimal::from(sum))
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);
        assigned += part;
        *out.entry(*unit).or_insert(Decimal::ZERO) += part;
    }
    if let Some((unit, _)) = weights.first() {
        *out.entry(*unit).or_insert(Decimal::ZERO) += total - assigned;
    }
    out.retain(|_, v| *v > Decimal::ZERO);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pair_has_a_non_hold_candidate() {
        for p in Personality::ALL {
            for phase in [Phase::Opening, Phase::MidGame, Phase::Endgame, Phase::Stability] {
                let c = candidates(p, phase, 0.5);
                assert!(c.iter().map(|(_, w)| *w).sum::<u32>() > 0);
                assert!(c.iter().all(|(k, _)| *k != ActionKind::Hold));
            }
        }
    }

    #[test]
    fn defensive_never_attacks() {
        for phase in [Phase::Opening, Phase::MidGame, Phase::Endgame, Phase::Stability] {
            let c = candidates(Personality::Defensive, phase, 1.0);
            assert!(c
                .iter()
                .all(|(k, _)| matches!(k, ActionKind::Defend | ActionKind::Diversify)));
        }
    }

    #[test]
    fn deceptive_leans_on_predictable_opponents() {
        let low = candidates(Personality::Deceptive, Phase::MidGame, 0.0);
        let high = candidates(Personality::Deceptive, Phase::MidGame, 1.0);
        assert_eq!(low[0], (ActionKind::Attack, 50));
        assert_eq!(high[0], (ActionKind::Attack, 90));
        assert_eq!(high[1], (ActionKind::Defend, 10));
    }

    #[test]
    fn counters_follow_dominant_line() {
        assert_eq!(
            counter_units(Some(UnitKind::Sales)),
            [UnitKind::Marketing, UnitKind::RnD]
        );
        assert_eq!(
            counter_units(Some(UnitKind::RnD)),
            [UnitKind::Sales, UnitKind::Legal]
        );
        assert_eq!(counter_units(None), [UnitKind::Sales, UnitKind::Marketing]);
    }

    #[test]
    fn split_sums_exactly() {
        let total = Decimal::new(100_01, 2);
        let parts = split(
            total,
            &[(UnitKind::Sales, 1), (UnitKind::Legal, 1), (UnitKind::Finance, 1)],
        );
        assert_eq!(parts.values().copied().sum::<Decimal>(), total);
        assert_eq!(parts[&UnitKind::Legal], Decimal::new(33_33, 2));
        assert_eq!(parts[&UnitKind::Sales], Decimal::new(33_35, 2));
    }

    #[test]
    fn split_of_nothing_is_empty() {
        assert!(split(Decimal::ZERO, &[(UnitKind::Sales, 1)]).is_empty());
        assert!(split(Decimal::ONE, &[]).is_empty());
    }
}
