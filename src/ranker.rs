use crate::types::{Allocation, RankedRecord, ScoredRecord, TieBreak};
use std::cmp::Ordering;
use tracing::debug;

const EFFICIENCY_WEIGHT: f64 = 0.3;
const INCREMENTAL_ROI_WEIGHT: f64 = 0.7;
pub const WINNER_BONUS: f64 = 0.1;

fn batch_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}

fn normalized(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Order the batch by ranking score, highest first.
///
/// Scores are normalized against the batch maxima, so the whole batch is
/// needed at once. Allocation fields start at their unfunded values.
pub fn rank(scored: Vec<ScoredRecord>, tie_break: TieBreak) -> Vec<RankedRecord> {
    if scored.is_empty() {
        return Vec::new();
    }
    let max_efficiency = batch_max(scored.iter().map(|s| s.efficiency_score));
    let max_incremental_roi = batch_max(scored.iter().map(|s| s.incremental_roi_score));

    let mut ranked: Vec<RankedRecord> = scored
        .into_iter()
        .map(|s| {
            let norm_efficiency = normalized(s.efficiency_score, max_efficiency);
            let norm_incremental_roi = normalized(s.incremental_roi_score, max_incremental_roi);
            let mut ranking_score =
                EFFICIENCY_WEIGHT * norm_efficiency + INCREMENTAL_ROI_WEIGHT * norm_incremental_roi;
            if s.is_efficiency_winner {
                ranking_score += WINNER_BONUS;
            }
            let allocation = Allocation::unfunded(s.record.sales_period2);
            RankedRecord {
                scored: s,
                ranking_score,
                allocation,
            }
        })
        .collect();

    // stable: complete ties keep merge order
    ranked.sort_by(|a, b| {
        let primary = desc(a.ranking_score, b.ranking_score);
        match tie_break {
            TieBreak::ScoreOnly => primary,
            TieBreak::Full => primary
                .then_with(|| desc(a.scored.incremental_sales, b.scored.incremental_sales))
                .then_with(|| desc(a.scored.current_roi, b.scored.current_roi)),
        }
    });

    debug!(
        entities = ranked.len(),
        max_efficiency,
        max_incremental_roi,
        ?tie_break,
        "ranked batch"
    );
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::score;
    use crate::types::MergedRecord;

    fn scored(name: &str, s1: f64, sp1: f64, s2: f64, sp2: f64) -> ScoredRecord {
        score(&MergedRecord {
            entity_name: name.into(),
            sales_period1: s1,
            spend_period1: sp1,
            sales_period2: s2,
            spend_period2: sp2,
        })
    }

    fn names(r: &[RankedRecord]) -> Vec<&str> {
        r.iter().map(|x| x.entity_name()).collect()
    }

    #[test]
    fn empty_batch_ranks_to_nothing() {
        assert!(rank(Vec::new(), TieBreak::Full).is_empty());
    }

    #[test]
    fn winner_tops_the_batch_with_bonus() {
        let ranked = rank(
            vec![
                scored("B", 100.0, 50.0, 90.0, 60.0),
                scored("A", 100.0, 50.0, 150.0, 40.0),
            ],
            TieBreak::Full,
        );
        assert_eq!(names(&ranked), vec!["A", "B"]);
        assert!((ranked[0].ranking_score - 1.1).abs() < 1e-9);
        // B only carries its share of the efficiency maximum
        let expected_b = 0.3 * (0.6 / 10.5);
        assert!((ranked[1].ranking_score - expected_b).abs() < 1e-9);
    }

    #[test]
    fn allocation_fields_start_unfunded() {
        let ranked = rank(vec![scored("A", 1.0, 1.0, 7.0, 2.0)], TieBreak::Full);
        let a = &ranked[0].allocation;
        assert_eq!(a.new_budget_allocation, 0.0);
        assert_eq!(a.budget_multiplier, 1.0);
        assert_eq!(a.projected_sales_increase, 0.0);
        assert_eq!(a.projected_new_sales, 7.0);
        assert_eq!(a.projected_roi, 0.0);
    }

    #[test]
    fn zero_maxima_normalize_to_zero() {
        // both decline with growing spend: every score is zero
        let ranked = rank(
            vec![
                scored("X", 10.0, 0.0, 0.0, 5.0),
                scored("Y", 10.0, 0.0, 0.0, 5.0),
            ],
            TieBreak::Full,
        );
        assert!(ranked.iter().all(|r| r.ranking_score == 0.0));
        assert_eq!(names(&ranked), vec!["X", "Y"]);
    }

    #[test]
    fn full_tie_break_uses_incremental_sales_then_current_roi() {
        // identical incremental ROI (2.0) and identical efficiency maxima ties
        let low_sales = scored("low", 0.0, 0.0, 10.0, 5.0);
        let high_sales = scored("high", 0.0, 0.0, 20.0, 10.0);
        assert_eq!(low_sales.efficiency_score, high_sales.efficiency_score);

        let ranked = rank(vec![low_sales.clone(), high_sales.clone()], TieBreak::Full);
        assert_eq!(names(&ranked), vec!["high", "low"]);

        let legacy = rank(vec![low_sales, high_sales], TieBreak::ScoreOnly);
        assert_eq!(names(&legacy), vec!["low", "high"]);
    }

    #[test]
    fn current_roi_breaks_ties_left_by_incremental_sales() {
        let with_roi = |name: &str, current_roi: f64| ScoredRecord {
            record: MergedRecord {
                entity_name: name.into(),
                sales_period1: 10.0,
                spend_period1: 10.0,
                sales_period2: 20.0,
                spend_period2: 20.0 / current_roi,
            },
            incremental_sales: 10.0,
            incremental_spend: 5.0,
            incremental_roi_score: 2.0,
            original_incremental_roi: 2.0,
            current_roi,
            efficiency_score: 1.5,
            is_efficiency_winner: false,
        };
        let input = vec![with_roi("lo", 1.0), with_roi("hi", 4.0)];

        let ranked = rank(input.clone(), TieBreak::Full);
        assert_eq!(ranked[0].ranking_score, ranked[1].ranking_score);
        assert_eq!(names(&ranked), vec!["hi", "lo"]);

        let legacy = rank(input, TieBreak::ScoreOnly);
        assert_eq!(names(&legacy), vec!["lo", "hi"]);
    }

    #[test]
    fn scores_are_monotonically_non_increasing() {
        let ranked = rank(
            vec![
                scored("a", 10.0, 10.0, 12.0, 11.0),
                scored("b", 10.0, 10.0, 30.0, 8.0),
                scored("c", 10.0, 10.0, 5.0, 12.0),
                scored("d", 0.0, 0.0, 3.0, 0.0),
                scored("e", 10.0, 10.0, 10.0, 9.0),
            ],
            TieBreak::Full,
        );
        for pair in ranked.windows(2) {
            assert!(pair[0].ranking_score >= pair[1].ranking_score);
        }
    }
}
