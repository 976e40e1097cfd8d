use crate::types::{MergedRecord, ScoredRecord};

/// Bonus added when sales grew while spend was cut.
const SPEND_CUT_BONUS: f64 = 10.0;
/// Multiplier applied to sales growth that came with no spend change.
const FREE_GROWTH_FACTOR: f64 = 100.0;
/// Score for flat or shrinking sales alongside a spend cut.
const NEUTRAL_SCORE: f64 = 0.1;

const CURRENT_ROI_WEIGHT: f64 = 0.4;
const INCREMENTAL_ROI_WEIGHT: f64 = 0.6;

/// Piecewise incremental ROI on the signs of the two deltas.
///
/// Plain sales/spend is meaningless once spend went down or stayed flat,
/// so those cases get synthetic scores that rank growth-with-less-spend
/// above ordinary marginal ROI.
pub fn incremental_roi_score(incremental_sales: f64, incremental_spend: f64) -> f64 {
    if incremental_sales > 0.0 {
        if incremental_spend > 0.0 {
            incremental_sales / incremental_spend
        } else if incremental_spend < 0.0 {
            incremental_sales / incremental_spend.abs() + SPEND_CUT_BONUS
        } else {
            incremental_sales * FREE_GROWTH_FACTOR
        }
    } else if incremental_sales == 0.0 {
        if incremental_spend <= 0.0 {
            NEUTRAL_SCORE
        } else {
            0.0
        }
    } else if incremental_spend < 0.0 {
        NEUTRAL_SCORE
    } else {
        0.0
    }
}

pub fn score(record: &MergedRecord) -> ScoredRecord {
    let incremental_sales = record.sales_period2 - record.sales_period1;
    let incremental_spend = record.spend_period2 - record.spend_period1;
    let incremental_roi_score = incremental_roi_score(incremental_sales, incremental_spend);
    let original_incremental_roi = if incremental_spend != 0.0 {
        incremental_sales / incremental_spend
    } else {
        0.0
    };
    let current_roi = if record.spend_period2 > 0.0 {
        record.sales_period2 / record.spend_period2
    } else {
        0.0
    };
    let efficiency_score =
        CURRENT_ROI_WEIGHT * current_roi + INCREMENTAL_ROI_WEIGHT * incremental_roi_score;

    ScoredRecord {
        record: record.clone(),
        incremental_sales,
        incremental_spend,
        incremental_roi_score,
        original_incremental_roi,
        current_roi,
        efficiency_score,
        is_efficiency_winner: incremental_sales > 0.0 && incremental_spend <= 0.0,
    }
}

pub fn score_all(records: &[MergedRecord]) -> Vec<ScoredRecord> {
    records.iter().map(score).collect()
}
