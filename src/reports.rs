use crate::allocator::{tier_for, AllocationTier};
use crate::types::{AllocationResult, MergeConfig, PeriodRow, RawPeriodRow};
use crate::util::{average, ratio_or_zero, round2};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tabled::Tabled;

const TOP_PERFORMERS: usize = 5;

/// One exported line per entity. All rounding to two decimals happens when
/// these rows are built; the engine itself keeps full precision.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ResultRow {
    #[serde(rename = "Campaign Name")]
    #[tabled(rename = "Campaign Name")]
    pub entity_name: String,
    #[serde(rename = "Total Sales - Period 1")]
    #[tabled(skip)]
    pub sales_period1: f64,
    #[serde(rename = "Total Spend - Period 1")]
    #[tabled(skip)]
    pub spend_period1: f64,
    #[serde(rename = "Total Sales - Period 2")]
    #[tabled(rename = "Sales P2")]
    pub sales_period2: f64,
    #[serde(rename = "Total Spend - Period 2")]
    #[tabled(rename = "Spend P2")]
    pub spend_period2: f64,
    #[serde(rename = "Incremental_Sales")]
    #[tabled(rename = "Incr. Sales")]
    pub incremental_sales: f64,
    #[serde(rename = "Incremental_Spend")]
    #[tabled(rename = "Incr. Spend")]
    pub incremental_spend: f64,
    #[serde(rename = "Original_Incremental_ROI")]
    #[tabled(skip)]
    pub original_incremental_roi: f64,
    #[serde(rename = "Incremental_ROI_Score")]
    #[tabled(skip)]
    pub incremental_roi_score: f64,
    #[serde(rename = "Current_ROI")]
    #[tabled(rename = "ROI")]
    pub current_roi: f64,
    #[serde(rename = "Efficiency_Score")]
    #[tabled(skip)]
    pub efficiency_score: f64,
    #[serde(rename = "Ranking_Score")]
    #[tabled(rename = "Score")]
    pub ranking_score: f64,
    #[serde(rename = "New_Budget_Allocation")]
    #[tabled(rename = "Allocation")]
    pub new_budget_allocation: f64,
    #[serde(rename = "Budget_Multiplier")]
    #[tabled(rename = "Multiplier")]
    pub budget_multiplier: f64,
    #[serde(rename = "Projected_Sales_Increase")]
    #[tabled(skip)]
    pub projected_sales_increase: f64,
    #[serde(rename = "Projected_New_Sales")]
    #[tabled(rename = "Projected Sales")]
    pub projected_new_sales: f64,
    #[serde(rename = "Projected_ROI")]
    #[tabled(rename = "Projected ROI")]
    pub projected_roi: f64,
    #[serde(rename = "isEfficiencyWinner")]
    #[tabled(rename = "Winner")]
    pub is_efficiency_winner: bool,
}

impl From<&AllocationResult> for ResultRow {
    fn from(r: &AllocationResult) -> Self {
        let s = &r.scored;
        let m = &s.record;
        let a = &r.allocation;
        ResultRow {
            entity_name: m.entity_name.clone(),
            sales_period1: round2(m.sales_period1),
            spend_period1: round2(m.spend_period1),
            sales_period2: round2(m.sales_period2),
            spend_period2: round2(m.spend_period2),
            incremental_sales: round2(s.incremental_sales),
            incremental_spend: round2(s.incremental_spend),
            original_incremental_roi: round2(s.original_incremental_roi),
            incremental_roi_score: round2(s.incremental_roi_score),
            current_roi: round2(s.current_roi),
            efficiency_score: round2(s.efficiency_score),
            ranking_score: round2(r.ranking_score),
            new_budget_allocation: round2(a.new_budget_allocation),
            budget_multiplier: round2(a.budget_multiplier),
            projected_sales_increase: round2(a.projected_sales_increase),
            projected_new_sales: round2(a.projected_new_sales),
            projected_roi: round2(a.projected_roi),
            is_efficiency_winner: s.is_efficiency_winner,
        }
    }
}

/// Headline figures for a single period file, before any merging.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PeriodOverview {
    pub entities: usize,
    pub total_sales: f64,
}

fn overview<'a>(entries: impl Iterator<Item = (&'a str, f64)>) -> PeriodOverview {
    let mut keys = HashSet::new();
    let mut total_sales = 0.0;
    for (key, sales) in entries {
        keys.insert(key);
        total_sales += sales;
    }
    PeriodOverview {
        entities: keys.len(),
        total_sales,
    }
}

pub fn generate_period_overview<R: PeriodRow>(rows: &[R]) -> PeriodOverview {
    overview(rows.iter().map(|r| (r.entity_key(), r.sales())))
}

/// Same as [`generate_period_overview`] for rows read with a custom mapping.
pub fn generate_raw_period_overview(
    rows: &[RawPeriodRow],
    config: &MergeConfig,
) -> PeriodOverview {
    let keyed: Vec<(String, f64)> = rows
        .iter()
        .map(|r| {
            (
                r.text(&config.entity_key_field),
                config.sales_fields.resolve(r),
            )
        })
        .collect();
    overview(keyed.iter().map(|(k, s)| (k.as_str(), *s)))
}

pub fn generate_result_rows(results: &[AllocationResult]) -> Vec<ResultRow> {
    results.iter().map(ResultRow::from).collect()
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ExecutiveSummary {
    pub generated_on: NaiveDate,
    pub total_budget: f64,
    pub total_entities: usize,
    pub funded_entities: usize,
    pub funding_rate_pct: f64,
    pub efficiency_winners: usize,
    pub efficiency_winners_funded: usize,
    pub total_allocated: f64,
    pub budget_utilization_pct: f64,
    pub remaining_budget: f64,
    pub expected_sales_increase: f64,
    pub portfolio_roi: f64,
    pub avg_multiplier: f64,
    pub top_performers: Vec<String>,
}

/// Portfolio-level figures over one allocation run.
pub fn generate_summary(
    results: &[AllocationResult],
    total_budget: f64,
    generated_on: NaiveDate,
) -> ExecutiveSummary {
    let funded: Vec<&AllocationResult> = results.iter().filter(|r| r.is_funded()).collect();
    let winners: Vec<&AllocationResult> = results
        .iter()
        .filter(|r| r.scored.is_efficiency_winner)
        .collect();

    let total_allocated: f64 = funded
        .iter()
        .map(|r| r.allocation.new_budget_allocation)
        .sum();
    let expected_sales_increase: f64 = funded
        .iter()
        .map(|r| r.allocation.projected_sales_increase)
        .sum();
    let multipliers: Vec<f64> = funded
        .iter()
        .map(|r| r.allocation.budget_multiplier)
        .collect();

    ExecutiveSummary {
        generated_on,
        total_budget: round2(total_budget),
        total_entities: results.len(),
        funded_entities: funded.len(),
        funding_rate_pct: round2(
            ratio_or_zero(funded.len() as f64, results.len() as f64) * 100.0,
        ),
        efficiency_winners: winners.len(),
        efficiency_winners_funded: winners.iter().filter(|r| r.is_funded()).count(),
        total_allocated: round2(total_allocated),
        budget_utilization_pct: round2(ratio_or_zero(total_allocated, total_budget) * 100.0),
        remaining_budget: round2((total_budget - total_allocated).max(0.0)),
        expected_sales_increase: round2(expected_sales_increase),
        portfolio_roi: round2(ratio_or_zero(expected_sales_increase, total_allocated)),
        avg_multiplier: round2(average(&multipliers)),
        top_performers: funded
            .iter()
            .take(TOP_PERFORMERS)
            .map(|r| r.entity_name().to_string())
            .collect(),
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TierRow {
    #[serde(rename = "Tier")]
    #[tabled(rename = "Tier")]
    pub tier: String,
    #[serde(rename = "Entities")]
    #[tabled(rename = "Entities")]
    pub entities: usize,
    #[serde(rename = "Allocated")]
    #[tabled(rename = "Allocated")]
    pub allocated: f64,
}

/// Funded entities and budget per allocation tier, strongest tier first.
pub fn generate_tier_breakdown(results: &[AllocationResult]) -> Vec<TierRow> {
    let mut by_tier: BTreeMap<AllocationTier, (usize, f64)> = BTreeMap::new();
    for r in results.iter().filter(|r| r.is_funded()) {
        let e = by_tier.entry(tier_for(r)).or_insert((0, 0.0));
        e.0 += 1;
        e.1 += r.allocation.new_budget_allocation;
    }
    by_tier
        .into_iter()
        .map(|(tier, (entities, allocated))| TierRow {
            tier: tier.to_string(),
            entities,
            allocated: round2(allocated),
        })
        .collect()
}
