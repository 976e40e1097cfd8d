use crate::types::{Allocation, AllocationResult, RankedRecord};
use std::fmt;
use tracing::{debug, info};

/// Flat allocation given to entities that spent nothing in period 2.
pub const SEED_ALLOCATION: f64 = 0.05;
/// Floor for the multiplier denominator when spend is zero.
const MIN_SPEND_BASE: f64 = 0.01;

/// The rule that capped an entity's allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AllocationTier {
    Winner,
    High,
    Medium,
    Base,
    Seed,
}

impl AllocationTier {
    /// Cap as a multiple of current spend. `Seed` is flat, not a multiple.
    pub fn spend_multiple(self) -> Option<f64> {
        match self {
            AllocationTier::Winner => Some(3.0),
            AllocationTier::High => Some(2.5),
            AllocationTier::Medium => Some(2.0),
            AllocationTier::Base => Some(1.5),
            AllocationTier::Seed => None,
        }
    }

    pub fn cap(self, current_spend: f64) -> f64 {
        match self.spend_multiple() {
            Some(m) => current_spend * m,
            None => SEED_ALLOCATION,
        }
    }
}

impl fmt::Display for AllocationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AllocationTier::Winner => "Efficiency winner (3x)",
            AllocationTier::High => "High score (2.5x)",
            AllocationTier::Medium => "Medium score (2x)",
            AllocationTier::Base => "Base (1.5x)",
            AllocationTier::Seed => "Seed (flat)",
        };
        f.write_str(label)
    }
}

/// Zero spend wins over every score-based rule.
pub fn tier_for(record: &RankedRecord) -> AllocationTier {
    if record.current_spend() == 0.0 {
        AllocationTier::Seed
    } else if record.scored.is_efficiency_winner {
        AllocationTier::Winner
    } else if record.ranking_score > 0.8 {
        AllocationTier::High
    } else if record.ranking_score > 0.5 {
        AllocationTier::Medium
    } else {
        AllocationTier::Base
    }
}

fn fund(record: &RankedRecord, remaining: f64) -> Allocation {
    let current_spend = record.current_spend();
    // negative spend must not hand budget back
    let new_budget_allocation = tier_for(record)
        .cap(current_spend)
        .min(remaining)
        .max(0.0);
    let budget_multiplier = new_budget_allocation / current_spend.max(MIN_SPEND_BASE);
    let incremental_sales = record.scored.incremental_sales;
    let projected_sales_increase = if budget_multiplier > 1.0 && incremental_sales > 0.0 {
        incremental_sales * (budget_multiplier - 1.0)
    } else {
        0.0
    };
    let projected_new_sales = record.scored.record.sales_period2 + projected_sales_increase;
    let projected_roi = if new_budget_allocation > 0.0 {
        projected_new_sales / new_budget_allocation
    } else {
        0.0
    };
    Allocation {
        new_budget_allocation,
        budget_multiplier,
        projected_sales_increase,
        projected_new_sales,
        projected_roi,
    }
}

/// Greedily hand out `total_budget` in rank order.
///
/// Each entity takes up to its tier cap from what is left; once the budget
/// runs out the remaining entities keep their unfunded values. Every entity
/// is returned, in the order given.
pub fn allocate(ranked: Vec<RankedRecord>, total_budget: f64) -> Vec<AllocationResult> {
    info!(entities = ranked.len(), total_budget, "allocating budget");
    let mut remaining = total_budget;
    let mut funded = 0usize;
    let results: Vec<AllocationResult> = ranked
        .into_iter()
        .map(|mut record| {
            if remaining <= 0.0 {
                return record;
            }
            let allocation = fund(&record, remaining);
            debug!(
                entity = record.entity_name(),
                tier = ?tier_for(&record),
                allocation = allocation.new_budget_allocation,
                "funded entity"
            );
            remaining -= allocation.new_budget_allocation;
            if allocation.new_budget_allocation > 0.0 {
                funded += 1;
            }
            record.allocation = allocation;
            record
        })
        .collect();
    info!(funded, remaining, "budget allocation complete");
    results
}
