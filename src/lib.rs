//! Period-over-period budget reallocation for quick-commerce ad campaigns.
//!
//! Two period extracts are merged per entity, scored on current and
//! incremental ROI, ranked, and a fixed budget is handed out greedily in
//! rank order:
//!
//! ```text
//! merge -> score -> rank -> allocate
//! ```
//!
//! The four stages are pure and infallible. Reading files, exporting and
//! rounding for display live in [`loader`], [`output`] and [`reports`].

pub mod allocator;
pub mod error;
pub mod loader;
pub mod merger;
pub mod output;
pub mod ranker;
pub mod reports;
pub mod scorer;
pub mod types;
pub mod util;

pub use allocator::{allocate, tier_for, AllocationTier};
pub use error::{AppError, AppResult};
pub use merger::{merge, merge_typed};
pub use ranker::rank;
pub use scorer::{score, score_all};
pub use types::{
    Allocation, AllocationResult, CellValue, JoinPolicy, MergeConfig, MergedRecord, PeriodRow,
    Platform, PlatformRow, RankedRecord, RawPeriodRow, SalesFields, ScoredRecord, TieBreak,
};

/// Run the whole pipeline over column-mapped rows.
pub fn analyze(
    period1: &[RawPeriodRow],
    period2: &[RawPeriodRow],
    config: &MergeConfig,
    total_budget: f64,
    tie_break: TieBreak,
) -> Vec<AllocationResult> {
    let merged = merge(period1, period2, config);
    allocate(rank(score_all(&merged), tie_break), total_budget)
}

/// Run the whole pipeline over typed platform rows.
pub fn analyze_typed<R: PeriodRow>(
    period1: &[R],
    period2: &[R],
    join: JoinPolicy,
    total_budget: f64,
    tie_break: TieBreak,
) -> Vec<AllocationResult> {
    let merged = merge_typed(period1, period2, join);
    allocate(rank(score_all(&merged), tie_break), total_budget)
}
