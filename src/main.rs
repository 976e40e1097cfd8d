// Command-line host for the reallocation engine.
//
// Loads the two period extracts, runs merge -> score -> rank -> allocate,
// prints markdown previews and writes the full result table to CSV.
use anyhow::Context;
use budget_realloc::loader::{self, LoadReport};
use budget_realloc::reports::PeriodOverview;
use budget_realloc::util::{format_int, format_number};
use budget_realloc::{
    analyze, analyze_typed, error::validate_budget, output, reports, AllocationResult, AppError,
    AppResult, JoinPolicy, MergeConfig, Platform, SalesFields, TieBreak,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Rank campaigns on period-over-period performance and reallocate a budget
#[derive(Parser, Debug)]
#[command(name = "budget_realloc")]
struct Args {
    /// Period 1 (baseline) extract
    #[arg(long)]
    period1: PathBuf,

    /// Period 2 (current) extract
    #[arg(long)]
    period2: PathBuf,

    /// Total budget to distribute, in the spend columns' unit
    #[arg(long)]
    budget: f64,

    /// Platform export layout (blinkit, zepto, instamart)
    #[arg(long, conflicts_with_all = ["key_field", "sales_field", "spend_field"])]
    platform: Option<Platform>,

    /// Custom mapping: entity key column
    #[arg(long)]
    key_field: Option<String>,

    /// Custom mapping: sales column, repeat to sum several
    #[arg(long)]
    sales_field: Vec<String>,

    /// Custom mapping: spend column
    #[arg(long)]
    spend_field: Option<String>,

    /// inner keeps entities seen in both periods; right-zero-fill keeps every period 2 entity
    #[arg(long, default_value = "inner")]
    join: JoinPolicy,

    /// full breaks score ties on incremental sales then ROI; score-only keeps input order
    #[arg(long, default_value = "full")]
    tie_break: TieBreak,

    /// Result CSV (defaults to budget_analysis_<date>.csv)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write the executive summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Rows shown in the console preview
    #[arg(long, default_value = "10")]
    preview: usize,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_load(label: &str, path: &Path, report: &LoadReport) {
    println!(
        "{}: {} rows loaded from {}",
        label,
        format_int(report.loaded_rows as i64),
        path.display()
    );
    if report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            format_int(report.parse_errors as i64)
        );
    }
}

fn print_overview(overview: &PeriodOverview) {
    println!(
        "Period 2: {} campaigns, current total sales {}",
        format_int(overview.entities as i64),
        format_number(overview.total_sales, 2)
    );
}

fn custom_mapping(args: &Args) -> AppResult<MergeConfig> {
    match (&args.key_field, &args.spend_field) {
        (Some(key), Some(spend)) if !args.sales_field.is_empty() => Ok(MergeConfig::new(
            key,
            SalesFields::from(args.sales_field.clone()),
            spend,
        )
        .with_join(args.join)),
        _ => Err(AppError::MissingMapping),
    }
}

fn run_analysis(args: &Args, budget: f64) -> anyhow::Result<Vec<AllocationResult>> {
    if let Some(platform) = args.platform {
        println!("Platform: {}", platform);
        let (p1, r1) = loader::load_platform_rows(&args.period1, platform)
            .with_context(|| format!("reading {}", args.period1.display()))?;
        let (p2, r2) = loader::load_platform_rows(&args.period2, platform)
            .with_context(|| format!("reading {}", args.period2.display()))?;
        print_load("Period 1", &args.period1, &r1);
        print_load("Period 2", &args.period2, &r2);
        print_overview(&reports::generate_period_overview(&p2));
        return Ok(analyze_typed(&p1, &p2, args.join, budget, args.tie_break));
    }

    let config = custom_mapping(args)?;
    let numeric = config.numeric_columns();
    let required = config.required_columns();
    let (p1, r1) = loader::load_raw_rows(&args.period1, &numeric, &required)
        .with_context(|| format!("reading {}", args.period1.display()))?;
    let (p2, r2) = loader::load_raw_rows(&args.period2, &numeric, &required)
        .with_context(|| format!("reading {}", args.period2.display()))?;
    print_load("Period 1", &args.period1, &r1);
    print_load("Period 2", &args.period2, &r2);
    print_overview(&reports::generate_raw_period_overview(&p2, &config));
    Ok(analyze(&p1, &p2, &config, budget, args.tie_break))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let budget = validate_budget(args.budget)?;
    let results = run_analysis(&args, budget)?;
    println!();

    let today = chrono::Local::now().date_naive();
    let rows = reports::generate_result_rows(&results);
    output::preview_table(
        "Budget Allocation Results",
        Some("Ranked by score, highest first"),
        &rows,
        args.preview,
    );
    output::preview_table(
        "Allocation by Tier",
        None,
        &reports::generate_tier_breakdown(&results),
        usize::MAX,
    );

    let summary = reports::generate_summary(&results, budget, today);
    println!("Executive Summary:");
    println!(
        "{} of {} entities funded ({}%), {} efficiency winners ({} funded)",
        summary.funded_entities,
        summary.total_entities,
        format_number(summary.funding_rate_pct, 1),
        summary.efficiency_winners,
        summary.efficiency_winners_funded
    );
    println!(
        "Allocated {} of {} ({}% utilization), expected sales increase {}, portfolio ROI {}x\n",
        format_number(summary.total_allocated, 2),
        format_number(budget, 2),
        format_number(summary.budget_utilization_pct, 1),
        format_number(summary.expected_sales_increase, 2),
        format_number(summary.portfolio_roi, 2)
    );

    let out_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(output::default_export_name(today)));
    output::write_csv(&out_path, &rows)
        .with_context(|| format!("writing {}", out_path.display()))?;
    println!("(Full table exported to {})", out_path.display());

    if let Some(path) = &args.summary_json {
        output::write_json(path, &summary)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("(Summary written to {})", path.display());
    }
    Ok(())
}
