use crate::error::AppError;
use crate::util::parse_f64_safe;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A single parsed cell as handed over by the tabular file reader.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Numeric view of the cell. Text is parsed forgivingly; anything that
    /// is not a number counts as zero.
    pub fn as_f64(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => parse_f64_safe(Some(s)).unwrap_or(0.0),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// One row of one period's extract: column name to cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPeriodRow {
    cells: HashMap<String, CellValue>,
}

impl RawPeriodRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<CellValue>) {
        self.cells.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Missing columns read as zero.
    pub fn number(&self, column: &str) -> f64 {
        self.get(column).map(CellValue::as_f64).unwrap_or(0.0)
    }

    /// Missing columns read as the empty string.
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(CellValue::as_text).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for RawPeriodRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RawPeriodRow {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Columns that make up an entity's sales figure.
#[derive(Debug, Clone, PartialEq)]
pub enum SalesFields {
    Single(String),
    Many(Vec<String>),
}

impl SalesFields {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            SalesFields::Single(c) => vec![c.as_str()],
            SalesFields::Many(cs) => cs.iter().map(String::as_str).collect(),
        }
    }

    /// Sum of every configured sales column in the row.
    pub fn resolve(&self, row: &RawPeriodRow) -> f64 {
        self.columns().into_iter().map(|c| row.number(c)).sum()
    }
}

impl From<&str> for SalesFields {
    fn from(s: &str) -> Self {
        SalesFields::Single(s.to_string())
    }
}

impl From<Vec<String>> for SalesFields {
    fn from(mut v: Vec<String>) -> Self {
        if v.len() == 1 {
            SalesFields::Single(v.remove(0))
        } else {
            SalesFields::Many(v)
        }
    }
}

/// How the two period aggregates are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    /// Only entities present in both periods.
    #[default]
    Inner,
    /// Every period-2 entity; a missing period-1 baseline counts as zero.
    RightZeroFill,
}

impl FromStr for JoinPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinPolicy::Inner),
            "right-zero-fill" | "right" | "zero-fill" => Ok(JoinPolicy::RightZeroFill),
            _ => Err(AppError::UnknownOption {
                kind: "join policy",
                value: s.to_string(),
            }),
        }
    }
}

/// Secondary ordering used when ranking scores are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Incremental sales, then current ROI, both descending.
    #[default]
    Full,
    /// Ranking score only; equal scores keep input order.
    ScoreOnly,
}

impl FromStr for TieBreak {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(TieBreak::Full),
            "score-only" | "score" => Ok(TieBreak::ScoreOnly),
            _ => Err(AppError::UnknownOption {
                kind: "tie-break",
                value: s.to_string(),
            }),
        }
    }
}

/// Field mapping and join policy handed to the merger.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    pub entity_key_field: String,
    pub sales_fields: SalesFields,
    pub spend_field: String,
    pub join: JoinPolicy,
}

impl MergeConfig {
    pub fn new(
        entity_key_field: &str,
        sales_fields: impl Into<SalesFields>,
        spend_field: &str,
    ) -> Self {
        Self {
            entity_key_field: entity_key_field.to_string(),
            sales_fields: sales_fields.into(),
            spend_field: spend_field.to_string(),
            join: JoinPolicy::default(),
        }
    }

    pub fn with_join(mut self, join: JoinPolicy) -> Self {
        self.join = join;
        self
    }

    /// Every column the loader must coerce to a number.
    pub fn numeric_columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = self
            .sales_fields
            .columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        cols.push(self.spend_field.clone());
        cols
    }

    /// Every column a period file must carry for this mapping.
    pub fn required_columns(&self) -> Vec<String> {
        let mut cols = vec![self.entity_key_field.clone()];
        cols.extend(self.numeric_columns());
        cols
    }
}

/// Ad platforms with a known export layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Blinkit,
    Zepto,
    Instamart,
}

impl Platform {
    pub fn merge_config(self) -> MergeConfig {
        match self {
            Platform::Blinkit => MergeConfig::new(
                "Campaign Name",
                SalesFields::Many(vec!["Direct Sales".into(), "Indirect Sales".into()]),
                "Estimated Budget Consumed",
            ),
            Platform::Zepto => MergeConfig::new("CampaignName", "Revenue", "Spend"),
            Platform::Instamart => {
                MergeConfig::new("CAMPAIGN_NAME", "TOTAL_GMV", "TOTAL_BUDGET_BURNT")
            }
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Blinkit => "Blinkit",
            Platform::Zepto => "Zepto",
            Platform::Instamart => "Instamart",
        };
        f.write_str(name)
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blinkit" => Ok(Platform::Blinkit),
            "zepto" => Ok(Platform::Zepto),
            "instamart" => Ok(Platform::Instamart),
            _ => Err(AppError::UnknownOption {
                kind: "platform",
                value: s.to_string(),
            }),
        }
    }
}

/// Anything the merger can aggregate: a keyed sales/spend pair.
pub trait PeriodRow {
    fn entity_key(&self) -> &str;
    fn sales(&self) -> f64;
    fn spend(&self) -> f64;
}

fn amount(v: &Option<String>) -> f64 {
    parse_f64_safe(v.as_deref()).unwrap_or(0.0)
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlinkitRow {
    #[serde(rename = "Campaign Name")]
    pub campaign_name: Option<String>,
    #[serde(rename = "Direct Sales")]
    pub direct_sales: Option<String>,
    #[serde(rename = "Indirect Sales")]
    pub indirect_sales: Option<String>,
    #[serde(rename = "Estimated Budget Consumed")]
    pub estimated_budget_consumed: Option<String>,
}

impl PeriodRow for BlinkitRow {
    fn entity_key(&self) -> &str {
        self.campaign_name.as_deref().unwrap_or("")
    }

    fn sales(&self) -> f64 {
        amount(&self.direct_sales) + amount(&self.indirect_sales)
    }

    fn spend(&self) -> f64 {
        amount(&self.estimated_budget_consumed)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZeptoRow {
    #[serde(rename = "CampaignName")]
    pub campaign_name: Option<String>,
    #[serde(rename = "Revenue")]
    pub revenue: Option<String>,
    #[serde(rename = "Spend")]
    pub spend: Option<String>,
}

impl PeriodRow for ZeptoRow {
    fn entity_key(&self) -> &str {
        self.campaign_name.as_deref().unwrap_or("")
    }

    fn sales(&self) -> f64 {
        amount(&self.revenue)
    }

    fn spend(&self) -> f64 {
        amount(&self.spend)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstamartRow {
    #[serde(rename = "CAMPAIGN_NAME")]
    pub campaign_name: Option<String>,
    #[serde(rename = "TOTAL_GMV")]
    pub total_gmv: Option<String>,
    #[serde(rename = "TOTAL_BUDGET_BURNT")]
    pub total_budget_burnt: Option<String>,
}

impl PeriodRow for InstamartRow {
    fn entity_key(&self) -> &str {
        self.campaign_name.as_deref().unwrap_or("")
    }

    fn sales(&self) -> f64 {
        amount(&self.total_gmv)
    }

    fn spend(&self) -> f64 {
        amount(&self.total_budget_burnt)
    }
}

/// A typed row from any supported platform.
#[derive(Debug, Clone)]
pub enum PlatformRow {
    Blinkit(BlinkitRow),
    Zepto(ZeptoRow),
    Instamart(InstamartRow),
}

impl PeriodRow for PlatformRow {
    fn entity_key(&self) -> &str {
        match self {
            PlatformRow::Blinkit(r) => r.entity_key(),
            PlatformRow::Zepto(r) => r.entity_key(),
            PlatformRow::Instamart(r) => r.entity_key(),
        }
    }

    fn sales(&self) -> f64 {
        match self {
            PlatformRow::Blinkit(r) => r.sales(),
            PlatformRow::Zepto(r) => r.sales(),
            PlatformRow::Instamart(r) => r.sales(),
        }
    }

    fn spend(&self) -> f64 {
        match self {
            PlatformRow::Blinkit(r) => PeriodRow::spend(r),
            PlatformRow::Zepto(r) => PeriodRow::spend(r),
            PlatformRow::Instamart(r) => PeriodRow::spend(r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub entity_name: String,
    pub sales_period1: f64,
    pub spend_period1: f64,
    pub sales_period2: f64,
    pub spend_period2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub record: MergedRecord,
    pub incremental_sales: f64,
    pub incremental_spend: f64,
    pub incremental_roi_score: f64,
    /// Raw period-over-period ratio. Display only, never ranked on.
    pub original_incremental_roi: f64,
    pub current_roi: f64,
    pub efficiency_score: f64,
    pub is_efficiency_winner: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub new_budget_allocation: f64,
    pub budget_multiplier: f64,
    pub projected_sales_increase: f64,
    pub projected_new_sales: f64,
    pub projected_roi: f64,
}

impl Allocation {
    /// Values carried by an entity that received no budget.
    pub fn unfunded(sales_period2: f64) -> Self {
        Self {
            new_budget_allocation: 0.0,
            budget_multiplier: 1.0,
            projected_sales_increase: 0.0,
            projected_new_sales: sales_period2,
            projected_roi: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecord {
    pub scored: ScoredRecord,
    pub ranking_score: f64,
    pub allocation: Allocation,
}

impl RankedRecord {
    pub fn entity_name(&self) -> &str {
        &self.scored.record.entity_name
    }

    /// Period-2 spend, the base every allocation tier multiplies.
    pub fn current_spend(&self) -> f64 {
        self.scored.record.spend_period2
    }

    pub fn is_funded(&self) -> bool {
        self.allocation.new_budget_allocation > 0.0
    }
}

/// A ranked record after the allocation pass.
pub type AllocationResult = RankedRecord;
