use crate::types::{JoinPolicy, MergeConfig, MergedRecord, PeriodRow, RawPeriodRow};
use std::collections::HashMap;
use tracing::debug;

/// Per-period totals keyed by entity, remembering first-seen order.
#[derive(Debug, Default)]
struct PeriodTotals {
    order: Vec<String>,
    totals: HashMap<String, (f64, f64)>,
}

impl PeriodTotals {
    fn add(&mut self, key: &str, sales: f64, spend: f64) {
        if !self.totals.contains_key(key) {
            self.order.push(key.to_string());
        }
        let e = self.totals.entry(key.to_string()).or_insert((0.0, 0.0));
        e.0 += sales;
        e.1 += spend;
    }

    fn get(&self, key: &str) -> Option<(f64, f64)> {
        self.totals.get(key).copied()
    }
}

fn aggregate<I>(entries: I) -> PeriodTotals
where
    I: IntoIterator<Item = (String, f64, f64)>,
{
    let mut acc = PeriodTotals::default();
    for (key, sales, spend) in entries {
        acc.add(&key, sales, spend);
    }
    acc
}

fn join(p1: PeriodTotals, p2: PeriodTotals, policy: JoinPolicy) -> Vec<MergedRecord> {
    let mut out = Vec::with_capacity(p2.order.len());
    let mut dropped = 0usize;
    for key in &p2.order {
        let (sales_period2, spend_period2) = p2.get(key).unwrap_or((0.0, 0.0));
        let (sales_period1, spend_period1) = match (p1.get(key), policy) {
            (Some(base), _) => base,
            (None, JoinPolicy::RightZeroFill) => (0.0, 0.0),
            (None, JoinPolicy::Inner) => {
                dropped += 1;
                continue;
            }
        };
        out.push(MergedRecord {
            entity_name: key.clone(),
            sales_period1,
            spend_period1,
            sales_period2,
            spend_period2,
        });
    }
    debug!(
        period1_entities = p1.order.len(),
        period2_entities = p2.order.len(),
        merged = out.len(),
        dropped,
        ?policy,
        "merged period extracts"
    );
    out
}

/// Merge two period extracts column-mapped by `config`.
///
/// Rows sharing a key are summed within their period before the join.
/// Output follows first-occurrence order of period 2; `config.join`
/// decides whether period-2-only entities survive with a zero baseline.
pub fn merge(
    period1: &[RawPeriodRow],
    period2: &[RawPeriodRow],
    config: &MergeConfig,
) -> Vec<MergedRecord> {
    let resolve = |row: &RawPeriodRow| {
        (
            row.text(&config.entity_key_field),
            config.sales_fields.resolve(row),
            row.number(&config.spend_field),
        )
    };
    let p1 = aggregate(period1.iter().map(resolve));
    let p2 = aggregate(period2.iter().map(resolve));
    join(p1, p2, config.join)
}

/// Merge typed platform rows. Same aggregation and join as [`merge`].
pub fn merge_typed<R: PeriodRow>(
    period1: &[R],
    period2: &[R],
    policy: JoinPolicy,
) -> Vec<MergedRecord> {
    let entry = |row: &R| (row.entity_key().to_string(), row.sales(), row.spend());
    let p1 = aggregate(period1.iter().map(entry));
    let p2 = aggregate(period2.iter().map(entry));
    join(p1, p2, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Platform, SalesFields, ZeptoRow};

    fn zepto(name: &str, revenue: f64, spend: f64) -> RawPeriodRow {
        RawPeriodRow::new()
            .with("CampaignName", name)
            .with("Revenue", revenue)
            .with("Spend", spend)
    }

    #[test]
    fn sums_duplicate_rows_within_a_period() {
        let cfg = Platform::Zepto.merge_config();
        let p1 = vec![zepto("A", 10.0, 2.0), zepto("A", 5.5, 1.0)];
        let p2 = vec![zepto("A", 7.0, 3.0), zepto("A", 1.0, 0.5), zepto("A", 2.0, 0.0)];
        let merged = merge(&p1, &p2, &cfg);
        assert_eq!(merged.len(), 1);
        let a = &merged[0];
        assert_eq!(a.entity_name, "A");
        assert_eq!(a.sales_period1, 15.5);
        assert_eq!(a.spend_period1, 3.0);
        assert_eq!(a.sales_period2, 10.0);
        assert_eq!(a.spend_period2, 3.5);
    }

    #[test]
    fn sums_every_listed_sales_column() {
        let cfg = Platform::Blinkit.merge_config();
        let row = |direct: f64, indirect: f64| {
            RawPeriodRow::new()
                .with("Campaign Name", "Search")
                .with("Direct Sales", direct)
                .with("Indirect Sales", indirect)
                .with("Estimated Budget Consumed", 4.0)
        };
        let merged = merge(&[row(1.0, 2.0)], &[row(3.0, 4.0), row(0.5, 0.5)], &cfg);
        assert_eq!(merged[0].sales_period1, 3.0);
        assert_eq!(merged[0].sales_period2, 8.0);
        assert_eq!(merged[0].spend_period2, 8.0);
    }

    #[test]
    fn inner_join_drops_period2_only_entities() {
        let cfg = Platform::Zepto.merge_config();
        let p1 = vec![zepto("A", 1.0, 1.0)];
        let p2 = vec![zepto("New", 9.0, 3.0), zepto("A", 2.0, 1.0)];
        let merged = merge(&p1, &p2, &cfg);
        let names: Vec<_> = merged.iter().map(|m| m.entity_name.as_str()).collect();
        assert_eq!(names, vec!["A"]);
    }

    #[test]
    fn zero_fill_keeps_period2_only_entities() {
        let cfg = Platform::Zepto
            .merge_config()
            .with_join(JoinPolicy::RightZeroFill);
        let p1 = vec![zepto("A", 1.0, 1.0), zepto("Gone", 5.0, 5.0)];
        let p2 = vec![zepto("New", 9.0, 3.0), zepto("A", 2.0, 1.0)];
        let merged = merge(&p1, &p2, &cfg);
        let names: Vec<_> = merged.iter().map(|m| m.entity_name.as_str()).collect();
        assert_eq!(names, vec!["New", "A"]);
        assert_eq!(merged[0].sales_period1, 0.0);
        assert_eq!(merged[0].spend_period1, 0.0);
        assert_eq!(merged[0].sales_period2, 9.0);
    }

    #[test]
    fn missing_and_text_cells_coerce_to_zero() {
        let cfg = MergeConfig::new("Name", SalesFields::Single("Sales".into()), "Cost");
        let p1 = vec![RawPeriodRow::new().with("Name", "X").with("Sales", "n/a")];
        let p2 = vec![RawPeriodRow::new()
            .with("Name", "X")
            .with("Sales", "1,200")
            .with("Cost", "")];
        let merged = merge(&p1, &p2, &cfg);
        assert_eq!(merged[0].sales_period1, 0.0);
        assert_eq!(merged[0].spend_period1, 0.0);
        assert_eq!(merged[0].sales_period2, 1200.0);
        assert_eq!(merged[0].spend_period2, 0.0);
    }

    #[test]
    fn empty_key_is_a_valid_entity() {
        let cfg = Platform::Zepto.merge_config();
        let keyless = RawPeriodRow::new().with("Revenue", 4.0).with("Spend", 1.0);
        let merged = merge(&[keyless.clone()], &[keyless.clone(), keyless], &cfg);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].entity_name, "");
        assert_eq!(merged[0].sales_period2, 8.0);
    }

    #[test]
    fn typed_rows_merge_like_raw_rows() {
        let typed = |name: &str, revenue: &str, spend: &str| ZeptoRow {
            campaign_name: Some(name.into()),
            revenue: Some(revenue.into()),
            spend: Some(spend.into()),
        };
        let p1 = vec![typed("A", "100", "50")];
        let p2 = vec![typed("A", "100", "20"), typed("A", "50", "20")];
        let merged = merge_typed(&p1, &p2, JoinPolicy::Inner);
        assert_eq!(
            merged,
            merge(
                &[zepto("A", 100.0, 50.0)],
                &[zepto("A", 100.0, 20.0), zepto("A", 50.0, 20.0)],
                &Platform::Zepto.merge_config()
            )
        );
    }
}
