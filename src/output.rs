use crate::error::AppResult;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> AppResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> AppResult<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Export file name used when the caller gives none.
pub fn default_export_name(date: NaiveDate) -> String {
    format!("budget_analysis_{}.csv", date.format("%Y-%m-%d"))
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    match render_table(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::TierRow;
    use tempfile::tempdir;

    fn tiers() -> Vec<TierRow> {
        vec![
            TierRow {
                tier: "Base (1.5x)".into(),
                entities: 2,
                allocated: 90.5,
            },
            TierRow {
                tier: "Seed (flat)".into(),
                entities: 1,
                allocated: 0.05,
            },
        ]
    }

    #[test]
    fn export_name_carries_the_date() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(default_export_name(d), "budget_analysis_2025-03-09.csv");
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiers.csv");
        write_csv(&path, &tiers()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Tier,Entities,Allocated");
        assert_eq!(lines[1], "Base (1.5x),2,90.5");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn json_export_is_readable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiers.json");
        write_json(&path, &tiers()).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v[1]["Allocated"], serde_json::json!(0.05));
    }

    #[test]
    fn table_respects_row_limit() {
        let table = render_table(&tiers(), 1).unwrap();
        assert!(table.contains("Base (1.5x)"));
        assert!(!table.contains("Seed (flat)"));
        assert!(render_table::<TierRow>(&[], 5).is_none());
    }
}
