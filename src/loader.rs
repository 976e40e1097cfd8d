use crate::error::{AppError, AppResult};
use crate::types::{
    BlinkitRow, CellValue, InstamartRow, Platform, PlatformRow, RawPeriodRow, ZeptoRow,
};
use crate::util::parse_f64_safe;
use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

fn open(path: &Path) -> AppResult<csv::Reader<std::fs::File>> {
    Ok(ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?)
}

fn check_columns(headers: &StringRecord, required: &[String], path: &Path) -> AppResult<()> {
    for col in required {
        if !headers.iter().any(|h| h == col) {
            return Err(AppError::MissingColumn {
                column: col.clone(),
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}

/// Read a period file into column-mapped rows.
///
/// Columns listed in `numeric_columns` are coerced to numbers (anything
/// unparsable becomes 0); every other column is kept as trimmed text.
pub fn load_raw_rows(
    path: impl AsRef<Path>,
    numeric_columns: &[String],
    required_columns: &[String],
) -> AppResult<(Vec<RawPeriodRow>, LoadReport)> {
    let path = path.as_ref();
    let mut rdr = open(path)?;
    let headers = rdr.headers()?.clone();
    check_columns(&headers, required_columns, path)?;

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut rows = Vec::new();
    for result in rdr.records() {
        total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable row");
                parse_errors += 1;
                continue;
            }
        };
        let row: RawPeriodRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| {
                let cell = if numeric_columns.iter().any(|c| c == h) {
                    CellValue::Number(parse_f64_safe(Some(v)).unwrap_or(0.0))
                } else {
                    CellValue::Text(v.trim().to_string())
                };
                (h, cell)
            })
            .collect();
        rows.push(row);
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: rows.len(),
        parse_errors,
    };
    info!(path = %path.display(), rows = report.loaded_rows, "loaded period file");
    Ok((rows, report))
}

fn load_typed<T, F>(
    path: &Path,
    platform: Platform,
    wrap: F,
) -> AppResult<(Vec<PlatformRow>, LoadReport)>
where
    T: DeserializeOwned,
    F: Fn(T) -> PlatformRow,
{
    let mut rdr = open(path)?;
    let headers = rdr.headers()?.clone();
    check_columns(&headers, &platform.merge_config().required_columns(), path)?;

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut rows = Vec::new();
    for result in rdr.deserialize::<T>() {
        total_rows += 1;
        match result {
            Ok(r) => rows.push(wrap(r)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable row");
                parse_errors += 1;
            }
        }
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: rows.len(),
        parse_errors,
    };
    info!(path = %path.display(), %platform, rows = report.loaded_rows, "loaded period file");
    Ok((rows, report))
}

/// Read a period file in a platform's native export layout.
pub fn load_platform_rows(
    path: impl AsRef<Path>,
    platform: Platform,
) -> AppResult<(Vec<PlatformRow>, LoadReport)> {
    let path = path.as_ref();
    match platform {
        Platform::Blinkit => load_typed::<BlinkitRow, _>(path, platform, PlatformRow::Blinkit),
        Platform::Zepto => load_typed::<ZeptoRow, _>(path, platform, PlatformRow::Zepto),
        Platform::Instamart => {
            load_typed::<InstamartRow, _>(path, platform, PlatformRow::Instamart)
        }
    }
}
