//! Errors raised by the file-facing shell around the engine.
//!
//! The merge/score/rank/allocate stages never fail; only reading inputs,
//! writing outputs and validating caller options can.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { column: String, path: String },

    #[error("Invalid budget: {value} (must be a finite amount greater than zero)")]
    InvalidBudget { value: f64 },

    #[error("No field mapping given: pass a platform or the key, sales and spend fields")]
    MissingMapping,

    #[error("Unknown {kind} '{value}'")]
    UnknownOption { kind: &'static str, value: String },
}

pub type AppResult<T> = Result<T, AppError>;

/// Budgets must be positive and finite before the engine sees them.
pub fn validate_budget(value: f64) -> AppResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(AppError::InvalidBudget { value })
    }
}
