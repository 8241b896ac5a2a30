//! Error types for input loading and run configuration.

use thiserror::Error;

/// Rejected run configuration. Checked once at the boundary, before any trial.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("trial count must be >= 1, got {0}")]
    InvalidTrialCount(usize),
    #[error("{name} must be a percentage in [0, 100], got {value}")]
    PercentOutOfRange { name: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("judgment compares item {item} with itself")]
    SelfComparison { item: String },
}

pub(crate) fn check_percent(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::PercentOutOfRange { name, value })
    }
}
