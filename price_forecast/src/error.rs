//! Error types for the price_forecast crate

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the price_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data loading or content
    #[error("Data error: {0}")]
    DataError(String),

    /// Train/test split is not whole-day aligned, gap-free, ordered and contiguous
    #[error("Data alignment error: {0}")]
    DataAlignment(String),

    /// The model failed or returned a malformed forecast for a test day
    #[error("Model invocation error on {day} (test day #{position}): {message}")]
    ModelInvocation {
        day: NaiveDate,
        position: usize,
        message: String,
    },

    /// Metric inputs were non-finite or mismatched in shape
    #[error("Metric computation error: {0}")]
    MetricComputation(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from parsing dates or numbers
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from CSV output
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from JSON (de)serialisation
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Error from the numeric routines
    #[error("Math error: {0}")]
    MathError(#[from] forecast_math::MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<chrono::ParseError> for ForecastError {
    fn from(err: chrono::ParseError) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}
