//! # Forecast Math
//!
//! Numeric building blocks for day-ahead electricity price forecasting.
//! This crate provides the error metrics used to score hourly forecasts,
//! the variance-stabilising transformation applied to prices before fitting,
//! and an L1-regularised linear regression solver.

use thiserror::Error;

pub mod lasso;
pub mod metrics;
pub mod scaling;

/// Errors that can occur in forecasting calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;

pub use lasso::{LassoFit, LassoSettings};
pub use metrics::{mae, mape, rmae, rmse, smape, Seasonality};
pub use scaling::AsinhMedianScaler;
