//! Point forecast error metrics
//!
//! Every metric takes the predicted and the actual values as flat slices of
//! equal length. Multi-day forecasts are scored by flattening the day/hour
//! matrix row by row before calling these functions.
//!
//! Percentage metrics are returned as fractions; multiply by 100 for display.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Seasonal period of the naive benchmark used by [`rmae`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seasonality {
    /// Same hour of the previous day
    Daily,
    /// Same hour of the same weekday one week earlier
    Weekly,
}

impl Seasonality {
    /// Lag of the naive benchmark in hourly steps
    pub fn lag_hours(&self) -> usize {
        match self {
            Seasonality::Daily => 24,
            Seasonality::Weekly => 24 * 7,
        }
    }
}

fn check_inputs(predicted: &[f64], actual: &[f64]) -> Result<()> {
    if predicted.is_empty() || actual.is_empty() {
        return Err(MathError::InvalidInput(
            "Predicted and actual values must not be empty".to_string(),
        ));
    }

    if predicted.len() != actual.len() {
        return Err(MathError::InvalidInput(format!(
            "Predicted length ({}) doesn't match actual length ({})",
            predicted.len(),
            actual.len()
        )));
    }

    if let Some(pos) = predicted
        .iter()
        .chain(actual.iter())
        .position(|v| !v.is_finite())
    {
        let (side, index) = if pos < predicted.len() {
            ("predicted", pos)
        } else {
            ("actual", pos - predicted.len())
        };
        return Err(MathError::InvalidInput(format!(
            "Non-finite {} value at index {}",
            side, index
        )));
    }

    Ok(())
}

/// Mean absolute error
pub fn mae(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_inputs(predicted, actual)?;

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).abs())
        .sum();

    Ok(sum / predicted.len() as f64)
}

/// Symmetric mean absolute percentage error
///
/// Each point contributes `|p - a| / ((|p| + |a|) / 2)`. A point where both
/// values are zero is a perfect forecast and contributes zero.
pub fn smape(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_inputs(predicted, actual)?;

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(&p, &a)| {
            let denominator = (p.abs() + a.abs()) / 2.0;
            if denominator == 0.0 {
                0.0
            } else {
                (p - a).abs() / denominator
            }
        })
        .sum();

    Ok(sum / predicted.len() as f64)
}

/// Root mean squared error
pub fn rmse(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_inputs(predicted, actual)?;

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).powi(2))
        .sum();

    Ok((sum / predicted.len() as f64).sqrt())
}

/// Mean absolute percentage error
///
/// Fails when any actual value is zero, since the error is undefined there.
pub fn mape(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_inputs(predicted, actual)?;

    if let Some(index) = actual.iter().position(|&a| a == 0.0) {
        return Err(MathError::CalculationError(format!(
            "MAPE is undefined for a zero actual value at index {}",
            index
        )));
    }

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| ((p - a) / a).abs())
        .sum();

    Ok(sum / predicted.len() as f64)
}

/// Relative mean absolute error
///
/// MAE of the forecast divided by the MAE of a seasonal naive forecast of
/// the actual series, where each value is predicted by the value one season
/// earlier. Values below 1 beat the naive benchmark.
pub fn rmae(predicted: &[f64], actual: &[f64], seasonality: Seasonality) -> Result<f64> {
    check_inputs(predicted, actual)?;

    let lag = seasonality.lag_hours();
    if actual.len() <= lag {
        return Err(MathError::InsufficientData(format!(
            "rMAE with a lag of {} needs more than {} values, got {}",
            lag,
            lag,
            actual.len()
        )));
    }

    let naive_mae = mae(&actual[..actual.len() - lag], &actual[lag..])?;
    if naive_mae == 0.0 {
        return Err(MathError::CalculationError(
            "Naive benchmark MAE is zero".to_string(),
        ));
    }

    Ok(mae(predicted, actual)? / naive_mae)
}
