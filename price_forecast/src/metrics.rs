//! Accuracy of the forecasts written so far

use crate::error::{ForecastError, Result};
use crate::matrix::{ForecastMatrix, RealValueMatrix};
use forecast_math::{metrics, MathError, Seasonality};
use serde::{Deserialize, Serialize};

fn metric_error(err: MathError) -> ForecastError {
    ForecastError::MetricComputation(err.to_string())
}

fn prefixes(
    forecast: &ForecastMatrix,
    real: &RealValueMatrix,
    days: usize,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if forecast.len() != real.len() {
        return Err(ForecastError::MetricComputation(format!(
            "Forecast matrix has {} days but real values have {}",
            forecast.len(),
            real.len()
        )));
    }

    Ok((forecast.prefix_values(days)?, real.prefix_values(days)?))
}

/// Cumulative accuracy over the first `days` test days
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningMetrics {
    pub days: usize,
    pub mae: f64,
    /// Symmetric MAPE in percent
    pub smape_pct: f64,
}

impl RunningMetrics {
    /// Recompute MAE and sMAPE from the written prefix of the matrices
    pub fn over_prefix(
        forecast: &ForecastMatrix,
        real: &RealValueMatrix,
        days: usize,
    ) -> Result<Self> {
        let (predicted, actual) = prefixes(forecast, real, days)?;

        Ok(Self {
            days,
            mae: metrics::mae(&predicted, &actual).map_err(metric_error)?,
            smape_pct: metrics::smape(&predicted, &actual).map_err(metric_error)? * 100.0,
        })
    }
}

/// Accuracy over the whole test period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalMetrics {
    pub days: usize,
    pub mae: f64,
    pub smape_pct: f64,
    pub rmse: f64,
    /// MAE relative to the weekly naive benchmark; absent for test periods
    /// of a week or less
    pub rmae_weekly: Option<f64>,
}

impl FinalMetrics {
    pub fn compute(forecast: &ForecastMatrix, real: &RealValueMatrix) -> Result<Self> {
        let days = forecast.written_rows();
        let running = RunningMetrics::over_prefix(forecast, real, days)?;
        let (predicted, actual) = prefixes(forecast, real, days)?;

        let rmae_weekly = match metrics::rmae(&predicted, &actual, Seasonality::Weekly) {
            Ok(value) => Some(value),
            Err(MathError::InsufficientData(_)) | Err(MathError::CalculationError(_)) => None,
            Err(err) => return Err(metric_error(err)),
        };

        Ok(Self {
            days,
            mae: running.mae,
            smape_pct: running.smape_pct,
            rmse: metrics::rmse(&predicted, &actual).map_err(metric_error)?,
            rmae_weekly,
        })
    }
}

impl std::fmt::Display for FinalMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy over {} days:", self.days)?;
        writeln!(f, "  MAE:   {:.3}", self.mae)?;
        writeln!(f, "  sMAPE: {:.2}%", self.smape_pct)?;
        writeln!(f, "  RMSE:  {:.3}", self.rmse)?;
        match self.rmae_weekly {
            Some(rmae) => writeln!(f, "  rMAE:  {:.3}", rmae)?,
            None => writeln!(f, "  rMAE:  n/a")?,
        }
        Ok(())
    }
}
