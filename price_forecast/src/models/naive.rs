//! Seasonal naive benchmark

use crate::data::ObservationSeries;
use crate::error::{ForecastError, Result};
use crate::models::DayAheadModel;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Repeats a recent day as the forecast
///
/// Mondays and weekends repeat the same weekday one week earlier; Tuesday
/// to Friday repeat the previous day.
#[derive(Debug, Clone)]
pub struct NaiveSeasonal {
    name: String,
}

impl NaiveSeasonal {
    pub fn new() -> Self {
        Self {
            name: "Naive (daily/weekly)".to_string(),
        }
    }

    /// Day whose prices are repeated for `target_day`
    pub fn source_day(target_day: NaiveDate) -> NaiveDate {
        match target_day.weekday() {
            Weekday::Mon | Weekday::Sat | Weekday::Sun => target_day - Duration::days(7),
            _ => target_day - Duration::days(1),
        }
    }
}

impl Default for NaiveSeasonal {
    fn default() -> Self {
        Self::new()
    }
}

impl DayAheadModel for NaiveSeasonal {
    fn name(&self) -> &str {
        &self.name
    }

    fn recalibrate_and_forecast_next_day(
        &self,
        window: &ObservationSeries,
        target_day: NaiveDate,
        _calibration_window_days: usize,
    ) -> Result<Vec<f64>> {
        let source = Self::source_day(target_day);
        window.day_prices(source).ok_or_else(|| {
            ForecastError::DataError(format!(
                "Naive forecast for {} needs all prices of {}",
                target_day, source
            ))
        })
    }
}
