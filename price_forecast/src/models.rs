//! Day-ahead forecasting models

use crate::data::ObservationSeries;
use crate::error::Result;
use chrono::NaiveDate;
use std::fmt::Debug;

/// A model that is refitted before every daily forecast
///
/// `window` holds every observation up to the last hour of `target_day`,
/// with the prices of `target_day` unknown. The model must fit on at most
/// the last `calibration_window_days` days before `target_day` and return
/// 24 hourly prices in hour order. It takes `&self`, so nothing learned on
/// one day can be carried into the next call.
pub trait DayAheadModel: Debug {
    /// Name of the model
    fn name(&self) -> &str;

    /// Refit on the window and forecast the 24 prices of `target_day`
    fn recalibrate_and_forecast_next_day(
        &self,
        window: &ObservationSeries,
        target_day: NaiveDate,
        calibration_window_days: usize,
    ) -> Result<Vec<f64>>;
}

impl<M: DayAheadModel + ?Sized> DayAheadModel for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recalibrate_and_forecast_next_day(
        &self,
        window: &ObservationSeries,
        target_day: NaiveDate,
        calibration_window_days: usize,
    ) -> Result<Vec<f64>> {
        (**self).recalibrate_and_forecast_next_day(window, target_day, calibration_window_days)
    }
}

pub mod lear;
pub mod naive;

pub use lear::Lear;
pub use naive::NaiveSeasonal;
