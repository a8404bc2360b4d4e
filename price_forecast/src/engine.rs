//! Walk-forward recalibrate-then-forecast backtest
//!
//! Test days are visited once each, in ascending order. For every day the
//! engine rebuilds the causally valid window from the two input series,
//! asks the model for 24 hourly prices, writes them into the forecast matrix
//! and rescores the whole written prefix.
//!
//! ```rust,no_run
//! use price_forecast::data::{read_data, TestPeriod};
//! use price_forecast::engine::WalkForwardBacktest;
//! use price_forecast::models::NaiveSeasonal;
//! use price_forecast::progress::ConsoleProgress;
//!
//! let split = read_data("datasets", "PJM", TestPeriod::Years(2))?;
//! let mut backtest = WalkForwardBacktest::new(NaiveSeasonal::new(), ConsoleProgress);
//! let outcome = backtest.run(&split.train, &split.test, 4 * 364)?;
//! println!("{}", outcome.metrics);
//! # Ok::<(), price_forecast::ForecastError>(())
//! ```

use crate::data::{ObservationSeries, HOURS_PER_DAY};
use crate::error::{ForecastError, Result};
use crate::matrix::{ForecastMatrix, RealValueMatrix};
use crate::metrics::{FinalMetrics, RunningMetrics};
use crate::models::DayAheadModel;
use crate::progress::{DayProgress, ProgressSink};
use crate::window::{available_window, validate_split};
use chrono::NaiveDate;
use tracing::{debug, error, info, info_span};

/// Everything a finished backtest produces
#[derive(Debug, Clone)]
pub struct BacktestOutcome {
    pub forecasts: ForecastMatrix,
    pub real_values: RealValueMatrix,
    pub metrics: FinalMetrics,
}

/// State of one backtest: the inputs, the day cursor and the two matrices
///
/// A session survives a failed [`WalkForwardBacktest::step`], so the caller
/// can still read every day written before the failure.
#[derive(Debug)]
pub struct BacktestSession<'a> {
    train: &'a ObservationSeries,
    test: &'a ObservationSeries,
    calibration_window_days: usize,
    forecasts: ForecastMatrix,
    real_values: RealValueMatrix,
    cursor: usize,
}

impl<'a> BacktestSession<'a> {
    pub fn calibration_window_days(&self) -> usize {
        self.calibration_window_days
    }

    pub fn total_days(&self) -> usize {
        self.real_values.len()
    }

    /// Number of days forecast so far
    pub fn completed_days(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor == self.total_days()
    }

    /// Next day to be forecast
    pub fn next_day(&self) -> Option<NaiveDate> {
        self.real_values.days().get(self.cursor).copied()
    }

    pub fn forecasts(&self) -> &ForecastMatrix {
        &self.forecasts
    }

    pub fn real_values(&self) -> &RealValueMatrix {
        &self.real_values
    }

    /// Metrics over the days completed so far
    pub fn running_metrics(&self) -> Result<RunningMetrics> {
        RunningMetrics::over_prefix(&self.forecasts, &self.real_values, self.cursor)
    }

    /// Turn a finished session into its outcome
    pub fn finish(self) -> Result<BacktestOutcome> {
        if !self.is_finished() {
            return Err(ForecastError::ValidationError(format!(
                "Backtest stopped after {} of {} days",
                self.cursor,
                self.total_days()
            )));
        }

        let metrics = FinalMetrics::compute(&self.forecasts, &self.real_values)?;
        Ok(BacktestOutcome {
            forecasts: self.forecasts,
            real_values: self.real_values,
            metrics,
        })
    }
}

/// Walk-forward backtest driver
#[derive(Debug)]
pub struct WalkForwardBacktest<M, P> {
    model: M,
    progress: P,
}

impl<M: DayAheadModel, P: ProgressSink> WalkForwardBacktest<M, P> {
    pub fn new(model: M, progress: P) -> Self {
        Self { model, progress }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    pub fn into_parts(self) -> (M, P) {
        (self.model, self.progress)
    }

    /// Forecast every test day and return the matrices and final metrics
    pub fn run(
        &mut self,
        train: &ObservationSeries,
        test: &ObservationSeries,
        calibration_window_days: usize,
    ) -> Result<BacktestOutcome> {
        self.run_with_failure_handler(train, test, calibration_window_days, |_, _| {})
    }

    /// Like [`run`](Self::run), but hands the session to `on_failure` when a
    /// day fails, before the error is returned
    ///
    /// The handler sees every row completed before the failing day. It cannot
    /// replace the error that stopped the run.
    pub fn run_with_failure_handler<F>(
        &mut self,
        train: &ObservationSeries,
        test: &ObservationSeries,
        calibration_window_days: usize,
        on_failure: F,
    ) -> Result<BacktestOutcome>
    where
        F: FnOnce(&BacktestSession<'_>, &ForecastError),
    {
        let mut session = self.prepare(train, test, calibration_window_days)?;

        let span = info_span!(
            "walk_forward",
            model = self.model.name(),
            days = session.total_days(),
            calibration_window_days
        );
        let _guard = span.enter();

        info!(
            first_day = ?session.next_day(),
            "Starting walk-forward backtest"
        );
        loop {
            match self.step(&mut session) {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(err) => {
                    on_failure(&session, &err);
                    return Err(err);
                }
            }
        }

        let outcome = session.finish()?;
        info!(
            mae = outcome.metrics.mae,
            smape_pct = outcome.metrics.smape_pct,
            "Walk-forward backtest completed"
        );
        Ok(outcome)
    }

    /// Validate the inputs and allocate the matrices
    pub fn prepare<'a>(
        &self,
        train: &'a ObservationSeries,
        test: &'a ObservationSeries,
        calibration_window_days: usize,
    ) -> Result<BacktestSession<'a>> {
        if calibration_window_days == 0 {
            let err = ForecastError::ValidationError(
                "Calibration window must be at least one day".to_string(),
            );
            error!(error = %err, "Backtest rejected");
            return Err(err);
        }

        let days = validate_split(train, test).map_err(|err| {
            error!(error = %err, "Backtest rejected");
            err
        })?;
        let real_values = RealValueMatrix::from_test(test)?;
        debug_assert_eq!(days.as_slice(), real_values.days());

        Ok(BacktestSession {
            train,
            test,
            calibration_window_days,
            forecasts: ForecastMatrix::new(days),
            real_values,
            cursor: 0,
        })
    }

    /// Forecast and score the next day of the session
    ///
    /// Returns `Ok(None)` once every day has been processed.
    pub fn step(&mut self, session: &mut BacktestSession<'_>) -> Result<Option<DayProgress>> {
        let position = session.cursor;
        let day = match session.next_day() {
            Some(day) => day,
            None => return Ok(None),
        };

        let span = info_span!("day", %day, position);
        let _guard = span.enter();
        info!("Processing date: {}", day);

        let window = available_window(session.train, session.test, day).map_err(|err| {
            error!(error = %err, "Could not build the data window");
            err
        })?;
        debug!(rows = window.len(), "Data window built");

        let predictions = self
            .model
            .recalibrate_and_forecast_next_day(&window, day, session.calibration_window_days)
            .map_err(|err| ForecastError::ModelInvocation {
                day,
                position,
                message: err.to_string(),
            })
            .and_then(|values| {
                if values.len() == HOURS_PER_DAY {
                    Ok(values)
                } else {
                    Err(ForecastError::ModelInvocation {
                        day,
                        position,
                        message: format!(
                            "expected {} hourly prices, got {}",
                            HOURS_PER_DAY,
                            values.len()
                        ),
                    })
                }
            })
            .map_err(|err| {
                error!(error = %err, "Model invocation failed");
                err
            })?;

        session.forecasts.write_row(position, &predictions)?;
        session.cursor += 1;

        let metrics = session.running_metrics().map_err(|err| {
            error!(error = %err, "Could not score the forecasts");
            err
        })?;

        let progress = DayProgress {
            day,
            position,
            total_days: session.total_days(),
            metrics,
        };
        self.progress.report(&progress);

        Ok(Some(progress))
    }
}
