//! # Price Forecast
//!
//! Walk-forward evaluation of day-ahead electricity price forecasts.
//!
//! ## Features
//!
//! - Hourly price datasets with exogenous covariates, split into train and test ranges
//! - A recalibrate-then-forecast backtest that never shows a model the prices
//!   of the day it forecasts
//! - LEAR and naive benchmark models behind one `DayAheadModel` trait
//! - Running MAE / sMAPE after every day, final RMSE and rMAE
//! - Forecast matrices written as `date,h0..h23` CSV files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use price_forecast::data::{read_data, TestPeriod};
//! use price_forecast::engine::WalkForwardBacktest;
//! use price_forecast::models::Lear;
//! use price_forecast::output::ForecastWriter;
//! use price_forecast::progress::ConsoleProgress;
//!
//! // Load data: the last two 364-day years are the test range
//! let split = read_data("datasets", "PJM", TestPeriod::Years(2))?;
//!
//! // Recalibrate on the last four years before every test day
//! let mut backtest = WalkForwardBacktest::new(Lear::default(), ConsoleProgress);
//! let outcome = backtest.run(&split.train, &split.test, 4 * 364)?;
//!
//! ForecastWriter::write_csv(&outcome.forecasts, "experimental_files/forecast.csv")?;
//! # Ok::<(), price_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod metrics;
pub mod models;
pub mod output;
pub mod progress;
pub mod window;

// Re-export commonly used types
pub use crate::config::{BacktestConfig, ModelKind};
pub use crate::data::{DataLoader, Observation, ObservationSeries, HOURS_PER_DAY};
pub use crate::engine::{BacktestOutcome, BacktestSession, WalkForwardBacktest};
pub use crate::error::ForecastError;
pub use crate::matrix::{ForecastMatrix, RealValueMatrix};
pub use crate::metrics::{FinalMetrics, RunningMetrics};
pub use crate::models::DayAheadModel;
pub use crate::progress::{ConsoleProgress, DayProgress, ProgressSink, RecordingProgress};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
