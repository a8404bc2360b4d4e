//! # EPF workspace
//!
//! Day-ahead electricity price forecasting: the numeric building blocks live
//! in [`forecast_math`], the walk-forward backtest in [`price_forecast`].
//!
//! ## Example
//!
//! ```
//! use epf_workspace::price_forecast::models::NaiveSeasonal;
//! use epf_workspace::price_forecast::{ObservationSeries, RecordingProgress, WalkForwardBacktest};
//! use chrono::NaiveDate;
//!
//! // Two weeks of history followed by one test day, all at a flat 40
//! let start = NaiveDate::from_ymd_opt(2016, 1, 4).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let train = ObservationSeries::hourly(start, &[40.0; 14 * 24], Vec::new()).unwrap();
//! let test_start = start + chrono::Duration::days(14);
//! let test = ObservationSeries::hourly(test_start, &[40.0; 24], Vec::new()).unwrap();
//!
//! let mut backtest = WalkForwardBacktest::new(NaiveSeasonal::new(), RecordingProgress::new());
//! let outcome = backtest.run(&train, &test, 14).unwrap();
//! assert_eq!(outcome.metrics.mae, 0.0);
//! ```

pub use forecast_math;
pub use price_forecast;

