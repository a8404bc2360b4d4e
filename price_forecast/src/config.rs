//! Run configuration

use crate::data::{parse_test_date, TestPeriod, DAYS_PER_TEST_YEAR};
use crate::error::{ForecastError, Result};
use crate::models::{DayAheadModel, Lear, NaiveSeasonal};
use forecast_math::LassoSettings;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Forecasting model used for the backtest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// LASSO-estimated autoregressive model
    Lear,
    /// Daily/weekly naive benchmark
    Naive,
}

/// Settings of one walk-forward backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Market identifier or CSV file name inside `datasets_dir`
    pub dataset: String,
    /// Years of 364 days in the test range
    pub years_test: usize,
    /// Days of history used at each recalibration
    pub calibration_window: usize,
    /// First day of the test range (`d/m/Y H:M`)
    pub begin_test_date: Option<String>,
    /// Last hour of the test range (`d/m/Y H:M`)
    pub end_test_date: Option<String>,
    pub datasets_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_file: PathBuf,
    pub model: ModelKind,
    pub lasso: LassoSettings,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            dataset: "PJM".to_string(),
            years_test: 2,
            calibration_window: 4 * DAYS_PER_TEST_YEAR,
            begin_test_date: None,
            end_test_date: None,
            datasets_dir: PathBuf::from("datasets"),
            output_dir: PathBuf::from("experimental_files"),
            log_file: PathBuf::from("forecasting.log"),
            model: ModelKind::Lear,
            lasso: LassoSettings::default(),
        }
    }
}

impl BacktestConfig {
    /// Load a configuration saved as JSON; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dataset.trim().is_empty() {
            return Err(ForecastError::ValidationError(
                "Dataset must not be empty".to_string(),
            ));
        }
        if self.calibration_window == 0 {
            return Err(ForecastError::ValidationError(
                "Calibration window must be at least one day".to_string(),
            ));
        }
        self.test_period()?;
        self.lasso.validate()?;
        Ok(())
    }

    /// Test range selection, from explicit dates when given
    pub fn test_period(&self) -> Result<TestPeriod> {
        match (&self.begin_test_date, &self.end_test_date) {
            (Some(begin), Some(end)) => Ok(TestPeriod::Range {
                begin: parse_test_date(begin)?,
                end: parse_test_date(end)?,
            }),
            (None, None) => {
                if self.years_test == 0 {
                    return Err(ForecastError::ValidationError(
                        "years_test must be positive when no test dates are given".to_string(),
                    ));
                }
                Ok(TestPeriod::Years(self.years_test))
            }
            _ => Err(ForecastError::ValidationError(
                "begin_test_date and end_test_date must be given together".to_string(),
            )),
        }
    }

    pub fn forecast_file_name(&self) -> String {
        format!(
            "fc_nl_dat{}_YT{}_CW{}.csv",
            self.dataset, self.years_test, self.calibration_window
        )
    }

    pub fn forecast_file_path(&self) -> PathBuf {
        self.output_dir.join(self.forecast_file_name())
    }

    /// Summary JSON written next to the forecast file
    pub fn summary_file_path(&self) -> PathBuf {
        self.forecast_file_path().with_extension("json")
    }

    pub fn build_model(&self) -> Result<Box<dyn DayAheadModel>> {
        Ok(match self.model {
            ModelKind::Lear => Box::new(Lear::new(self.lasso.clone())?),
            ModelKind::Naive => Box::new(NaiveSeasonal::new()),
        })
    }
}
