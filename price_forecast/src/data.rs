//! Hourly observation series and dataset loading
//!
//! A dataset is a CSV file with one row per hour. Columns are taken by
//! position, whatever their header says: the first holds the timestamp, the
//! second the market price, and every remaining column is an exogenous
//! covariate (load or generation forecasts, for instance). Covariates are
//! renamed `Exogenous 1..n` in file order.

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Number of hourly slots in a day-ahead auction
pub const HOURS_PER_DAY: usize = 24;

/// Days per "year" of test data, as used by the EPF benchmarks
pub const DAYS_PER_TEST_YEAR: usize = 364;

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// A single hourly record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    /// `None` when the price is unknown, either missing or masked
    pub price: Option<f64>,
    pub exogenous: Vec<f64>,
}

/// Chronological sequence of hourly observations
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSeries {
    exogenous_names: Vec<String>,
    observations: Vec<Observation>,
}

impl ObservationSeries {
    /// Create a series, checking that every record carries all covariates
    pub fn new(exogenous_names: Vec<String>, observations: Vec<Observation>) -> Result<Self> {
        if let Some(bad) = observations
            .iter()
            .find(|o| o.exogenous.len() != exogenous_names.len())
        {
            return Err(ForecastError::DataError(format!(
                "Observation at {} has {} covariates, expected {}",
                bad.timestamp,
                bad.exogenous.len(),
                exogenous_names.len()
            )));
        }

        Ok(Self {
            exogenous_names,
            observations,
        })
    }

    /// Build an hourly series starting at `start` from price and covariate columns
    pub fn hourly(
        start: NaiveDateTime,
        prices: &[f64],
        covariates: Vec<(String, Vec<f64>)>,
    ) -> Result<Self> {
        if let Some((name, values)) = covariates.iter().find(|(_, v)| v.len() != prices.len()) {
            return Err(ForecastError::DataError(format!(
                "Covariate '{}' has {} values, expected {}",
                name,
                values.len(),
                prices.len()
            )));
        }

        let observations = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| Observation {
                timestamp: start + Duration::hours(i as i64),
                price: Some(price),
                exogenous: covariates.iter().map(|(_, v)| v[i]).collect(),
            })
            .collect();

        Self::new(covariates.into_iter().map(|(n, _)| n).collect(), observations)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn exogenous_names(&self) -> &[String] {
        &self.exogenous_names
    }

    pub fn exogenous_count(&self) -> usize {
        self.exogenous_names.len()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.observations.first().map(|o| o.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.observations.last().map(|o| o.timestamp)
    }

    /// Observations with a timestamp at or before `end`
    ///
    /// The series must be chronologically ordered.
    pub fn through(&self, end: NaiveDateTime) -> &[Observation] {
        let cut = self.observations.partition_point(|o| o.timestamp <= end);
        &self.observations[..cut]
    }

    /// Split into the observations strictly before `at` and the rest
    pub fn split_at_timestamp(&self, at: NaiveDateTime) -> (Self, Self) {
        let cut = self.observations.partition_point(|o| o.timestamp < at);
        (
            self.with_observations(self.observations[..cut].to_vec()),
            self.with_observations(self.observations[cut..].to_vec()),
        )
    }

    /// Observations between two indices as a new series
    pub fn slice(&self, start: usize, end: Option<usize>) -> Result<Self> {
        let end = end.unwrap_or(self.observations.len());
        if start > end || end > self.observations.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Slice {}..{} is out of bounds for {} observations",
                start,
                end,
                self.observations.len()
            )));
        }

        Ok(self.with_observations(self.observations[start..end].to_vec()))
    }

    /// Append observations from another series with the same covariates
    pub fn extend_from(&mut self, tail: &[Observation]) -> Result<()> {
        if let Some(bad) = tail
            .iter()
            .find(|o| o.exogenous.len() != self.exogenous_names.len())
        {
            return Err(ForecastError::DataError(format!(
                "Observation at {} has {} covariates, expected {}",
                bad.timestamp,
                bad.exogenous.len(),
                self.exogenous_names.len()
            )));
        }

        self.observations.extend_from_slice(tail);
        Ok(())
    }

    /// Mark the price of every observation in `[from, to]` as unknown
    ///
    /// Returns the number of observations masked.
    pub fn mask_prices(&mut self, from: NaiveDateTime, to: NaiveDateTime) -> usize {
        let mut masked = 0;
        for observation in self
            .observations
            .iter_mut()
            .filter(|o| o.timestamp >= from && o.timestamp <= to)
        {
            observation.price = None;
            masked += 1;
        }
        masked
    }

    /// The 24 hourly observations of `day`, if present and complete
    pub fn day(&self, day: NaiveDate) -> Option<&[Observation]> {
        let start = day.and_time(NaiveTime::MIN);
        let first = self.observations.partition_point(|o| o.timestamp < start);
        let hours = self.observations.get(first..first + HOURS_PER_DAY)?;

        let aligned = hours
            .iter()
            .enumerate()
            .all(|(h, o)| o.timestamp == start + Duration::hours(h as i64));
        aligned.then_some(hours)
    }

    /// Known prices of `day` in hour order, or `None` if any hour is missing
    pub fn day_prices(&self, day: NaiveDate) -> Option<Vec<f64>> {
        self.day(day)?.iter().map(|o| o.price).collect()
    }

    /// All known prices in order, skipping unknown ones
    pub fn known_prices(&self) -> Vec<f64> {
        self.observations.iter().filter_map(|o| o.price).collect()
    }

    fn with_observations(&self, observations: Vec<Observation>) -> Self {
        Self {
            exogenous_names: self.exogenous_names.clone(),
            observations,
        }
    }
}

/// Data loader for hourly market datasets
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load an observation series from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<ObservationSeries> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Convert a DataFrame with timestamp, price and covariate columns
    pub fn from_dataframe(df: &DataFrame) -> Result<ObservationSeries> {
        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        if column_names.len() < 2 {
            return Err(ForecastError::DataError(
                "Dataset needs a timestamp column and a price column".to_string(),
            ));
        }

        let time_column = &column_names[0];
        let price_column = &column_names[1];
        let covariate_columns: Vec<&String> = column_names[2..].iter().collect();

        let timestamps = Self::timestamps(df, time_column)?;
        let prices = Self::column_as_f64(df, price_column)?;
        let mut covariates = Vec::with_capacity(covariate_columns.len());
        for name in &covariate_columns {
            let values = Self::column_as_f64(df, name)?;
            if let Some(row) = values.iter().position(|v| v.is_none()) {
                return Err(ForecastError::DataError(format!(
                    "Missing value in covariate '{}' at row {}",
                    name, row
                )));
            }
            covariates.push(values.into_iter().flatten().collect::<Vec<f64>>());
        }

        let observations = timestamps
            .into_iter()
            .zip(prices)
            .enumerate()
            .map(|(row, (timestamp, price))| Observation {
                timestamp,
                price,
                exogenous: covariates.iter().map(|c| c[row]).collect(),
            })
            .collect();

        let exogenous_names = (1..=covariate_columns.len())
            .map(|k| format!("Exogenous {}", k))
            .collect();

        ObservationSeries::new(exogenous_names, observations)
    }

    fn timestamps(df: &DataFrame, column_name: &str) -> Result<Vec<NaiveDateTime>> {
        let text = df.column(column_name)?.cast(&DataType::Utf8)?;
        text.utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let value = value.ok_or_else(|| {
                    ForecastError::DataError(format!("Missing timestamp at row {}", row))
                })?;
                parse_timestamp(value)
            })
            .collect()
    }

    fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<Option<f64>>> {
        let col = df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;

        if !col.dtype().is_numeric() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64",
                column_name
            )));
        }

        let values = col.cast(&DataType::Float64)?;
        let values = values.f64()?.into_iter().collect();
        Ok(values)
    }
}

/// Parse a dataset timestamp in any of the supported layouts
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| ForecastError::ParseError(format!("Unrecognised timestamp '{}'", value)))
}

/// Parse a test period boundary given as `d/m/Y H:M`, `d/m/Y` or `Y-m-d`
pub fn parse_test_date(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%d/%m/%Y %H:%M") {
        return Ok(parsed);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%d/%m/%Y") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(ForecastError::ParseError(format!(
        "Unrecognised test date '{}', expected d/m/Y H:M",
        value
    )))
}

/// How the test period is selected from a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPeriod {
    /// The last `n` years of 364 days
    Years(usize),
    /// An explicit inclusive range
    Range {
        begin: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// Historical and evaluation parts of a dataset
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: ObservationSeries,
    pub test: ObservationSeries,
}

/// Split a series into train and test ranges
///
/// An explicit range must begin at midnight; an end given at midnight is
/// taken to mean the whole of that day.
pub fn split_train_test(series: &ObservationSeries, period: TestPeriod) -> Result<DatasetSplit> {
    let (train, test) = match period {
        TestPeriod::Years(years) => {
            let test_len = years
                .checked_mul(DAYS_PER_TEST_YEAR * HOURS_PER_DAY)
                .ok_or_else(|| {
                    ForecastError::DataError(format!("{} test years is too many", years))
                })?;
            if test_len == 0 || test_len >= series.len() {
                return Err(ForecastError::DataError(format!(
                    "Dataset has {} hourly rows, not enough for {} test year(s)",
                    series.len(),
                    years
                )));
            }
            let train = series.slice(0, Some(series.len() - test_len))?;
            let test = series.slice(series.len() - test_len, None)?;
            (train, test)
        }
        TestPeriod::Range { begin, end } => {
            if begin.time() != NaiveTime::MIN {
                return Err(ForecastError::ValidationError(format!(
                    "Test period must begin at midnight, got {}",
                    begin
                )));
            }
            let end = if end.hour() == 0 && end.minute() == 0 {
                end + Duration::hours(HOURS_PER_DAY as i64 - 1)
            } else {
                end
            };
            if end < begin {
                return Err(ForecastError::ValidationError(format!(
                    "Test period ends ({}) before it begins ({})",
                    end, begin
                )));
            }

            let (train, rest) = series.split_at_timestamp(begin);
            let visible = rest.through(end).len();
            let test = rest.slice(0, Some(visible))?;
            (train, test)
        }
    };

    if train.is_empty() {
        return Err(ForecastError::DataError(
            "Train range of the dataset is empty".to_string(),
        ));
    }
    if test.is_empty() {
        return Err(ForecastError::DataError(
            "Test range of the dataset is empty".to_string(),
        ));
    }

    Ok(DatasetSplit { train, test })
}

/// Location of a dataset file: `<dir>/<dataset>.csv` unless a file name is given
pub fn dataset_path<P: AsRef<Path>>(dir: P, dataset: &str) -> PathBuf {
    if dataset.to_lowercase().ends_with(".csv") {
        dir.as_ref().join(dataset)
    } else {
        dir.as_ref().join(format!("{}.csv", dataset))
    }
}

/// Load a dataset and split it into train and test ranges
pub fn read_data<P: AsRef<Path>>(dir: P, dataset: &str, period: TestPeriod) -> Result<DatasetSplit> {
    let path = dataset_path(dir, dataset);
    if !path.exists() {
        return Err(ForecastError::DataError(format!(
            "Dataset file {} does not exist",
            path.display()
        )));
    }

    let series = DataLoader::from_csv(&path)?;
    split_train_test(&series, period)
}
