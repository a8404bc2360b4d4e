//! Day by hour matrices of forecast and realised prices

use crate::data::{ObservationSeries, HOURS_PER_DAY};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

/// The 24 hourly prices of one day
pub type HourlyProfile = [f64; HOURS_PER_DAY];

fn to_profile(values: &[f64]) -> Option<HourlyProfile> {
    values.try_into().ok()
}

/// Realised prices of the test range, one row per test day
#[derive(Debug, Clone, PartialEq)]
pub struct RealValueMatrix {
    days: Vec<NaiveDate>,
    rows: Vec<HourlyProfile>,
}

impl RealValueMatrix {
    /// Build from a validated test range
    pub fn from_test(test: &ObservationSeries) -> Result<Self> {
        if test.len() % HOURS_PER_DAY != 0 {
            return Err(ForecastError::DataAlignment(format!(
                "Test data has {} hourly rows, which is not a whole number of days",
                test.len()
            )));
        }

        let mut days = Vec::with_capacity(test.len() / HOURS_PER_DAY);
        let mut rows = Vec::with_capacity(test.len() / HOURS_PER_DAY);
        for chunk in test.observations().chunks(HOURS_PER_DAY) {
            let prices: Option<Vec<f64>> = chunk.iter().map(|o| o.price).collect();
            let prices = prices.ok_or_else(|| {
                ForecastError::DataAlignment(format!(
                    "Test day starting {} has an unknown price",
                    chunk[0].timestamp
                ))
            })?;
            let profile = to_profile(&prices).ok_or_else(|| {
                ForecastError::DataAlignment(format!(
                    "Test day starting {} has {} hours",
                    chunk[0].timestamp,
                    chunk.len()
                ))
            })?;
            days.push(chunk[0].timestamp.date());
            rows.push(profile);
        }

        Ok(Self { days, rows })
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&HourlyProfile> {
        self.rows.get(index)
    }

    /// Rows `0..days` flattened in day then hour order
    pub fn prefix_values(&self, days: usize) -> Result<Vec<f64>> {
        if days > self.rows.len() {
            return Err(ForecastError::MetricComputation(format!(
                "Requested {} days of real values, only {} available",
                days,
                self.rows.len()
            )));
        }

        Ok(self.rows[..days].iter().flatten().copied().collect())
    }
}

/// Forecast prices, filled one day at a time
///
/// Rows are write-once and are always written in day order, so the written
/// rows form a prefix of the test days.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastMatrix {
    days: Vec<NaiveDate>,
    rows: Vec<Option<HourlyProfile>>,
}

impl ForecastMatrix {
    /// Allocate an empty matrix for the given test days
    pub fn new(days: Vec<NaiveDate>) -> Self {
        let rows = vec![None; days.len()];
        Self { days, rows }
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows written so far
    pub fn written_rows(&self) -> usize {
        self.rows.iter().take_while(|r| r.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.rows.iter().all(|r| r.is_some())
    }

    pub fn row(&self, index: usize) -> Option<&HourlyProfile> {
        self.rows.get(index)?.as_ref()
    }

    /// Written rows with their day
    pub fn written(&self) -> impl Iterator<Item = (NaiveDate, &HourlyProfile)> {
        self.days
            .iter()
            .zip(self.rows.iter())
            .map_while(|(day, row)| row.as_ref().map(|r| (*day, r)))
    }

    /// Store the forecast of the next unwritten day
    pub fn write_row(&mut self, index: usize, values: &[f64]) -> Result<()> {
        let next = self.written_rows();
        if index >= self.rows.len() {
            return Err(ForecastError::ValidationError(format!(
                "Row {} is outside a matrix of {} days",
                index,
                self.rows.len()
            )));
        }
        if index < next {
            return Err(ForecastError::ValidationError(format!(
                "Row {} ({}) has already been written",
                index, self.days[index]
            )));
        }
        if index > next {
            return Err(ForecastError::ValidationError(format!(
                "Row {} cannot be written before row {}",
                index, next
            )));
        }

        let profile = to_profile(values).ok_or_else(|| {
            ForecastError::ValidationError(format!(
                "A forecast row needs {} values, got {}",
                HOURS_PER_DAY,
                values.len()
            ))
        })?;
        self.rows[index] = Some(profile);
        Ok(())
    }

    /// Rows `0..days` flattened in day then hour order
    pub fn prefix_values(&self, days: usize) -> Result<Vec<f64>> {
        let written = self.written_rows();
        if days > written {
            return Err(ForecastError::MetricComputation(format!(
                "Requested {} days of forecasts, only {} written",
                days, written
            )));
        }

        Ok(self.rows[..days].iter().flatten().flatten().copied().collect())
    }
}
