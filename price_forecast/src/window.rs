//! Train/test alignment checks and causally valid data windows
//!
//! The window handed to a model for test day `D` contains the whole train
//! range plus the test range up to the last hour of `D`, with the 24 prices
//! of `D` masked. Covariates of `D` stay visible: day-ahead load and
//! generation forecasts are published before the auction closes.

use crate::data::{ObservationSeries, HOURS_PER_DAY};
use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

fn is_midnight(timestamp: NaiveDateTime) -> bool {
    timestamp.time() == NaiveTime::MIN
}

/// Check hourly spacing of a series, naming the first offending position
fn check_hourly(series: &ObservationSeries, label: &str) -> Result<()> {
    for (i, pair) in series.observations().windows(2).enumerate() {
        let step = pair[1].timestamp - pair[0].timestamp;
        if step <= Duration::zero() {
            return Err(ForecastError::DataAlignment(format!(
                "{} data is not in chronological order at row {} ({} follows {})",
                label,
                i + 1,
                pair[1].timestamp,
                pair[0].timestamp
            )));
        }
        if step != Duration::hours(1) {
            return Err(ForecastError::DataAlignment(format!(
                "{} data has a gap of {} minutes between {} and {}",
                label,
                step.num_minutes(),
                pair[0].timestamp,
                pair[1].timestamp
            )));
        }
    }
    Ok(())
}

/// Validate a train/test split and return the test days in order
///
/// The test range must start at midnight, consist of whole days of hourly
/// observations without gaps, carry a known price for every hour and begin
/// exactly one hour after the last train observation.
pub fn validate_split(train: &ObservationSeries, test: &ObservationSeries) -> Result<Vec<NaiveDate>> {
    let first = test
        .first_timestamp()
        .ok_or_else(|| ForecastError::DataAlignment("Test data is empty".to_string()))?;

    if train.exogenous_count() != test.exogenous_count() {
        return Err(ForecastError::DataAlignment(format!(
            "Train data has {} covariates but test data has {}",
            train.exogenous_count(),
            test.exogenous_count()
        )));
    }

    check_hourly(train, "Train")?;
    check_hourly(test, "Test")?;

    if !is_midnight(first) {
        return Err(ForecastError::DataAlignment(format!(
            "Test data starts at {} instead of midnight",
            first
        )));
    }

    if test.len() % HOURS_PER_DAY != 0 {
        return Err(ForecastError::DataAlignment(format!(
            "Test data has {} hourly rows, which is not a whole number of days",
            test.len()
        )));
    }

    if let Some(last_train) = train.last_timestamp() {
        if first != last_train + Duration::hours(1) {
            return Err(ForecastError::DataAlignment(format!(
                "Test data starts at {} but train data ends at {}",
                first, last_train
            )));
        }
    }

    if let Some(missing) = test.observations().iter().find(|o| o.price.is_none()) {
        return Err(ForecastError::DataAlignment(format!(
            "Test data has no price at {}",
            missing.timestamp
        )));
    }

    Ok(test
        .observations()
        .iter()
        .step_by(HOURS_PER_DAY)
        .map(|o| o.timestamp.date())
        .collect())
}

/// First and last hour of a day
pub fn day_bounds(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = day.and_time(NaiveTime::MIN);
    (start, start + Duration::hours(HOURS_PER_DAY as i64 - 1))
}

/// Build the data a model may see when forecasting `day`
///
/// Rebuilt from the two input series on every call. Fails if the test range
/// does not hold all 24 hours of `day`.
pub fn available_window(
    train: &ObservationSeries,
    test: &ObservationSeries,
    day: NaiveDate,
) -> Result<ObservationSeries> {
    let (start, end) = day_bounds(day);

    let mut window = train.clone();
    window.extend_from(test.through(end))?;

    let masked = window.mask_prices(start, end);
    if masked != HOURS_PER_DAY {
        return Err(ForecastError::DataAlignment(format!(
            "Expected {} hours for {} in the test data, found {}",
            HOURS_PER_DAY, day, masked
        )));
    }

    debug_assert!(window
        .observations()
        .iter()
        .filter(|o| o.timestamp >= start)
        .all(|o| o.price.is_none()));

    Ok(window)
}
