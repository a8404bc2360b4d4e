//! LASSO-estimated autoregressive (LEAR) model
//!
//! One sparse linear model per hour of the day, all sharing the same inputs:
//! the 24 prices of the days one, two, three and seven days before the
//! target, every covariate on the target day and one and seven days before,
//! and a one-hot day of the week. Prices and covariates pass through an
//! asinh/median/MAD transformation fitted on the calibration window, and the
//! L1 penalty of each hour is chosen by AIC.

use crate::data::{ObservationSeries, HOURS_PER_DAY};
use crate::error::{ForecastError, Result};
use crate::models::DayAheadModel;
use chrono::{Datelike, Duration, NaiveDate};
use forecast_math::lasso::{self, LassoSettings};
use forecast_math::{AsinhMedianScaler, MathError};
use tracing::debug;

const PRICE_LAGS: [usize; 4] = [1, 2, 3, 7];
const EXOGENOUS_LAGS: [usize; 3] = [0, 1, 7];
const MAX_LAG: usize = 7;
const WEEKDAYS: usize = 7;

/// LEAR model
#[derive(Debug, Clone)]
pub struct Lear {
    name: String,
    settings: LassoSettings,
}

/// Window reshaped into days
struct DailyPanel {
    days: Vec<NaiveDate>,
    /// `[day][hour]`
    prices: Vec<Vec<Option<f64>>>,
    /// `[variable][day][hour]`
    exogenous: Vec<Vec<Vec<f64>>>,
}

impl DailyPanel {
    fn from_window(window: &ObservationSeries, target_day: NaiveDate) -> Result<Self> {
        let observations = window.observations();
        if observations.is_empty() || observations.len() % HOURS_PER_DAY != 0 {
            return Err(ForecastError::DataError(format!(
                "LEAR needs whole days of hourly data, got {} rows",
                observations.len()
            )));
        }

        let day_count = observations.len() / HOURS_PER_DAY;
        let mut days = Vec::with_capacity(day_count);
        let mut prices = Vec::with_capacity(day_count);
        let mut exogenous = vec![Vec::with_capacity(day_count); window.exogenous_count()];

        for chunk in observations.chunks(HOURS_PER_DAY) {
            let day = chunk[0].timestamp.date();
            let start = day.and_time(chrono::NaiveTime::MIN);
            if let Some((h, o)) = chunk
                .iter()
                .enumerate()
                .find(|(h, o)| o.timestamp != start + Duration::hours(*h as i64))
            {
                return Err(ForecastError::DataError(format!(
                    "LEAR expected {} at hour {} of {}, found {}",
                    start + Duration::hours(h as i64),
                    h,
                    day,
                    o.timestamp
                )));
            }

            days.push(day);
            prices.push(chunk.iter().map(|o| o.price).collect());
            for (k, series) in exogenous.iter_mut().enumerate() {
                series.push(chunk.iter().map(|o| o.exogenous[k]).collect());
            }
        }

        if days.last() != Some(&target_day) {
            return Err(ForecastError::DataError(format!(
                "Window must end with the target day {}, ends with {:?}",
                target_day,
                days.last()
            )));
        }

        Ok(Self {
            days,
            prices,
            exogenous,
        })
    }

    fn known_prices(&self, day: usize) -> Option<Vec<f64>> {
        self.prices[day].iter().copied().collect()
    }
}

/// Fitted transformations of one calibration window
struct Scalers {
    price: AsinhMedianScaler,
    exogenous: Vec<AsinhMedianScaler>,
}

impl Scalers {
    fn fit(panel: &DailyPanel, first_day: usize, target: usize) -> Result<Self> {
        let price_sample: Vec<f64> = panel.prices[first_day..target]
            .iter()
            .flatten()
            .filter_map(|p| *p)
            .collect();
        let price = AsinhMedianScaler::fit(&price_sample)?;

        let exogenous = panel
            .exogenous
            .iter()
            .map(|series| {
                let sample: Vec<f64> = series[first_day..=target].iter().flatten().copied().collect();
                AsinhMedianScaler::fit(&sample)
            })
            .collect::<std::result::Result<Vec<_>, MathError>>()?;

        Ok(Self { price, exogenous })
    }
}

impl Lear {
    /// Create a LEAR model with the given solver settings
    pub fn new(settings: LassoSettings) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            name: "LEAR".to_string(),
            settings,
        })
    }

    pub fn settings(&self) -> &LassoSettings {
        &self.settings
    }

    /// Number of inputs for a dataset with `exogenous_count` covariates
    pub fn feature_count(exogenous_count: usize) -> usize {
        PRICE_LAGS.len() * HOURS_PER_DAY
            + exogenous_count * EXOGENOUS_LAGS.len() * HOURS_PER_DAY
            + WEEKDAYS
    }

    /// Inputs for day `index`, or `None` if a lagged price is unknown
    fn features(panel: &DailyPanel, scalers: &Scalers, index: usize) -> Option<Vec<f64>> {
        let mut row = Vec::with_capacity(Self::feature_count(panel.exogenous.len()));

        for lag in PRICE_LAGS {
            for price in &panel.prices[index - lag] {
                row.push(scalers.price.transform((*price)?));
            }
        }

        for (series, scaler) in panel.exogenous.iter().zip(scalers.exogenous.iter()) {
            for lag in EXOGENOUS_LAGS {
                row.extend(series[index - lag].iter().map(|&v| scaler.transform(v)));
            }
        }

        let weekday = panel.days[index].weekday().num_days_from_monday() as usize;
        row.extend((0..WEEKDAYS).map(|d| if d == weekday { 1.0 } else { 0.0 }));

        Some(row)
    }
}

impl Default for Lear {
    fn default() -> Self {
        Self {
            name: "LEAR".to_string(),
            settings: LassoSettings::default(),
        }
    }
}

impl DayAheadModel for Lear {
    fn name(&self) -> &str {
        &self.name
    }

    fn recalibrate_and_forecast_next_day(
        &self,
        window: &ObservationSeries,
        target_day: NaiveDate,
        calibration_window_days: usize,
    ) -> Result<Vec<f64>> {
        let panel = DailyPanel::from_window(window, target_day)?;
        let target = panel.days.len() - 1;
        let first_day = target.saturating_sub(calibration_window_days);
        let first_sample = first_day + MAX_LAG;

        if first_sample >= target {
            return Err(MathError::InsufficientData(format!(
                "LEAR needs more than {} days of history before {}, the calibration window holds {}",
                MAX_LAG,
                target_day,
                target - first_day
            ))
            .into());
        }

        let scalers = Scalers::fit(&panel, first_day, target)?;

        let mut rows = Vec::with_capacity(target - first_sample);
        let mut targets = Vec::with_capacity(target - first_sample);
        for day in first_sample..target {
            if let (Some(row), Some(prices)) = (
                Self::features(&panel, &scalers, day),
                panel.known_prices(day),
            ) {
                rows.push(row);
                targets.push(scalers.price.transform_all(&prices));
            }
        }

        if rows.is_empty() {
            return Err(MathError::InsufficientData(format!(
                "No complete calibration days before {}",
                target_day
            ))
            .into());
        }

        let target_row = Self::features(&panel, &scalers, target).ok_or_else(|| {
            ForecastError::DataError(format!(
                "Lagged prices needed to forecast {} are missing",
                target_day
            ))
        })?;

        let mut forecast = Vec::with_capacity(HOURS_PER_DAY);
        let mut active = 0;
        for hour in 0..HOURS_PER_DAY {
            let y: Vec<f64> = targets.iter().map(|t| t[hour]).collect();
            let fit = lasso::fit_aic(&rows, &y, &self.settings)?;
            active += fit.active_features();
            forecast.push(scalers.price.inverse(fit.predict(&target_row)?));
        }

        debug!(
            day = %target_day,
            samples = rows.len(),
            features = target_row.len(),
            mean_active = active as f64 / HOURS_PER_DAY as f64,
            "LEAR recalibrated"
        );

        Ok(forecast)
    }
}
