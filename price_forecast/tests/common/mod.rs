#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use price_forecast::ObservationSeries;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 1, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn day(offset: i64) -> NaiveDate {
    start().date() + chrono::Duration::days(offset)
}

/// Hourly prices with a daily shape, a weekend dip and a little noise
pub fn hourly_prices(days: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..days * 24)
        .map(|i| {
            let hour = (i % 24) as f64;
            let weekday = (i / 24) % 7;
            let daily = 10.0 * (2.0 * std::f64::consts::PI * (hour - 6.0) / 24.0).sin();
            let weekend = if weekday >= 5 { -8.0 } else { 0.0 };
            40.0 + daily + weekend + rng.gen_range(-1.0..1.0)
        })
        .collect()
}

/// Load-like covariate correlated with the price shape
pub fn hourly_load(prices: &[f64], seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    prices
        .iter()
        .map(|p| 1000.0 + 20.0 * p + rng.gen_range(-5.0..5.0))
        .collect()
}

pub fn series(prices: &[f64], with_load: bool) -> ObservationSeries {
    let covariates = if with_load {
        vec![("Exogenous 1".to_string(), hourly_load(prices, 7))]
    } else {
        Vec::new()
    };
    ObservationSeries::hourly(start(), prices, covariates).unwrap()
}

/// Train and test series cut from one synthetic dataset
pub fn split(
    train_days: usize,
    test_days: usize,
    with_load: bool,
) -> (ObservationSeries, ObservationSeries) {
    let prices = hourly_prices(train_days + test_days, 42);
    let full = series(&prices, with_load);
    let train = full.slice(0, Some(train_days * 24)).unwrap();
    let test = full.slice(train_days * 24, None).unwrap();
    (train, test)
}

/// In-memory sink for formatted tracing output
#[derive(Clone, Default)]
pub struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber writing plain text into memory
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, log.contents())
}
