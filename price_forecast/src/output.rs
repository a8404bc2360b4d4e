//! Forecast files and run summaries

use crate::config::BacktestConfig;
use crate::data::HOURS_PER_DAY;
use crate::error::{ForecastError, Result};
use crate::matrix::{ForecastMatrix, HourlyProfile};
use crate::metrics::FinalMetrics;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tracing::{error, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// What a run reports about itself next to the forecast file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub model: String,
    pub config: BacktestConfig,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
    pub metrics: FinalMetrics,
    pub completed_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn new(
        model: &str,
        config: &BacktestConfig,
        forecasts: &ForecastMatrix,
        metrics: &FinalMetrics,
    ) -> Self {
        let written: Vec<NaiveDate> = forecasts.written().map(|(day, _)| day).collect();
        Self {
            model: model.to_string(),
            config: config.clone(),
            first_day: written.first().copied(),
            last_day: written.last().copied(),
            metrics: metrics.clone(),
            completed_at: Utc::now(),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn header() -> Vec<String> {
    std::iter::once("date".to_string())
        .chain((0..HOURS_PER_DAY).map(|h| format!("h{}", h)))
        .collect()
}

/// Writes and reads forecast matrices as CSV
#[derive(Debug)]
pub struct ForecastWriter;

impl ForecastWriter {
    /// Write the written rows of a forecast matrix, one line per day
    pub fn write_csv<P: AsRef<Path>>(forecasts: &ForecastMatrix, path: P) -> Result<()> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let file = File::create(path)?;
        Self::to_writer(forecasts, BufWriter::new(file))
    }

    pub fn to_writer<W: Write>(forecasts: &ForecastMatrix, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(header())?;

        for (day, row) in forecasts.written() {
            let record = std::iter::once(day.format(DATE_FORMAT).to_string())
                .chain(row.iter().map(|v| v.to_string()));
            csv_writer.write_record(record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Save the rows completed before a failed run
    ///
    /// Failures are logged rather than returned, so the error that stopped
    /// the run stays the one reported. Returns whether a file was written.
    pub fn write_partial<P: AsRef<Path>>(forecasts: &ForecastMatrix, path: P) -> bool {
        let path = path.as_ref();
        let completed_days = forecasts.written_rows();
        if completed_days == 0 {
            return false;
        }

        match Self::write_csv(forecasts, path) {
            Ok(()) => {
                warn!(
                    completed_days,
                    path = %path.display(),
                    "Wrote the forecasts completed before the failure"
                );
                true
            }
            Err(err) => {
                error!(
                    error = %err,
                    path = %path.display(),
                    "Could not write the forecasts completed before the failure"
                );
                false
            }
        }
    }

    /// Read a forecast file back into day rows
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Vec<(NaiveDate, HourlyProfile)>> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<(NaiveDate, HourlyProfile)>> {
        let mut csv_reader = csv::Reader::from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let expected = header();
        if headers.iter().ne(expected.iter().map(|s| s.as_str())) {
            return Err(ForecastError::CsvError(format!(
                "Unexpected forecast header: {:?}",
                headers
            )));
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let day = NaiveDate::parse_from_str(&record[0], DATE_FORMAT)?;
            let mut profile = [0.0; HOURS_PER_DAY];
            for (h, value) in profile.iter_mut().enumerate() {
                *value = record[h + 1].parse::<f64>().map_err(|e| {
                    ForecastError::ParseError(format!("{} h{}: {}", day, h, e))
                })?;
            }
            rows.push((day, profile));
        }

        Ok(rows)
    }

    /// Write the run summary as pretty JSON
    pub fn write_summary<P: AsRef<Path>>(summary: &RunSummary, path: P) -> Result<()> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
        Ok(())
    }
}
