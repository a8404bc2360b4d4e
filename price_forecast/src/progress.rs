//! Per-day progress records and where they are sent

use crate::metrics::RunningMetrics;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

/// Emitted once a test day has been forecast and scored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayProgress {
    pub day: NaiveDate,
    /// Zero-based index of the day in the test range
    pub position: usize,
    pub total_days: usize,
    pub metrics: RunningMetrics,
}

impl std::fmt::Display for DayProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - sMAPE: {:.2}%  |  MAE: {:.3}",
            self.day, self.metrics.smape_pct, self.metrics.mae
        )
    }
}

/// Receiver of progress records, injected into the backtest engine
pub trait ProgressSink {
    fn report(&mut self, progress: &DayProgress);
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn report(&mut self, progress: &DayProgress) {
        (**self).report(progress)
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for Box<S> {
    fn report(&mut self, progress: &DayProgress) {
        (**self).report(progress)
    }
}

/// Prints each record to stdout and logs it
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn report(&mut self, progress: &DayProgress) {
        println!("{}", progress);
        info!(
            day = %progress.day,
            position = progress.position,
            total_days = progress.total_days,
            "{}",
            progress
        );
    }
}

/// Keeps records in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    records: Vec<DayProgress>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[DayProgress] {
        &self.records
    }

    /// Progress lines as they would be printed
    pub fn lines(&self) -> Vec<String> {
        self.records.iter().map(|r| r.to_string()).collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&mut self, progress: &DayProgress) {
        self.records.push(progress.clone());
    }
}
