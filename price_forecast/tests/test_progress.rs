mod common;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use price_forecast::data::HOURS_PER_DAY;
use price_forecast::{
    ConsoleProgress, DayAheadModel, DayProgress, ObservationSeries, ProgressSink,
    RecordingProgress, RunningMetrics, WalkForwardBacktest,
};

#[derive(Debug)]
struct FlatModel(f64);

impl DayAheadModel for FlatModel {
    fn name(&self) -> &str {
        "flat"
    }

    fn recalibrate_and_forecast_next_day(
        &self,
        _window: &ObservationSeries,
        _target_day: NaiveDate,
        _calibration_window_days: usize,
    ) -> price_forecast::error::Result<Vec<f64>> {
        Ok(vec![self.0; HOURS_PER_DAY])
    }
}

fn sample_progress() -> DayProgress {
    DayProgress {
        day: NaiveDate::from_ymd_opt(2017, 3, 26).unwrap(),
        position: 84,
        total_days: 728,
        metrics: RunningMetrics {
            days: 85,
            mae: 3.14159,
            smape_pct: 12.3456,
        },
    }
}

#[test]
fn test_progress_line_format() {
    assert_eq!(
        sample_progress().to_string(),
        "2017-03-26 - sMAPE: 12.35%  |  MAE: 3.142"
    );
}

#[test]
fn test_console_progress_reaches_the_log() {
    let (_, log) = common::capture_logs(|| {
        let mut sink = ConsoleProgress;
        sink.report(&sample_progress());
    });

    assert!(log.contains("2017-03-26 - sMAPE: 12.35%  |  MAE: 3.142"));
    assert!(log.contains("position=84"));
    assert!(log.contains("total_days=728"));
}

#[test]
fn test_console_progress_logs_every_backtest_day() {
    let train = ObservationSeries::hourly(common::start(), &[10.0; 7 * 24], Vec::new()).unwrap();
    let test_start = common::start() + chrono::Duration::days(7);
    let test = ObservationSeries::hourly(test_start, &[10.0; 2 * 24], Vec::new()).unwrap();

    let (outcome, log) = common::capture_logs(|| {
        let mut backtest = WalkForwardBacktest::new(FlatModel(12.0), ConsoleProgress);
        backtest.run(&train, &test, 7)
    });

    assert_eq!(outcome.unwrap().forecasts.written_rows(), 2);
    assert!(log.contains("2016-01-11 - sMAPE: 18.18%  |  MAE: 2.000"));
    assert!(log.contains("2016-01-12 - sMAPE: 18.18%  |  MAE: 2.000"));
}

fn send_sample<S: ProgressSink>(mut sink: S) {
    sink.report(&sample_progress());
}

#[test]
fn test_boxed_and_borrowed_sinks_forward_records() {
    let mut recording = RecordingProgress::new();
    send_sample(&mut recording);
    send_sample(Box::new(&mut recording));

    assert_eq!(recording.records(), &[sample_progress(), sample_progress()]);
    assert_eq!(recording.lines().len(), 2);
}
