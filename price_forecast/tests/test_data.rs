mod common;

use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use price_forecast::data::{
    dataset_path, parse_test_date, read_data, split_train_test, TestPeriod,
};
use price_forecast::{DataLoader, ForecastError};
use rstest::rstest;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, NamedTempFile};

/// Write `days` of hourly rows with a price and two covariates
fn write_dataset<W: Write>(writer: &mut W, days: usize) {
    writeln!(writer, "Date,Price,Load forecast,Wind forecast").unwrap();
    let prices = common::hourly_prices(days, 3);
    for (i, price) in prices.iter().enumerate() {
        let timestamp = common::start() + Duration::hours(i as i64);
        writeln!(
            writer,
            "{},{:.2},{}.5,{}.25",
            timestamp.format("%Y-%m-%d %H:%M:%S"),
            price,
            1000 + i,
            200 + i
        )
        .unwrap();
    }
}

fn sample_file(days: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write_dataset(&mut file, days);
    file.flush().unwrap();
    file
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_load_csv_with_covariates() {
    let file = sample_file(3);
    let series = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(series.len(), 72);
    assert_eq!(
        series.exogenous_names(),
        &["Exogenous 1".to_string(), "Exogenous 2".to_string()]
    );
    assert_eq!(series.first_timestamp(), Some(common::start()));
    assert_eq!(
        series.last_timestamp(),
        Some(common::start() + Duration::hours(71))
    );

    let first = &series.observations()[0];
    assert!(first.price.is_some());
    assert_eq!(first.exogenous, vec![1000.5, 200.25]);
    assert_eq!(series.observations()[10].exogenous, vec![1010.5, 210.25]);
}

#[test]
fn test_load_csv_keeps_missing_prices_unknown() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Price").unwrap();
    writeln!(file, "2016-01-04 00:00:00,31.5").unwrap();
    writeln!(file, "2016-01-04 01:00:00,").unwrap();
    writeln!(file, "2016-01-04 02:00:00,29.0").unwrap();
    file.flush().unwrap();

    let series = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(series.exogenous_count(), 0);
    let prices: Vec<Option<f64>> = series.observations().iter().map(|o| o.price).collect();
    assert_eq!(prices, vec![Some(31.5), None, Some(29.0)]);
    assert_eq!(series.known_prices(), vec![31.5, 29.0]);
}

#[test]
fn test_load_csv_takes_price_from_second_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,LMP,Load").unwrap();
    writeln!(file, "2016-01-04 00:00:00,31.5,1000.0").unwrap();
    writeln!(file, "2016-01-04 01:00:00,29.0,980.0").unwrap();
    file.flush().unwrap();

    let series = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(series.exogenous_names(), &["Exogenous 1".to_string()]);
    assert_eq!(series.known_prices(), vec![31.5, 29.0]);
    assert_eq!(series.observations()[1].exogenous, vec![980.0]);
}

#[test]
fn test_load_csv_ignores_column_names() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Load forecast,Price").unwrap();
    writeln!(file, "2016-01-04 00:00:00,1000.0,30.5").unwrap();
    file.flush().unwrap();

    let series = DataLoader::from_csv(file.path()).unwrap();

    let first = &series.observations()[0];
    assert_eq!(first.price, Some(1000.0));
    assert_eq!(first.exogenous, vec![30.5]);
}

#[test]
fn test_load_csv_needs_a_price_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date").unwrap();
    writeln!(file, "2016-01-04 00:00:00").unwrap();
    file.flush().unwrap();

    let result = DataLoader::from_csv(file.path());
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_load_csv_with_bad_timestamp() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Price").unwrap();
    writeln!(file, "yesterday at noon,31.5").unwrap();
    file.flush().unwrap();

    let result = DataLoader::from_csv(file.path());
    assert!(matches!(result, Err(ForecastError::ParseError(_))));
}

#[rstest]
#[case("07/01/2016 00:00", date(2016, 1, 7), 0)]
#[case("07/01/2016 23:00", date(2016, 1, 7), 23)]
#[case("07/01/2016", date(2016, 1, 7), 0)]
#[case("2016-01-07", date(2016, 1, 7), 0)]
#[case(" 31/12/2017 00:00 ", date(2017, 12, 31), 0)]
fn test_parse_test_date(#[case] input: &str, #[case] day: NaiveDate, #[case] hour: u32) {
    let parsed = parse_test_date(input).unwrap();
    assert_eq!(parsed, day.and_hms_opt(hour, 0, 0).unwrap());
}

#[rstest]
#[case("")]
#[case("2016/01/07")]
#[case("32/01/2016 00:00")]
fn test_parse_test_date_rejects(#[case] input: &str) {
    assert!(matches!(
        parse_test_date(input),
        Err(ForecastError::ParseError(_))
    ));
}

#[test]
fn test_split_by_date_range_covers_whole_days() {
    let series = common::series(&common::hourly_prices(10, 1), true);
    let period = TestPeriod::Range {
        begin: parse_test_date("07/01/2016 00:00").unwrap(),
        end: parse_test_date("08/01/2016 00:00").unwrap(),
    };

    let split = split_train_test(&series, period).unwrap();

    assert_eq!(split.train.len(), 3 * 24);
    assert_eq!(split.test.len(), 2 * 24);
    assert_eq!(
        split.test.first_timestamp(),
        Some(date(2016, 1, 7).and_hms_opt(0, 0, 0).unwrap())
    );
    assert_eq!(
        split.test.last_timestamp(),
        Some(date(2016, 1, 8).and_hms_opt(23, 0, 0).unwrap())
    );
    assert_eq!(split.test.exogenous_count(), 1);
}

#[test]
fn test_split_by_date_range_must_begin_at_midnight() {
    let series = common::series(&common::hourly_prices(10, 1), false);
    let period = TestPeriod::Range {
        begin: parse_test_date("08/01/2016 12:00").unwrap(),
        end: parse_test_date("09/01/2016 23:00").unwrap(),
    };

    let result = split_train_test(&series, period);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
}

#[test]
fn test_split_by_years() {
    let series = common::series(&common::hourly_prices(370, 1), false);

    let split = split_train_test(&series, TestPeriod::Years(1)).unwrap();

    assert_eq!(split.test.len(), 364 * 24);
    assert_eq!(split.train.len(), 6 * 24);
    assert_eq!(split.test.first_timestamp(), Some(common::day(6).and_hms_opt(0, 0, 0).unwrap()));
}

#[test]
fn test_split_by_years_needs_enough_data() {
    let series = common::series(&common::hourly_prices(30, 1), false);

    let result = split_train_test(&series, TestPeriod::Years(1));
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_split_by_absurd_number_of_years() {
    let series = common::series(&common::hourly_prices(10, 1), false);

    let result = split_train_test(&series, TestPeriod::Years(usize::MAX));
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_split_rejects_reversed_range() {
    let series = common::series(&common::hourly_prices(10, 1), false);
    let period = TestPeriod::Range {
        begin: parse_test_date("08/01/2016 00:00").unwrap(),
        end: parse_test_date("06/01/2016 10:00").unwrap(),
    };

    let result = split_train_test(&series, period);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
}

#[test]
fn test_split_rejects_range_outside_the_data() {
    let series = common::series(&common::hourly_prices(10, 1), false);
    let period = TestPeriod::Range {
        begin: parse_test_date("01/03/2016 00:00").unwrap(),
        end: parse_test_date("02/03/2016 00:00").unwrap(),
    };

    let result = split_train_test(&series, period);
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[rstest]
#[case("PJM", "datasets/PJM.csv")]
#[case("NP", "datasets/NP.csv")]
#[case("my_market.csv", "datasets/my_market.csv")]
fn test_dataset_path(#[case] dataset: &str, #[case] expected: &str) {
    assert_eq!(dataset_path("datasets", dataset), PathBuf::from(expected));
}

#[test]
fn test_read_data_from_directory() {
    let dir = tempdir().unwrap();
    let mut file = std::fs::File::create(dir.path().join("TEST.csv")).unwrap();
    write_dataset(&mut file, 12);
    drop(file);

    let period = TestPeriod::Range {
        begin: parse_test_date("14/01/2016 00:00").unwrap(),
        end: parse_test_date("15/01/2016 00:00").unwrap(),
    };
    let split = read_data(dir.path(), "TEST", period).unwrap();

    assert_eq!(split.train.len(), 10 * 24);
    assert_eq!(split.test.len(), 2 * 24);
    assert_eq!(split.train.exogenous_count(), 2);
}

#[test]
fn test_read_data_missing_file() {
    let dir = tempdir().unwrap();

    let result = read_data(dir.path(), "PJM", TestPeriod::Years(2));
    match result {
        Err(ForecastError::DataError(message)) => assert!(message.contains("PJM.csv")),
        other => panic!("Expected DataError, got {:?}", other.map(|_| ())),
    }
    assert!(!Path::new(&dir.path().join("PJM.csv")).exists());
}
