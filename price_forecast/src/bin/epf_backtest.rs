//! # Backtest the LEAR model on the last two years of PJM
//! epf_backtest --dataset PJM --years-test 2 --calibration-window 1456
//!
//! # Explicit test range with the naive benchmark
//! epf_backtest --dataset NP --model naive --begin-test-date "01/01/2017 00:00" --end-test-date "31/12/2017 23:00"
//!
//! # Start from a saved configuration
//! epf_backtest --config runs/pjm.json

use anyhow::{Context, Result};
use clap::Parser;
use price_forecast::data::read_data;
use price_forecast::output::{ForecastWriter, RunSummary};
use price_forecast::{BacktestConfig, ConsoleProgress, ModelKind, WalkForwardBacktest};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "epf_backtest")]
#[command(about = "Walk-forward backtest of day-ahead electricity price forecasts")]
#[command(version)]
struct Cli {
    /// Market under study, or a CSV file name inside the datasets directory
    #[arg(long)]
    dataset: Option<String>,

    /// Number of years (a year is 364 days) in the test dataset
    #[arg(long)]
    years_test: Option<usize>,

    /// Number of days used in the training dataset for recalibration
    #[arg(long)]
    calibration_window: Option<usize>,

    /// First day of the test dataset (format: d/m/Y H:M)
    #[arg(long)]
    begin_test_date: Option<String>,

    /// Last hour of the test dataset (format: d/m/Y H:M)
    #[arg(long)]
    end_test_date: Option<String>,

    /// Folder holding the dataset CSV files
    #[arg(long)]
    datasets_dir: Option<PathBuf>,

    /// Folder receiving forecast files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Append-only diagnostic log
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Forecasting model
    #[arg(long, value_enum)]
    model: Option<ModelKind>,

    /// JSON configuration to start from; other flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn resolve(self) -> Result<BacktestConfig> {
        let mut config = match &self.config {
            Some(path) => BacktestConfig::from_json_file(path)
                .with_context(|| format!("reading configuration {}", path.display()))?,
            None => BacktestConfig::default(),
        };

        if let Some(dataset) = self.dataset {
            config.dataset = dataset;
        }
        if let Some(years) = self.years_test {
            config.years_test = years;
        }
        if let Some(window) = self.calibration_window {
            config.calibration_window = window;
        }
        if self.begin_test_date.is_some() {
            config.begin_test_date = self.begin_test_date;
        }
        if self.end_test_date.is_some() {
            config.end_test_date = self.end_test_date;
        }
        if let Some(dir) = self.datasets_dir {
            config.datasets_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = log_file;
        }
        if let Some(model) = self.model {
            config.model = model;
        }

        Ok(config)
    }
}

fn init_tracing(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn log_system_info(config: &BacktestConfig) {
    info!(
        name = price_forecast::NAME,
        version = price_forecast::VERSION,
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        executable = ?std::env::current_exe().ok(),
        args = ?std::env::args().collect::<Vec<_>>(),
        "System info"
    );
    info!(
        dataset = %config.dataset,
        years_test = config.years_test,
        calibration_window = config.calibration_window,
        model = ?config.model,
        "Run configuration"
    );
}

fn run(config: &BacktestConfig) -> Result<()> {
    config.validate()?;

    let split = read_data(&config.datasets_dir, &config.dataset, config.test_period()?)
        .with_context(|| format!("loading dataset {}", config.dataset))?;
    info!(
        train_rows = split.train.len(),
        test_rows = split.test.len(),
        "Dataset loaded"
    );

    let model = config.build_model()?;
    let model_name = model.name().to_string();
    let forecast_path = config.forecast_file_path();

    let mut backtest = WalkForwardBacktest::new(model, ConsoleProgress);
    let outcome = backtest.run_with_failure_handler(
        &split.train,
        &split.test,
        config.calibration_window,
        |session, _| {
            ForecastWriter::write_partial(session.forecasts(), &forecast_path);
        },
    )?;

    ForecastWriter::write_csv(&outcome.forecasts, &forecast_path)
        .with_context(|| format!("writing {}", forecast_path.display()))?;

    let summary = RunSummary::new(&model_name, config, &outcome.forecasts, &outcome.metrics);
    ForecastWriter::write_summary(&summary, config.summary_file_path())?;

    print!("{}", outcome.metrics);
    info!(
        path = %forecast_path.display(),
        mae = outcome.metrics.mae,
        smape_pct = outcome.metrics.smape_pct,
        "Forecasts written"
    );
    Ok(())
}

fn handle_error(err: &anyhow::Error) {
    let message = format!("An error occurred: {:#}", err);
    eprintln!("{}", message);
    error!("{}", message);
    for (depth, cause) in err.chain().enumerate() {
        error!(depth, "{}", cause);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("An error occurred: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing(&config.log_file) {
        eprintln!("An error occurred: {:#}", err);
        return ExitCode::FAILURE;
    }
    log_system_info(&config);

    match run(&config) {
        Ok(()) => {
            info!("Run completed successfully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            handle_error(&err);
            ExitCode::FAILURE
        }
    }
}
