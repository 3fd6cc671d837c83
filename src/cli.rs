//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::validate_forecast_config;
use crate::domain::error::PricecastError;
use crate::domain::features::FEATURE_NAMES;
use crate::domain::forecast::{
    load_history, run_forecast, ForecastOutcome, ForecastRequest, ForecastSettings, History,
    DEFAULT_HISTORY_DAYS, DEFAULT_LOOKBACK_DAYS, DEFAULT_MIN_TRAINING_ROWS,
};
use crate::domain::forest::{ForestConfig, RandomForest};
use crate::domain::summary::{round_price, DEFAULT_THRESHOLD_PCT};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "pricecast", about = "Short-horizon stock price forecaster", version)]
pub struct Cli {
    /// Log verbosity (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Forecast closing prices over a date range
    Predict {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Read <SYMBOL>.csv files from this directory instead of Yahoo
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Treat this date as today (defaults to the local date)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Also write the price table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the engineered training rows used for a forecast starting on --start
    Features {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.log_level);

    match cli.command {
        Command::Predict {
            symbol,
            start,
            end,
            config,
            data_dir,
            as_of,
            output,
        } => run_predict(
            &symbol,
            start,
            end,
            config.as_ref(),
            data_dir.as_deref(),
            as_of,
            output.as_deref(),
        ),
        Command::Features {
            symbol,
            start,
            config,
            data_dir,
        } => run_features(&symbol, start, config.as_ref(), data_dir.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Install the stderr subscriber. A second call (as in tests) is a no-op.
pub fn init_tracing(level: tracing::Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PricecastError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Load and validate `path`, or fall back to an empty configuration.
fn load_validated_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading config");
            load_config(p)?
        }
        None => FileConfigAdapter::empty(),
    };
    if let Err(e) = validate_forecast_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }
    Ok(adapter)
}

fn usize_setting(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    usize::try_from(config.get_int(section, key, default as i64)).unwrap_or(default)
}

pub fn build_forecast_settings(config: &dyn ConfigPort) -> ForecastSettings {
    ForecastSettings {
        lookback_days: u32::try_from(config.get_int(
            "forecast",
            "lookback_days",
            i64::from(DEFAULT_LOOKBACK_DAYS),
        ))
        .unwrap_or(DEFAULT_LOOKBACK_DAYS),
        history_days: usize_setting(config, "forecast", "history_days", DEFAULT_HISTORY_DAYS),
        min_training_rows: usize_setting(
            config,
            "forecast",
            "min_training_rows",
            DEFAULT_MIN_TRAINING_ROWS,
        ),
        threshold_pct: config.get_double("forecast", "threshold_pct", DEFAULT_THRESHOLD_PCT),
    }
}

/// Zero for `max_depth` or `max_features` means "no limit".
pub fn build_forest_config(config: &dyn ConfigPort) -> ForestConfig {
    let defaults = ForestConfig::default();
    let max_depth = usize_setting(config, "model", "max_depth", 0);
    let max_features = usize_setting(config, "model", "max_features", 0);
    ForestConfig {
        n_trees: usize_setting(config, "model", "n_estimators", defaults.n_trees),
        max_depth: (max_depth > 0).then_some(max_depth),
        min_samples_split: usize_setting(
            config,
            "model",
            "min_samples_split",
            defaults.min_samples_split,
        ),
        min_samples_leaf: usize_setting(
            config,
            "model",
            "min_samples_leaf",
            defaults.min_samples_leaf,
        ),
        max_features: (max_features > 0).then_some(max_features),
        bootstrap: defaults.bootstrap,
        seed: u64::try_from(config.get_int("model", "seed", defaults.seed as i64))
            .unwrap_or(defaults.seed),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Csv(PathBuf),
    Yahoo,
}

/// `--data-dir` wins; otherwise `[data] source`, then `[data] data_dir`,
/// then Yahoo.
pub fn resolve_data_source(
    config: &dyn ConfigPort,
    data_dir_override: Option<&Path>,
) -> Result<DataSource, PricecastError> {
    if let Some(dir) = data_dir_override {
        return Ok(DataSource::Csv(dir.to_path_buf()));
    }
    let data_dir = config
        .get_string("data", "data_dir")
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from);
    let source = config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase());

    match (source.as_deref(), data_dir) {
        (Some("yahoo"), _) => Ok(DataSource::Yahoo),
        (Some("csv") | None, Some(dir)) => Ok(DataSource::Csv(dir)),
        (Some("csv"), None) => Err(PricecastError::ConfigMissing {
            section: "data".into(),
            key: "data_dir".into(),
        }),
        (None, None) => Ok(DataSource::Yahoo),
        (Some(other), _) => Err(PricecastError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown source '{}'", other),
        }),
    }
}

pub fn open_data_port(source: &DataSource) -> Result<Box<dyn DataPort>, PricecastError> {
    match source {
        DataSource::Csv(dir) => {
            tracing::info!(dir = %dir.display(), "using csv data source");
            Ok(Box::new(CsvAdapter::new(dir.clone())))
        }
        #[cfg(feature = "yahoo")]
        DataSource::Yahoo => {
            tracing::info!("using yahoo finance data source");
            Ok(Box::new(crate::adapters::yahoo_adapter::YahooAdapter::new()))
        }
        #[cfg(not(feature = "yahoo"))]
        DataSource::Yahoo => Err(PricecastError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "built without the yahoo feature; use --data-dir".into(),
        }),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn run_predict(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    config_path: Option<&PathBuf>,
    data_dir: Option<&Path>,
    as_of: Option<NaiveDate>,
    output: Option<&Path>,
) -> ExitCode {
    let config = match load_validated_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let request = match ForecastRequest::new(symbol, start, end, as_of.unwrap_or_else(today)) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = match resolve_data_source(&config, data_dir).and_then(|s| open_data_port(&s)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let settings = build_forecast_settings(&config);
    let mut model = RandomForest::new(build_forest_config(&config));

    let outcome = match run_forecast(data_port.as_ref(), &mut model, &request, &settings) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print!("{}", format_outcome(&request, &outcome));

    let output_path = output
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));
    if let Some(path) = output_path {
        if let Err(e) = CsvReportAdapter::new().write(&outcome, &path) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Report written to {}", path.display());
    }

    ExitCode::SUCCESS
}

fn signed(value: f64) -> String {
    format!("{:+.2}", value)
}

/// Render the warnings, the record table and the summary block.
pub fn format_outcome(request: &ForecastRequest, outcome: &ForecastOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Forecast for {} ({} to {}), trained on {} rows",
        outcome.symbol, request.start, request.end, outcome.training_rows
    );
    for warning in &outcome.warnings {
        let _ = writeln!(out, "Warning: {warning}");
    }

    let Some(summary) = &outcome.summary else {
        let _ = writeln!(out, "\nNo data available for the selected range.");
        return out;
    };

    let _ = writeln!(out, "\n{:<12}{:>12}  {}", "Date", "Price", "Kind");
    for record in &outcome.records {
        let _ = writeln!(
            out,
            "{:<12}{:>12.2}  {}",
            record.date.format("%Y-%m-%d").to_string(),
            round_price(record.price),
            record.kind
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Reference price: {:.2}", summary.reference_price);
    let _ = writeln!(out, "Final price:     {:.2}", summary.final_price);
    let _ = writeln!(out, "Difference:      {}", signed(summary.difference));
    let _ = writeln!(out, "Move:            {}%", signed(summary.percent_move));
    let _ = writeln!(out, "Recommendation:  {}", summary.recommendation);
    out
}

fn run_features(
    symbol: &str,
    start: NaiveDate,
    config_path: Option<&PathBuf>,
    data_dir: Option<&Path>,
) -> ExitCode {
    let config = match load_validated_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let end = start.succ_opt().unwrap_or(start);
    let request = match ForecastRequest::new(symbol, start, end, today()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = match resolve_data_source(&config, data_dir).and_then(|s| open_data_port(&s)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let settings = build_forecast_settings(&config);
    match load_history(data_port.as_ref(), &request, &settings) {
        Ok(history) => {
            print!("{}", format_history(&history));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Training rows as a table (features then target) plus the column means the
/// projection resets to.
pub fn format_history(history: &History) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<12}", "date");
    for name in FEATURE_NAMES {
        let _ = write!(out, "{:>18}", name);
    }
    let _ = writeln!(out, "{:>18}", "target");

    for sample in &history.training.samples {
        let _ = write!(out, "{:<12}", sample.date.format("%Y-%m-%d").to_string());
        for value in sample.features.to_array() {
            let _ = write!(out, "{:>18.4}", value);
        }
        let _ = writeln!(out, "{:>18.4}", sample.target);
    }

    let means = history.means();
    let _ = writeln!(
        out,
        "\n{} bars, {} training rows",
        history.bars.len(),
        history.training.len()
    );
    let _ = writeln!(out, "Means used for projection:");
    for (name, value) in [
        ("return", means.ret),
        ("moving_average_5", means.moving_average_5),
        ("volatility_5", means.volatility_5),
        ("rsi_14", means.rsi_14),
        ("macd", means.macd),
        ("volume", means.volume),
    ] {
        let _ = writeln!(out, "  {:<18}{:.4}", name, value);
    }
    out
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_forecast_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let source = match resolve_data_source(&config, None) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let settings = build_forecast_settings(&config);
    let forest = build_forest_config(&config);

    let source_label = match &source {
        DataSource::Csv(dir) => format!("csv ({})", dir.display()),
        DataSource::Yahoo => "yahoo".to_string(),
    };

    eprintln!("\nData source:       {}", source_label);
    eprintln!("Lookback days:     {}", settings.lookback_days);
    eprintln!("History days:      {}", settings.history_days);
    eprintln!("Min training rows: {}", settings.min_training_rows);
    eprintln!("Threshold:         {}%", settings.threshold_pct);
    eprintln!("Trees:             {}", forest.n_trees);
    eprintln!("Seed:              {}", forest.seed);

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
