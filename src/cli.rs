//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_date, read_policy, validate_backtest_config, validate_strategy_config,
    DEFAULT_INITIAL_CAPITAL, DEFAULT_LONG_WINDOW, DEFAULT_SHORT_WINDOW,
};
use crate::domain::error::SmacrossError;
use crate::domain::metrics::{format_currency, format_percent, Metrics};
use crate::domain::moving_average::Windows;
use crate::domain::portfolio::SimulationSettings;
use crate::domain::universe::{parse_instruments, validate_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_CURRENCY: &str = "£";

#[derive(Parser, Debug)]
#[command(name = "smacross", about = "Moving-average crossover backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding one <SYMBOL>.csv per instrument
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        /// Comma separated instruments, overriding the config
        #[arg(short, long)]
        instruments: Option<String>,
        /// Print every buy/sell event
        #[arg(long)]
        events: bool,
    },
    /// Validate a configuration without running it
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List instruments available in a data directory
    ListInstruments {
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show data range for instrument(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        instrument: Option<String>,
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

/// How the summary is printed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub currency: String,
    pub show_events: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            show_events: false,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            instruments,
            events,
        } => run_backtest(&config, data_dir.as_deref(), instruments.as_deref(), events),
        Command::Validate { config } => run_validate(&config),
        Command::ListInstruments { data_dir, config } => {
            run_list_instruments(data_dir.as_deref(), config.as_deref())
        }
        Command::Info {
            config,
            instrument,
            data_dir,
        } => run_info(&config, instrument.as_deref(), data_dir.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

fn fail(err: SmacrossError) -> ExitCode {
    error!("{err}");
    (&err).into()
}

fn run_backtest(
    config_path: &Path,
    data_dir_override: Option<&Path>,
    instruments_override: Option<&str>,
    show_events: bool,
) -> ExitCode {
    info!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let instruments = match resolve_instruments(instruments_override, &adapter) {
        Ok(i) => i,
        Err(e) => return fail(e),
    };

    let mut report = build_report_settings(&adapter);
    report.show_events |= show_events;

    let data_dir = resolve_data_dir(data_dir_override, Some(&adapter as &dyn ConfigPort));
    info!("Reading prices from {}", data_dir.display());
    let data_port = CsvAdapter::new(data_dir);

    run_backtest_pipeline(&data_port, &bt_config, &instruments, &report)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SmacrossError> {
    let start_date = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    let short = adapter.get_int("strategy", "short_window", DEFAULT_SHORT_WINDOW);
    let long = adapter.get_int("strategy", "long_window", DEFAULT_LONG_WINDOW);
    let windows = Windows::new(
        usize::try_from(short).unwrap_or(0),
        usize::try_from(long).unwrap_or(0),
    )?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        windows,
        warmup: read_policy(adapter, "strategy", "warmup")?,
        simulation: SimulationSettings {
            position_mode: read_policy(adapter, "strategy", "position_mode")?,
            cash_accounting: read_policy(adapter, "strategy", "cash_accounting")?,
        },
        alignment: read_policy(adapter, "backtest", "date_alignment")?,
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.0),
    })
}

pub fn build_report_settings(adapter: &dyn ConfigPort) -> ReportSettings {
    let currency = adapter
        .get_string("backtest", "currency")
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    ReportSettings {
        currency,
        show_events: adapter.get_bool("backtest", "events", false),
    }
}

/// Instruments from the command line if given, otherwise from `[backtest]`.
pub fn resolve_instruments(
    instruments_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, SmacrossError> {
    let (raw, source) = match instruments_override {
        Some(list) => (list.to_string(), "--instruments"),
        None => match config.get_string("backtest", "instruments") {
            Some(list) => (list, "instruments"),
            None => {
                return Err(SmacrossError::ConfigMissing {
                    section: "backtest".into(),
                    key: "instruments".into(),
                })
            }
        },
    };

    parse_instruments(&raw).map_err(|e| SmacrossError::ConfigInvalid {
        section: "backtest".into(),
        key: source.into(),
        reason: e.to_string(),
    })
}

pub fn resolve_data_dir(
    data_dir_override: Option<&Path>,
    config: Option<&dyn ConfigPort>,
) -> PathBuf {
    if let Some(dir) = data_dir_override {
        return dir.to_path_buf();
    }
    config
        .and_then(|c| c.get_string("backtest", "data_dir"))
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    instruments: &[String],
    report: &ReportSettings,
) -> ExitCode {
    info!(
        "Fetching {} instruments, {} to {}",
        instruments.len(),
        bt_config.start_date,
        bt_config.end_date
    );
    let validation = match validate_universe(
        data_port,
        instruments.to_vec(),
        bt_config.start_date,
        bt_config.end_date,
    ) {
        Ok(v) => v,
        Err(e) => return fail(e),
    };

    info!(
        "Running backtest: {} instruments, windows {}/{}, warmup {}, {} / {}",
        validation.universe.count(),
        bt_config.windows.short,
        bt_config.windows.long,
        bt_config.warmup,
        bt_config.simulation.position_mode,
        bt_config.simulation.cash_accounting,
    );

    let result = match backtest_engine::run_backtest(validation.series, bt_config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    info!("  Processed: {} dates", result.dates.len());

    let metrics = result.metrics(bt_config.risk_free_rate);
    for line in summary_lines(&result, &metrics, &report.currency) {
        println!("{line}");
    }
    if report.show_events {
        println!();
        for line in event_lines(&result) {
            println!("{line}");
        }
    }

    ExitCode::SUCCESS
}

/// The reported summary: final value and cumulative return first, then the
/// supplementary metrics.
pub fn summary_lines(result: &BacktestResult, metrics: &Metrics, currency: &str) -> Vec<String> {
    vec![
        format!(
            "Final Portfolio Value: {}",
            format_currency(result.summary.final_value, currency)
        ),
        format!(
            "Cumulative Returns: {}",
            format_percent(result.summary.cumulative_return)
        ),
        format!("Annualized Return: {}", format_percent(metrics.annualized_return)),
        format!("Sharpe Ratio: {:.2}", metrics.sharpe_ratio),
        format!("Sortino Ratio: {:.2}", metrics.sortino_ratio),
        format!(
            "Max Drawdown: {} over {} days",
            format_percent(metrics.max_drawdown),
            metrics.max_drawdown_duration
        ),
        format!(
            "Signals: {} buy, {} sell",
            metrics.buy_events, metrics.sell_events
        ),
    ]
}

pub fn event_lines(result: &BacktestResult) -> Vec<String> {
    result
        .trade_events()
        .iter()
        .map(|e| format!("{}  {:<4}  {}  {:.2}", e.date, e.kind, e.instrument, e.price))
        .collect()
}

fn run_validate(config_path: &Path) -> ExitCode {
    info!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let instruments = match resolve_instruments(None, &adapter) {
        Ok(i) => i,
        Err(e) => return fail(e),
    };
    let report = build_report_settings(&adapter);

    println!("Period:          {} to {}", bt_config.start_date, bt_config.end_date);
    println!(
        "Initial capital: {}",
        format_currency(bt_config.initial_capital, &report.currency)
    );
    println!("Instruments:     {}", instruments.join(", "));
    println!(
        "Windows:         short {} / long {}",
        bt_config.windows.short, bt_config.windows.long
    );
    println!("Warmup:          {}", bt_config.warmup);
    println!("Position mode:   {}", bt_config.simulation.position_mode);
    println!("Cash accounting: {}", bt_config.simulation.cash_accounting);
    println!("Date alignment:  {}", bt_config.alignment);
    println!(
        "Data dir:        {}",
        resolve_data_dir(None, Some(&adapter as &dyn ConfigPort)).display()
    );

    info!("Configuration is valid");
    ExitCode::SUCCESS
}

fn run_list_instruments(data_dir: Option<&Path>, config_path: Option<&Path>) -> ExitCode {
    let config = match config_path {
        Some(p) => match load_config(p) {
            Ok(c) => Some(c),
            Err(code) => return code,
        },
        None => None,
    };
    let dir = resolve_data_dir(data_dir, config.as_ref().map(|c| c as &dyn ConfigPort));
    let adapter = CsvAdapter::new(dir.clone());

    let instruments = match adapter.list_instruments() {
        Ok(i) => i,
        Err(e) => return fail(e),
    };

    if instruments.is_empty() {
        warn!("No instruments found in {}", dir.display());
    } else {
        for instrument in &instruments {
            println!("{}", instrument);
        }
        info!("{} instruments found", instruments.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, instrument: Option<&str>, data_dir: Option<&Path>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let instruments = match resolve_instruments(instrument, &config) {
        Ok(i) => i,
        Err(e) => return fail(e),
    };

    let adapter = CsvAdapter::new(resolve_data_dir(data_dir, Some(&config as &dyn ConfigPort)));
    for line in data_range_lines(&adapter, &instruments) {
        println!("{line}");
    }
    ExitCode::SUCCESS
}

pub fn data_range_lines(data_port: &dyn DataPort, instruments: &[String]) -> Vec<String> {
    instruments
        .iter()
        .map(|i| match data_port.get_data_range(i) {
            Ok(Some((first, last, count))) => {
                format!("{}: {} prices, {} to {}", i, count, first, last)
            }
            Ok(None) => format!("{}: no data found", i),
            Err(e) => format!("{}: error: {}", i, e),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backtest_command() {
        let cli = Cli::try_parse_from([
            "smacross",
            "backtest",
            "--config",
            "run.ini",
            "--instruments",
            "XLE,USO",
            "--events",
        ])
        .unwrap();

        match cli.command {
            Command::Backtest {
                config,
                data_dir,
                instruments,
                events,
            } => {
                assert_eq!(config, PathBuf::from("run.ini"));
                assert!(data_dir.is_none());
                assert_eq!(instruments.as_deref(), Some("XLE,USO"));
                assert!(events);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_list_instruments_command() {
        let cli = Cli::try_parse_from(["smacross", "list-instruments", "--data-dir", "prices"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::ListInstruments {
                data_dir: Some(d),
                config: None,
            } if d == PathBuf::from("prices")
        ));
    }

    #[test]
    fn backtest_requires_config() {
        assert!(Cli::try_parse_from(["smacross", "backtest"]).is_err());
    }

    #[test]
    fn data_dir_override_wins() {
        let config =
            FileConfigAdapter::from_string("[backtest]\ndata_dir = /srv/prices\n").unwrap();
        let config: &dyn ConfigPort = &config;
        assert_eq!(
            resolve_data_dir(Some(Path::new("local")), Some(config)),
            PathBuf::from("local")
        );
        assert_eq!(resolve_data_dir(None, Some(config)), PathBuf::from("/srv/prices"));
        assert_eq!(resolve_data_dir(None, None), PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn report_settings_defaults() {
        let config = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(build_report_settings(&config), ReportSettings::default());

        let config =
            FileConfigAdapter::from_string("[backtest]\ncurrency = $\nevents = yes\n").unwrap();
        let report = build_report_settings(&config);
        assert_eq!(report.currency, "$");
        assert!(report.show_events);
    }
}
