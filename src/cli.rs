//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report::JsonReport;
use crate::adapters::text_report::TextReport;
use crate::domain::backtest::{
    simulate_backtest, BacktestConfig, DEFAULT_INITIAL_INVESTMENT, DEFAULT_LONG_WINDOW,
    DEFAULT_SHORT_WINDOW,
};
use crate::domain::config_validation::{parse_date, validate_backtest_config};
use crate::domain::error::MacrossError;
use crate::domain::portfolio::CrossoverPolicy;
use crate::logging::{init_logging, LogFormat};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceSeriesPort;
use crate::ports::report_port::{BacktestReport, ReportPort};

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "macross", about = "Moving-average crossover backtester")]
pub struct Cli {
    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest for one symbol
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: Overrides,
        /// Include the trade list in the report
        #[arg(long)]
        trades: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in a CSV data directory
    ListSymbols {
        #[arg(long)]
        data_dir: PathBuf,
    },
    /// Show the date range and point count for a symbol
    Info {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        data_dir: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct Overrides {
    #[arg(long)]
    pub symbol: Option<String>,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub initial_investment: Option<f64>,
    #[arg(long)]
    pub short_window: Option<usize>,
    #[arg(long)]
    pub long_window: Option<usize>,
    /// golden | inverted
    #[arg(long)]
    pub crossover: Option<String>,
    #[arg(long)]
    pub start_date: Option<String>,
    #[arg(long)]
    pub end_date: Option<String>,
    /// text | json
    #[arg(long)]
    pub format: Option<String>,
}

/// A config file with command-line overrides layered on top.
pub struct LayeredConfig<'a> {
    base: &'a dyn ConfigPort,
    overrides: Vec<(&'static str, &'static str, String)>,
}

impl<'a> LayeredConfig<'a> {
    pub fn new(base: &'a dyn ConfigPort, overrides: &Overrides) -> Self {
        let mut layered = Vec::new();
        let mut set = |section: &'static str, key: &'static str, value: Option<String>| {
            if let Some(v) = value {
                layered.push((section, key, v));
            }
        };
        set("backtest", "symbol", overrides.symbol.clone());
        set(
            "data",
            "dir",
            overrides.data_dir.as_ref().map(|p| p.display().to_string()),
        );
        set(
            "backtest",
            "initial_investment",
            overrides.initial_investment.map(|v| v.to_string()),
        );
        set(
            "backtest",
            "short_window",
            overrides.short_window.map(|v| v.to_string()),
        );
        set(
            "backtest",
            "long_window",
            overrides.long_window.map(|v| v.to_string()),
        );
        set("backtest", "crossover", overrides.crossover.clone());
        set("backtest", "start_date", overrides.start_date.clone());
        set("backtest", "end_date", overrides.end_date.clone());
        set("report", "format", overrides.format.clone());

        Self {
            base,
            overrides: layered,
        }
    }

    fn overridden(&self, section: &str, key: &str) -> Option<&String> {
        self.overrides
            .iter()
            .find(|(s, k, _)| *s == section && *k == key)
            .map(|(_, _, v)| v)
    }
}

impl ConfigPort for LayeredConfig<'_> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.overridden(section, key)
            .cloned()
            .or_else(|| self.base.get_string(section, key))
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.overridden(section, key) {
            Some(v) => v.trim().parse().unwrap_or(default),
            None => self.base.get_int(section, key, default),
        }
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        match self.overridden(section, key) {
            Some(v) => v.trim().parse().unwrap_or(default),
            None => self.base.get_double(section, key, default),
        }
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.base.get_bool(section, key, default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Fully resolved inputs for one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestSettings {
    pub symbol: String,
    pub data_dir: PathBuf,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub config: BacktestConfig,
    pub format: ReportFormat,
    pub show_trades: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(&cli.log_level, cli.log_format);

    let result = match cli.command {
        Command::Backtest {
            config,
            overrides,
            trades,
            output,
        } => run_backtest(config.as_deref(), &overrides, trades, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data_dir } => run_list_symbols(&data_dir),
        Command::Info { symbol, data_dir } => run_info(&symbol, &data_dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, MacrossError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// Resolves validated settings from a (possibly layered) config.
pub fn build_settings(config: &dyn ConfigPort) -> Result<BacktestSettings, MacrossError> {
    validate_backtest_config(config)?;

    let symbol = config
        .get_string("backtest", "symbol")
        .map(|s| s.trim().to_uppercase())
        .ok_or_else(|| MacrossError::ConfigMissing {
            section: "backtest".into(),
            key: "symbol".into(),
        })?;

    let policy = match config.get_string("backtest", "crossover") {
        Some(s) => s
            .parse::<CrossoverPolicy>()
            .map_err(|reason| MacrossError::config_invalid("backtest", "crossover", reason))?,
        None => CrossoverPolicy::default(),
    };

    let format = match config
        .get_string("report", "format")
        .map(|s| s.trim().to_lowercase())
        .as_deref()
    {
        Some("json") => ReportFormat::Json,
        _ => ReportFormat::Text,
    };

    let window = |key, default: usize| config.get_int("backtest", key, default as i64) as usize;

    Ok(BacktestSettings {
        symbol,
        data_dir: PathBuf::from(
            config
                .get_string("data", "dir")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        ),
        start_date: parse_date(config, "start_date")?,
        end_date: parse_date(config, "end_date")?,
        config: BacktestConfig {
            initial_investment: config.get_double(
                "backtest",
                "initial_investment",
                DEFAULT_INITIAL_INVESTMENT,
            ),
            short_window: window("short_window", DEFAULT_SHORT_WINDOW),
            long_window: window("long_window", DEFAULT_LONG_WINDOW),
            policy,
        },
        format,
        show_trades: config.get_bool("report", "trades", false),
    })
}

/// Load → compute signals → simulate → summarize, for one symbol.
pub fn run_backtest_pipeline(
    data_port: &dyn PriceSeriesPort,
    settings: &BacktestSettings,
) -> Result<BacktestReport, MacrossError> {
    let prices = data_port.fetch_prices(&settings.symbol, settings.start_date, settings.end_date)?;
    let (Some(first), Some(last)) = (prices.first(), prices.last()) else {
        return Err(MacrossError::NoData {
            symbol: settings.symbol.clone(),
        });
    };
    tracing::info!(
        symbol = %settings.symbol,
        points = prices.len(),
        start = %first.date,
        end = %last.date,
        "loaded price series"
    );

    tracing::info!(
        short_window = settings.config.short_window,
        long_window = settings.config.long_window,
        crossover = %settings.config.policy,
        initial_investment = settings.config.initial_investment,
        "running backtest"
    );
    let (simulation, result) = simulate_backtest(&prices, &settings.config)?;
    tracing::info!(
        trades = result.trade_count,
        total_return_pct = result.total_return_pct,
        max_drawdown_pct = result.max_drawdown_pct,
        "backtest complete"
    );

    Ok(BacktestReport {
        symbol: settings.symbol.clone(),
        config: settings.config.clone(),
        start_date: first.date,
        end_date: last.date,
        points: prices.len(),
        result,
        trades: simulation.trades,
    })
}

pub fn reporter_for(settings: &BacktestSettings) -> Box<dyn ReportPort> {
    match settings.format {
        ReportFormat::Text => Box::new(TextReport::new(settings.show_trades)),
        ReportFormat::Json => Box::new(JsonReport::new(settings.show_trades)),
    }
}

fn run_backtest(
    config_path: Option<&Path>,
    overrides: &Overrides,
    trades: bool,
    output_path: Option<&Path>,
) -> Result<(), MacrossError> {
    let file_config = match config_path {
        Some(path) => load_config(path)?,
        None => FileConfigAdapter::empty(),
    };
    let layered = LayeredConfig::new(&file_config, overrides);

    let mut settings = build_settings(&layered)?;
    settings.show_trades |= trades;

    let data_port = CsvAdapter::new(settings.data_dir.clone());
    let report = run_backtest_pipeline(&data_port, &settings)?;
    let reporter = reporter_for(&settings);

    match output_path {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            reporter.write(&report, &mut out)?;
            out.flush()?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            reporter.write(&report, &mut out)?;
        }
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), MacrossError> {
    let adapter = load_config(config_path)?;
    let settings = build_settings(&adapter)?;

    eprintln!("Symbol:        {}", settings.symbol);
    eprintln!("Data dir:      {}", settings.data_dir.display());
    eprintln!(
        "Windows:       SMA({}) / SMA({})",
        settings.config.short_window, settings.config.long_window
    );
    eprintln!("Crossover:     {}", settings.config.policy);
    eprintln!("Investment:    {:.2}", settings.config.initial_investment);
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(data_dir: &Path) -> Result<(), MacrossError> {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let symbols = adapter.list_symbols()?;

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_info(symbol: &str, data_dir: &Path) -> Result<(), MacrossError> {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let symbol = symbol.to_uppercase();
    match adapter.get_data_range(&symbol)? {
        Some((first, last, count)) => {
            println!("{}: {} points, {} to {}", symbol, count, first, last);
            Ok(())
        }
        None => Err(MacrossError::NoData { symbol }),
    }
}
