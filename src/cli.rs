//! CLI definition and dispatch.

use chrono::{NaiveDateTime, Timelike};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::adapters::csv_feed_adapter::read_daily_csv;
use crate::adapters::feed_factory::registry_from_config;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_asset_cache::InMemoryAssetCache;
use crate::adapters::system_clock::SystemClock;
use crate::domain::asset::parse_fqn_list;
use crate::domain::atr::compute_atr;
use crate::domain::error::TrendstopError;
use crate::domain::portfolio::{correlations_for_ids, prices_for_ids, stops_for_ids};
use crate::domain::resample::resample;
use crate::domain::resolution::Resolution;
use crate::domain::series::OhlcSeries;
use crate::domain::strategy::StrategySettings;
use crate::domain::trailing_stop::compute_trailing_stop;
use crate::ports::clock_port::ClockPort;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LOG_FILTER: &str = "trendstop=info,warn";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";

#[derive(Parser, Debug)]
#[command(name = "trendstop", about = "ATR trailing stops over normalized broker data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Latest trailing stop for each asset (e.g. AV:5269 CMC:X-ABC)
    Stop {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(required = true)]
        assets: Vec<String>,
    },
    /// Current price and daily change for each asset
    Price {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(required = true)]
        assets: Vec<String>,
    },
    /// Print a daily CSV augmented with ATR (and stop when a multiplier is given)
    Atr {
        #[arg(long)]
        csv: PathBuf,
        #[arg(short, long, default_value_t = 21)]
        periods: usize,
        #[arg(short, long)]
        multiplier: Option<f64>,
        #[arg(short, long, default_value = "day")]
        resolution: Resolution,
    },
    /// Resample a daily CSV to weekly or monthly bars
    Resample {
        #[arg(long)]
        csv: PathBuf,
        #[arg(short, long)]
        resolution: Resolution,
    },
    /// Clustered correlation matrix of daily returns, `;`-separated
    Correlations {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(required = true)]
        assets: Vec<String>,
        /// Extra assets appended after clustering
        #[arg(short, long, value_delimiter = ',')]
        external: Vec<String>,
    },
    /// Start the HTTP API
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), TrendstopError> {
    match cli.command {
        Command::Stop { config, assets } => run_stop(&config, &assets),
        Command::Price { config, assets } => run_price(&config, &assets),
        Command::Atr {
            csv,
            periods,
            multiplier,
            resolution,
        } => run_atr(&csv, periods, multiplier, resolution),
        Command::Resample { csv, resolution } => run_resample(&csv, resolution),
        Command::Correlations {
            config,
            assets,
            external,
        } => run_correlations(&config, &assets, &external),
        Command::Serve { config } => run_serve(&config),
    }
}

/// Installs the global subscriber once. `RUST_LOG` wins over the config's
/// `[log] filter`, which wins over the default.
pub fn init_logging(config_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TrendstopError> {
    let config = FileConfigAdapter::from_file(path)?;
    init_logging(config.get_string("log", "filter").as_deref());
    Ok(config)
}

fn read_csv_series(path: &Path) -> Result<OhlcSeries, TrendstopError> {
    init_logging(None);
    let content = fs::read_to_string(path)?;
    read_daily_csv(&content, &path.display().to_string())
}

fn run_stop(config_path: &Path, assets: &[String]) -> Result<(), TrendstopError> {
    let config = load_config(config_path)?;
    let registry = registry_from_config(&config)?;
    let settings = StrategySettings::from_config(&config)?;
    let cache = InMemoryAssetCache::new();

    let ids = parse_fqn_list(&assets.join(","));
    let stops = stops_for_ids(&ids, &cache, &registry, &settings, SystemClock.now());
    for stop in &stops {
        println!("{}\t{}", stop.fqn_id, stop.stop_loss_atr);
    }

    if stops.len() < ids.len() {
        eprintln!("{} of {} assets skipped", ids.len() - stops.len(), ids.len());
    }
    Ok(())
}

fn run_price(config_path: &Path, assets: &[String]) -> Result<(), TrendstopError> {
    let config = load_config(config_path)?;
    let registry = registry_from_config(&config)?;
    let cache = InMemoryAssetCache::new();

    let ids = parse_fqn_list(&assets.join(","));
    let prices = prices_for_ids(&ids, &cache, &registry);
    for p in &prices {
        println!(
            "{}\t{}\t{}\t{:.2}%",
            p.fqn_id, p.price.last, p.price.change, p.price.change_pct
        );
    }

    if prices.len() < ids.len() {
        eprintln!("{} of {} assets skipped", ids.len() - prices.len(), ids.len());
    }
    Ok(())
}

fn run_atr(
    csv_path: &Path,
    periods: usize,
    multiplier: Option<f64>,
    resolution: Resolution,
) -> Result<(), TrendstopError> {
    let series = resample(&read_csv_series(csv_path)?, resolution);
    print!("{}", atr_table(&series, periods, multiplier)?);
    Ok(())
}

fn run_resample(csv_path: &Path, resolution: Resolution) -> Result<(), TrendstopError> {
    let series = resample(&read_csv_series(csv_path)?, resolution);
    print!("{}", series_table(&series)?);
    Ok(())
}

fn run_correlations(
    config_path: &Path,
    assets: &[String],
    external: &[String],
) -> Result<(), TrendstopError> {
    let config = load_config(config_path)?;
    let registry = registry_from_config(&config)?;
    let cache = InMemoryAssetCache::new();

    let portfolio = parse_fqn_list(&assets.join(","));
    let external = parse_fqn_list(&external.join(","));
    let matrix = correlations_for_ids(&portfolio, &external, &cache, &registry)?;
    print!("{}", matrix.to_csv(b';')?);
    Ok(())
}

fn run_serve(config_path: &Path) -> Result<(), TrendstopError> {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::net::SocketAddr;
        use std::sync::Arc;
        use tracing::info;

        let config = load_config(config_path)?;
        let listen = config
            .get_string("web", "listen")
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let addr: SocketAddr = listen.parse().map_err(|e| TrendstopError::ConfigInvalid {
            section: "web".to_string(),
            key: "listen".to_string(),
            reason: format!("{listen:?}: {e}"),
        })?;

        let state = AppState {
            registry: registry_from_config(&config)?,
            cache: Arc::new(InMemoryAssetCache::new()),
            settings: StrategySettings::from_config(&config)?,
            clock: Arc::new(SystemClock),
        };
        let router = build_router(state);

        info!(%addr, "starting web server");
        tokio::runtime::Runtime::new()?.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await
        })?;
        Ok(())
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        Err(TrendstopError::ConfigInvalid {
            section: "web".to_string(),
            key: "listen".to_string(),
            reason: "built without the `web` feature".to_string(),
        })
    }
}

fn format_time(time: NaiveDateTime) -> String {
    if time.num_seconds_from_midnight() == 0 {
        time.date().to_string()
    } else {
        time.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String, TrendstopError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| TrendstopError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| TrendstopError::Io(std::io::Error::other(e)))
}

/// `date,open,high,low,close` rows.
pub fn series_table(series: &OhlcSeries) -> Result<String, TrendstopError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["date", "open", "high", "low", "close"])
        .map_err(|e| TrendstopError::Io(e.into()))?;
    for bar in series.bars() {
        writer
            .write_record([
                format_time(bar.time),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
            ])
            .map_err(|e| TrendstopError::Io(e.into()))?;
    }
    into_string(writer)
}

/// Bars plus `true_range,atr`, and `stop_distance,stop` when a multiplier is
/// given. Undefined values are empty.
pub fn atr_table(
    series: &OhlcSeries,
    periods: usize,
    multiplier: Option<f64>,
) -> Result<String, TrendstopError> {
    let atr = compute_atr(series, periods);
    let stops = match multiplier {
        Some(m) => Some(compute_trailing_stop(series, periods, m)?),
        None => None,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["date", "open", "high", "low", "close", "true_range", "atr"];
    if stops.is_some() {
        header.extend(["stop_distance", "stop"]);
    }
    writer
        .write_record(&header)
        .map_err(|e| TrendstopError::Io(e.into()))?;

    for (i, row) in atr.rows.iter().enumerate() {
        let bar = row.bar;
        let mut record = vec![
            format_time(bar.time),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            optional(row.true_range),
            optional(row.atr),
        ];
        if let Some(stops) = &stops {
            let stop_row = &stops.rows[i];
            record.push(optional(stop_row.stop_distance));
            record.push(optional(stop_row.stop));
        }
        writer
            .write_record(&record)
            .map_err(|e| TrendstopError::Io(e.into()))?;
    }
    into_string(writer)
}
