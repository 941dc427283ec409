mod report;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use cycles_core::{
    display_name, DateRange, IndicatorKind, PipelineConfig, PriceField, PriceSource,
    SmoothingParams, KNOWN_TICKERS,
};
use cycles_data::{CachedPriceSource, CsvPriceSource, YahooPriceSource};
use cycles_indicators::savgol::SavitzkyGolay;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

/// Upper bound of the default date range; Yahoo clips it to today.
const OPEN_END_YEAR: i32 = 2050;

#[derive(Parser)]
#[command(name = "cycles")]
#[command(about = "Market cycles toolkit: technical indicators and monthly seasonality for index and crypto tickers")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Read `<TICKER>.csv` files from this directory instead of Yahoo Finance
    #[arg(long, env = "CYCLES_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute ROC, Z Score, Sharpe, Sortino, MACD and the composite AVG
    Indicators {
        /// Ticker symbol (e.g. "^GSPC", "BTC-USD")
        #[arg(short, long, default_value = "^GSPC")]
        ticker: String,

        /// First year of data (ignored when --start is given)
        #[arg(long, default_value = "2022")]
        start_year: i32,

        /// Exact start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Exclusive end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// TOML file with pipeline settings
        #[arg(short, long, env = "CYCLES_CONFIG")]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Number of most recent rows shown in table output
        #[arg(long, default_value = "20")]
        rows: usize,

        /// Indicator highlighted in the summary (AVG, ROC, Sortino, Sharpe, MACD, Z Score)
        #[arg(long, default_value = "AVG")]
        plot: IndicatorKind,

        #[arg(long)]
        roc_weight: Option<f64>,

        #[arg(long)]
        z_weight: Option<f64>,

        #[arg(long)]
        sharpe_weight: Option<f64>,

        #[arg(long)]
        sortino_weight: Option<f64>,

        #[arg(long)]
        macd_weight: Option<f64>,

        /// Savitzky–Golay window length (odd)
        #[arg(long)]
        window_length: Option<usize>,

        /// Savitzky–Golay polynomial order
        #[arg(long)]
        polyorder: Option<usize>,

        /// Leave AVG and AVG_6 unsmoothed
        #[arg(long, conflicts_with_all = ["window_length", "polyorder"])]
        no_smoothing: bool,
    },

    /// Monthly return heatmap and average monthly performance
    Seasonality {
        #[arg(short, long, default_value = "^GSPC")]
        ticker: String,

        #[arg(long, default_value = "2000")]
        start_year: i32,

        #[arg(long, default_value = "2035")]
        end_year: i32,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Deviation z-score of a ticker's adjusted close next to a reference's close
    Zscore {
        #[arg(short, long, default_value = "^GSPC")]
        ticker: String,

        /// Reference ticker, read as plain close
        #[arg(long, default_value = "^VIX")]
        reference: String,

        /// Rolling window for the basis and the deviation
        #[arg(short, long, default_value = "20")]
        window: usize,

        #[arg(long, default_value = "2022")]
        start_year: i32,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Number of most recent rows shown in table output
        #[arg(long, default_value = "20")]
        rows: usize,
    },

    /// List the tickers the dashboards know about, or the CSV files under --data-dir
    Tickers,
}

/// Flag overrides applied on top of the config file.
#[derive(Default)]
struct PipelineOverrides {
    roc_weight: Option<f64>,
    z_weight: Option<f64>,
    sharpe_weight: Option<f64>,
    sortino_weight: Option<f64>,
    macd_weight: Option<f64>,
    window_length: Option<usize>,
    polyorder: Option<usize>,
    no_smoothing: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let source = build_source(cli.data_dir.as_deref());

    match cli.command {
        Commands::Indicators {
            ticker,
            start_year,
            start,
            end,
            config,
            format,
            rows,
            plot,
            roc_weight,
            z_weight,
            sharpe_weight,
            sortino_weight,
            macd_weight,
            window_length,
            polyorder,
            no_smoothing,
        } => {
            let overrides = PipelineOverrides {
                roc_weight,
                z_weight,
                sharpe_weight,
                sortino_weight,
                macd_weight,
                window_length,
                polyorder,
                no_smoothing,
            };
            let pipeline = load_pipeline_config(config.as_deref(), overrides)?;
            let start = match start {
                Some(date) => date,
                None => NaiveDate::from_ymd_opt(start_year, 1, 1)
                    .with_context(|| format!("Invalid start year {}", start_year))?,
            };
            let end = match end {
                Some(date) => date,
                None => NaiveDate::from_ymd_opt(OPEN_END_YEAR, 1, 1)
                    .context("Invalid default end date")?,
            };
            if start >= end {
                anyhow::bail!("Start date {} must be before end date {}", start, end);
            }
            run_indicators(
                source.as_ref(),
                &ticker,
                DateRange::new(start, end),
                &pipeline,
                format,
                rows,
                plot,
            )
            .await?;
        }
        Commands::Seasonality {
            ticker,
            start_year,
            end_year,
            format,
        } => {
            let range = DateRange::from_years(start_year, end_year)
                .with_context(|| format!("Invalid year range {}..{}", start_year, end_year))?;
            if range.start >= range.end {
                anyhow::bail!("Start year {} must be before end year {}", start_year, end_year);
            }
            run_seasonality(source.as_ref(), &ticker, range, format).await?;
        }
        Commands::Zscore {
            ticker,
            reference,
            window,
            start_year,
            format,
            rows,
        } => {
            if window == 0 {
                anyhow::bail!("Window must be > 0");
            }
            let range = DateRange::from_years(start_year, OPEN_END_YEAR)
                .with_context(|| format!("Invalid start year {}", start_year))?;
            if range.start >= range.end {
                anyhow::bail!("Start year {} must be before {}", start_year, OPEN_END_YEAR);
            }
            run_zscore(source.as_ref(), &ticker, &reference, range, window, format, rows).await?;
        }
        Commands::Tickers => match cli.data_dir.as_deref() {
            Some(dir) => {
                let tickers = CsvPriceSource::new(dir)
                    .available_tickers()
                    .with_context(|| format!("Failed to list {}", dir.display()))?;
                println!("Tickers in {}:", dir.display());
                for symbol in tickers {
                    println!("  {:<9} {}", symbol, display_name(&symbol));
                }
            }
            None => {
                println!("Known tickers:");
                for t in KNOWN_TICKERS {
                    println!("  {:<9} {:<9} - {}", t.symbol, t.display_name, t.description);
                }
            }
        },
    }

    Ok(())
}

fn build_source(data_dir: Option<&Path>) -> Box<dyn PriceSource> {
    match data_dir {
        Some(dir) => {
            tracing::debug!(dir = %dir.display(), "Using CSV price source");
            Box::new(CachedPriceSource::new(CsvPriceSource::new(dir)))
        }
        None => Box::new(CachedPriceSource::new(YahooPriceSource::new())),
    }
}

fn load_pipeline_config(
    path: Option<&Path>,
    overrides: PipelineOverrides,
) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            toml::from_str::<PipelineConfig>(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    if let Some(w) = overrides.roc_weight {
        config.weights.roc = w;
    }
    if let Some(w) = overrides.z_weight {
        config.weights.zscore = w;
    }
    if let Some(w) = overrides.sharpe_weight {
        config.weights.sharpe = w;
    }
    if let Some(w) = overrides.sortino_weight {
        config.weights.sortino = w;
    }
    if let Some(w) = overrides.macd_weight {
        config.weights.macd = w;
    }

    if overrides.no_smoothing {
        config.smoothing = None;
    } else if overrides.window_length.is_some() || overrides.polyorder.is_some() {
        let base = config.smoothing.unwrap_or_default();
        config.smoothing = Some(SmoothingParams {
            window_length: overrides.window_length.unwrap_or(base.window_length),
            polyorder: overrides.polyorder.unwrap_or(base.polyorder),
        });
    }

    // Reject bad smoothing parameters before any data is fetched.
    if let Some(params) = &config.smoothing {
        SavitzkyGolay::from_params(params)?;
    }
    Ok(config)
}

async fn run_indicators(
    source: &dyn PriceSource,
    ticker: &str,
    range: DateRange,
    config: &PipelineConfig,
    format: OutputFormat,
    rows: usize,
    plot: IndicatorKind,
) -> Result<()> {
    tracing::info!(
        ticker = %ticker,
        range = %range,
        source = source.name(),
        "Computing indicators"
    );

    let series = source.fetch(ticker, range, PriceField::Close).await?;
    let set = cycles_indicators::compute_indicators(&series, config)?;

    match format {
        OutputFormat::Table => {
            print!("{}", report::IndicatorTable::new(&set, plot, rows));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&set)?);
        }
        OutputFormat::Csv => {
            report::write_indicator_csv(&set, std::io::stdout().lock())?;
        }
    }
    Ok(())
}

async fn run_seasonality(
    source: &dyn PriceSource,
    ticker: &str,
    range: DateRange,
    format: OutputFormat,
) -> Result<()> {
    tracing::info!(
        ticker = %ticker,
        range = %range,
        source = source.name(),
        "Computing seasonality"
    );

    let series = source.fetch(ticker, range, PriceField::AdjClose).await?;
    let seasonality = report::SeasonalityReport::build(display_name(ticker), &series);

    match format {
        OutputFormat::Table => print!("{}", seasonality),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&seasonality)?),
        OutputFormat::Csv => seasonality.write_heatmap_csv(std::io::stdout().lock())?,
    }
    Ok(())
}

async fn run_zscore(
    source: &dyn PriceSource,
    ticker: &str,
    reference: &str,
    range: DateRange,
    window: usize,
    format: OutputFormat,
    rows: usize,
) -> Result<()> {
    tracing::info!(
        ticker = %ticker,
        reference = %reference,
        range = %range,
        window,
        "Computing z-scores"
    );

    let primary = source.fetch(ticker, range, PriceField::AdjClose).await?;
    let reference = source.fetch(reference, range, PriceField::Close).await?;
    let zscores = report::ZScoreReport::build(&primary, &reference, window);

    match format {
        OutputFormat::Table => print!("{}", zscores.table(rows)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&zscores)?),
        OutputFormat::Csv => zscores.write_csv(std::io::stdout().lock())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cycles-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file_or_flags() {
        let config = load_pipeline_config(None, PipelineOverrides::default()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_no_smoothing_clears_configured_filter() {
        let path = config_file("no-smoothing", "[smoothing]\nwindow_length = 21\npolyorder = 3\n");
        let config = load_pipeline_config(
            Some(path.as_path()),
            PipelineOverrides {
                no_smoothing: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(config.smoothing.is_none());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_polyorder_alone_keeps_default_window() {
        let path = config_file("polyorder", "roc_lag = 10\n\n[weights]\nsortino = 1.0\n");
        let config = load_pipeline_config(
            Some(path.as_path()),
            PipelineOverrides {
                polyorder: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.roc_lag, 10);
        assert_eq!(config.weights.sortino, 1.0);
        assert_eq!(
            config.smoothing,
            Some(SmoothingParams {
                window_length: 41,
                polyorder: 3,
            })
        );
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_weight_flags_override_file() {
        let path = config_file("weights", "[weights]\nroc = 2.0\nmacd = 3.0\n");
        let config = load_pipeline_config(
            Some(path.as_path()),
            PipelineOverrides {
                roc_weight: Some(5.0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.weights.roc, 5.0);
        assert_eq!(config.weights.macd, 3.0);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_smoothing_flags_rejected() {
        for overrides in [
            PipelineOverrides {
                window_length: Some(40),
                ..Default::default()
            },
            PipelineOverrides {
                window_length: Some(7),
                polyorder: Some(7),
                ..Default::default()
            },
        ] {
            assert!(load_pipeline_config(None, overrides).is_err());
        }
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let path = std::env::temp_dir().join("cycles-does-not-exist.toml");
        assert!(load_pipeline_config(Some(path.as_path()), PipelineOverrides::default()).is_err());
    }
}
