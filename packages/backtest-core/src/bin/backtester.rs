//! Backtester CLI - Command line interface for portfolio backtests.
//!
//! Logs go to stderr so stdout stays machine-readable with `--json`.

use anyhow::{Context, Result};
use backtest_core::{
    build_policy, list_strategies,
    report::{self, ApiResponse},
    BacktestConfig, BacktestRun, Backtester, CsvPriceSource, EqualWeightAllocator,
    FixedTargetAllocator, PriceMatrix, PriceSource, Rebalance, ResultsRecord,
    SyntheticPriceSource, WeightAllocator,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SAMPLE_SYMBOLS: [&str; 5] = ["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA"];

#[derive(Parser)]
#[command(name = "backtester")]
#[command(about = "Portfolio backtester - allocation, returns and performance metrics")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $BACKTESTER_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print a JSON envelope instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a custom backtest
    Backtest {
        /// Symbols to backtest (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Initial capital (overrides config)
        #[arg(short, long)]
        capital: Option<f64>,
        /// Write results JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Wide CSV price file; synthetic data is used when omitted
        #[arg(long)]
        prices: Option<PathBuf>,
        /// Use synthetic data if the price file cannot be read
        #[arg(long)]
        fallback_synthetic: bool,
        /// Strategy ID (overrides config)
        #[arg(long)]
        strategy: Option<String>,
        /// Fixed target weights, e.g. AAPL=0.6,MSFT=0.4
        #[arg(long)]
        targets: Option<String>,
        /// Rebalance frequency: daily, weekly or monthly (overrides config)
        #[arg(long)]
        rebalance: Option<Rebalance>,
    },
    /// Run a sample backtest with popular stocks on synthetic data
    Sample,
    /// Render a stored results file
    Report {
        /// Results JSON file
        #[arg(short, long)]
        input: PathBuf,
        /// Report file (.html for HTML, text otherwise)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List available strategies
    Strategies,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) if json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&ApiResponse::<()>::err(format!("{:#}", e)))?
            );
            std::process::exit(1);
        }
        Err(e) => Err(e),
    }
}

fn run(cli: Cli) -> Result<String> {
    let config = match &cli.config {
        Some(path) => BacktestConfig::load_from_path(path),
        None => BacktestConfig::load(),
    }
    .context("failed to load configuration")?;

    match cli.command {
        Commands::Backtest {
            symbols,
            start,
            end,
            capital,
            output,
            prices,
            fallback_synthetic,
            strategy,
            targets,
            rebalance,
        } => {
            let mut config = config;
            if let Some(capital) = capital {
                config.initial_capital = capital;
            }
            if let Some(strategy) = strategy {
                config.strategy = strategy;
            }
            if let Some(rebalance) = rebalance {
                config.rebalance = rebalance;
            }
            config.validate()?;

            let symbols: Vec<String> = symbols.iter().map(|s| s.trim().to_uppercase()).collect();
            let matrix = load_prices(
                &config,
                prices.as_deref(),
                fallback_synthetic,
                &symbols,
                start,
                end,
            )?;

            let allocator: Box<dyn WeightAllocator> = match targets {
                Some(targets) => Box::new(FixedTargetAllocator::parse(&targets)?),
                None => Box::new(EqualWeightAllocator),
            };

            let backtest = execute(&config, &matrix, allocator.as_ref())?;
            if let Some(path) = &output {
                save(&backtest.results, path)?;
            }
            render_run(cli.json, &config, &symbols, start, end, &backtest, output.as_deref())
        }
        Commands::Sample => {
            let symbols: Vec<String> = SAMPLE_SYMBOLS.iter().map(|s| s.to_string()).collect();
            let start = date(2020, 1, 1)?;
            let end = date(2023, 12, 31)?;

            let config = BacktestConfig {
                strategy: "buy_and_hold".to_string(),
                ..config
            };
            let matrix = SyntheticPriceSource::new(config.seed).fetch(&symbols, start, end)?;
            let backtest = execute(&config, &matrix, &EqualWeightAllocator)?;

            let path = PathBuf::from(format!(
                "sample_results_{}.json",
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            ));
            save(&backtest.results, &path)?;
            render_run(cli.json, &config, &symbols, start, end, &backtest, Some(&path))
        }
        Commands::Report { input, output } => {
            let results = ResultsRecord::load(&input)
                .with_context(|| format!("failed to read results from {}", input.display()))?;

            let is_html = output
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
            let content = if is_html {
                report::html(&results)
            } else {
                report::summary(&results)
            };
            std::fs::write(&output, content)
                .with_context(|| format!("failed to write report to {}", output.display()))?;
            tracing::info!(path = %output.display(), html = is_html, "report generated");

            if cli.json {
                Ok(serde_json::to_string_pretty(&ApiResponse::ok(json!({
                    "report": output,
                })))?)
            } else {
                Ok(format!("Report generated: {}", output.display()))
            }
        }
        Commands::Strategies => Ok(serde_json::to_string_pretty(&ApiResponse::ok(json!({
            "strategies": list_strategies(),
        })))?),
    }
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("invalid date {}-{}-{}", year, month, day))
}

fn load_prices(
    config: &BacktestConfig,
    prices: Option<&Path>,
    fallback_synthetic: bool,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceMatrix> {
    let synthetic = SyntheticPriceSource::new(config.seed);
    let Some(path) = prices else {
        tracing::info!(seed = config.seed, "no price file given, using synthetic data");
        return Ok(synthetic.fetch(symbols, start, end)?);
    };

    match CsvPriceSource::new(path).fetch(symbols, start, end) {
        Ok(matrix) => Ok(matrix),
        Err(e) if fallback_synthetic => {
            tracing::warn!(
                error = %e,
                seed = config.seed,
                "price file failed, falling back to synthetic data"
            );
            Ok(synthetic.fetch(symbols, start, end)?)
        }
        Err(e) => Err(e).with_context(|| format!("failed to load prices from {}", path.display())),
    }
}

fn execute(
    config: &BacktestConfig,
    prices: &PriceMatrix,
    allocator: &dyn WeightAllocator,
) -> Result<BacktestRun> {
    let policy = build_policy(&config.strategy)?;
    let backtester = Backtester::from_config(config);
    Ok(backtester.run(prices, policy.as_ref(), allocator)?)
}

fn save(results: &ResultsRecord, path: &Path) -> Result<()> {
    results
        .save(path)
        .with_context(|| format!("failed to save results to {}", path.display()))?;
    tracing::info!(path = %path.display(), "results saved");
    Ok(())
}

fn render_run(
    json: bool,
    config: &BacktestConfig,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    backtest: &BacktestRun,
    saved_to: Option<&Path>,
) -> Result<String> {
    let results = &backtest.results;

    if json {
        return Ok(serde_json::to_string_pretty(&ApiResponse::ok(json!({
            "symbols": symbols,
            "start": start,
            "end": end,
            "initial_capital": config.initial_capital,
            "strategy": config.strategy,
            "rebalance": config.rebalance,
            "results": results.to_map(),
            "output": saved_to,
        })))?);
    }

    let mut lines = vec![
        "Backtest Results:".to_string(),
        format!("Symbols: {}", symbols.join(", ")),
        format!("Period: {} to {}", start, end),
        format!("Strategy: {}", config.strategy),
        format!("Initial Capital: {:.2}", config.initial_capital),
        format!("Final Value: {:.2}", results.final_value()),
        format!("Total Return: {:.2}%", results.total_return() * 100.0),
        format!("Annualized Return: {:.2}%", results.annualized_return() * 100.0),
        format!("Sharpe Ratio: {:.2}", results.sharpe_ratio()),
        format!("Max Drawdown: {:.2}%", results.max_drawdown() * 100.0),
    ];
    if let Some(path) = saved_to {
        lines.push(format!("Results saved to: {}", path.display()));
    }
    Ok(lines.join("\n"))
}
