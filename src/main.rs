//! Multi-Strategy Forex Trading Bot
//!
//! Runs independent signal detectors over a bar feed, acts only on consensus,
//! sizes positions against broker bounds and mirrors every confirmed order to
//! linked accounts.

mod bot;
mod broker;
mod config;
mod detectors;
mod error;
mod models;
mod trading;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::bot::TradingLoop;
use crate::broker::{MarketFeed, PaperAccounts, PaperGateway, ReplayFeed, SimulatedFeed};
use crate::config::AppConfig;
use crate::models::Bar;
use crate::trading::StrategyAggregator;

/// Multi-strategy forex trading bot CLI.
#[derive(Parser)]
#[command(name = "fxtrader")]
#[command(about = "Consensus-driven forex trading with multi-account replication", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long, env = "FXTRADER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a paper-trading session on simulated bars for every configured symbol
    Run {
        /// Paper account balance
        #[arg(short, long, default_value = "10000")]
        balance: f64,

        /// Bars to process per symbol (runs until Ctrl+C when omitted)
        #[arg(short = 'n', long)]
        bars: Option<u64>,

        /// Seed for the simulated feed
        #[arg(short, long, default_value = "1")]
        seed: u64,

        /// Wall-clock milliseconds between simulated bars (0 replays as fast as possible)
        #[arg(short, long, default_value = "1000")]
        interval_ms: u64,

        /// Fraction of feed polls that fail as a terminal dropout (0.0 to 1.0)
        #[arg(long, default_value = "0")]
        dropout: f64,

        /// Reject the first order submitted on each symbol
        #[arg(long)]
        reject_first: bool,

        /// Linked accounts to treat as unreachable
        #[arg(long)]
        unreachable: Vec<String>,

        /// Replay recorded bars (JSON object of symbol -> bars) instead of simulating
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Show each detector's vote over simulated bars
    Signals {
        /// Bars to generate
        #[arg(short = 'n', long, default_value = "96")]
        bars: usize,

        /// Seed for the simulated feed
        #[arg(short, long, default_value = "1")]
        seed: u64,

        /// Only show bars with a directional decision
        #[arg(long)]
        decisions_only: bool,
    },

    /// Show the effective configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AppConfig::load(cli.config.as_deref()).context("Invalid configuration")?;
    let config = Arc::new(config);

    match cli.command {
        Commands::Run {
            balance,
            bars,
            seed,
            interval_ms,
            dropout,
            reject_first,
            unreachable,
            replay,
        } => {
            let balance = Decimal::try_from(balance).context("Invalid balance")?;
            let recorded: Option<HashMap<String, Vec<Bar>>> = match &replay {
                Some(path) => {
                    let content = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read replay file {}", path.display()))?;
                    Some(serde_json::from_str(&content).context("Invalid replay file")?)
                }
                None => None,
            };
            info!(
                balance = %balance,
                symbols = ?config.symbols,
                timeframe = %config.timeframe,
                "Starting paper session"
            );

            println!("\n=== Multi-Strategy Forex Bot (PAPER) ===");
            println!("Symbols:          {}", config.symbols.join(", "));
            println!("Timeframe:        {}", config.timeframe);
            println!("Balance:          {}", balance);
            println!("Bar Interval:     {}ms", interval_ms);
            println!("Detectors:        {}", detector_list(&config));
            println!("Quorum:           {}", config.strategy.quorum);
            println!("Linked accounts:  {}", config.accounts.len());
            println!("\nPress Ctrl+C to stop.\n");

            let shutdown = Arc::new(AtomicBool::new(false));
            let signal = shutdown.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutdown signal received");
                signal.store(true, Ordering::SeqCst);
            });

            let start = session_start();
            let mut handles = Vec::new();

            for (i, symbol) in config.symbols.iter().cloned().enumerate() {
                let config = config.clone();
                let shutdown = shutdown.clone();
                let unreachable = unreachable.clone();
                let recorded = recorded
                    .as_ref()
                    .map(|r| r.get(&symbol).cloned().unwrap_or_default());

                handles.push(tokio::spawn(async move {
                    let gateway = Arc::new(PaperGateway::new(balance, config.execution.clone()));
                    if reject_first {
                        gateway.reject_next();
                    }
                    let accounts = unreachable
                        .into_iter()
                        .fold(PaperAccounts::new(), |acc, id| acc.with_unreachable(id));

                    let mut feed: Box<dyn MarketFeed> = match recorded {
                        Some(recorded) => {
                            let feed = ReplayFeed::new(recorded);
                            info!(symbol = %symbol, bars = feed.remaining(), "Replaying recorded bars");
                            Box::new(feed)
                        }
                        None => Box::new(
                            SimulatedFeed::eurusd(seed.wrapping_add(i as u64), config.timeframe, start)
                                .with_pace(Duration::from_millis(interval_ms))
                                .with_dropout(dropout),
                        ),
                    };
                    let mut trading_loop =
                        TradingLoop::from_config(symbol, &config, gateway, Arc::new(accounts));

                    trading_loop.run(feed.as_mut(), bars, shutdown).await
                }));
            }

            for handle in handles {
                match handle.await {
                    Ok(stats) => println!("\n{}", stats),
                    Err(e) => error!(error = %e, "Trading loop task failed"),
                }
            }
        }

        Commands::Signals {
            bars,
            seed,
            decisions_only,
        } => {
            let aggregator = StrategyAggregator::from_config(&config.strategy);
            let mut feed = SimulatedFeed::eurusd(seed, config.timeframe, session_start());
            let window: Vec<_> = (0..bars).map_while(|_| feed.generate()).collect();

            let names = aggregator.detector_names();
            print!("\n{:<17} {:>9}", "TIME", "CLOSE");
            for name in &names {
                print!(" {:>8}", name);
            }
            println!(" {:>9}", "DECISION");
            println!("{}", "-".repeat(28 + 9 * names.len() + 10));

            for end in aggregator.min_lookback().max(1)..=window.len() {
                let slice = &window[..end];
                let Some(last) = slice.last() else { continue };
                let decision = aggregator.evaluate(slice, last.timestamp);
                if decisions_only && decision.is_abstain() {
                    continue;
                }

                print!("{:<17} {:>9}", last.timestamp.format("%Y-%m-%d %H:%M"), last.close);
                for vote in &decision.votes {
                    print!(" {:>8}", vote.signal);
                }
                println!(" {:>9}", decision.signal);
            }
        }

        Commands::Config { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config.as_ref())?);
                return Ok(());
            }

            println!("\n=== Trading Configuration ===\n");
            println!("Symbols:              {}", config.symbols.join(", "));
            println!("Timeframe:            {}", config.timeframe);
            println!("History Bars:         {}", config.history_bars);

            println!("\nRisk:");
            println!("  Risk Fraction:      {}%", config.risk.risk_fraction * Decimal::from(100));
            println!("  Max Trades / Day:   {}", config.risk.max_trades_per_day);
            println!("  Lot Bounds:         {} - {} (step {})",
                config.risk.min_lot, config.risk.max_lot, config.risk.lot_step);
            println!("  Min Balance:        {}", config.risk.min_account_balance);

            println!("\nStrategy:");
            println!("  Detectors:          {}", detector_list(&config));
            println!("  Quorum:             {}", config.strategy.quorum);
            println!("  Kill Zone (UTC):    {:02}:00 - {:02}:59",
                config.strategy.kill_zone.start_hour, config.strategy.kill_zone.end_hour);
            println!("  SMC Order Block:    {}", config.strategy.smc.confirm_order_block);

            println!("\nExecution:");
            println!("  Submit Timeout:     {}s", config.execution.submit_timeout_secs);
            println!("  Replicate Timeout:  {}s", config.execution.replication_timeout_secs);
            println!("  Deviation:          {} points", config.execution.deviation);
            println!("  Magic:              {}", config.execution.magic);
            println!("  Comment:            {}", config.execution.comment);

            println!("\nLinked Accounts:");
            for account in &config.accounts {
                println!("  {}", account);
            }
        }
    }

    Ok(())
}

fn detector_list(config: &AppConfig) -> String {
    config
        .strategy
        .enabled
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Midnight UTC today, so simulated sessions cross the kill zone.
fn session_start() -> DateTime<Utc> {
    let now = Utc::now();
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}
