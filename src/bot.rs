//! Trading loop: per-symbol orchestration of one decision cycle per bar.
//!
//! Each completed bar walks the state machine
//! `AwaitingBars -> Evaluating -> Sizing -> Submitting -> Replicating -> Idle`.
//! Abstentions and execution failures fall back to `AwaitingBars`. Hitting
//! the daily cap parks the loop in `DailyLimitReached` until the next UTC
//! day; a sizing failure parks it in `Halted` for the rest of the session.
//!
//! Cycles for one symbol are strictly sequential. Run one loop per symbol for
//! multiple instruments; loops share nothing mutable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::broker::{AccountTarget, ExecutionGateway, MarketFeed};
use crate::config::AppConfig;
use crate::error::{DataError, ExecutionError, FeedError, RiskError};
use crate::models::{
    AuditContext, Bar, Decision, ExecutionRecord, OrderAck, OrderIntent, SessionState,
};
use crate::trading::{
    AccountReplicator, ReplicationReport, RiskManager, RiskParameters, StrategyAggregator,
};

const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_HISTORY_BARS: usize = 200;

/// Where the loop is in its decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    AwaitingBars,
    Evaluating,
    Sizing,
    Submitting,
    Replicating,
    /// Cap reached; observing the feed until the day rolls over
    DailyLimitReached,
    /// Sizing failed; no more trading this session
    Halted,
}

/// Result of feeding one bar to the loop.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Bar dropped before evaluation
    Rejected(DataError),

    /// Not enough history for the enabled detectors yet
    Warmup { have: usize, need: usize },

    Abstained(Decision),

    DailyLimitReached { trades_today: u32 },

    /// Sizing failed on this bar; the session is now halted
    Halted {
        context: AuditContext,
        error: RiskError,
    },

    /// Bar observed while already halted
    SessionHalted,

    /// Gateway refused, timed out or could not report the balance
    ExecutionFailed {
        context: AuditContext,
        error: ExecutionError,
        decision: Decision,
    },

    Executed {
        record: ExecutionRecord,
        decision: Decision,
        replication: ReplicationReport,
    },
}

/// Counters for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub symbol: String,
    pub bars_seen: u64,
    pub rejected_bars: u64,
    pub feed_errors: u64,
    pub evaluations: u64,
    pub abstentions: u64,
    pub limit_skips: u64,
    pub executed: u64,
    pub execution_failures: u64,
    pub replication_failures: u64,
    pub lots_traded: Decimal,
    pub halted: Option<String>,
}

impl std::fmt::Display for SessionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session: {} ===", self.symbol)?;
        writeln!(f, "Bars Seen:        {} (Rejected: {}, Feed Errors: {})",
            self.bars_seen, self.rejected_bars, self.feed_errors)?;
        writeln!(f, "Evaluations:      {} (Abstained: {})", self.evaluations, self.abstentions)?;
        writeln!(f, "Limit Skips:      {}", self.limit_skips)?;
        writeln!(f, "Executed:         {} ({} lots)", self.executed, self.lots_traded)?;
        writeln!(f, "Execution Errors: {}", self.execution_failures)?;
        writeln!(f, "Replication Errs: {}", self.replication_failures)?;
        writeln!(f, "Status:           {}",
            match &self.halted {
                Some(reason) => format!("HALTED ({})", reason),
                None => "Active".to_string(),
            })?;
        Ok(())
    }
}

/// Single-symbol trading loop.
pub struct TradingLoop {
    symbol: String,
    aggregator: StrategyAggregator,
    risk: RiskManager,
    gateway: Arc<dyn ExecutionGateway>,
    replicator: AccountReplicator,
    submit_timeout: Duration,
    history_limit: usize,

    // Session state
    bars: Vec<Bar>,
    session: SessionState,
    state: LoopState,
    stats: SessionStats,
}

impl TradingLoop {
    pub fn new(
        symbol: impl Into<String>,
        aggregator: StrategyAggregator,
        risk: RiskParameters,
        gateway: Arc<dyn ExecutionGateway>,
        replicator: AccountReplicator,
    ) -> Self {
        let symbol = symbol.into();
        let history_limit = DEFAULT_HISTORY_BARS.max(aggregator.min_lookback());
        Self {
            stats: SessionStats {
                symbol: symbol.clone(),
                ..Default::default()
            },
            symbol,
            aggregator,
            risk: RiskManager::new(risk),
            gateway,
            replicator,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            history_limit,
            bars: Vec::new(),
            session: SessionState::new(),
            state: LoopState::Idle,
        }
    }

    /// Build a loop for `symbol` from the application configuration.
    pub fn from_config(
        symbol: impl Into<String>,
        config: &AppConfig,
        gateway: Arc<dyn ExecutionGateway>,
        accounts: Arc<dyn AccountTarget>,
    ) -> Self {
        let aggregator = StrategyAggregator::from_config(&config.strategy);
        let replicator = AccountReplicator::new(
            config.accounts.clone(),
            accounts,
            config.execution.replication_timeout(),
        );

        Self::new(symbol, aggregator, config.risk.clone(), gateway, replicator)
            .with_submit_timeout(config.execution.submit_timeout())
            .with_history_limit(config.history_bars)
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// Bars retained for evaluation, never fewer than the detectors need.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(self.aggregator.min_lookback()).max(1);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn window(&self) -> &[Bar] {
        &self.bars
    }

    /// Drive the loop from a feed until it is exhausted, `max_bars` have been
    /// consumed, or `shutdown` is set.
    pub async fn run(
        &mut self,
        feed: &mut dyn MarketFeed,
        max_bars: Option<u64>,
        shutdown: Arc<AtomicBool>,
    ) -> SessionStats {
        info!(
            symbol = %self.symbol,
            detectors = ?self.aggregator.detector_names(),
            quorum = self.aggregator.quorum(),
            accounts = self.replicator.accounts().len(),
            "Starting trading loop"
        );

        let mut consumed = 0u64;
        while !shutdown.load(Ordering::SeqCst) {
            if max_bars.is_some_and(|max| consumed >= max) {
                break;
            }

            match feed.next_bar(&self.symbol).await {
                Ok(bar) => {
                    consumed += 1;
                    self.on_bar(bar).await;
                }
                Err(FeedError::Exhausted(_)) => {
                    info!(symbol = %self.symbol, "Feed exhausted");
                    break;
                }
                Err(e) => {
                    warn!(symbol = %self.symbol, error = %e, "Feed error, waiting for next bar");
                    self.stats.feed_errors += 1;
                }
            }

            // Keep sibling loops and the shutdown handler scheduled
            tokio::task::yield_now().await;
        }

        info!(symbol = %self.symbol, state = ?self.state, "Trading loop stopped");
        self.stats.clone()
    }

    /// Run one decision cycle for a newly completed bar.
    pub async fn on_bar(&mut self, bar: Bar) -> CycleOutcome {
        self.stats.bars_seen += 1;

        if let Err(e) = self.ingest(bar) {
            warn!(symbol = %self.symbol, error = %e, "Dropping bar");
            self.stats.rejected_bars += 1;
            return CycleOutcome::Rejected(e);
        }

        if self.state == LoopState::Halted {
            return CycleOutcome::SessionHalted;
        }

        let now = bar.timestamp;
        let today = now.date_naive();

        if self.session.roll_over(today) {
            info!(symbol = %self.symbol, day = %today, "New trading day, daily counter reset");
        }

        let max_trades = self.risk.params().max_trades_per_day;
        if self.session.limit_reached(today, max_trades) {
            self.state = LoopState::DailyLimitReached;
            self.stats.limit_skips += 1;
            debug!(symbol = %self.symbol, max_trades, "Daily trade limit reached, skipping");
            return CycleOutcome::DailyLimitReached {
                trades_today: self.session.trades_on(today),
            };
        }

        let need = self.aggregator.min_lookback();
        if self.bars.len() < need {
            self.state = LoopState::AwaitingBars;
            return CycleOutcome::Warmup {
                have: self.bars.len(),
                need,
            };
        }

        // ==================== Evaluating ====================

        self.state = LoopState::Evaluating;
        let decision = self.aggregator.evaluate(&self.bars, now);
        self.stats.evaluations += 1;

        let Some(direction) = decision.direction() else {
            self.state = LoopState::AwaitingBars;
            self.stats.abstentions += 1;
            return CycleOutcome::Abstained(decision);
        };

        info!(
            symbol = %self.symbol,
            direction = %direction,
            votes = %decision.vote_summary(),
            "Consensus reached"
        );

        // ==================== Sizing ====================

        self.state = LoopState::Sizing;
        let unsized_context = AuditContext {
            symbol: self.symbol.clone(),
            timestamp: now,
            lot_size: None,
        };

        let balance = match self.bounded(self.gateway.account_balance()).await {
            Ok(balance) => balance,
            Err(error) => {
                warn!(context = %unsized_context, error = %error, "Could not read account balance");
                return self.execution_failed(unsized_context, error, decision);
            }
        };

        let lot_size = match self.risk.size(balance) {
            Ok(lot) => lot,
            Err(error) => {
                error!(
                    context = %unsized_context,
                    balance = %balance,
                    error = %error,
                    "Position sizing failed, halting session"
                );
                self.state = LoopState::Halted;
                self.stats.halted = Some(error.to_string());
                return CycleOutcome::Halted {
                    context: unsized_context,
                    error,
                };
            }
        };

        // ==================== Submitting ====================

        self.state = LoopState::Submitting;
        let intent = OrderIntent::new(self.symbol.clone(), direction, lot_size, now);

        let ack: OrderAck = match self.bounded(self.gateway.submit(&intent)).await {
            Ok(ack) => ack,
            Err(error) => {
                let context = intent.audit();
                warn!(context = %context, intent = %intent.id, error = %error, "Order submission failed, discarding intent");
                return self.execution_failed(context, error, decision);
            }
        };

        self.session.record_trade(today);
        self.stats.executed += 1;
        self.stats.lots_traded += lot_size;

        let record = ExecutionRecord::confirm(intent, ack);
        info!(
            symbol = %self.symbol,
            order_id = %record.order_id,
            direction = %direction,
            lot = %lot_size,
            trades_today = self.session.trades_executed_today,
            "Order executed"
        );

        // ==================== Replicating ====================

        self.state = LoopState::Replicating;
        let replication = self.replicator.replicate(&record.intent).await;
        self.stats.replication_failures += replication.failures.len() as u64;
        if !replication.is_complete() {
            warn!(
                symbol = %self.symbol,
                order_id = %record.order_id,
                failed = replication.failures.len(),
                attempted = replication.attempted(),
                "Trade not mirrored to every linked account"
            );
        }

        self.state = if self.session.limit_reached(today, max_trades) {
            LoopState::DailyLimitReached
        } else {
            LoopState::Idle
        };

        CycleOutcome::Executed {
            record,
            decision,
            replication,
        }
    }

    /// Append a bar to the window after checking it.
    fn ingest(&mut self, bar: Bar) -> Result<(), DataError> {
        let checked = Bar::new(bar.timestamp, bar.open, bar.high, bar.low, bar.close)?;

        if let Some(last) = self.bars.last() {
            if checked.timestamp <= last.timestamp {
                return Err(DataError::OutOfOrder {
                    timestamp: checked.timestamp,
                    last: last.timestamp,
                });
            }
        }

        self.bars.push(checked);
        if self.bars.len() > self.history_limit {
            let excess = self.bars.len() - self.history_limit;
            self.bars.drain(..excess);
        }
        Ok(())
    }

    /// Bound a gateway call by the submit timeout.
    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, ExecutionError>>,
    ) -> Result<T, ExecutionError> {
        match tokio::time::timeout(self.submit_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ExecutionError::Timeout(self.submit_timeout)),
        }
    }

    fn execution_failed(
        &mut self,
        context: AuditContext,
        error: ExecutionError,
        decision: Decision,
    ) -> CycleOutcome {
        self.state = LoopState::AwaitingBars;
        self.stats.execution_failures += 1;
        CycleOutcome::ExecutionFailed {
            context,
            error,
            decision,
        }
    }
}
