//! Market feeds: a seeded random walk and a fixed replay sequence.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::error::FeedError;
use crate::models::{Bar, Timeframe};

use super::MarketFeed;

/// Synthetic bars from a seeded random walk.
///
/// Same seed, same bars. Timestamps advance by one timeframe per bar and the
/// feed is exhausted once they would leave chrono's range.
pub struct SimulatedFeed {
    rng: StdRng,
    timeframe: Timeframe,
    next_time: Option<DateTime<Utc>>,
    last_close: f64,
    /// Typical bar-to-bar move, as a fraction of price
    volatility: f64,
    /// Wall-clock time between bars served by `next_bar`
    pace: Option<Duration>,
    ticker: Option<Interval>,
    /// Chance that a poll fails as if the terminal dropped out
    dropout: f64,
}

impl SimulatedFeed {
    pub fn new(seed: u64, timeframe: Timeframe, start: DateTime<Utc>, start_price: Decimal) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            timeframe,
            next_time: Some(start),
            last_close: start_price.to_f64().unwrap_or(1.1),
            volatility: 0.0008,
            pace: None,
            ticker: None,
            dropout: 0.0,
        }
    }

    /// Feed starting at EURUSD-like prices.
    pub fn eurusd(seed: u64, timeframe: Timeframe, start: DateTime<Utc>) -> Self {
        Self::new(seed, timeframe, start, dec!(1.10))
    }

    /// Serve at most one bar per `pace` from `next_bar`. The first bar is
    /// immediate.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = (!pace.is_zero()).then_some(pace);
        self.ticker = None;
        self
    }

    /// Fail a fraction of polls with `FeedUnavailable`, clamped to [0, 1).
    pub fn with_dropout(mut self, probability: f64) -> Self {
        self.dropout = probability.clamp(0.0, 0.99);
        self
    }

    /// Generate the next bar without waiting. `None` once timestamps overflow.
    pub fn generate(&mut self) -> Option<Bar> {
        let timestamp = self.next_time?;
        let open = self.last_close;
        let drift = self.rng.gen_range(-1.0..1.0) * self.volatility * open;
        let close = (open + drift).max(0.0001);

        let wick_up = self.rng.gen_range(0.0..0.5) * self.volatility * open;
        let wick_down = self.rng.gen_range(0.0..0.5) * self.volatility * open;
        let high = open.max(close) + wick_up;
        let low = (open.min(close) - wick_down).max(0.00005);

        let to_price = |v: f64| Decimal::try_from(v).unwrap_or(Decimal::ONE).round_dp(5);
        let (open_d, close_d) = (to_price(open), to_price(close));
        // Rounding can nudge the wicks inside the body; pin them to it.
        let high_d = to_price(high).max(open_d.max(close_d));
        let low_d = to_price(low).min(open_d.min(close_d));

        let bar = Bar {
            timestamp,
            open: open_d,
            high: high_d,
            low: low_d,
            close: close_d,
        };

        self.last_close = close_d.to_f64().unwrap_or(close);
        self.next_time = timestamp.checked_add_signed(self.timeframe.duration());
        Some(bar)
    }
}

#[async_trait]
impl MarketFeed for SimulatedFeed {
    async fn next_bar(&mut self, symbol: &str) -> Result<Bar, FeedError> {
        if let Some(pace) = self.pace {
            let ticker = self.ticker.get_or_insert_with(|| {
                let mut ticker = interval(pace);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });
            ticker.tick().await;
        }

        if self.dropout > 0.0 && self.rng.gen_bool(self.dropout) {
            return Err(FeedError::FeedUnavailable {
                symbol: symbol.to_string(),
                reason: "simulated terminal dropout".to_string(),
            });
        }

        self.generate()
            .ok_or_else(|| FeedError::Exhausted(symbol.to_string()))
    }
}

/// Replays a fixed bar sequence, then reports exhaustion.
pub struct ReplayFeed {
    bars: VecDeque<Bar>,
}

impl ReplayFeed {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars: bars.into() }
    }

    pub fn remaining(&self) -> usize {
        self.bars.len()
    }
}

#[async_trait]
impl MarketFeed for ReplayFeed {
    async fn next_bar(&mut self, symbol: &str) -> Result<Bar, FeedError> {
        self.bars
            .pop_front()
            .ok_or_else(|| FeedError::Exhausted(symbol.to_string()))
    }
}
