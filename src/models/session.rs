//! Per-session trade counters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily trade counter, owned by a single trading loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub trades_executed_today: u32,
    pub last_trade_date: Option<NaiveDate>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the counter when `today` is past the last trade date.
    ///
    /// Returns true if a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        match self.last_trade_date {
            Some(last) if last != today && self.trades_executed_today > 0 => {
                self.trades_executed_today = 0;
                true
            }
            _ => false,
        }
    }

    /// Trades already executed on `today`.
    pub fn trades_on(&self, today: NaiveDate) -> u32 {
        if self.last_trade_date == Some(today) {
            self.trades_executed_today
        } else {
            0
        }
    }

    /// Whether the daily cap is reached for `today`.
    pub fn limit_reached(&self, today: NaiveDate, max_trades_per_day: u32) -> bool {
        self.trades_on(today) >= max_trades_per_day
    }

    /// Count a confirmed execution.
    pub fn record_trade(&mut self, today: NaiveDate) {
        if self.last_trade_date != Some(today) {
            self.trades_executed_today = 0;
        }
        self.trades_executed_today += 1;
        self.last_trade_date = Some(today);
    }
}
