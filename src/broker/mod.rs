//! External collaborators: market data, order execution and linked accounts.
//!
//! The trading core only talks to these traits. Real broker terminals plug in
//! behind them; the paper and replay implementations here drive simulated
//! sessions and tests.

mod feed;
mod paper;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{ExecutionError, FeedError, ReplicationError};
use crate::models::{AccountHandle, Bar, OrderAck, OrderIntent};

pub use feed::{ReplayFeed, SimulatedFeed};
pub use paper::{PaperAccounts, PaperGateway};

/// Source of completed bars for a symbol.
#[async_trait]
pub trait MarketFeed: Send {
    /// Wait for the next completed bar.
    async fn next_bar(&mut self, symbol: &str) -> Result<Bar, FeedError>;
}

/// Order entry on the primary account.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Current account balance.
    async fn account_balance(&self) -> Result<Decimal, ExecutionError>;

    /// Submit an order. Returns once the broker accepts or rejects it.
    async fn submit(&self, intent: &OrderIntent) -> Result<OrderAck, ExecutionError>;
}

/// Acknowledgement from a linked account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountAck {
    pub account: AccountHandle,
    pub order_id: String,
}

/// Delivery of confirmed orders to linked accounts.
#[async_trait]
pub trait AccountTarget: Send + Sync {
    async fn send(
        &self,
        account: &AccountHandle,
        intent: &OrderIntent,
    ) -> Result<AccountAck, ReplicationError>;
}
