//! Error taxonomy for the trading core.
//!
//! Only [`ConfigError`] is fatal, and only at startup. Everything else is
//! scoped to a bar, a cycle, a session or a single linked account.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Problems with incoming market data. Recovered locally by dropping the bar
/// or abstaining.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// A bar whose prices are inconsistent (e.g. high below close)
    #[error("Malformed bar at {timestamp}: {reason}")]
    MalformedBar {
        timestamp: DateTime<Utc>,
        reason: String,
    },

    /// A bar that does not advance the timeline
    #[error("Out-of-order bar: {timestamp} is not after {last}")]
    OutOfOrder {
        timestamp: DateTime<Utc>,
        last: DateTime<Utc>,
    },
}

/// Sizing failures. Surfaced and halt the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error(
        "Insufficient balance {balance}: computed lot {computed_lot} is below broker minimum {min_lot}"
    )]
    InsufficientBalance {
        balance: Decimal,
        computed_lot: Decimal,
        min_lot: Decimal,
    },

    #[error("Balance {balance} is below the configured account floor {floor}")]
    BelowAccountFloor { balance: Decimal, floor: Decimal },

    #[error("Lot {lot} cannot be expressed in steps of {lot_step}")]
    UnrepresentableLot { lot: Decimal, lot_step: Decimal },
}

/// Gateway failures. Surfaced per cycle, never retried automatically.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Gateway did not respond within {0:?}")]
    Timeout(Duration),
}

/// Per-account fan-out failures. Collected into a report, never block other
/// accounts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplicationError {
    #[error("Account {account} unreachable: {reason}")]
    AccountUnreachable { account: String, reason: String },

    #[error("Account {account} did not acknowledge within {timeout:?}")]
    Timeout { account: String, timeout: Duration },
}

impl ReplicationError {
    /// Account the failure belongs to.
    pub fn account(&self) -> &str {
        match self {
            ReplicationError::AccountUnreachable { account, .. } => account,
            ReplicationError::Timeout { account, .. } => account,
        }
    }
}

/// Market feed failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    /// Transient, the loop keeps observing
    #[error("Feed unavailable for {symbol}: {reason}")]
    FeedUnavailable { symbol: String, reason: String },

    /// A finite feed has no more bars; ends the session
    #[error("Feed exhausted for {0}")]
    Exhausted(String),
}

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid risk parameters: {0}")]
    InvalidRisk(String),

    #[error("Invalid strategy configuration: {0}")]
    InvalidStrategy(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_risk_error_message_carries_amounts() {
        let err = RiskError::InsufficientBalance {
            balance: dec!(5),
            computed_lot: dec!(0.05),
            min_lot: dec!(0.1),
        };
        let msg = err.to_string();
        assert!(msg.contains("0.05"));
        assert!(msg.contains("0.1"));
    }

    #[test]
    fn test_replication_error_account() {
        let err = ReplicationError::Timeout {
            account: "ACC-2".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(err.account(), "ACC-2");
    }
}
