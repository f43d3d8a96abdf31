//! Order intents and execution records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Direction;

/// A sized order ready for the gateway. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Unique intent ID, shared by the primary order and every replica
    pub id: Uuid,

    pub symbol: String,

    pub direction: Direction,

    /// Position size in broker lots
    pub lot_size: Decimal,

    /// Evaluation time of the decision this intent came from
    pub timestamp: DateTime<Utc>,
}

impl OrderIntent {
    pub fn new(
        symbol: impl Into<String>,
        direction: Direction,
        lot_size: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            direction,
            lot_size,
            timestamp,
        }
    }

    /// Audit context for this intent.
    pub fn audit(&self) -> AuditContext {
        AuditContext {
            symbol: self.symbol.clone(),
            timestamp: self.timestamp,
            lot_size: Some(self.lot_size),
        }
    }
}

/// Gateway acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,

    /// Fill price when the gateway reports one
    pub fill_price: Option<Decimal>,
}

/// A confirmed execution of an intent on the primary account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub order_id: String,
    pub intent: OrderIntent,
    pub fill_price: Option<Decimal>,
    pub executed_at: DateTime<Utc>,
}

impl ExecutionRecord {
    pub fn confirm(intent: OrderIntent, ack: OrderAck) -> Self {
        Self {
            order_id: ack.order_id,
            intent,
            fill_price: ack.fill_price,
            executed_at: Utc::now(),
        }
    }
}

/// What was being attempted when a financial action failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    /// Attempted size, absent when sizing itself failed
    pub lot_size: Option<Decimal>,
}

impl std::fmt::Display for AuditContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.lot_size {
            Some(lot) => write!(f, "{} @ {} lot {}", self.symbol, self.timestamp, lot),
            None => write!(f, "{} @ {}", self.symbol, self.timestamp),
        }
    }
}
