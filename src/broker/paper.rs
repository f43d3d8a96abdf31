//! Paper collaborators: fill every order immediately and log it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{ExecutionError, ReplicationError};
use crate::models::{AccountHandle, OrderAck, OrderIntent};
use crate::trading::ExecutionConfig;

use super::{AccountAck, AccountTarget, ExecutionGateway};

/// Simulated primary account with a fixed balance.
pub struct PaperGateway {
    balance: Decimal,
    settings: ExecutionConfig,
    reject_next: AtomicBool,
}

impl PaperGateway {
    pub fn new(balance: Decimal, settings: ExecutionConfig) -> Self {
        Self {
            balance,
            settings,
            reject_next: AtomicBool::new(false),
        }
    }

    /// Make the next submission fail with a rejection.
    pub fn reject_next(&self) {
        self.reject_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExecutionGateway for PaperGateway {
    async fn account_balance(&self) -> Result<Decimal, ExecutionError> {
        Ok(self.balance)
    }

    async fn submit(&self, intent: &OrderIntent) -> Result<OrderAck, ExecutionError> {
        if self.reject_next.swap(false, Ordering::SeqCst) {
            return Err(ExecutionError::Rejected("simulated rejection".to_string()));
        }

        let order_id = format!("PAPER-{}", uuid::Uuid::new_v4().simple());
        info!(
            order_id = %order_id,
            symbol = %intent.symbol,
            direction = %intent.direction,
            lot = %intent.lot_size,
            deviation = self.settings.deviation,
            magic = self.settings.magic,
            comment = %self.settings.comment,
            "[PAPER] Order filled"
        );

        Ok(OrderAck {
            order_id,
            fill_price: None,
        })
    }
}

/// Simulated linked accounts. Accounts listed as unreachable fail every send.
#[derive(Default)]
pub struct PaperAccounts {
    unreachable: HashSet<String>,
}

impl PaperAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unreachable(mut self, account_id: impl Into<String>) -> Self {
        self.unreachable.insert(account_id.into());
        self
    }
}

#[async_trait]
impl AccountTarget for PaperAccounts {
    async fn send(
        &self,
        account: &AccountHandle,
        intent: &OrderIntent,
    ) -> Result<AccountAck, ReplicationError> {
        if self.unreachable.contains(&account.id) {
            return Err(ReplicationError::AccountUnreachable {
                account: account.id.clone(),
                reason: "simulated outage".to_string(),
            });
        }

        info!(
            account = %account,
            symbol = %intent.symbol,
            direction = %intent.direction,
            lot = %intent.lot_size,
            "[PAPER] Order replicated"
        );

        Ok(AccountAck {
            account: account.clone(),
            order_id: format!("{}-{}", account.id, intent.id.simple()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    fn intent() -> OrderIntent {
        OrderIntent::new("EURUSD", Direction::Buy, dec!(0.5), Utc::now())
    }

    #[tokio::test]
    async fn test_gateway_fills_and_rejects_once() {
        let gateway = PaperGateway::new(dec!(10000), ExecutionConfig::default());
        assert_eq!(assert_ok!(gateway.account_balance().await), dec!(10000));

        let ack = assert_ok!(gateway.submit(&intent()).await);
        assert!(ack.order_id.starts_with("PAPER-"));

        gateway.reject_next();
        assert!(matches!(
            assert_err!(gateway.submit(&intent()).await),
            ExecutionError::Rejected(_)
        ));
        assert_ok!(gateway.submit(&intent()).await);
    }

    #[tokio::test]
    async fn test_unreachable_account() {
        let accounts = PaperAccounts::new().with_unreachable("ACC-2");
        assert_ok!(accounts.send(&AccountHandle::new("ACC-1"), &intent()).await);
        let err = assert_err!(accounts.send(&AccountHandle::new("ACC-2"), &intent()).await);
        assert_eq!(err.account(), "ACC-2");
    }
}
