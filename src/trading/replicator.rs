//! Best-effort fan-out of confirmed orders to linked accounts.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::broker::{AccountAck, AccountTarget};
use crate::error::ReplicationError;
use crate::models::{AccountHandle, OrderIntent};

/// Per-account outcome of one fan-out.
#[derive(Debug, Clone)]
pub struct ReplicationReport {
    pub intent_id: Uuid,
    pub delivered: Vec<AccountAck>,
    pub failures: Vec<ReplicationError>,
}

impl ReplicationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failures.len()
    }
}

/// Sends every confirmed intent to a static set of accounts.
///
/// Sends run concurrently and are all joined, each bounded by its own
/// timeout, before the report is returned. One account failing never stops
/// the others.
pub struct AccountReplicator {
    accounts: Vec<AccountHandle>,
    target: Arc<dyn AccountTarget>,
    timeout: Duration,
}

impl AccountReplicator {
    pub fn new(accounts: Vec<AccountHandle>, target: Arc<dyn AccountTarget>, timeout: Duration) -> Self {
        Self {
            accounts,
            target,
            timeout,
        }
    }

    pub fn accounts(&self) -> &[AccountHandle] {
        &self.accounts
    }

    pub async fn replicate(&self, intent: &OrderIntent) -> ReplicationReport {
        let sends = self.accounts.iter().map(|account| async move {
            match tokio::time::timeout(self.timeout, self.target.send(account, intent)).await {
                Ok(result) => result,
                Err(_) => Err(ReplicationError::Timeout {
                    account: account.id.clone(),
                    timeout: self.timeout,
                }),
            }
        });

        let mut report = ReplicationReport {
            intent_id: intent.id,
            delivered: Vec::new(),
            failures: Vec::new(),
        };

        for result in join_all(sends).await {
            match result {
                Ok(ack) => report.delivered.push(ack),
                Err(e) => {
                    warn!(
                        error = %e,
                        symbol = %intent.symbol,
                        timestamp = %intent.timestamp,
                        lot = %intent.lot_size,
                        "Replication to account failed"
                    );
                    report.failures.push(e);
                }
            }
        }

        info!(
            intent = %intent.id,
            delivered = report.delivered.len(),
            failed = report.failures.len(),
            "Replication finished"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    use crate::broker::PaperAccounts;
    use crate::models::Direction;

    fn accounts() -> Vec<AccountHandle> {
        vec![
            AccountHandle::new("ACC-1"),
            AccountHandle::new("ACC-2"),
            AccountHandle::new("ACC-3"),
        ]
    }

    fn intent() -> OrderIntent {
        OrderIntent::new("EURUSD", Direction::Sell, dec!(1.25), Utc::now())
    }

    /// Records what each account received; one account hangs.
    struct Recording {
        received: Mutex<Vec<(String, OrderIntent)>>,
        hanging: &'static str,
    }

    #[async_trait]
    impl AccountTarget for Recording {
        async fn send(
            &self,
            account: &AccountHandle,
            intent: &OrderIntent,
        ) -> Result<AccountAck, ReplicationError> {
            if account.id == self.hanging {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.received
                .lock()
                .unwrap()
                .push((account.id.clone(), intent.clone()));
            Ok(AccountAck {
                account: account.clone(),
                order_id: "ok".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_partial_failure_reaches_other_accounts() {
        let target = Arc::new(PaperAccounts::new().with_unreachable("ACC-2"));
        let replicator = AccountReplicator::new(accounts(), target, Duration::from_secs(1));

        let report = replicator.replicate(&intent()).await;

        assert_eq!(report.attempted(), 3);
        assert!(!report.is_complete());
        let delivered: Vec<_> = report.delivered.iter().map(|a| a.account.id.as_str()).collect();
        assert_eq!(delivered, vec!["ACC-1", "ACC-3"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].account(), "ACC-2");
    }

    #[tokio::test]
    async fn test_hung_account_times_out() {
        let target = Arc::new(Recording {
            received: Mutex::new(Vec::new()),
            hanging: "ACC-3",
        });
        let replicator = AccountReplicator::new(accounts(), target.clone(), Duration::from_millis(50));
        let sent = intent();

        let report = replicator.replicate(&sent).await;

        assert_eq!(report.delivered.len(), 2);
        assert!(matches!(
            report.failures.as_slice(),
            [ReplicationError::Timeout { account, .. }] if account == "ACC-3"
        ));

        let received = target.received.lock().unwrap();
        assert_eq!(received.len(), 2);
        assert!(received.iter().all(|(_, i)| *i == sent));
    }

    #[tokio::test]
    async fn test_no_accounts() {
        let replicator = AccountReplicator::new(Vec::new(), Arc::new(PaperAccounts::new()), Duration::from_secs(1));
        let report = replicator.replicate(&intent()).await;
        assert!(report.is_complete());
        assert_eq!(report.attempted(), 0);
    }
}
