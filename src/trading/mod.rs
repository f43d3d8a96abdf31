//! Trading logic: consensus voting, position sizing, account replication.

mod aggregator;
mod config;
mod replicator;
mod risk;

pub use aggregator::StrategyAggregator;
pub use config::{ExecutionConfig, RiskParameters, StrategyConfig};
pub use replicator::{AccountReplicator, ReplicationReport};
pub use risk::{size_position, RiskManager};
