//! Trading configuration: risk bounds, strategy selection, execution settings.

use std::collections::HashSet;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::detectors::{DetectorKind, KillZone, SmcConfig};
use crate::error::ConfigError;

/// Position sizing and trade frequency limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParameters {
    /// Fraction of balance converted into lots (0.0 exclusive to 1.0)
    pub risk_fraction: Decimal,

    /// Maximum confirmed trades per symbol per UTC day
    pub max_trades_per_day: u32,

    /// Broker minimum volume
    pub min_lot: Decimal,

    /// Broker maximum volume
    pub max_lot: Decimal,

    /// Broker volume increment
    pub lot_step: Decimal,

    /// Refuse to size below this account balance
    pub min_account_balance: Decimal,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            risk_fraction: dec!(0.01),          // 1% per trade
            max_trades_per_day: 3,
            min_lot: dec!(0.01),                // Micro lot
            max_lot: dec!(100),
            lot_step: dec!(0.01),
            min_account_balance: Decimal::ZERO, // No floor
        }
    }
}

impl RiskParameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidRisk(msg));

        if self.risk_fraction <= Decimal::ZERO || self.risk_fraction > Decimal::ONE {
            return invalid(format!("risk_fraction {} must be in (0, 1]", self.risk_fraction));
        }
        if self.max_trades_per_day == 0 {
            return invalid("max_trades_per_day must be at least 1".to_string());
        }
        if self.min_lot <= Decimal::ZERO {
            return invalid(format!("min_lot {} must be positive", self.min_lot));
        }
        if self.max_lot < self.min_lot {
            return invalid(format!("max_lot {} is below min_lot {}", self.max_lot, self.min_lot));
        }
        if self.lot_step <= Decimal::ZERO {
            return invalid(format!("lot_step {} must be positive", self.lot_step));
        }
        if self.lot_step > self.max_lot || self.max_lot.checked_div(self.lot_step).is_none() {
            return invalid(format!(
                "lot_step {} cannot express lots up to max_lot {}",
                self.lot_step, self.max_lot
            ));
        }
        if self.min_account_balance < Decimal::ZERO {
            return invalid("min_account_balance cannot be negative".to_string());
        }
        Ok(())
    }
}

/// Which detectors vote and how many must agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Enabled detectors
    pub enabled: Vec<DetectorKind>,

    /// Agreeing votes required for a directional decision
    pub quorum: usize,

    /// SMC parameters
    pub smc: SmcConfig,

    /// ICT session window
    pub kill_zone: KillZone,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            enabled: vec![DetectorKind::Smc, DetectorKind::Ict, DetectorKind::Custom],
            quorum: 2,
            smc: SmcConfig::default(),
            kill_zone: KillZone::default(),
        }
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidStrategy(msg));

        if self.enabled.is_empty() {
            return invalid("at least one detector must be enabled".to_string());
        }
        let unique: HashSet<_> = self.enabled.iter().collect();
        if unique.len() != self.enabled.len() {
            return invalid("detectors may only be enabled once".to_string());
        }
        if self.quorum == 0 {
            return invalid("quorum must be at least 1".to_string());
        }
        if self.quorum > self.enabled.len() {
            return invalid(format!(
                "quorum {} exceeds the {} enabled detectors",
                self.quorum,
                self.enabled.len()
            ));
        }
        if !self.kill_zone.is_valid() {
            return invalid("kill zone hours must be 0-23".to_string());
        }
        Ok(())
    }
}

/// Gateway and replication settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Bound on a single order submission
    pub submit_timeout_secs: u64,

    /// Bound on each linked-account send
    pub replication_timeout_secs: u64,

    /// Maximum price deviation in points
    pub deviation: u32,

    /// Order tag identifying this bot
    pub magic: u64,

    /// Order comment
    pub comment: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            submit_timeout_secs: 10,
            replication_timeout_secs: 10,
            deviation: 10,
            magic: 123456,
            comment: "fxtrader".to_string(),
        }
    }
}

impl ExecutionConfig {
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn replication_timeout(&self) -> Duration {
        Duration::from_secs(self.replication_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.submit_timeout_secs == 0 || self.replication_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least one second".to_string()));
        }
        Ok(())
    }
}
