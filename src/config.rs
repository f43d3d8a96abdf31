//! Application configuration, loaded once at startup.
//!
//! Every section is optional in the TOML file; missing values fall back to
//! the defaults below. A config that fails validation aborts startup.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::models::{AccountHandle, Timeframe};
use crate::trading::{ExecutionConfig, RiskParameters, StrategyAggregator, StrategyConfig};

/// Full configuration surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Traded instruments, one trading loop each
    pub symbols: Vec<String>,

    /// Bar timeframe
    pub timeframe: Timeframe,

    /// Bars kept in each loop's evaluation window
    pub history_bars: usize,

    pub risk: RiskParameters,

    pub strategy: StrategyConfig,

    pub execution: ExecutionConfig,

    /// Accounts that mirror every confirmed trade
    pub accounts: Vec<AccountHandle>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["EURUSD".to_string()],
            timeframe: Timeframe::M15,
            history_bars: 200,
            risk: RiskParameters::default(),
            strategy: StrategyConfig::default(),
            execution: ExecutionConfig::default(),
            accounts: vec![
                AccountHandle::new("ACC-1"),
                AccountHandle::new("ACC-2"),
                AccountHandle::new("ACC-3"),
            ],
        }
    }
}

impl AppConfig {
    /// Load from `path`, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration");
                let content = std::fs::read_to_string(path)?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse without validating.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.risk.validate()?;
        self.strategy.validate()?;
        self.execution.validate()?;

        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("at least one symbol is required".to_string()));
        }
        let symbols: HashSet<_> = self.symbols.iter().collect();
        if symbols.len() != self.symbols.len() {
            return Err(ConfigError::Invalid("duplicate symbol".to_string()));
        }
        if self.symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid("empty symbol name".to_string()));
        }

        let ids: HashSet<_> = self.accounts.iter().map(|a| &a.id).collect();
        if ids.len() != self.accounts.len() {
            return Err(ConfigError::Invalid("duplicate linked account".to_string()));
        }

        let lookback = StrategyAggregator::from_config(&self.strategy).min_lookback();
        if self.history_bars < lookback {
            return Err(ConfigError::Invalid(format!(
                "history_bars {} is shorter than the {} bars the detectors need",
                self.history_bars, lookback
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::DetectorKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.symbols, vec!["EURUSD"]);
        assert_eq!(config.timeframe, Timeframe::M15);
        assert_eq!(config.risk.risk_fraction, dec!(0.01));
        assert_eq!(config.risk.max_trades_per_day, 3);
        assert_eq!(config.strategy.quorum, 2);
        assert_eq!(config.accounts.len(), 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
            symbols = ["EURUSD", "GBPUSD"]
            timeframe = "H1"

            [risk]
            risk_fraction = "0.02"
            max_trades_per_day = 5

            [strategy]
            enabled = ["SMC", "CUSTOM"]
            quorum = 2

            [strategy.kill_zone]
            start_hour = 12
            end_hour = 15

            [[accounts]]
            id = "100564040"
            server = "MetaQuotes-Demo"
        "#;

        let config = AppConfig::from_toml_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.symbols.len(), 2);
        assert_eq!(config.timeframe, Timeframe::H1);
        assert_eq!(config.risk.risk_fraction, dec!(0.02));
        assert_eq!(config.risk.max_trades_per_day, 5);
        assert_eq!(config.risk.min_lot, dec!(0.01));
        assert_eq!(config.strategy.enabled, vec![DetectorKind::Smc, DetectorKind::Custom]);
        assert_eq!(config.strategy.kill_zone.start_hour, 12);
        assert_eq!(config.accounts, vec![AccountHandle {
                id: "100564040".to_string(),
                server: Some("MetaQuotes-Demo".to_string()),
            }]);
        assert_eq!(config.execution, ExecutionConfig::default());
    }

    #[test]
    fn test_invalid_risk_is_fatal() {
        let toml = r#"
            [risk]
            risk_fraction = "0"
        "#;
        let config = AppConfig::from_toml_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRisk(_))));
    }

    #[test]
    fn test_unknown_detector_fails_to_parse() {
        let toml = r#"
            [strategy]
            enabled = ["ELLIOTT"]
        "#;
        assert!(matches!(AppConfig::from_toml_str(toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_duplicate_accounts_rejected() {
        let config = AppConfig {
            accounts: vec![AccountHandle::new("ACC-1"), AccountHandle::new("ACC-1")],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_history_must_cover_lookback() {
        let config = AppConfig {
            history_bars: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/fxtrader.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
