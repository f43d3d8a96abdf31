//! Signal detectors: independent price-action heuristics that each cast a vote.
//!
//! Detectors are pure functions of a bar window and an evaluation time. They
//! never fail; a window shorter than [`SignalDetector::min_lookback`] yields
//! [`Signal::Abstain`]. New strategies only need to implement the trait and be
//! handed to the aggregator.

mod custom;
mod ict;
mod smc;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Bar, Signal};
use crate::trading::StrategyConfig;

pub use custom::CandleDirectionDetector;
pub use ict::{IctDetector, KillZone};
pub use smc::{SmcConfig, SmcDetector};

/// A single voting strategy.
pub trait SignalDetector: Send + Sync {
    /// Label used in votes and logs.
    fn name(&self) -> &str;

    /// Bars required before the detector can produce a directional signal.
    fn min_lookback(&self) -> usize;

    /// Vote on the latest bar of `window` (oldest first).
    fn signal(&self, window: &[Bar], now: DateTime<Utc>) -> Signal;
}

/// Built-in detector families selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectorKind {
    /// Smart-money concepts: break of structure + fair value gap
    Smc,
    /// Liquidity sweep inside a kill zone
    Ict,
    /// Candle body direction
    Custom,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Smc => "SMC",
            DetectorKind::Ict => "ICT",
            DetectorKind::Custom => "CUSTOM",
        }
    }

    /// Instantiate the detector with its configured parameters.
    pub fn build(&self, config: &StrategyConfig) -> Box<dyn SignalDetector> {
        match self {
            DetectorKind::Smc => Box::new(SmcDetector::new(config.smc.clone())),
            DetectorKind::Ict => Box::new(IctDetector::new(config.kill_zone)),
            DetectorKind::Custom => Box::new(CandleDirectionDetector),
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Last `n` bars of the window, or `None` if it is too short.
pub(crate) fn tail(window: &[Bar], n: usize) -> Option<&[Bar]> {
    if n == 0 || window.len() < n {
        return None;
    }
    Some(&window[window.len() - n..])
}
