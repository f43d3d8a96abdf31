//! Consensus voting across enabled detectors.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::detectors::SignalDetector;
use crate::models::{Bar, Decision, Signal, Vote};

use super::StrategyConfig;

/// Runs every enabled detector against one window snapshot and applies a
/// fixed quorum.
pub struct StrategyAggregator {
    detectors: Vec<Box<dyn SignalDetector>>,
    quorum: usize,
}

impl StrategyAggregator {
    /// Create an aggregator over an explicit detector set.
    pub fn new(detectors: Vec<Box<dyn SignalDetector>>, quorum: usize) -> Self {
        Self { detectors, quorum }
    }

    /// Build the configured detector set.
    pub fn from_config(config: &StrategyConfig) -> Self {
        let detectors = config.enabled.iter().map(|kind| kind.build(config)).collect();
        Self::new(detectors, config.quorum)
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Longest lookback among the enabled detectors.
    pub fn min_lookback(&self) -> usize {
        self.detectors
            .iter()
            .map(|d| d.min_lookback())
            .max()
            .unwrap_or(0)
    }

    /// Collect every detector's vote and tally them.
    pub fn evaluate(&self, window: &[Bar], now: DateTime<Utc>) -> Decision {
        let votes: Vec<Vote> = self
            .detectors
            .iter()
            .map(|d| Vote {
                detector: d.name().to_string(),
                signal: d.signal(window, now),
            })
            .collect();

        let signal = tally(&votes, self.quorum);
        let decision = Decision { signal, votes };

        debug!(
            signal = %decision.signal,
            votes = %decision.vote_summary(),
            quorum = self.quorum,
            "Strategy evaluation"
        );

        decision
    }
}

/// Majority-consensus rule.
///
/// A direction wins only if it reaches `quorum` and the opposite side does
/// not. Conflicts and shortfalls abstain.
pub fn tally(votes: &[Vote], quorum: usize) -> Signal {
    if quorum == 0 {
        return Signal::Abstain;
    }
    let buys = votes.iter().filter(|v| v.signal == Signal::Buy).count();
    let sells = votes.iter().filter(|v| v.signal == Signal::Sell).count();

    match (buys >= quorum, sells >= quorum) {
        (true, false) => Signal::Buy,
        (false, true) => Signal::Sell,
        _ => Signal::Abstain,
    }
}
