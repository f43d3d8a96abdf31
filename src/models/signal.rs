//! Detector signals, trade directions and aggregated decisions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Output of a single detector for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Abstain,
}

impl Signal {
    /// Direction this signal points at, if any.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Signal::Buy => Some(Direction::Buy),
            Signal::Sell => Some(Direction::Sell),
            Signal::Abstain => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Abstain => "ABSTAIN",
        }
    }
}


impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One detector's contribution to a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub detector: String,
    pub signal: Signal,
}

/// Aggregated verdict plus the votes that produced it, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub signal: Signal,
    pub votes: Vec<Vote>,
}

impl Decision {
    pub fn direction(&self) -> Option<Direction> {
        self.signal.direction()
    }

    pub fn is_abstain(&self) -> bool {
        self.signal == Signal::Abstain
    }

    /// Number of votes matching `signal`.
    pub fn count(&self, signal: Signal) -> usize {
        self.votes.iter().filter(|v| v.signal == signal).count()
    }

    /// Compact vote summary for log lines, e.g. `SMC=BUY ICT=ABSTAIN`.
    pub fn vote_summary(&self) -> String {
        self.votes
            .iter()
            .map(|v| format!("{}={}", v.detector, v.signal))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
