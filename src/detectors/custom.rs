//! Candle-direction detector.

use chrono::{DateTime, Utc};

use crate::models::{Bar, Signal};

use super::SignalDetector;

/// Follows the body of the latest candle. Dojis abstain.
pub struct CandleDirectionDetector;

impl SignalDetector for CandleDirectionDetector {
    fn name(&self) -> &str {
        "CUSTOM"
    }

    fn min_lookback(&self) -> usize {
        1
    }

    fn signal(&self, window: &[Bar], _now: DateTime<Utc>) -> Signal {
        match window.last() {
            Some(bar) if bar.is_bullish() => Signal::Buy,
            Some(bar) if bar.is_bearish() => Signal::Sell,
            _ => Signal::Abstain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{bars_from, start};
    use rust_decimal_macros::dec;

    #[test]
    fn test_follows_latest_body() {
        let bars = bars_from(start(), &[
            (dec!(1.1000), dec!(1.1010), dec!(1.0990), dec!(1.0995)),
            (dec!(1.0995), dec!(1.1010), dec!(1.0990), dec!(1.1005)),
        ]);
        assert_eq!(CandleDirectionDetector.signal(&bars, start()), Signal::Buy);
        assert_eq!(CandleDirectionDetector.signal(&bars[..1], start()), Signal::Sell);
    }

    #[test]
    fn test_doji_and_empty_abstain() {
        let bars = bars_from(start(), &[(dec!(1.1000), dec!(1.1010), dec!(1.0990), dec!(1.1000))]);
        assert_eq!(CandleDirectionDetector.signal(&bars, start()), Signal::Abstain);
        assert_eq!(CandleDirectionDetector.signal(&[], start()), Signal::Abstain);
    }
}
