//! Smart-money concepts detector: break of structure confirmed by a fair value gap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Bar, Signal};

use super::{tail, SignalDetector};

const LOOKBACK: usize = 3;

/// SMC detector parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmcConfig {
    /// Also require the latest candle body to point the same way (order block)
    pub confirm_order_block: bool,
}

/// Votes with the structure break when an imbalance backs it.
pub struct SmcDetector {
    config: SmcConfig,
}

impl SmcDetector {
    pub fn new(config: SmcConfig) -> Self {
        Self { config }
    }

    /// Latest close clears the previous bar's high.
    fn bullish_bos(prev: &Bar, last: &Bar) -> bool {
        last.close > prev.high
    }

    fn bearish_bos(prev: &Bar, last: &Bar) -> bool {
        last.close < prev.low
    }

    /// Gap between the high two bars back and the latest low.
    fn bullish_fvg(first: &Bar, last: &Bar) -> bool {
        first.high < last.low
    }

    fn bearish_fvg(first: &Bar, last: &Bar) -> bool {
        first.low > last.high
    }
}

impl SignalDetector for SmcDetector {
    fn name(&self) -> &str {
        "SMC"
    }

    fn min_lookback(&self) -> usize {
        LOOKBACK
    }

    fn signal(&self, window: &[Bar], _now: DateTime<Utc>) -> Signal {
        let Some(bars) = tail(window, LOOKBACK) else {
            return Signal::Abstain;
        };
        let (first, prev, last) = (&bars[0], &bars[1], &bars[2]);

        let bullish = Self::bullish_bos(prev, last)
            && Self::bullish_fvg(first, last)
            && (!self.config.confirm_order_block || last.is_bullish());
        let bearish = Self::bearish_bos(prev, last)
            && Self::bearish_fvg(first, last)
            && (!self.config.confirm_order_block || last.is_bearish());

        match (bullish, bearish) {
            (true, false) => Signal::Buy,
            (false, true) => Signal::Sell,
            _ => Signal::Abstain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{bars_from, start};
    use rust_decimal_macros::dec;

    fn detector() -> SmcDetector {
        SmcDetector::new(SmcConfig::default())
    }

    #[test]
    fn test_bullish_break_with_gap() {
        let bars = bars_from(start(), &[
            (dec!(1.1000), dec!(1.1010), dec!(1.0990), dec!(1.1005)),
            (dec!(1.1005), dec!(1.1020), dec!(1.1000), dec!(1.1015)),
            (dec!(1.1015), dec!(1.1045), dec!(1.1012), dec!(1.1040)),
        ]);
        assert_eq!(detector().signal(&bars, start()), Signal::Buy);
    }

    #[test]
    fn test_bearish_break_with_gap() {
        let bars = bars_from(start(), &[
            (dec!(1.1000), dec!(1.1010), dec!(1.0990), dec!(1.0995)),
            (dec!(1.0995), dec!(1.0998), dec!(1.0980), dec!(1.0985)),
            (dec!(1.0985), dec!(1.0988), dec!(1.0950), dec!(1.0955)),
        ]);
        assert_eq!(detector().signal(&bars, start()), Signal::Sell);
    }

    #[test]
    fn test_break_without_gap_abstains() {
        // Close clears the prior high but the low overlaps the first bar.
        let bars = bars_from(start(), &[
            (dec!(1.1000), dec!(1.1030), dec!(1.0990), dec!(1.1005)),
            (dec!(1.1005), dec!(1.1020), dec!(1.1000), dec!(1.1015)),
            (dec!(1.1015), dec!(1.1045), dec!(1.1012), dec!(1.1040)),
        ]);
        assert_eq!(detector().signal(&bars, start()), Signal::Abstain);
    }

    #[test]
    fn test_order_block_confirmation() {
        // Bullish structure but the latest candle closed below its open.
        let bars = bars_from(start(), &[
            (dec!(1.1000), dec!(1.1010), dec!(1.0990), dec!(1.1005)),
            (dec!(1.1005), dec!(1.1020), dec!(1.1000), dec!(1.1015)),
            (dec!(1.1044), dec!(1.1045), dec!(1.1012), dec!(1.1040)),
        ]);
        assert_eq!(detector().signal(&bars, start()), Signal::Buy);

        let strict = SmcDetector::new(SmcConfig {
            confirm_order_block: true,
        });
        assert_eq!(strict.signal(&bars, start()), Signal::Abstain);
    }

    #[test]
    fn test_short_window_abstains() {
        let bars = bars_from(start(), &[
            (dec!(1.1005), dec!(1.1020), dec!(1.1000), dec!(1.1015)),
            (dec!(1.1015), dec!(1.1045), dec!(1.1012), dec!(1.1040)),
        ]);
        assert_eq!(detector().signal(&bars, start()), Signal::Abstain);
        assert_eq!(detector().signal(&[], start()), Signal::Abstain);
    }
}
