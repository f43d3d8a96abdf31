//! ICT detector: liquidity sweep taken inside a kill zone.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Bar, Signal};

use super::{tail, SignalDetector};

const LOOKBACK: usize = 2;

/// Time-of-day window, in whole UTC hours, both ends inclusive.
///
/// A window whose start is after its end wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillZone {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for KillZone {
    fn default() -> Self {
        // London open
        Self {
            start_hour: 7,
            end_hour: 10,
        }
    }
}

impl KillZone {
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let hour = now.hour();
        if self.start_hour <= self.end_hour {
            (self.start_hour..=self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour <= self.end_hour
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start_hour < 24 && self.end_hour < 24
    }
}

/// Votes against the side whose resting liquidity was just swept.
pub struct IctDetector {
    kill_zone: KillZone,
}

impl IctDetector {
    pub fn new(kill_zone: KillZone) -> Self {
        Self { kill_zone }
    }
}

impl SignalDetector for IctDetector {
    fn name(&self) -> &str {
        "ICT"
    }

    fn min_lookback(&self) -> usize {
        LOOKBACK
    }

    fn signal(&self, window: &[Bar], now: DateTime<Utc>) -> Signal {
        let Some(bars) = tail(window, LOOKBACK) else {
            return Signal::Abstain;
        };
        if !self.kill_zone.contains(now) {
            return Signal::Abstain;
        }
        let (prev, last) = (&bars[0], &bars[1]);

        // Sell-side liquidity taken below the prior low
        let swept_lows = last.low < prev.low;
        let swept_highs = last.high > prev.high;

        match (swept_lows, swept_highs) {
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
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn sweep_low() -> Vec<Bar> {
        bars_from(start(), &[
            (dec!(1.1000), dec!(1.1010), dec!(1.0995), dec!(1.1005)),
            (dec!(1.1005), dec!(1.1008), dec!(1.0990), dec!(1.1002)),
        ])
    }

    #[test]
    fn test_sweep_inside_kill_zone_buys() {
        let detector = IctDetector::new(KillZone::default());
        assert_eq!(detector.signal(&sweep_low(), start()), Signal::Buy);
    }

    #[test]
    fn test_sweep_of_highs_sells() {
        let bars = bars_from(start(), &[
            (dec!(1.1000), dec!(1.1010), dec!(1.0995), dec!(1.1005)),
            (dec!(1.1005), dec!(1.1020), dec!(1.0997), dec!(1.1001)),
        ]);
        let detector = IctDetector::new(KillZone::default());
        assert_eq!(detector.signal(&bars, start()), Signal::Sell);
    }

    #[test]
    fn test_outside_bar_abstains() {
        let bars = bars_from(start(), &[
            (dec!(1.1000), dec!(1.1010), dec!(1.0995), dec!(1.1005)),
            (dec!(1.1005), dec!(1.1020), dec!(1.0980), dec!(1.1001)),
        ]);
        let detector = IctDetector::new(KillZone::default());
        assert_eq!(detector.signal(&bars, start()), Signal::Abstain);
    }

    #[test]
    fn test_outside_kill_zone_abstains() {
        let detector = IctDetector::new(KillZone::default());
        let noon = start() + Duration::hours(4);
        assert_eq!(detector.signal(&sweep_low(), noon), Signal::Abstain);

        // 10:59 is still inside the inclusive end hour
        let late = start() + Duration::minutes(179);
        assert_eq!(detector.signal(&sweep_low(), late), Signal::Buy);
    }

    #[test]
    fn test_kill_zone_wraps_midnight() {
        let asia = KillZone {
            start_hour: 23,
            end_hour: 2,
        };
        let at = |h| Utc.with_ymd_and_hms(2024, 3, 4, h, 30, 0).unwrap();
        assert!(asia.contains(at(23)));
        assert!(asia.contains(at(0)));
        assert!(asia.contains(at(2)));
        assert!(!asia.contains(at(3)));
        assert!(!asia.contains(at(22)));
    }

    #[test]
    fn test_single_bar_abstains() {
        let detector = IctDetector::new(KillZone::default());
        assert_eq!(detector.signal(&sweep_low()[1..], start()), Signal::Abstain);
    }
}
