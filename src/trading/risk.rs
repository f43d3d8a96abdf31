//! Position sizing against broker volume bounds.

use rust_decimal::Decimal;

use crate::error::RiskError;

use super::RiskParameters;

/// Converts an account balance into a tradeable lot size.
pub struct RiskManager {
    params: RiskParameters,
}

impl RiskManager {
    pub fn new(params: RiskParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RiskParameters {
        &self.params
    }

    /// Size a position for `balance` with the session's parameters.
    pub fn size(&self, balance: Decimal) -> Result<Decimal, RiskError> {
        size_position(balance, &self.params)
    }
}

/// Lot size for `balance`.
///
/// `balance * risk_fraction`, capped at `max_lot` and floored to `lot_step`.
/// Anything that would land under `min_lot` is an error rather than an
/// undersized or zero trade.
pub fn size_position(balance: Decimal, params: &RiskParameters) -> Result<Decimal, RiskError> {
    let insufficient = |computed_lot: Decimal| RiskError::InsufficientBalance {
        balance,
        computed_lot,
        min_lot: params.min_lot,
    };

    if balance <= Decimal::ZERO {
        return Err(insufficient(Decimal::ZERO));
    }

    if balance < params.min_account_balance {
        return Err(RiskError::BelowAccountFloor {
            balance,
            floor: params.min_account_balance,
        });
    }

    let raw = balance * params.risk_fraction;
    if raw < params.min_lot {
        return Err(insufficient(raw));
    }

    let capped = raw.min(params.max_lot);
    let steps = capped
        .checked_div(params.lot_step)
        .ok_or(RiskError::UnrepresentableLot {
            lot: capped,
            lot_step: params.lot_step,
        })?;
    let stepped = steps.floor() * params.lot_step;

    if stepped < params.min_lot {
        return Err(insufficient(stepped));
    }

    Ok(stepped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn params(min_lot: Decimal, max_lot: Decimal, lot_step: Decimal) -> RiskParameters {
        RiskParameters {
            risk_fraction: dec!(0.01),
            min_lot,
            max_lot,
            lot_step,
            ..Default::default()
        }
    }

    #[test]
    fn test_standard_sizing() {
        let lot = size_position(dec!(10000), &params(dec!(0.01), dec!(100), dec!(0.01))).unwrap();
        assert_eq!(lot, dec!(100.00));
    }

    #[test]
    fn test_below_min_lot_fails() {
        let result = size_position(dec!(5), &params(dec!(0.1), dec!(100), dec!(0.01)));
        assert_eq!(
            result,
            Err(RiskError::InsufficientBalance {
                balance: dec!(5),
                computed_lot: dec!(0.05),
                min_lot: dec!(0.1),
            })
        );
    }

    #[test]
    fn test_caps_at_max_lot() {
        let lot = size_position(dec!(1000000), &params(dec!(0.01), dec!(50), dec!(0.01))).unwrap();
        assert_eq!(lot, dec!(50));
    }

    #[test]
    fn test_rounds_down_to_step() {
        // 1234.5 * 0.01 = 12.345 -> 12.3 with a 0.1 step
        let lot = size_position(dec!(1234.5), &params(dec!(0.1), dec!(100), dec!(0.1))).unwrap();
        assert_eq!(lot, dec!(12.3));
    }

    #[test]
    fn test_step_rounding_below_min_fails() {
        // 0.15 clears min 0.12 but floors to 0.1 on a 0.1 step
        let result = size_position(dec!(15), &params(dec!(0.12), dec!(100), dec!(0.1)));
        assert!(matches!(result, Err(RiskError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_non_positive_balance_fails() {
        let p = params(dec!(0.01), dec!(100), dec!(0.01));
        for balance in [Decimal::ZERO, dec!(-100)] {
            assert_eq!(
                size_position(balance, &p),
                Err(RiskError::InsufficientBalance {
                    balance,
                    computed_lot: Decimal::ZERO,
                    min_lot: dec!(0.01),
                })
            );
        }

        // Still insufficient, not a floor breach, when a floor is configured
        let floored = RiskParameters {
            min_account_balance: dec!(100),
            ..p
        };
        assert!(matches!(
            size_position(dec!(-5), &floored),
            Err(RiskError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_tiny_lot_step_errors_instead_of_overflowing() {
        let p = params(dec!(0.01), dec!(100), Decimal::new(1, 28));
        assert_eq!(
            size_position(dec!(10000), &p),
            Err(RiskError::UnrepresentableLot {
                lot: dec!(100),
                lot_step: Decimal::new(1, 28),
            })
        );
    }

    #[test]
    fn test_account_floor() {
        let p = RiskParameters {
            min_account_balance: dec!(100),
            ..Default::default()
        };
        let manager = RiskManager::new(p);
        assert!(matches!(manager.size(dec!(99)), Err(RiskError::BelowAccountFloor { .. })));
        assert_eq!(manager.size(dec!(100)).unwrap(), dec!(1));
    }
}
