//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for exact base-10 arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest scale (digits after the decimal point) a `Decimal` can carry.
const MAX_SCALE: u32 = 28;

/// Errors produced by monetary arithmetic and construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Operands carry different currencies.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch {
        /// Currency of the left-hand operand.
        expected: Currency,
        /// Currency of the right-hand operand.
        actual: Currency,
    },

    /// The result does not fit in a `Decimal`.
    #[error("Monetary amount overflow")]
    Overflow,

    /// The base-10 exponent cannot be represented.
    #[error("Exponent {0} is out of range")]
    ExponentOutOfRange(i32),

    /// The amount has more fractional digits than the currency allows.
    #[error("{currency} amounts allow at most {allowed} decimal places, got {scale}")]
    ExcessPrecision {
        /// The currency of the amount.
        currency: Currency,
        /// The currency's minor-unit scale.
        allowed: u32,
        /// The scale of the offending amount.
        scale: u32,
    },
}

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The exact decimal amount in major units (e.g. 30.00 NGN).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "NGN", "USD").
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Nigerian Naira
    Ngn,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// Japanese Yen
    Jpy,
}

impl Currency {
    /// Returns the ISO 4217 alphabetic code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Ngn => "NGN",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
        }
    }

    /// Number of decimal places of the currency's minor unit.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Jpy => 0,
            Self::Ngn | Self::Usd | Self::Eur | Self::Gbp => 2,
        }
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Builds an exact amount from an integer coefficient and a base-10 exponent.
    ///
    /// The value is `coefficient * 10^exponent`, so `(3000, -2)` is `30.00`.
    /// Nothing is ever rounded: values that cannot be represented exactly are errors.
    pub fn from_parts(
        coefficient: i128,
        exponent: i32,
        currency: Currency,
    ) -> Result<Self, MoneyError> {
        let amount = decimal_from_parts(coefficient, exponent)?;
        Ok(Self::new(amount, currency))
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Checks that the amount fits the currency's minor-unit scale.
    ///
    /// Trailing zeros are ignored, so `30.000 NGN` is accepted while `30.005 NGN` is not.
    pub fn check_scale(&self) -> Result<(), MoneyError> {
        let scale = self.amount.normalize().scale();
        let allowed = self.currency.minor_units();
        if scale > allowed {
            return Err(MoneyError::ExcessPrecision {
                currency: self.currency,
                allowed,
                scale,
            });
        }
        Ok(())
    }

    /// Adds two amounts of the same currency.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(amount, self.currency))
    }

    /// Subtracts an amount of the same currency.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(amount, self.currency))
    }

    fn ensure_same_currency(self, other: Self) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.currency,
                actual: other.currency,
            });
        }
        Ok(())
    }
}

/// Converts `coefficient * 10^exponent` into a `Decimal` without rounding.
pub fn decimal_from_parts(coefficient: i128, exponent: i32) -> Result<Decimal, MoneyError> {
    if exponent <= 0 {
        let scale = exponent.unsigned_abs();
        if scale > MAX_SCALE {
            return Err(MoneyError::ExponentOutOfRange(exponent));
        }
        return Decimal::try_from_i128_with_scale(coefficient, scale)
            .map_err(|_| MoneyError::Overflow);
    }

    if exponent.unsigned_abs() > MAX_SCALE {
        return Err(MoneyError::ExponentOutOfRange(exponent));
    }
    let mut value =
        Decimal::try_from_i128_with_scale(coefficient, 0).map_err(|_| MoneyError::Overflow)?;
    for _ in 0..exponent {
        value = value.checked_mul(Decimal::TEN).ok_or(MoneyError::Overflow)?;
    }
    Ok(value)
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NGN" => Ok(Self::Ngn),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "JPY" => Ok(Self::Jpy),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_money_new() {
        let amount = dec!(100.00);
        let money = Money::new(amount, Currency::Ngn);
        assert_eq!(money.amount, amount);
        assert_eq!(money.currency, Currency::Ngn);
    }

    #[test]
    fn test_money_zero() {
        let money = Money::zero(Currency::Usd);
        assert!(money.is_zero());
        assert!(!money.is_positive());
        assert!(!money.is_negative());
    }

    #[rstest]
    #[case(3000, -2, dec!(30.00))]
    #[case(5, 0, dec!(5))]
    #[case(15, 1, dec!(150))]
    #[case(-125, -3, dec!(-0.125))]
    #[case(1, -28, dec!(0.0000000000000000000000000001))]
    fn test_from_parts(
        #[case] coefficient: i128,
        #[case] exponent: i32,
        #[case] expected: Decimal,
    ) {
        let money = Money::from_parts(coefficient, exponent, Currency::Ngn).unwrap();
        assert_eq!(money.amount, expected);
    }

    #[test]
    fn test_from_parts_keeps_scale() {
        let money = Money::from_parts(3000, -2, Currency::Ngn).unwrap();
        assert_eq!(money.amount.to_string(), "30.00");
    }

    #[test]
    fn test_from_parts_rejects_unrepresentable() {
        assert_eq!(
            Money::from_parts(1, -29, Currency::Usd),
            Err(MoneyError::ExponentOutOfRange(-29))
        );
        assert_eq!(
            Money::from_parts(1, 29, Currency::Usd),
            Err(MoneyError::ExponentOutOfRange(29))
        );
        assert_eq!(
            Money::from_parts(i128::MAX, 0, Currency::Usd),
            Err(MoneyError::Overflow)
        );
        assert_eq!(
            Money::from_parts(i128::from(i64::MAX), 20, Currency::Usd),
            Err(MoneyError::Overflow)
        );
    }

    #[rstest]
    #[case(dec!(30.00), Currency::Ngn, true)]
    #[case(dec!(30.000), Currency::Ngn, true)]
    #[case(dec!(30.005), Currency::Ngn, false)]
    #[case(dec!(100), Currency::Jpy, true)]
    #[case(dec!(100.5), Currency::Jpy, false)]
    fn test_check_scale(#[case] amount: Decimal, #[case] currency: Currency, #[case] ok: bool) {
        assert_eq!(Money::new(amount, currency).check_scale().is_ok(), ok);
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::new(dec!(100.00), Currency::Ngn);
        let b = Money::new(dec!(30.00), Currency::Ngn);
        assert_eq!(a.checked_sub(b).unwrap().amount, dec!(70.00));
        assert_eq!(a.checked_add(b).unwrap().amount, dec!(130.00));

        let usd = Money::new(dec!(1), Currency::Usd);
        assert_eq!(
            a.checked_add(usd),
            Err(MoneyError::CurrencyMismatch {
                expected: Currency::Ngn,
                actual: Currency::Usd,
            })
        );
        assert_eq!(
            Money::new(Decimal::MAX, Currency::Ngn).checked_add(b),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn test_exact_decimal_has_no_drift() {
        let mut total = Money::zero(Currency::Usd);
        for _ in 0..10 {
            total = total
                .checked_add(Money::new(dec!(0.10), Currency::Usd))
                .unwrap();
        }
        assert_eq!(total.amount, dec!(1.00));
    }

    #[test]
    fn test_currency_display_and_parse() {
        assert_eq!(Currency::Ngn.to_string(), "NGN");
        assert_eq!(Currency::from_str("ngn").unwrap(), Currency::Ngn);
        assert_eq!(Currency::from_str("GBP").unwrap(), Currency::Gbp);
        assert!(Currency::from_str("XXX").is_err());
        assert!(Currency::from_str("").is_err());
    }

    #[test]
    fn test_money_serializes_amount_as_string() {
        let money = Money::new(dec!(30.00), Currency::Ngn);
        let json = serde_json::to_value(money).unwrap();
        assert_eq!(json["amount"], "30.00");
        assert_eq!(json["currency"], "NGN");
    }
}
