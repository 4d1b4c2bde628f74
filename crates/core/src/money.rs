use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Cad,
    Chf,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Cad => "CAD",
            Currency::Chf => "CHF",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Cad => "C$",
            Currency::Chf => "CHF ",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "CAD" => Ok(Currency::Cad),
            "CHF" => Ok(Currency::Chf),
            other => Err(format!("Unknown currency: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid amount: '{0}'")]
pub struct ParseMoneyError(pub String);

/// Fixed-point amount in minor currency units (cents) tagged with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub amount_minor: i64,
    pub currency: Currency,
}

impl Money {
    pub const fn from_minor(amount_minor: i64, currency: Currency) -> Self {
        Money { amount_minor, currency }
    }

    pub const fn zero(currency: Currency) -> Self {
        Money { amount_minor: 0, currency }
    }

    /// Rounds to two decimal places before converting to minor units.
    pub fn from_decimal(decimal: Decimal, currency: Currency) -> Option<Self> {
        let minor = (decimal.round_dp(2) * Decimal::from(100)).to_i64()?;
        Some(Money::from_minor(minor, currency))
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.amount_minor, 2)
    }

    /// Parses `12.34`, `-12.34`, `$1,234.56` or accounting-style `(5.00)`.
    pub fn parse(s: &str, currency: Currency) -> Result<Self, ParseMoneyError> {
        let trimmed = s.trim();
        let (negative, body) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
            (true, &trimmed[1..trimmed.len() - 1])
        } else {
            (false, trimmed)
        };
        let cleaned = body.replace([',', ' ', '$', '€', '£'], "");
        let mut dec = Decimal::from_str(&cleaned).map_err(|_| ParseMoneyError(s.to_string()))?;
        if negative {
            dec = -dec;
        }
        Money::from_decimal(dec, currency).ok_or_else(|| ParseMoneyError(s.to_string()))
    }

    /// Fails only on a currency mismatch; the sum saturates at the `i64`
    /// bounds.
    pub fn checked_add(self, rhs: Money) -> Result<Money, MoneyError> {
        self.same_currency(rhs)?;
        Ok(Money::from_minor(self.amount_minor.saturating_add(rhs.amount_minor), self.currency))
    }

    pub fn checked_sub(self, rhs: Money) -> Result<Money, MoneyError> {
        self.same_currency(rhs)?;
        Ok(Money::from_minor(self.amount_minor.saturating_sub(rhs.amount_minor), self.currency))
    }

    /// Multiplies by `numerator / denominator`, truncating toward zero and
    /// saturating at the `i64` bounds.
    pub fn scale(self, numerator: i64, denominator: i64) -> Money {
        if denominator == 0 {
            return Money::zero(self.currency);
        }
        let scaled =
            i128::from(self.amount_minor) * i128::from(numerator) / i128::from(denominator);
        let minor = i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX });
        Money::from_minor(minor, self.currency)
    }

    pub fn abs(self) -> Money {
        Money::from_minor(self.amount_minor.saturating_abs(), self.currency)
    }

    pub fn is_zero(self) -> bool {
        self.amount_minor == 0
    }

    pub fn is_positive(self) -> bool {
        self.amount_minor > 0
    }

    pub fn is_negative(self) -> bool {
        self.amount_minor < 0
    }

    fn same_currency(self, other: Money) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            })
        }
    }
}

/// Amounts in different currencies are unordered.
impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        Some(self.amount_minor.cmp(&other.amount_minor))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        write!(
            f,
            "{sign}{}{}.{:02}",
            self.currency.symbol(),
            abs / 100,
            abs % 100
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(minor: i64) -> Money {
        Money::from_minor(minor, Currency::Usd)
    }

    #[test]
    fn add_and_sub_same_currency() {
        assert_eq!(usd(1050).checked_add(usd(250)).unwrap(), usd(1300));
        assert_eq!(usd(1050).checked_sub(usd(2000)).unwrap(), usd(-950));
    }

    #[test]
    fn mismatched_currency_is_an_error() {
        let eur = Money::from_minor(100, Currency::Eur);
        assert_eq!(
            usd(100).checked_add(eur),
            Err(MoneyError::CurrencyMismatch {
                left: Currency::Usd,
                right: Currency::Eur
            })
        );
        assert!(usd(100).checked_sub(eur).is_err());
    }

    #[test]
    fn mismatched_currency_is_unordered() {
        let eur = Money::from_minor(100, Currency::Eur);
        assert_eq!(usd(100).partial_cmp(&eur), None);
        assert!(usd(100) < usd(101));
        assert_ne!(usd(100), eur);
    }

    #[test]
    fn scale_truncates_toward_zero() {
        assert_eq!(usd(-12000).scale(1, 12), usd(-1000));
        assert_eq!(usd(1000).scale(52, 12), usd(4333));
        assert_eq!(usd(-1000).scale(52, 12), usd(-4333));
        assert_eq!(usd(100).scale(1, 0), usd(0));
    }

    #[test]
    fn arithmetic_saturates_instead_of_overflowing() {
        let max = usd(i64::MAX);
        let min = usd(i64::MIN);
        assert_eq!(max.checked_add(usd(1)).unwrap(), max);
        assert_eq!(min.checked_sub(usd(1)).unwrap(), min);
        assert_eq!(max.scale(52, 12), max);
        assert_eq!(min.scale(3, 1), min);
        assert_eq!(usd(i64::MAX / 2).scale(3, 3), usd(i64::MAX / 2));
        assert_eq!(min.abs(), max);
    }

    #[test]
    fn parse_formats() {
        assert_eq!(Money::parse("12.34", Currency::Usd).unwrap(), usd(1234));
        assert_eq!(Money::parse("-5", Currency::Usd).unwrap(), usd(-500));
        assert_eq!(Money::parse("$1,234.56", Currency::Usd).unwrap(), usd(123456));
        assert_eq!(Money::parse("(75.25)", Currency::Usd).unwrap(), usd(-7525));
        assert!(Money::parse("twelve", Currency::Usd).is_err());
        assert!(Money::parse("", Currency::Usd).is_err());
    }

    #[test]
    fn decimal_round_trip() {
        let m = Money::from_decimal(Decimal::new(199_999, 4), Currency::Gbp).unwrap();
        assert_eq!(m.amount_minor, 2000);
        assert_eq!(m.to_decimal(), Decimal::new(2000, 2));
    }

    #[test]
    fn display_uses_symbol_and_sign() {
        assert_eq!(usd(123456).to_string(), "$1234.56");
        assert_eq!(usd(-5).to_string(), "-$0.05");
        assert_eq!(Money::from_minor(1000, Currency::Eur).to_string(), "€10.00");
    }

    #[test]
    fn currency_from_str() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(Currency::Chf.to_string(), "CHF");
        assert!("XYZ".parse::<Currency>().is_err());
    }
}
