//! Minor-unit money representation.
//!
//! All amounts are carried as integer minor units (pence for GBP) to avoid
//! floating-point rounding through cart math and order metadata. Major-unit
//! values are derived only at the display/snapshot boundary via
//! `rust_decimal`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors from money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// Addition or multiplication overflowed the minor-unit range.
    #[error("money amount overflow")]
    Overflow,
    /// Two amounts in different currencies cannot be combined.
    #[error("currency mismatch: {0} vs {1}")]
    CurrencyMismatch(CurrencyCode, CurrencyCode),
}

/// An amount of money in integer minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the smallest currency unit (e.g., pence for GBP).
    pub minor: i64,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Money {
    /// Create a money value from minor units.
    #[must_use]
    pub const fn from_minor(minor: i64, currency: CurrencyCode) -> Self {
        Self { minor, currency }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self { minor: 0, currency }
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn minor(&self) -> i64 {
        self.minor
    }

    /// Checked addition. Fails on overflow or currency mismatch.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` if the currencies differ and
    /// `MoneyError::Overflow` if the sum leaves the i64 range.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(self.currency, other.currency));
        }
        let minor = self
            .minor
            .checked_add(other.minor)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self {
            minor,
            currency: self.currency,
        })
    }

    /// Checked multiplication by a quantity.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the product leaves the i64 range.
    pub fn checked_mul(self, quantity: u32) -> Result<Self, MoneyError> {
        let minor = self
            .minor
            .checked_mul(i64::from(quantity))
            .ok_or(MoneyError::Overflow)?;
        Ok(Self {
            minor,
            currency: self.currency,
        })
    }

    /// The amount in major units as a two-decimal value (e.g., 499 → 4.99).
    #[must_use]
    pub fn to_major(&self) -> Decimal {
        Decimal::new(self.minor, 2)
    }

    /// Format for display (e.g., "£4.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency.symbol(), self.to_major())
    }
}

/// ISO 4217 currency codes supported by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    GBP,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Currency symbol for display formatting.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::GBP => "£",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::GBP => "GBP",
            Self::USD => "USD",
            Self::EUR => "EUR",
        }
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GBP" => Ok(Self::GBP),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            other => Err(format!("unsupported currency code: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_add() {
        let a = Money::from_minor(500, CurrencyCode::GBP);
        let b = Money::from_minor(250, CurrencyCode::GBP);
        assert_eq!(a.checked_add(b).unwrap().minor(), 750);
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let a = Money::from_minor(500, CurrencyCode::GBP);
        let b = Money::from_minor(250, CurrencyCode::USD);
        assert!(matches!(
            a.checked_add(b),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn test_checked_add_overflow() {
        let a = Money::from_minor(i64::MAX, CurrencyCode::GBP);
        let b = Money::from_minor(1, CurrencyCode::GBP);
        assert_eq!(a.checked_add(b), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_checked_mul() {
        // quantity 2 at 500 minor units -> 1000, per the cart totals contract
        let unit = Money::from_minor(500, CurrencyCode::GBP);
        assert_eq!(unit.checked_mul(2).unwrap().minor(), 1000);
    }

    #[test]
    fn test_to_major() {
        let m = Money::from_minor(499, CurrencyCode::GBP);
        assert_eq!(m.to_major().to_string(), "4.99");
    }

    #[test]
    fn test_display() {
        let m = Money::from_minor(1050, CurrencyCode::GBP);
        assert_eq!(m.display(), "£10.50");
        let m = Money::from_minor(5, CurrencyCode::EUR);
        assert_eq!(m.display(), "€0.05");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("gbp".parse::<CurrencyCode>().unwrap(), CurrencyCode::GBP);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
