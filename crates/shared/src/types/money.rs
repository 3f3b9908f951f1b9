//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minor units (kobo, pesewas, cents) per major unit for every supported currency.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Maximum decimal places a wallet amount may carry.
pub const MAX_SCALE: u32 = 2;

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g., naira).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// ISO 4217 currency codes the payment gateway settles in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Nigerian Naira
    Ngn,
    /// Ghanaian Cedi
    Ghs,
    /// Kenyan Shilling
    Kes,
    /// South African Rand
    Zar,
    /// US Dollar
    Usd,
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates an amount from gateway minor units (e.g., kobo).
    #[must_use]
    pub fn from_minor_units(minor: i64, currency: Currency) -> Self {
        Self {
            amount: Decimal::new(minor, MAX_SCALE),
            currency,
        }
    }

    /// Converts to gateway minor units.
    ///
    /// Returns `None` if the amount has sub-minor precision or overflows `i64`.
    #[must_use]
    pub fn to_minor_units(&self) -> Option<i64> {
        if !has_wallet_scale(self.amount) {
            return None;
        }
        let minor = self
            .amount
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))?
            .normalize();
        i64::try_from(minor).ok()
    }
}

/// Returns true if `amount` fits in whole minor units.
#[must_use]
pub fn has_wallet_scale(amount: Decimal) -> bool {
    amount.normalize().scale() <= MAX_SCALE
}

impl Currency {
    /// ISO 4217 code, as the gateway reports it.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Ngn => "NGN",
            Self::Ghs => "GHS",
            Self::Kes => "KES",
            Self::Zar => "ZAR",
            Self::Usd => "USD",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NGN" => Ok(Self::Ngn),
            "GHS" => Ok(Self::Ghs),
            "KES" => Ok(Self::Kes),
            "ZAR" => Ok(Self::Zar),
            "USD" => Ok(Self::Usd),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_minor_units_round_trip() {
        let money = Money::from_minor_units(250_050, Currency::Ngn);
        assert_eq!(money.amount, dec!(2500.50));
        assert_eq!(money.to_minor_units(), Some(250_050));
    }

    #[test]
    fn test_whole_amount_to_minor_units() {
        let money = Money::new(dec!(2000), Currency::Ngn);
        assert_eq!(money.to_minor_units(), Some(200_000));
    }

    #[test]
    fn test_sub_kobo_amount_rejected() {
        let money = Money::new(dec!(10.005), Currency::Ngn);
        assert_eq!(money.to_minor_units(), None);
        assert!(!has_wallet_scale(dec!(10.005)));
        assert!(has_wallet_scale(dec!(10.500)));
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("NGN").unwrap(), Currency::Ngn);
        assert_eq!(Currency::from_str("ghs").unwrap(), Currency::Ghs);
        assert_eq!(Currency::Zar.to_string(), "ZAR");
        assert_eq!(Currency::Ghs.code(), "GHS");
        assert!(Currency::from_str("XXX").is_err());
    }
}
