//! Decimal type utilities for fixed two-decimal money amounts

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

use crate::error::{Error, Result};

/// Monetary amount with fixed two-decimal precision
pub type Amount = Decimal;

/// Precision helpers for money amounts
pub mod money {
    use super::*;

    /// All monetary values are stored with two decimal places
    pub const MONEY_PRECISION: u32 = 2;

    /// Round an amount to money precision
    pub fn round(amount: Amount) -> Amount {
        amount.round_dp(MONEY_PRECISION)
    }

    /// Validate a transaction amount: strictly positive, at most two
    /// decimal places
    pub fn validate_amount(amount: Amount) -> Result<Amount> {
        if amount <= Amount::ZERO {
            return Err(Error::ValidationError(format!(
                "Amount must be strictly positive, got {}",
                amount
            )));
        }
        if amount.normalize().scale() > MONEY_PRECISION {
            return Err(Error::ValidationError(format!(
                "Amount must have at most {} decimal places, got {}",
                MONEY_PRECISION, amount
            )));
        }
        Ok(round(amount))
    }
}
