//! Amounts live in the database as paise (`i64`) and percents as basis points
//! (`i32`, 100% = 10000). `Decimal` is only used at the API boundary.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{AppError, AppResult};

pub const MAX_PERCENT_BP: i32 = 10_000;

/// 45000 -> 450.00
pub fn paise_to_decimal(paise: i64) -> Decimal {
    Decimal::new(paise, 2)
}

/// 12.5 -> 1250. Rejects more than two decimal places and anything outside 0..=100.
pub fn percent_to_bp(percent: Decimal) -> AppResult<i32> {
    let percent = percent.normalize();
    if percent.scale() > 2 {
        return Err(AppError::ValidationError(
            "Commission percent allows at most 2 decimal places".to_string(),
        ));
    }
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(AppError::ValidationError(
            "Commission percent must be between 0 and 100".to_string(),
        ));
    }
    (percent * Decimal::ONE_HUNDRED)
        .to_i32()
        .ok_or_else(|| AppError::ValidationError("Invalid commission percent".to_string()))
}

pub fn bp_to_percent(bp: i32) -> Decimal {
    Decimal::new(i64::from(bp), 2)
}

/// Price in rupees with at most two decimals, not negative, to paise.
pub fn decimal_to_paise(amount: Decimal) -> AppResult<i64> {
    let amount = amount.normalize();
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::ValidationError(
            "Amount must not be negative".to_string(),
        ));
    }
    if amount.scale() > 2 {
        return Err(AppError::ValidationError(
            "Amount allows at most 2 decimal places".to_string(),
        ));
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|paise| paise.to_i64())
        .ok_or_else(|| AppError::ValidationError("Amount is out of range".to_string()))
}
