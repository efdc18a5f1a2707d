//! decimal64 precision handling

use crate::errors::{Result, YangError};
use rust_decimal::{Decimal, RoundingStrategy};

/// Largest `fraction-digits` argument YANG allows
pub const MAX_FRACTION_DIGITS: u32 = 18;

/// Check a `fraction-digits` argument
///
/// # Errors
///
/// Returns `InvalidSchema` outside `1..=18`.
pub fn check_fraction_digits(digits: u32) -> Result<u32> {
    if (1..=MAX_FRACTION_DIGITS).contains(&digits) {
        Ok(digits)
    } else {
        Err(YangError::InvalidSchema {
            reason: format!(
                "fraction-digits must be between 1 and {}, got {}",
                MAX_FRACTION_DIGITS, digits
            ),
        })
    }
}

/// Round half-to-even to exactly `digits` decimal places
///
/// The result always carries `digits` places, so `1.5` at two digits
/// becomes `1.50`.
pub fn quantize(value: Decimal, digits: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(digits, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(digits);
    rounded
}
