//! Conversions between human decimal strings and raw token units.

use alloy::primitives::utils::{format_units as alloy_format_units, parse_units as alloy_parse_units};
use alloy::primitives::U256;

use crate::errors::LeverageError;

/// Parse a decimal string such as `"0.24"` into raw units with `decimals` places.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, LeverageError> {
    let parsed = alloy_parse_units(amount, decimals).map_err(|e| {
        LeverageError::Validation(format!("invalid amount {amount:?} for {decimals} decimals: {e}"))
    })?;
    if parsed.is_negative() {
        return Err(LeverageError::Validation(format!(
            "amount {amount:?} is negative"
        )));
    }
    Ok(parsed.get_absolute())
}

/// Render raw units as a decimal string with `decimals` places.
pub fn format_units(amount: U256, decimals: u8) -> Result<String, LeverageError> {
    alloy_format_units(amount, decimals)
        .map_err(|e| LeverageError::Validation(format!("cannot format {amount}: {e}")))
}
