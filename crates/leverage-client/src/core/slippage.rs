//! Slippage and block-time arithmetic.

use alloy::primitives::U256;

use crate::constants::BPS_DENOMINATOR;
use crate::errors::LeverageError;

/// Reject slippage outside `[0, 10000]` bps.
pub fn validate_slippage_bps(bps: u32) -> Result<(), LeverageError> {
    if bps > BPS_DENOMINATOR {
        return Err(LeverageError::SlippageOutOfRange { bps });
    }
    Ok(())
}

/// `floor(amount * (10000 - bps) / 10000)`, exact over the whole U256 range.
pub fn apply_slippage(amount: U256, bps: u32) -> Result<U256, LeverageError> {
    validate_slippage_bps(bps)?;
    let keep = U256::from(BPS_DENOMINATOR - bps);
    let denominator = U256::from(BPS_DENOMINATOR);
    // Split amount = q * D + r so neither product can exceed amount.
    let (q, r) = (amount / denominator, amount % denominator);
    Ok(q * keep + r * keep / denominator)
}

/// Minutes between `current_block` and `expiration_block`; negative once expired.
pub fn estimate_minutes_until(expiration_block: U256, current_block: u64, blocks_per_minute: f64) -> f64 {
    let expiration = expiration_block.saturating_to::<u64>();
    (expiration as f64 - current_block as f64) / blocks_per_minute
}
