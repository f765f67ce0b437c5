//! Linear vesting with a cliff gate.
//!
//! Accrual runs from the capsule's start time; the cliff only decides when
//! the accrued amount becomes releasable. All arithmetic is integer and
//! overflow-checked.

use anchor_lang::prelude::*;

use crate::error::VestingError;

/// Total accrued since `start_time`, capped at `rate * duration`.
pub fn accrued_amount(
    duration_seconds: u64,
    rate_per_second: u64,
    start_time: i64,
    now: i64,
) -> Result<u64> {
    if now <= start_time {
        return Ok(0);
    }
    let elapsed = now.abs_diff(start_time).min(duration_seconds);
    let accrued = (elapsed as u128)
        .checked_mul(rate_per_second as u128)
        .ok_or(VestingError::MathOverflow)?;
    Ok(u64::try_from(accrued).map_err(|_| VestingError::MathOverflow)?)
}

/// Releasable amount at `now`: zero before `start_time + cliff`, otherwise
/// the accrued amount minus what was already claimed, floored at zero.
pub fn vested_amount(
    cliff_seconds: u64,
    duration_seconds: u64,
    rate_per_second: u64,
    start_time: i64,
    claimed_amount: u64,
    now: i64,
) -> Result<u64> {
    let cliff = i64::try_from(cliff_seconds).map_err(|_| VestingError::MathOverflow)?;
    let cliff_end = start_time
        .checked_add(cliff)
        .ok_or(VestingError::MathOverflow)?;
    if now < cliff_end {
        return Ok(0);
    }
    let accrued = accrued_amount(duration_seconds, rate_per_second, start_time, now)?;
    Ok(accrued.saturating_sub(claimed_amount))
}
