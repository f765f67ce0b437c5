use anchor_lang::prelude::*;

use crate::constants::SCHEDULE_SEED;
use crate::error::VestingError;

/// A linear release policy for one asset, with its own reserve pool.
///
/// Everything except the two reserve counters is immutable after creation.
/// Counters move only through `fill`, `lock` and `release`, each of which
/// keeps `locked_reserves <= total_reserves`.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct Schedule {
    /// Dense id, allocated by the ledger.
    pub id: u64,
    /// Asset mint released by this schedule.
    pub mint: Pubkey,
    /// Signer that created the schedule; the only one allowed to issue capsules on it.
    pub creator: Pubkey,
    /// Seconds after a capsule's start before anything can be withdrawn.
    pub cliff_seconds: u64,
    /// Seconds over which a capsule releases `amount`.
    pub duration_seconds: u64,
    /// Units released per second.
    pub rate_per_second: u64,
    /// Per-capsule entitlement, always `rate_per_second * duration_seconds`.
    pub amount: u64,
    /// Asset funded into this schedule and not yet paid out.
    pub total_reserves: u64,
    /// Part of `total_reserves` earmarked for active capsules.
    pub locked_reserves: u64,
    /// PDA bump seed.
    pub bump: u8,
}

impl Schedule {
    pub const SIZE: usize =
        8 +  // id
        32 + // mint
        32 + // creator
        8 +  // cliff_seconds
        8 +  // duration_seconds
        8 +  // rate_per_second
        8 +  // amount
        8 +  // total_reserves
        8 +  // locked_reserves
        1;   // bump

    pub fn address(id: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[SCHEDULE_SEED, &id.to_le_bytes()], &crate::ID)
    }

    /// Validates the parameters and builds an unfunded schedule.
    pub fn new(
        id: u64,
        mint: Pubkey,
        creator: Pubkey,
        cliff_seconds: u64,
        duration_seconds: u64,
        rate_per_second: u64,
        bump: u8,
    ) -> Result<Self> {
        require!(mint != Pubkey::default(), VestingError::InvalidAsset);
        require!(duration_seconds > 0, VestingError::InvalidDuration);
        // Capsule end times are signed unix timestamps.
        require!(
            i64::try_from(duration_seconds).is_ok(),
            VestingError::InvalidDuration
        );
        require!(rate_per_second > 0, VestingError::InvalidRate);
        require!(cliff_seconds < duration_seconds, VestingError::InvalidCliff);

        let amount = rate_per_second
            .checked_mul(duration_seconds)
            .ok_or(VestingError::MathOverflow)?;

        Ok(Self {
            id,
            mint,
            creator,
            cliff_seconds,
            duration_seconds,
            rate_per_second,
            amount,
            total_reserves: 0,
            locked_reserves: 0,
            bump,
        })
    }

    pub fn available_reserves(&self) -> u64 {
        // locked <= total is maintained by every mutator below.
        self.total_reserves.saturating_sub(self.locked_reserves)
    }

    /// Credits freshly deposited asset.
    pub fn fill(&mut self, amount: u64) -> Result<()> {
        require!(amount > 0, VestingError::ZeroAmount);
        self.total_reserves = self
            .total_reserves
            .checked_add(amount)
            .ok_or(VestingError::MathOverflow)?;
        Ok(())
    }

    /// Earmarks one capsule's full entitlement.
    pub fn lock(&mut self) -> Result<()> {
        require!(
            self.available_reserves() >= self.amount,
            VestingError::InsufficientReserves
        );
        self.locked_reserves = self
            .locked_reserves
            .checked_add(self.amount)
            .ok_or(VestingError::MathOverflow)?;
        Ok(())
    }

    /// Moves `amount` of earmarked asset out of the pool. Used both for
    /// withdrawals and for transfer settlement into leftover credit.
    pub fn release(&mut self, amount: u64) -> Result<()> {
        require!(
            amount <= self.locked_reserves,
            VestingError::ReserveInvariant
        );
        self.locked_reserves -= amount;
        self.total_reserves = self
            .total_reserves
            .checked_sub(amount)
            .ok_or(VestingError::ReserveInvariant)?;
        Ok(())
    }
}

/// Splits a desired per-capsule total into `(rate_per_second, effective_amount)`.
///
/// The rate truncates, so `effective_amount` may be less than `amount`; it is
/// the figure a schedule created with that rate actually locks and releases.
pub fn schedule_params_from_amount(amount: u64, duration_seconds: u64) -> Result<(u64, u64)> {
    require!(duration_seconds > 0, VestingError::InvalidDuration);
    let rate = amount / duration_seconds;
    require!(rate > 0, VestingError::InvalidRate);
    Ok((rate, rate * duration_seconds))
}
