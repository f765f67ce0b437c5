use anchor_lang::prelude::*;

use crate::constants::CAPSULE_SEED;
use crate::error::VestingError;
use crate::state::Schedule;
use crate::utils::math;

/// A transferable claim on one schedule's linear release, starting at
/// `start_time`. The account exists only while `claimed_amount < amount`.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct Capsule {
    pub id: u64,
    pub owner: Pubkey,
    pub schedule_id: u64,
    /// Unix seconds; accrual starts here, release starts at `start_time + cliff`.
    pub start_time: i64,
    /// `start_time + duration_seconds`.
    pub end_time: i64,
    /// Amount already paid out or settled into leftover credit.
    pub claimed_amount: u64,
    pub bump: u8,
}

impl Capsule {
    pub const SIZE: usize =
        8 +  // id
        32 + // owner
        8 +  // schedule_id
        8 +  // start_time
        8 +  // end_time
        8 +  // claimed_amount
        1;   // bump

    pub fn address(id: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[CAPSULE_SEED, &id.to_le_bytes()], &crate::ID)
    }

    pub fn new(id: u64, owner: Pubkey, schedule: &Schedule, start_time: i64) -> Result<Self> {
        let duration =
            i64::try_from(schedule.duration_seconds).map_err(|_| VestingError::MathOverflow)?;
        let end_time = start_time
            .checked_add(duration)
            .ok_or(VestingError::MathOverflow)?;
        Ok(Self {
            id,
            owner,
            schedule_id: schedule.id,
            start_time,
            end_time,
            claimed_amount: 0,
            bump: 0,
        })
    }

    /// Amount the current owner could withdraw at `now`.
    pub fn vested_amount(&self, schedule: &Schedule, now: i64) -> Result<u64> {
        math::vested_amount(
            schedule.cliff_seconds,
            schedule.duration_seconds,
            schedule.rate_per_second,
            self.start_time,
            self.claimed_amount,
            now,
        )
    }

    /// Entitlement not yet paid out or settled.
    pub fn remaining(&self, schedule: &Schedule) -> u64 {
        schedule.amount.saturating_sub(self.claimed_amount)
    }

    pub fn is_fully_vested(&self, now: i64) -> bool {
        now >= self.end_time
    }

    pub fn is_exhausted(&self, schedule: &Schedule) -> bool {
        self.claimed_amount >= schedule.amount
    }

    pub fn claim(&mut self, amount: u64) -> Result<()> {
        self.claimed_amount = self
            .claimed_amount
            .checked_add(amount)
            .ok_or(VestingError::MathOverflow)?;
        Ok(())
    }
}
