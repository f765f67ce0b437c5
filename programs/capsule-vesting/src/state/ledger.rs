use anchor_lang::prelude::*;

use crate::error::VestingError;

/// Singleton ledger PDA. Hands out dense schedule and capsule ids and is the
/// token authority of every reserve vault.
#[account]
pub struct Ledger {
    /// Next schedule id (ids are never reused).
    pub schedule_count: u64,
    /// Next capsule id (ids are never reused, even after a capsule retires).
    pub capsule_count: u64,
    /// PDA bump seed.
    pub bump: u8,
}

impl Ledger {
    pub const SIZE: usize =
        8 + // schedule_count
        8 + // capsule_count
        1;  // bump

    pub fn next_schedule_id(&mut self) -> Result<u64> {
        let id = self.schedule_count;
        self.schedule_count = id.checked_add(1).ok_or(VestingError::MathOverflow)?;
        Ok(id)
    }

    /// Reserves `n` consecutive capsule ids and returns the first one.
    pub fn reserve_capsule_ids(&mut self, n: usize) -> Result<u64> {
        let first = self.capsule_count;
        self.capsule_count = first
            .checked_add(n as u64)
            .ok_or(VestingError::MathOverflow)?;
        Ok(first)
    }
}
