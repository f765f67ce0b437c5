use anchor_lang::prelude::*;

use crate::constants::LEFTOVER_SEED;
use crate::error::VestingError;

/// Value settled out of capsules at transfer time and owed to the
/// pre-transfer owner, per asset. Backed by the asset's reserve vault.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct Leftover {
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub bump: u8,
}

impl Leftover {
    pub const SIZE: usize =
        32 + // owner
        32 + // mint
        8 +  // amount
        1;   // bump

    pub fn address(owner: &Pubkey, mint: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[LEFTOVER_SEED, owner.as_ref(), mint.as_ref()],
            &crate::ID,
        )
    }

    pub fn empty(owner: Pubkey, mint: Pubkey) -> Self {
        Self {
            owner,
            mint,
            amount: 0,
            bump: 0,
        }
    }

    /// The stored record, or an empty one with `bump` if the account was
    /// only just created by `init_if_needed`.
    pub fn or_empty(&self, owner: Pubkey, mint: Pubkey, bump: u8) -> Self {
        if self.owner == Pubkey::default() {
            Self {
                bump,
                ..Self::empty(owner, mint)
            }
        } else {
            self.clone()
        }
    }

    pub fn credit(&mut self, amount: u64) -> Result<()> {
        self.amount = self
            .amount
            .checked_add(amount)
            .ok_or(VestingError::MathOverflow)?;
        Ok(())
    }

    /// Zeroes the credit and returns what it held.
    pub fn take(&mut self, caller: &Pubkey) -> Result<u64> {
        require_keys_eq!(*caller, self.owner, VestingError::NotOwner);
        require!(self.amount > 0, VestingError::NothingToWithdraw);
        Ok(std::mem::take(&mut self.amount))
    }
}
