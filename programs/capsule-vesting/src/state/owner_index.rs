use anchor_lang::prelude::*;

use crate::constants::{MAX_CAPSULES_PER_OWNER, OWNER_INDEX_SEED};
use crate::error::VestingError;

/// Active capsule ids held by one owner, in acquisition order.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct OwnerIndex {
    pub owner: Pubkey,
    pub capsule_ids: Vec<u64>,
    pub bump: u8,
}

impl OwnerIndex {
    /// Space for the fields at full capacity (excludes the discriminator).
    pub const SIZE: usize =
        32 + // owner
        4 + 8 * MAX_CAPSULES_PER_OWNER + // capsule_ids
        1;   // bump

    pub fn address(owner: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[OWNER_INDEX_SEED, owner.as_ref()], &crate::ID)
    }

    pub fn empty(owner: Pubkey) -> Self {
        Self {
            owner,
            capsule_ids: Vec::new(),
            bump: 0,
        }
    }

    /// The stored record, or an empty one with `bump` if the account was
    /// only just created by `init_if_needed`.
    pub fn or_empty(&self, owner: Pubkey, bump: u8) -> Self {
        if self.owner == Pubkey::default() {
            Self {
                bump,
                ..Self::empty(owner)
            }
        } else {
            self.clone()
        }
    }

    pub fn contains(&self, capsule_id: u64) -> bool {
        self.capsule_ids.contains(&capsule_id)
    }

    pub fn insert(&mut self, capsule_id: u64) -> Result<()> {
        if self.contains(capsule_id) {
            return Ok(());
        }
        require!(
            self.capsule_ids.len() < MAX_CAPSULES_PER_OWNER,
            VestingError::OwnerIndexFull
        );
        self.capsule_ids.push(capsule_id);
        Ok(())
    }

    /// Returns whether the id was present.
    pub fn remove(&mut self, capsule_id: u64) -> bool {
        match self.capsule_ids.iter().position(|id| *id == capsule_id) {
            Some(pos) => {
                self.capsule_ids.remove(pos);
                true
            }
            None => false,
        }
    }
}
