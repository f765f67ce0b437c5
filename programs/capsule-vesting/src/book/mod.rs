//! Capsule lifecycle over an in-memory copy of the touched accounts.
//!
//! An instruction loads every account it may touch into a [`Book`], runs one
//! or more operations, and only commits the result back to accounts if all of
//! them succeeded. Every public operation is also atomic on the `Book`
//! itself: on error the book is restored to its state before the call, so a
//! failing batch element leaves no trace of the elements before it.

use anchor_lang::prelude::*;

use crate::constants::MAX_BATCH;
use crate::error::VestingError;
use crate::state::{Capsule, Leftover, OwnerIndex, Schedule};

#[cfg(test)]
mod proptests;

/// Tokens owed to `recipient` out of the `mint` reserve vault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payout {
    pub mint: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
}

/// Outcome of a capsule transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub capsule_id: u64,
    pub schedule_id: u64,
    pub mint: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    /// Vested amount credited to `from`'s leftover balance.
    pub credited: u64,
    /// Entitlement that moved to `to`.
    pub remaining: u64,
}

/// Outcome of a capsule withdrawal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Withdrawal {
    pub capsule_id: u64,
    pub schedule_id: u64,
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    /// The capsule was claimed in full and retired.
    pub exhausted: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Book {
    now: i64,
    schedules: Vec<Schedule>,
    /// `None` marks a capsule retired during this book's lifetime.
    capsules: Vec<(u64, Option<Capsule>)>,
    leftovers: Vec<Leftover>,
    indexes: Vec<OwnerIndex>,
    payouts: Vec<Payout>,
}

impl Book {
    pub fn new(now: i64) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    #[cfg(test)]
    pub fn set_now(&mut self, now: i64) {
        self.now = now;
    }

    // ---- loading -------------------------------------------------------

    /// Adds a schedule unless one with the same id is already tracked.
    pub fn track_schedule(&mut self, schedule: Schedule) {
        if !self.schedule_exists(schedule.id) {
            self.schedules.push(schedule);
        }
    }

    pub fn track_capsule(&mut self, capsule: Capsule) {
        if self.capsule_slot(capsule.id).is_none() {
            self.capsules.push((capsule.id, Some(capsule)));
        }
    }

    pub fn track_leftover(&mut self, leftover: Leftover) {
        if self.leftover(&leftover.owner, &leftover.mint).is_none() {
            self.leftovers.push(leftover);
        }
    }

    pub fn track_index(&mut self, index: OwnerIndex) {
        if self.owner_index(&index.owner).is_none() {
            self.indexes.push(index);
        }
    }

    // ---- queries -------------------------------------------------------

    pub fn schedule_exists(&self, schedule_id: u64) -> bool {
        self.schedules.iter().any(|s| s.id == schedule_id)
    }

    pub fn schedule(&self, schedule_id: u64) -> Result<&Schedule> {
        self.schedules
            .iter()
            .find(|s| s.id == schedule_id)
            .ok_or_else(|| error!(VestingError::InvalidSchedule))
    }

    pub fn total_reserves_of(&self, schedule_id: u64) -> Result<u64> {
        Ok(self.schedule(schedule_id)?.total_reserves)
    }

    pub fn locked_reserves_of(&self, schedule_id: u64) -> Result<u64> {
        Ok(self.schedule(schedule_id)?.locked_reserves)
    }

    pub fn available_reserves_of(&self, schedule_id: u64) -> Result<u64> {
        Ok(self.schedule(schedule_id)?.available_reserves())
    }

    pub fn capsule(&self, capsule_id: u64) -> Option<&Capsule> {
        self.capsule_slot(capsule_id).and_then(|slot| slot.as_ref())
    }

    pub fn is_capsule_active(&self, capsule_id: u64) -> bool {
        self.capsule(capsule_id).is_some()
    }

    pub fn capsule_owner_of(&self, capsule_id: u64) -> Result<Pubkey> {
        self.capsule(capsule_id)
            .map(|c| c.owner)
            .ok_or_else(|| error!(VestingError::InvalidCapsule))
    }

    pub fn vested_balance_of(&self, capsule_id: u64) -> Result<u64> {
        let capsule = self
            .capsule(capsule_id)
            .ok_or(VestingError::InvalidCapsule)?;
        let schedule = self.schedule(capsule.schedule_id)?;
        capsule.vested_amount(schedule, self.now)
    }

    pub fn leftover_balance_of(&self, owner: &Pubkey, mint: &Pubkey) -> u64 {
        self.leftover(owner, mint).map_or(0, |l| l.amount)
    }

    pub fn capsules_of(&self, owner: &Pubkey) -> Vec<u64> {
        self.owner_index(owner)
            .map(|ix| ix.capsule_ids.clone())
            .unwrap_or_default()
    }

    pub fn leftover(&self, owner: &Pubkey, mint: &Pubkey) -> Option<&Leftover> {
        self.leftovers
            .iter()
            .find(|l| l.owner == *owner && l.mint == *mint)
    }

    pub fn owner_index(&self, owner: &Pubkey) -> Option<&OwnerIndex> {
        self.indexes.iter().find(|ix| ix.owner == *owner)
    }

    pub fn leftovers(&self) -> &[Leftover] {
        &self.leftovers
    }

    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }

    #[cfg(test)]
    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    /// Every capsule id the book has seen, with its final state.
    #[cfg(test)]
    pub fn capsule_slots(&self) -> impl Iterator<Item = (u64, Option<&Capsule>)> {
        self.capsules.iter().map(|(id, c)| (*id, c.as_ref()))
    }

    // ---- operations ----------------------------------------------------

    pub fn fill_reserves(&mut self, schedule_id: u64, amount: u64) -> Result<()> {
        self.atomically(|book| book.schedule_mut(schedule_id)?.fill(amount))
    }

    pub fn create_capsule(
        &mut self,
        capsule_id: u64,
        owner: Pubkey,
        schedule_id: u64,
        start_time: i64,
        caller: &Pubkey,
    ) -> Result<Capsule> {
        self.atomically(|book| {
            book.create_one(capsule_id, owner, schedule_id, start_time, caller)
        })
    }

    /// One capsule per entry of `schedule_ids`, with consecutive ids from
    /// `first_capsule_id`. Every schedule id is checked before any reserve
    /// counter moves.
    pub fn create_multi_capsule(
        &mut self,
        first_capsule_id: u64,
        owner: Pubkey,
        schedule_ids: &[u64],
        start_time: i64,
        caller: &Pubkey,
    ) -> Result<Vec<Capsule>> {
        check_batch(schedule_ids.len())?;
        self.atomically(|book| {
            require!(owner != Pubkey::default(), VestingError::ZeroOwner);
            for schedule_id in schedule_ids {
                require!(
                    book.schedule_exists(*schedule_id),
                    VestingError::InvalidSchedule
                );
            }
            let mut created = Vec::with_capacity(schedule_ids.len());
            for (capsule_id, schedule_id) in (first_capsule_id..).zip(schedule_ids) {
                created.push(book.create_one(
                    capsule_id,
                    owner,
                    *schedule_id,
                    start_time,
                    caller,
                )?);
            }
            Ok(created)
        })
    }

    pub fn transfer_capsule(
        &mut self,
        capsule_id: u64,
        new_owner: Pubkey,
        caller: &Pubkey,
    ) -> Result<Settlement> {
        self.atomically(|book| book.transfer_one(capsule_id, new_owner, caller))
    }

    pub fn transfer_multi_capsule(
        &mut self,
        capsule_ids: &[u64],
        new_owner: Pubkey,
        caller: &Pubkey,
    ) -> Result<Vec<Settlement>> {
        check_batch(capsule_ids.len())?;
        self.atomically(|book| {
            capsule_ids
                .iter()
                .map(|id| book.transfer_one(*id, new_owner, caller))
                .collect()
        })
    }

    pub fn withdraw_capsule(&mut self, capsule_id: u64, caller: &Pubkey) -> Result<Withdrawal> {
        self.atomically(|book| book.withdraw_one(capsule_id, caller))
    }

    pub fn withdraw_multi_capsule(
        &mut self,
        capsule_ids: &[u64],
        caller: &Pubkey,
    ) -> Result<Vec<Withdrawal>> {
        check_batch(capsule_ids.len())?;
        self.atomically(|book| {
            capsule_ids
                .iter()
                .map(|id| book.withdraw_one(*id, caller))
                .collect()
        })
    }

    /// Pays out and zeroes `owner`'s leftover credit in `mint`.
    pub fn withdraw_leftovers(
        &mut self,
        owner: Pubkey,
        mint: Pubkey,
        caller: &Pubkey,
    ) -> Result<u64> {
        self.atomically(|book| {
            require_keys_eq!(*caller, owner, VestingError::NotOwner);
            let amount = book.leftover_mut(owner, mint).take(caller)?;
            book.pay(mint, owner, amount)?;
            Ok(amount)
        })
    }

    // ---- single-element steps (not atomic on their own) ----------------

    fn create_one(
        &mut self,
        capsule_id: u64,
        owner: Pubkey,
        schedule_id: u64,
        start_time: i64,
        caller: &Pubkey,
    ) -> Result<Capsule> {
        require!(owner != Pubkey::default(), VestingError::ZeroOwner);
        require!(
            self.capsule_slot(capsule_id).is_none(),
            VestingError::InvalidAccount
        );
        let now = self.now;
        let schedule = self.schedule_mut(schedule_id)?;
        require_keys_eq!(*caller, schedule.creator, VestingError::NotOwner);
        require!(start_time >= now, VestingError::PastStartTime);

        let capsule = Capsule::new(capsule_id, owner, schedule, start_time)?;
        schedule.lock()?;

        self.index_mut(owner).insert(capsule_id)?;
        self.capsules.push((capsule_id, Some(capsule.clone())));
        Ok(capsule)
    }

    fn transfer_one(
        &mut self,
        capsule_id: u64,
        new_owner: Pubkey,
        caller: &Pubkey,
    ) -> Result<Settlement> {
        let now = self.now;
        let capsule = self
            .capsule(capsule_id)
            .cloned()
            .ok_or(VestingError::InvalidCapsule)?;
        let from = capsule.owner;
        require!(new_owner != Pubkey::default(), VestingError::ZeroOwner);
        require!(new_owner != from, VestingError::SelfTransfer);
        require_keys_eq!(*caller, from, VestingError::NotOwner);
        require!(!capsule.is_fully_vested(now), VestingError::FullyVested);

        let schedule = self.schedule_mut(capsule.schedule_id)?;
        let credited = capsule.vested_amount(schedule, now)?;
        // Settled value leaves the schedule's pool the same way a withdrawal
        // does; the vault keeps the tokens on behalf of the leftover credit.
        if credited > 0 {
            schedule.release(credited)?;
        }
        let mint = schedule.mint;
        let amount = schedule.amount;
        let schedule_id = schedule.id;

        if credited > 0 {
            self.leftover_mut(from, mint).credit(credited)?;
        }

        let entry = self.capsule_mut(capsule_id)?;
        entry.claim(credited)?;
        entry.owner = new_owner;
        let remaining = amount.saturating_sub(entry.claimed_amount);

        self.index_mut(from).remove(capsule_id);
        self.index_mut(new_owner).insert(capsule_id)?;

        Ok(Settlement {
            capsule_id,
            schedule_id,
            mint,
            from,
            to: new_owner,
            credited,
            remaining,
        })
    }

    fn withdraw_one(&mut self, capsule_id: u64, caller: &Pubkey) -> Result<Withdrawal> {
        let now = self.now;
        let capsule = self
            .capsule(capsule_id)
            .cloned()
            .ok_or(VestingError::InvalidCapsule)?;
        require_keys_eq!(*caller, capsule.owner, VestingError::NotOwner);

        let schedule = self.schedule_mut(capsule.schedule_id)?;
        let amount = capsule.vested_amount(schedule, now)?;
        if amount == 0 {
            let cliff_end = capsule
                .start_time
                .saturating_add_unsigned(schedule.cliff_seconds);
            if now < cliff_end {
                msg!("capsule {}: cliff not reached (releases from {})", capsule_id, cliff_end);
            } else {
                msg!("capsule {}: no newly vested amount", capsule_id);
            }
            return err!(VestingError::NothingToWithdraw);
        }
        schedule.release(amount)?;
        let schedule = schedule.clone();

        let entry = self.capsule_mut(capsule_id)?;
        entry.claim(amount)?;
        let exhausted = entry.is_exhausted(&schedule);

        self.pay(schedule.mint, capsule.owner, amount)?;
        if exhausted {
            self.retire(capsule_id);
            self.index_mut(capsule.owner).remove(capsule_id);
        }

        Ok(Withdrawal {
            capsule_id,
            schedule_id: schedule.id,
            mint: schedule.mint,
            owner: capsule.owner,
            amount,
            exhausted,
        })
    }

    // ---- internals -----------------------------------------------------

    fn atomically<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.clone();
        let result = op(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    fn schedule_mut(&mut self, schedule_id: u64) -> Result<&mut Schedule> {
        self.schedules
            .iter_mut()
            .find(|s| s.id == schedule_id)
            .ok_or_else(|| error!(VestingError::InvalidSchedule))
    }

    fn capsule_slot(&self, capsule_id: u64) -> Option<&Option<Capsule>> {
        self.capsules
            .iter()
            .find(|(id, _)| *id == capsule_id)
            .map(|(_, slot)| slot)
    }

    fn capsule_mut(&mut self, capsule_id: u64) -> Result<&mut Capsule> {
        self.capsules
            .iter_mut()
            .find(|(id, _)| *id == capsule_id)
            .and_then(|(_, slot)| slot.as_mut())
            .ok_or_else(|| error!(VestingError::InvalidCapsule))
    }

    fn retire(&mut self, capsule_id: u64) {
        if let Some((_, slot)) = self.capsules.iter_mut().find(|(id, _)| *id == capsule_id) {
            *slot = None;
        }
    }

    fn leftover_mut(&mut self, owner: Pubkey, mint: Pubkey) -> &mut Leftover {
        let pos = match self
            .leftovers
            .iter()
            .position(|l| l.owner == owner && l.mint == mint)
        {
            Some(pos) => pos,
            None => {
                self.leftovers.push(Leftover::empty(owner, mint));
                self.leftovers.len() - 1
            }
        };
        &mut self.leftovers[pos]
    }

    fn index_mut(&mut self, owner: Pubkey) -> &mut OwnerIndex {
        let pos = match self.indexes.iter().position(|ix| ix.owner == owner) {
            Some(pos) => pos,
            None => {
                self.indexes.push(OwnerIndex::empty(owner));
                self.indexes.len() - 1
            }
        };
        &mut self.indexes[pos]
    }

    fn pay(&mut self, mint: Pubkey, recipient: Pubkey, amount: u64) -> Result<()> {
        match self
            .payouts
            .iter_mut()
            .find(|p| p.mint == mint && p.recipient == recipient)
        {
            Some(p) => {
                p.amount = p
                    .amount
                    .checked_add(amount)
                    .ok_or(VestingError::MathOverflow)?;
            }
            None => self.payouts.push(Payout {
                mint,
                recipient,
                amount,
            }),
        }
        Ok(())
    }
}

/// Rejects empty batches and batches over [`MAX_BATCH`].
pub fn check_batch(len: usize) -> Result<()> {
    require!(len > 0, VestingError::EmptyBatch);
    require!(len <= MAX_BATCH, VestingError::BatchTooLarge);
    Ok(())
}
