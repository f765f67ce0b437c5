use anchor_lang::prelude::*;

use crate::book::{Book, Settlement};
use crate::constants::{CAPSULE_SEED, LEFTOVER_SEED, OWNER_INDEX_SEED, SCHEDULE_SEED};
use crate::error::VestingError;
use crate::state::{Capsule, Leftover, OwnerIndex, Schedule};

pub fn process_transfer_capsule(
    ctx: Context<TransferCapsule>,
    capsule_id: u64,
    new_owner: Pubkey,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let caller = ctx.accounts.owner.key();
    let mint = ctx.accounts.schedule.mint;
    let bumps = &ctx.bumps;

    let mut book = Book::new(now);
    book.track_capsule((*ctx.accounts.capsule).clone());
    book.track_schedule((*ctx.accounts.schedule).clone());
    book.track_leftover(ctx.accounts.leftover.or_empty(caller, mint, bumps.leftover));
    book.track_index(ctx.accounts.owner_index.or_empty(caller, bumps.owner_index));
    book.track_index(
        ctx.accounts
            .new_owner_index
            .or_empty(new_owner, bumps.new_owner_index),
    );

    let settlement = book.transfer_capsule(capsule_id, new_owner, &caller)?;

    let accounts = ctx.accounts;
    let capsule = book
        .capsule(capsule_id)
        .ok_or(VestingError::InvalidCapsule)?;
    accounts.capsule.set_inner(capsule.clone());
    accounts
        .schedule
        .set_inner(book.schedule(settlement.schedule_id)?.clone());
    if let Some(leftover) = book.leftover(&caller, &mint) {
        accounts.leftover.set_inner(leftover.clone());
    }
    if let Some(index) = book.owner_index(&caller) {
        accounts.owner_index.set_inner(index.clone());
    }
    if let Some(index) = book.owner_index(&new_owner) {
        accounts.new_owner_index.set_inner(index.clone());
    }

    emit!(CapsuleTransferred::from(&settlement));
    Ok(())
}

#[derive(Accounts)]
#[instruction(capsule_id: u64, new_owner: Pubkey)]
pub struct TransferCapsule<'info> {
    #[account(
        mut,
        seeds = [CAPSULE_SEED, capsule_id.to_le_bytes().as_ref()],
        bump = capsule.bump
    )]
    pub capsule: Account<'info, Capsule>,

    #[account(
        mut,
        seeds = [SCHEDULE_SEED, capsule.schedule_id.to_le_bytes().as_ref()],
        bump = schedule.bump
    )]
    pub schedule: Account<'info, Schedule>,

    /// Leftover credit of the sender in the schedule's asset.
    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + Leftover::SIZE,
        seeds = [LEFTOVER_SEED, owner.key().as_ref(), schedule.mint.as_ref()],
        bump
    )]
    pub leftover: Account<'info, Leftover>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + OwnerIndex::SIZE,
        seeds = [OWNER_INDEX_SEED, owner.key().as_ref()],
        bump
    )]
    pub owner_index: Account<'info, OwnerIndex>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + OwnerIndex::SIZE,
        seeds = [OWNER_INDEX_SEED, new_owner.as_ref()],
        bump
    )]
    pub new_owner_index: Account<'info, OwnerIndex>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[event]
pub struct CapsuleTransferred {
    pub capsule_id: u64,
    pub schedule_id: u64,
    pub from: Pubkey,
    pub to: Pubkey,
    /// Vested amount settled into `from`'s leftover balance.
    pub credited: u64,
    pub remaining: u64,
}

impl From<&Settlement> for CapsuleTransferred {
    fn from(s: &Settlement) -> Self {
        Self {
            capsule_id: s.capsule_id,
            schedule_id: s.schedule_id,
            from: s.from,
            to: s.to,
            credited: s.credited,
            remaining: s.remaining,
        }
    }
}
