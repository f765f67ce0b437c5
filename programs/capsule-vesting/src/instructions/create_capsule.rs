use anchor_lang::prelude::*;

use crate::book::Book;
use crate::constants::{CAPSULE_SEED, LEDGER_SEED, OWNER_INDEX_SEED, SCHEDULE_SEED};
use crate::error::VestingError;
use crate::state::{Capsule, Ledger, OwnerIndex, Schedule};

pub fn process_create_capsule(
    ctx: Context<CreateCapsule>,
    owner: Pubkey,
    schedule_id: u64,
    start_time: i64,
) -> Result<()> {
    require!(owner != Pubkey::default(), VestingError::ZeroOwner);

    let now = Clock::get()?.unix_timestamp;
    let mut book = Book::new(now);
    book.track_schedule((*ctx.accounts.schedule).clone());
    book.track_index(ctx.accounts.owner_index.or_empty(owner, ctx.bumps.owner_index));

    let capsule_id = ctx.accounts.ledger.reserve_capsule_ids(1)?;
    let creator = ctx.accounts.creator.key();
    let capsule = book.create_capsule(capsule_id, owner, schedule_id, start_time, &creator)?;

    let accounts = ctx.accounts;
    accounts.schedule.set_inner(book.schedule(schedule_id)?.clone());
    accounts.capsule.set_inner(Capsule {
        bump: ctx.bumps.capsule,
        ..capsule.clone()
    });
    if let Some(index) = book.owner_index(&owner) {
        accounts.owner_index.set_inner(index.clone());
    }

    emit!(CapsuleCreated {
        capsule_id,
        schedule_id,
        owner,
        start_time: capsule.start_time,
        end_time: capsule.end_time,
    });

    Ok(())
}

#[derive(Accounts)]
#[instruction(owner: Pubkey, schedule_id: u64)]
pub struct CreateCapsule<'info> {
    #[account(mut, seeds = [LEDGER_SEED], bump = ledger.bump)]
    pub ledger: Account<'info, Ledger>,

    #[account(
        mut,
        seeds = [SCHEDULE_SEED, schedule_id.to_le_bytes().as_ref()],
        bump = schedule.bump
    )]
    pub schedule: Account<'info, Schedule>,

    /// PDA of the next capsule id. Lamports already sent to it are kept.
    #[account(
        init,
        payer = creator,
        space = 8 + Capsule::SIZE,
        seeds = [CAPSULE_SEED, ledger.capsule_count.to_le_bytes().as_ref()],
        bump
    )]
    pub capsule: Account<'info, Capsule>,

    #[account(
        init_if_needed,
        payer = creator,
        space = 8 + OwnerIndex::SIZE,
        seeds = [OWNER_INDEX_SEED, owner.as_ref()],
        bump
    )]
    pub owner_index: Account<'info, OwnerIndex>,

    #[account(mut)]
    pub creator: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[event]
pub struct CapsuleCreated {
    pub capsule_id: u64,
    pub schedule_id: u64,
    pub owner: Pubkey,
    pub start_time: i64,
    pub end_time: i64,
}
