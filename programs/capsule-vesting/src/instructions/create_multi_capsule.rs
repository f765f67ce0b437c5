use anchor_lang::prelude::*;

use crate::book::{check_batch, Book};
use crate::constants::{LEDGER_SEED, OWNER_INDEX_SEED};
use crate::error::VestingError;
use crate::instructions::CapsuleCreated;
use crate::state::{Ledger, OwnerIndex};
use crate::utils::accounts::{CommitAccounts, Slots};

/// Accounts per batch element in `remaining_accounts`: `[schedule, capsule]`.
const GROUP: usize = 2;

pub fn process_create_multi_capsule<'info>(
    ctx: Context<'_, '_, 'info, 'info, CreateMultiCapsule<'info>>,
    owner: Pubkey,
    schedule_ids: Vec<u64>,
    start_time: i64,
) -> Result<()> {
    check_batch(schedule_ids.len())?;
    require!(owner != Pubkey::default(), VestingError::ZeroOwner);
    require!(
        ctx.remaining_accounts.len() == schedule_ids.len() * GROUP,
        VestingError::InvalidAccount
    );

    let now = Clock::get()?.unix_timestamp;
    let mut book = Book::new(now);
    let mut slots = Slots::new();

    let first_id = ctx.accounts.ledger.reserve_capsule_ids(schedule_ids.len())?;
    for ((capsule_id, schedule_id), group) in (first_id..)
        .zip(&schedule_ids)
        .zip(ctx.remaining_accounts.chunks_exact(GROUP))
    {
        slots.load_schedule(&mut book, &group[0], *schedule_id)?;
        slots.reserve_capsule(&group[1], capsule_id)?;
    }
    book.track_index(
        ctx.accounts
            .owner_index
            .or_empty(owner, ctx.bumps.owner_index),
    );

    let creator = ctx.accounts.creator.key();
    let created =
        book.create_multi_capsule(first_id, owner, &schedule_ids, start_time, &creator)?;

    let creator_info = ctx.accounts.creator.to_account_info();
    let ledger_info = ctx.accounts.ledger.to_account_info();
    let system_info = ctx.accounts.system_program.to_account_info();
    slots.commit(
        &book,
        &CommitAccounts {
            payer: &creator_info,
            ledger: &ledger_info,
            ledger_bump: ctx.accounts.ledger.bump,
            system_program: &system_info,
            token_program: None,
        },
    )?;
    if let Some(index) = book.owner_index(&owner) {
        ctx.accounts.owner_index.set_inner(index.clone());
    }

    for capsule in &created {
        emit!(CapsuleCreated {
            capsule_id: capsule.id,
            schedule_id: capsule.schedule_id,
            owner,
            start_time: capsule.start_time,
            end_time: capsule.end_time,
        });
    }
    msg!("created {} capsules for {}", created.len(), owner);

    Ok(())
}

#[derive(Accounts)]
#[instruction(owner: Pubkey)]
pub struct CreateMultiCapsule<'info> {
    #[account(mut, seeds = [LEDGER_SEED], bump = ledger.bump)]
    pub ledger: Account<'info, Ledger>,

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
