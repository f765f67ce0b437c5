use anchor_lang::prelude::*;

use crate::book::{check_batch, Book};
use crate::constants::{LEDGER_SEED, OWNER_INDEX_SEED};
use crate::error::VestingError;
use crate::instructions::CapsuleTransferred;
use crate::state::{Ledger, OwnerIndex};
use crate::utils::accounts::{CommitAccounts, Slots};

/// Accounts per batch element in `remaining_accounts`:
/// `[capsule, schedule, leftover]`.
const GROUP: usize = 3;

pub fn process_transfer_multi_capsule<'info>(
    ctx: Context<'_, '_, 'info, 'info, TransferMultiCapsule<'info>>,
    capsule_ids: Vec<u64>,
    new_owner: Pubkey,
) -> Result<()> {
    check_batch(capsule_ids.len())?;
    require!(
        ctx.remaining_accounts.len() == capsule_ids.len() * GROUP,
        VestingError::InvalidAccount
    );

    let now = Clock::get()?.unix_timestamp;
    let mut book = Book::new(now);
    let mut slots = Slots::new();
    let caller = ctx.accounts.owner.key();

    for (capsule_id, group) in capsule_ids
        .iter()
        .zip(ctx.remaining_accounts.chunks_exact(GROUP))
    {
        let capsule = slots.load_capsule(&mut book, &group[0], *capsule_id)?;
        let schedule = slots.load_schedule(&mut book, &group[1], capsule.schedule_id)?;
        slots.load_leftover(&mut book, &group[2], caller, schedule.mint)?;
    }
    require!(new_owner != Pubkey::default(), VestingError::ZeroOwner);

    let bumps = &ctx.bumps;
    book.track_index(ctx.accounts.owner_index.or_empty(caller, bumps.owner_index));
    book.track_index(
        ctx.accounts
            .new_owner_index
            .or_empty(new_owner, bumps.new_owner_index),
    );

    let settlements = book.transfer_multi_capsule(&capsule_ids, new_owner, &caller)?;

    let owner_info = ctx.accounts.owner.to_account_info();
    let ledger_info = ctx.accounts.ledger.to_account_info();
    let system_info = ctx.accounts.system_program.to_account_info();
    slots.commit(
        &book,
        &CommitAccounts {
            payer: &owner_info,
            ledger: &ledger_info,
            ledger_bump: ctx.accounts.ledger.bump,
            system_program: &system_info,
            token_program: None,
        },
    )?;
    if let Some(index) = book.owner_index(&caller) {
        ctx.accounts.owner_index.set_inner(index.clone());
    }
    if let Some(index) = book.owner_index(&new_owner) {
        ctx.accounts.new_owner_index.set_inner(index.clone());
    }

    for settlement in &settlements {
        emit!(CapsuleTransferred::from(settlement));
    }

    Ok(())
}

#[derive(Accounts)]
#[instruction(capsule_ids: Vec<u64>, new_owner: Pubkey)]
pub struct TransferMultiCapsule<'info> {
    #[account(seeds = [LEDGER_SEED], bump = ledger.bump)]
    pub ledger: Account<'info, Ledger>,

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
