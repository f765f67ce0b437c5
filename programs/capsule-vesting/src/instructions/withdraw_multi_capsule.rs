use anchor_lang::prelude::*;
use anchor_spl::token::Token;

use crate::book::{check_batch, Book};
use crate::constants::{LEDGER_SEED, OWNER_INDEX_SEED};
use crate::error::VestingError;
use crate::instructions::withdraw_capsule::emit_withdrawal;
use crate::state::{Ledger, OwnerIndex};
use crate::utils::accounts::{CommitAccounts, Slots};

/// Accounts per batch element in `remaining_accounts`:
/// `[capsule, schedule, reserve_vault, destination]`.
const GROUP: usize = 4;

pub fn process_withdraw_multi_capsule<'info>(
    ctx: Context<'_, '_, 'info, 'info, WithdrawMultiCapsule<'info>>,
    capsule_ids: Vec<u64>,
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
        slots.load_vault(&group[2], &schedule.mint)?;
        slots.load_destination(&group[3], &caller, &schedule.mint)?;
    }
    book.track_index(
        ctx.accounts
            .owner_index
            .or_empty(caller, ctx.bumps.owner_index),
    );

    let withdrawals = book.withdraw_multi_capsule(&capsule_ids, &caller)?;

    let owner_info = ctx.accounts.owner.to_account_info();
    let ledger_info = ctx.accounts.ledger.to_account_info();
    let system_info = ctx.accounts.system_program.to_account_info();
    let token_info = ctx.accounts.token_program.to_account_info();
    slots.commit(
        &book,
        &CommitAccounts {
            payer: &owner_info,
            ledger: &ledger_info,
            ledger_bump: ctx.accounts.ledger.bump,
            system_program: &system_info,
            token_program: Some(&token_info),
        },
    )?;
    if let Some(index) = book.owner_index(&caller) {
        ctx.accounts.owner_index.set_inner(index.clone());
    }

    for withdrawal in &withdrawals {
        emit_withdrawal(withdrawal);
    }
    msg!(
        "withdrew {} capsules, {} payouts",
        withdrawals.len(),
        book.payouts().len()
    );

    Ok(())
}

#[derive(Accounts)]
pub struct WithdrawMultiCapsule<'info> {
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

    #[account(mut)]
    pub owner: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}
