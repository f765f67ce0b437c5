use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::book::{Book, Withdrawal};
use crate::constants::{CAPSULE_SEED, LEDGER_SEED, OWNER_INDEX_SEED, RESERVE_SEED, SCHEDULE_SEED};
use crate::error::VestingError;
use crate::state::{Capsule, Ledger, OwnerIndex, Schedule};
use crate::utils::accounts::push_tokens;

pub fn process_withdraw_capsule(ctx: Context<WithdrawCapsule>, capsule_id: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let caller = ctx.accounts.owner.key();

    let mut book = Book::new(now);
    book.track_capsule((*ctx.accounts.capsule).clone());
    book.track_schedule((*ctx.accounts.schedule).clone());
    book.track_index(
        ctx.accounts
            .owner_index
            .or_empty(caller, ctx.bumps.owner_index),
    );

    let withdrawal = book.withdraw_capsule(capsule_id, &caller)?;

    let accounts = ctx.accounts;
    accounts
        .schedule
        .set_inner(book.schedule(withdrawal.schedule_id)?.clone());
    if let Some(index) = book.owner_index(&caller) {
        accounts.owner_index.set_inner(index.clone());
    }
    match book.capsule(capsule_id) {
        Some(capsule) => accounts.capsule.set_inner(capsule.clone()),
        None => accounts.capsule.close(accounts.owner.to_account_info())?,
    }

    push_tokens(
        &accounts.token_program.to_account_info(),
        &accounts.reserve_vault.to_account_info(),
        &accounts.destination.to_account_info(),
        &accounts.ledger.to_account_info(),
        accounts.ledger.bump,
        withdrawal.amount,
    )?;

    emit_withdrawal(&withdrawal);
    Ok(())
}

pub(crate) fn emit_withdrawal(withdrawal: &Withdrawal) {
    emit!(CapsuleWithdrawn {
        capsule_id: withdrawal.capsule_id,
        schedule_id: withdrawal.schedule_id,
        owner: withdrawal.owner,
        amount: withdrawal.amount,
    });
    if withdrawal.exhausted {
        emit!(CapsuleExhausted {
            capsule_id: withdrawal.capsule_id,
            owner: withdrawal.owner,
        });
    }
}

#[derive(Accounts)]
#[instruction(capsule_id: u64)]
pub struct WithdrawCapsule<'info> {
    #[account(seeds = [LEDGER_SEED], bump = ledger.bump)]
    pub ledger: Account<'info, Ledger>,

    /// Closed to `owner` once claimed in full.
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

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + OwnerIndex::SIZE,
        seeds = [OWNER_INDEX_SEED, owner.key().as_ref()],
        bump
    )]
    pub owner_index: Account<'info, OwnerIndex>,

    #[account(
        mut,
        seeds = [RESERVE_SEED, schedule.mint.as_ref()],
        bump,
        constraint = reserve_vault.mint == schedule.mint @ VestingError::InvalidTokenMint
    )]
    pub reserve_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = destination.mint == schedule.mint @ VestingError::InvalidTokenMint,
        constraint = destination.owner == owner.key() @ VestingError::InvalidTokenAccount
    )]
    pub destination: Account<'info, TokenAccount>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[event]
pub struct CapsuleWithdrawn {
    pub capsule_id: u64,
    pub schedule_id: u64,
    pub owner: Pubkey,
    pub amount: u64,
}

#[event]
pub struct CapsuleExhausted {
    pub capsule_id: u64,
    pub owner: Pubkey,
}
