use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::book::Book;
use crate::constants::{LEDGER_SEED, LEFTOVER_SEED, RESERVE_SEED};
use crate::error::VestingError;
use crate::state::{Ledger, Leftover};
use crate::utils::accounts::push_tokens;

pub fn process_withdraw_leftovers(
    ctx: Context<WithdrawLeftovers>,
    owner: Pubkey,
    mint: Pubkey,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let caller = ctx.accounts.caller.key();

    let mut book = Book::new(now);
    book.track_leftover(
        ctx.accounts
            .leftover
            .or_empty(owner, mint, ctx.bumps.leftover),
    );

    let amount = book.withdraw_leftovers(owner, mint, &caller)?;

    let accounts = ctx.accounts;
    if let Some(leftover) = book.leftover(&owner, &mint) {
        accounts.leftover.set_inner(leftover.clone());
    }
    push_tokens(
        &accounts.token_program.to_account_info(),
        &accounts.reserve_vault.to_account_info(),
        &accounts.destination.to_account_info(),
        &accounts.ledger.to_account_info(),
        accounts.ledger.bump,
        amount,
    )?;

    emit!(LeftoversWithdrawn { owner, mint, amount });
    Ok(())
}

#[derive(Accounts)]
#[instruction(owner: Pubkey, mint: Pubkey)]
pub struct WithdrawLeftovers<'info> {
    #[account(seeds = [LEDGER_SEED], bump = ledger.bump)]
    pub ledger: Account<'info, Ledger>,

    /// Read as an empty credit when `owner` never settled a transfer in `mint`.
    #[account(
        init_if_needed,
        payer = caller,
        space = 8 + Leftover::SIZE,
        seeds = [LEFTOVER_SEED, owner.as_ref(), mint.as_ref()],
        bump
    )]
    pub leftover: Account<'info, Leftover>,

    #[account(
        mut,
        seeds = [RESERVE_SEED, mint.as_ref()],
        bump,
        constraint = reserve_vault.mint == mint @ VestingError::InvalidTokenMint
    )]
    pub reserve_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = destination.mint == mint @ VestingError::InvalidTokenMint,
        constraint = destination.owner == owner @ VestingError::InvalidTokenAccount
    )]
    pub destination: Account<'info, TokenAccount>,

    #[account(mut)]
    pub caller: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[event]
pub struct LeftoversWithdrawn {
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
}
