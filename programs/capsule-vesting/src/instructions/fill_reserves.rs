use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::book::Book;
use crate::constants::{RESERVE_SEED, SCHEDULE_SEED};
use crate::error::VestingError;
use crate::state::Schedule;

pub fn process_fill_reserves(
    ctx: Context<FillReserves>,
    schedule_id: u64,
    amount: u64,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let mut book = Book::new(now);
    book.track_schedule((*ctx.accounts.schedule).clone());
    book.fill_reserves(schedule_id, amount)?;

    // Pull first: a failed transfer aborts before any counter is written.
    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.funder_token_account.to_account_info(),
                to: ctx.accounts.reserve_vault.to_account_info(),
                authority: ctx.accounts.funder.to_account_info(),
            },
        ),
        amount,
    )?;

    let filled = book.schedule(schedule_id)?;
    ctx.accounts.schedule.set_inner(filled.clone());

    emit!(ReservesFilled {
        schedule_id,
        funder: ctx.accounts.funder.key(),
        amount,
        total_reserves: filled.total_reserves,
        available_reserves: filled.available_reserves(),
    });

    Ok(())
}

#[derive(Accounts)]
#[instruction(schedule_id: u64)]
pub struct FillReserves<'info> {
    #[account(
        mut,
        seeds = [SCHEDULE_SEED, schedule_id.to_le_bytes().as_ref()],
        bump = schedule.bump
    )]
    pub schedule: Account<'info, Schedule>,

    #[account(
        mut,
        seeds = [RESERVE_SEED, schedule.mint.as_ref()],
        bump,
        constraint = reserve_vault.mint == schedule.mint @ VestingError::InvalidTokenMint
    )]
    pub reserve_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = funder_token_account.mint == schedule.mint @ VestingError::InvalidTokenMint,
        constraint = funder_token_account.owner == funder.key() @ VestingError::InvalidTokenAccount
    )]
    pub funder_token_account: Account<'info, TokenAccount>,

    pub funder: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[event]
pub struct ReservesFilled {
    pub schedule_id: u64,
    pub funder: Pubkey,
    pub amount: u64,
    pub total_reserves: u64,
    pub available_reserves: u64,
}
