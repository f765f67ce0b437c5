use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::{LEDGER_SEED, RESERVE_SEED, SCHEDULE_SEED};
use crate::state::{Ledger, Schedule};

pub fn process_create_schedule(
    ctx: Context<CreateSchedule>,
    cliff_seconds: u64,
    duration_seconds: u64,
    rate_per_second: u64,
) -> Result<()> {
    let schedule = Schedule::new(
        ctx.accounts.ledger.schedule_count,
        ctx.accounts.mint.key(),
        ctx.accounts.creator.key(),
        cliff_seconds,
        duration_seconds,
        rate_per_second,
        ctx.bumps.schedule,
    )?;
    ctx.accounts.ledger.next_schedule_id()?;

    emit!(ScheduleCreated {
        schedule_id: schedule.id,
        mint: schedule.mint,
        creator: schedule.creator,
        cliff_seconds,
        duration_seconds,
        rate_per_second,
        amount: schedule.amount,
    });

    ctx.accounts.schedule.set_inner(schedule);
    Ok(())
}

#[derive(Accounts)]
pub struct CreateSchedule<'info> {
    #[account(mut, seeds = [LEDGER_SEED], bump = ledger.bump)]
    pub ledger: Account<'info, Ledger>,

    #[account(
        init,
        payer = creator,
        space = 8 + Schedule::SIZE,
        seeds = [SCHEDULE_SEED, ledger.schedule_count.to_le_bytes().as_ref()],
        bump
    )]
    pub schedule: Account<'info, Schedule>,

    /// Shared reserve pool of `mint`; the first schedule on an asset creates it.
    #[account(
        init_if_needed,
        payer = creator,
        token::mint = mint,
        token::authority = ledger,
        seeds = [RESERVE_SEED, mint.key().as_ref()],
        bump
    )]
    pub reserve_vault: Account<'info, TokenAccount>,

    pub mint: Account<'info, Mint>,

    #[account(mut)]
    pub creator: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[event]
pub struct ScheduleCreated {
    pub schedule_id: u64,
    pub mint: Pubkey,
    pub creator: Pubkey,
    pub cliff_seconds: u64,
    pub duration_seconds: u64,
    pub rate_per_second: u64,
    pub amount: u64,
}
