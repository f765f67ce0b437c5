use anchor_lang::prelude::*;

use crate::book::Book;
use crate::constants::{CAPSULE_SEED, SCHEDULE_SEED};
use crate::state::{Capsule, Schedule};

pub fn process_quote_capsule(ctx: Context<QuoteCapsule>, capsule_id: u64) -> Result<()> {
    let capsule = &ctx.accounts.capsule;
    let schedule = &ctx.accounts.schedule;
    let mut book = Book::new(Clock::get()?.unix_timestamp);
    book.track_capsule((**capsule).clone());
    book.track_schedule((**schedule).clone());

    emit!(CapsuleQuote {
        capsule_id,
        schedule_id: schedule.id,
        owner: capsule.owner,
        start_time: capsule.start_time,
        end_time: capsule.end_time,
        claimed_amount: capsule.claimed_amount,
        vested_balance: book.vested_balance_of(capsule_id)?,
        remaining: capsule.remaining(schedule),
    });

    Ok(())
}

#[derive(Accounts)]
#[instruction(capsule_id: u64)]
pub struct QuoteCapsule<'info> {
    #[account(
        seeds = [CAPSULE_SEED, capsule_id.to_le_bytes().as_ref()],
        bump = capsule.bump
    )]
    pub capsule: Account<'info, Capsule>,

    #[account(
        seeds = [SCHEDULE_SEED, capsule.schedule_id.to_le_bytes().as_ref()],
        bump = schedule.bump
    )]
    pub schedule: Account<'info, Schedule>,
}

#[event]
pub struct CapsuleQuote {
    pub capsule_id: u64,
    pub schedule_id: u64,
    pub owner: Pubkey,
    pub start_time: i64,
    pub end_time: i64,
    pub claimed_amount: u64,
    /// Withdrawable right now.
    pub vested_balance: u64,
    pub remaining: u64,
}
