use anchor_lang::prelude::*;

use crate::constants::SCHEDULE_SEED;
use crate::state::Schedule;
use crate::utils::accounts::read_optional;

/// Logs the reserve position of a schedule. An id with no schedule behind it
/// yields a quote with `exists = false` rather than an error.
pub fn process_quote_schedule(ctx: Context<QuoteSchedule>, schedule_id: u64) -> Result<()> {
    let quote = match read_optional::<Schedule>(&ctx.accounts.schedule)? {
        Some(schedule) => ScheduleQuote {
            schedule_id,
            exists: true,
            mint: schedule.mint,
            amount: schedule.amount,
            total_reserves: schedule.total_reserves,
            locked_reserves: schedule.locked_reserves,
            available_reserves: schedule.available_reserves(),
        },
        None => ScheduleQuote {
            schedule_id,
            exists: false,
            mint: Pubkey::default(),
            amount: 0,
            total_reserves: 0,
            locked_reserves: 0,
            available_reserves: 0,
        },
    };
    emit!(quote);

    Ok(())
}

#[derive(Accounts)]
#[instruction(schedule_id: u64)]
pub struct QuoteSchedule<'info> {
    /// CHECK: Schedule PDA of the quoted id; may be uninitialized.
    #[account(seeds = [SCHEDULE_SEED, schedule_id.to_le_bytes().as_ref()], bump)]
    pub schedule: UncheckedAccount<'info>,
}

#[event]
pub struct ScheduleQuote {
    pub schedule_id: u64,
    pub exists: bool,
    pub mint: Pubkey,
    pub amount: u64,
    pub total_reserves: u64,
    pub locked_reserves: u64,
    pub available_reserves: u64,
}
