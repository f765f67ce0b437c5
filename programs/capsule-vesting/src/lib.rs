use anchor_lang::prelude::*;

pub mod book;
pub mod constants;
pub mod error;
pub mod instructions;
pub mod state;
pub mod utils;

pub use instructions::*;

declare_id!("9vb4NmXFktwtnGFpzYj2rTxNpVnY6pL84yoVW4K1KTqw");

#[program]
pub mod capsule_vesting {
    use super::*;

    pub fn initialize_ledger(ctx: Context<InitializeLedger>) -> Result<()> {
        instructions::process_initialize_ledger(ctx)
    }

    pub fn create_schedule(
        ctx: Context<CreateSchedule>,
        cliff_seconds: u64,
        duration_seconds: u64,
        rate_per_second: u64,
    ) -> Result<()> {
        instructions::process_create_schedule(
            ctx,
            cliff_seconds,
            duration_seconds,
            rate_per_second,
        )
    }

    pub fn fill_reserves(ctx: Context<FillReserves>, schedule_id: u64, amount: u64) -> Result<()> {
        instructions::process_fill_reserves(ctx, schedule_id, amount)
    }

    pub fn create_capsule(
        ctx: Context<CreateCapsule>,
        owner: Pubkey,
        schedule_id: u64,
        start_time: i64,
    ) -> Result<()> {
        instructions::process_create_capsule(ctx, owner, schedule_id, start_time)
    }

    /// `remaining_accounts`: `[schedule, capsule]` per schedule id.
    pub fn create_multi_capsule<'info>(
        ctx: Context<'_, '_, 'info, 'info, CreateMultiCapsule<'info>>,
        owner: Pubkey,
        schedule_ids: Vec<u64>,
        start_time: i64,
    ) -> Result<()> {
        instructions::process_create_multi_capsule(ctx, owner, schedule_ids, start_time)
    }

    pub fn transfer_capsule(
        ctx: Context<TransferCapsule>,
        capsule_id: u64,
        new_owner: Pubkey,
    ) -> Result<()> {
        instructions::process_transfer_capsule(ctx, capsule_id, new_owner)
    }

    /// `remaining_accounts`: `[capsule, schedule, leftover]` per capsule id.
    pub fn transfer_multi_capsule<'info>(
        ctx: Context<'_, '_, 'info, 'info, TransferMultiCapsule<'info>>,
        capsule_ids: Vec<u64>,
        new_owner: Pubkey,
    ) -> Result<()> {
        instructions::process_transfer_multi_capsule(ctx, capsule_ids, new_owner)
    }

    pub fn withdraw_capsule(ctx: Context<WithdrawCapsule>, capsule_id: u64) -> Result<()> {
        instructions::process_withdraw_capsule(ctx, capsule_id)
    }

    /// `remaining_accounts`: `[capsule, schedule, reserve_vault, destination]`
    /// per capsule id.
    pub fn withdraw_multi_capsule<'info>(
        ctx: Context<'_, '_, 'info, 'info, WithdrawMultiCapsule<'info>>,
        capsule_ids: Vec<u64>,
    ) -> Result<()> {
        instructions::process_withdraw_multi_capsule(ctx, capsule_ids)
    }

    pub fn withdraw_leftovers(
        ctx: Context<WithdrawLeftovers>,
        owner: Pubkey,
        mint: Pubkey,
    ) -> Result<()> {
        instructions::process_withdraw_leftovers(ctx, owner, mint)
    }

    pub fn quote_schedule(ctx: Context<QuoteSchedule>, schedule_id: u64) -> Result<()> {
        instructions::process_quote_schedule(ctx, schedule_id)
    }

    pub fn quote_capsule(ctx: Context<QuoteCapsule>, capsule_id: u64) -> Result<()> {
        instructions::process_quote_capsule(ctx, capsule_id)
    }

    pub fn quote_leftover(ctx: Context<QuoteLeftover>, owner: Pubkey, mint: Pubkey) -> Result<()> {
        instructions::process_quote_leftover(ctx, owner, mint)
    }

    pub fn quote_owner(ctx: Context<QuoteOwner>, owner: Pubkey) -> Result<()> {
        instructions::process_quote_owner(ctx, owner)
    }
}
