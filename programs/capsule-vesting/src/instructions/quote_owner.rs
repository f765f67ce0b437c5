use anchor_lang::prelude::*;

use crate::book::Book;
use crate::constants::OWNER_INDEX_SEED;
use crate::state::OwnerIndex;
use crate::utils::accounts::read_optional;

pub fn process_quote_owner(ctx: Context<QuoteOwner>, owner: Pubkey) -> Result<()> {
    let mut book = Book::new(Clock::get()?.unix_timestamp);
    if let Some(index) = read_optional::<OwnerIndex>(&ctx.accounts.owner_index)? {
        book.track_index(index);
    }

    emit!(OwnerQuote {
        owner,
        capsule_ids: book.capsules_of(&owner),
    });

    Ok(())
}

#[derive(Accounts)]
#[instruction(owner: Pubkey)]
pub struct QuoteOwner<'info> {
    /// CHECK: Owner index PDA of `owner`; may be uninitialized.
    #[account(seeds = [OWNER_INDEX_SEED, owner.as_ref()], bump)]
    pub owner_index: UncheckedAccount<'info>,
}

#[event]
pub struct OwnerQuote {
    pub owner: Pubkey,
    pub capsule_ids: Vec<u64>,
}
