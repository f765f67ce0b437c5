use anchor_lang::prelude::*;

use crate::book::Book;
use crate::constants::LEFTOVER_SEED;
use crate::state::Leftover;
use crate::utils::accounts::read_optional;

pub fn process_quote_leftover(
    ctx: Context<QuoteLeftover>,
    owner: Pubkey,
    mint: Pubkey,
) -> Result<()> {
    let mut book = Book::new(Clock::get()?.unix_timestamp);
    if let Some(leftover) = read_optional::<Leftover>(&ctx.accounts.leftover)? {
        book.track_leftover(leftover);
    }

    emit!(LeftoverQuote {
        owner,
        mint,
        amount: book.leftover_balance_of(&owner, &mint),
    });

    Ok(())
}

#[derive(Accounts)]
#[instruction(owner: Pubkey, mint: Pubkey)]
pub struct QuoteLeftover<'info> {
    /// CHECK: Leftover PDA of (`owner`, `mint`); may be uninitialized.
    #[account(seeds = [LEFTOVER_SEED, owner.as_ref(), mint.as_ref()], bump)]
    pub leftover: UncheckedAccount<'info>,
}

#[event]
pub struct LeftoverQuote {
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
}
