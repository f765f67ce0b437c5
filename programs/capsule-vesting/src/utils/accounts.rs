//! Batch instructions: loading `remaining_accounts` into a [`Book`] and
//! committing it back.
//!
//! Records are read and written through Anchor's `Account<'info, T>`, so the
//! owner and discriminator checks and the serialization are Anchor's. Only the
//! id lookups are mapped onto ledger errors, and records that may not exist
//! yet (new capsules, first leftover credit) are created here because their
//! addresses come from instruction data.

use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Allocate, Assign, CreateAccount, Transfer as SolTransfer};
use anchor_spl::token::{self, TokenAccount, Transfer};

use crate::book::Book;
use crate::constants::{CAPSULE_SEED, LEDGER_SEED, LEFTOVER_SEED, RESERVE_SEED};
use crate::error::VestingError;
use crate::state::{Capsule, Leftover, Schedule};

pub fn reserve_vault_address(mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RESERVE_SEED, mint.as_ref()], &crate::ID)
}

/// Deserializes a record that may not have been created yet.
pub fn read_optional<T: AccountDeserialize + Owner>(info: &AccountInfo) -> Result<Option<T>> {
    if info.data_is_empty() {
        return Ok(None);
    }
    require_keys_eq!(*info.owner, T::owner(), VestingError::InvalidAccount);
    let data = info.try_borrow_data()?;
    let record = T::try_deserialize(&mut &data[..])?;
    Ok(Some(record))
}

/// Pushes `amount` out of a reserve vault, signed by the ledger PDA.
pub fn push_tokens<'info>(
    token_program: &AccountInfo<'info>,
    vault: &AccountInfo<'info>,
    destination: &AccountInfo<'info>,
    ledger: &AccountInfo<'info>,
    ledger_bump: u8,
    amount: u64,
) -> Result<()> {
    let signer_seeds: &[&[&[u8]]] = &[&[LEDGER_SEED, &[ledger_bump]]];
    token::transfer(
        CpiContext::new_with_signer(
            token_program.clone(),
            Transfer {
                from: vault.clone(),
                to: destination.clone(),
                authority: ledger.clone(),
            },
            signer_seeds,
        ),
        amount,
    )
}

/// Accounts every commit needs besides the loaded records.
pub struct CommitAccounts<'a, 'info> {
    /// Pays rent for created records and receives rent of retired capsules.
    pub payer: &'a AccountInfo<'info>,
    pub ledger: &'a AccountInfo<'info>,
    pub ledger_bump: u8,
    pub system_program: &'a AccountInfo<'info>,
    /// Required only when the book holds payouts.
    pub token_program: Option<&'a AccountInfo<'info>>,
}

/// Creates a program-owned PDA the way Anchor's `init` does: an address
/// that already holds lamports is topped up, allocated and assigned instead
/// of failing `create_account`.
fn init_pda<'info>(
    env: &CommitAccounts<'_, 'info>,
    target: &AccountInfo<'info>,
    seeds: &[&[u8]],
    space: usize,
) -> Result<()> {
    let rent = Rent::get()?.minimum_balance(space);
    let current = target.lamports();
    if current == 0 {
        return system_program::create_account(
            CpiContext::new_with_signer(
                env.system_program.clone(),
                CreateAccount {
                    from: env.payer.clone(),
                    to: target.clone(),
                },
                &[seeds],
            ),
            rent,
            space as u64,
            &crate::ID,
        );
    }

    let top_up = rent.saturating_sub(current);
    if top_up > 0 {
        system_program::transfer(
            CpiContext::new(
                env.system_program.clone(),
                SolTransfer {
                    from: env.payer.clone(),
                    to: target.clone(),
                },
            ),
            top_up,
        )?;
    }
    system_program::allocate(
        CpiContext::new_with_signer(
            env.system_program.clone(),
            Allocate {
                account_to_allocate: target.clone(),
            },
            &[seeds],
        ),
        space as u64,
    )?;
    system_program::assign(
        CpiContext::new_with_signer(
            env.system_program.clone(),
            Assign {
                account_to_assign: target.clone(),
            },
            &[seeds],
        ),
        &crate::ID,
    )
}

/// A record account that either exists or is an unused PDA it may be
/// created at.
enum Record<'info, T: AccountSerialize + AccountDeserialize + Clone> {
    Existing(Account<'info, T>),
    Vacant(&'info AccountInfo<'info>),
}

/// Accounts backing the records loaded into a [`Book`], keyed the same way
/// the book keys them.
#[derive(Default)]
pub struct Slots<'info> {
    schedules: Vec<Account<'info, Schedule>>,
    capsules: Vec<(u64, Record<'info, Capsule>)>,
    leftovers: Vec<((Pubkey, Pubkey), Record<'info, Leftover>)>,
    vaults: Vec<Account<'info, TokenAccount>>,
    destinations: Vec<Account<'info, TokenAccount>>,
}

impl<'info> Slots<'info> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_schedule(
        &mut self,
        book: &mut Book,
        info: &'info AccountInfo<'info>,
        expected_id: u64,
    ) -> Result<Schedule> {
        let account = Account::<Schedule>::try_from(info)
            .map_err(|_| error!(VestingError::InvalidSchedule))?;
        require!(account.id == expected_id, VestingError::InvalidSchedule);
        let schedule = (*account).clone();
        if !self.schedules.iter().any(|s| s.id == expected_id) {
            self.schedules.push(account);
        }
        book.track_schedule(schedule.clone());
        Ok(schedule)
    }

    pub fn load_capsule(
        &mut self,
        book: &mut Book,
        info: &'info AccountInfo<'info>,
        expected_id: u64,
    ) -> Result<Capsule> {
        let account = Account::<Capsule>::try_from(info)
            .map_err(|_| error!(VestingError::InvalidCapsule))?;
        require!(account.id == expected_id, VestingError::InvalidCapsule);
        let capsule = (*account).clone();
        if !self.capsules.iter().any(|(id, _)| *id == expected_id) {
            self.capsules.push((expected_id, Record::Existing(account)));
        }
        book.track_capsule(capsule.clone());
        Ok(capsule)
    }

    /// Registers the unused PDA a new capsule `capsule_id` will live in.
    /// Lamports already sitting at the address are tolerated.
    pub fn reserve_capsule(
        &mut self,
        info: &'info AccountInfo<'info>,
        capsule_id: u64,
    ) -> Result<()> {
        let (address, _) = Capsule::address(capsule_id);
        require_keys_eq!(info.key(), address, VestingError::InvalidAccount);
        require!(
            info.data_is_empty() && info.owner == &system_program::ID,
            VestingError::InvalidAccount
        );
        self.capsules.push((capsule_id, Record::Vacant(info)));
        Ok(())
    }

    pub fn load_leftover(
        &mut self,
        book: &mut Book,
        info: &'info AccountInfo<'info>,
        owner: Pubkey,
        mint: Pubkey,
    ) -> Result<()> {
        if self.leftovers.iter().any(|(key, _)| *key == (owner, mint)) {
            return Ok(());
        }
        let (address, bump) = Leftover::address(&owner, &mint);
        require_keys_eq!(info.key(), address, VestingError::InvalidAccount);
        let record = if info.owner == &system_program::ID {
            require!(info.data_is_empty(), VestingError::InvalidAccount);
            book.track_leftover(Leftover {
                bump,
                ..Leftover::empty(owner, mint)
            });
            Record::Vacant(info)
        } else {
            let account = Account::<Leftover>::try_from(info)
                .map_err(|_| error!(VestingError::InvalidAccount))?;
            book.track_leftover((*account).clone());
            Record::Existing(account)
        };
        self.leftovers.push(((owner, mint), record));
        Ok(())
    }

    /// Registers the reserve vault of `mint`.
    pub fn load_vault(&mut self, info: &'info AccountInfo<'info>, mint: &Pubkey) -> Result<()> {
        let (address, _) = reserve_vault_address(mint);
        require_keys_eq!(info.key(), address, VestingError::InvalidAccount);
        let vault = Account::<TokenAccount>::try_from(info)
            .map_err(|_| error!(VestingError::InvalidTokenAccount))?;
        require_keys_eq!(vault.mint, *mint, VestingError::InvalidTokenMint);
        if !self.vaults.iter().any(|v| v.mint == *mint) {
            self.vaults.push(vault);
        }
        Ok(())
    }

    /// Registers `owner`'s token account for `mint` as a payout destination.
    pub fn load_destination(
        &mut self,
        info: &'info AccountInfo<'info>,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<()> {
        let account = Account::<TokenAccount>::try_from(info)
            .map_err(|_| error!(VestingError::InvalidTokenAccount))?;
        require_keys_eq!(account.mint, *mint, VestingError::InvalidTokenMint);
        require_keys_eq!(account.owner, *owner, VestingError::InvalidTokenAccount);
        if !self
            .destinations
            .iter()
            .any(|d| d.owner == *owner && d.mint == *mint)
        {
            self.destinations.push(account);
        }
        Ok(())
    }

    /// Writes every record back, creates new ones, closes retired capsules
    /// and pushes the book's payouts.
    pub fn commit(&mut self, book: &Book, env: &CommitAccounts<'_, 'info>) -> Result<()> {
        for account in &mut self.schedules {
            let schedule = book.schedule(account.id)?.clone();
            account.set_inner(schedule);
            account.exit(&crate::ID)?;
        }

        for (id, record) in &mut self.capsules {
            match (book.capsule(*id), record) {
                (Some(capsule), Record::Existing(account)) => {
                    account.set_inner(capsule.clone());
                    account.exit(&crate::ID)?;
                }
                (Some(capsule), Record::Vacant(info)) => {
                    let (_, bump) = Capsule::address(*id);
                    let id_bytes = id.to_le_bytes();
                    init_pda(
                        env,
                        *info,
                        &[CAPSULE_SEED, &id_bytes, &[bump]],
                        8 + Capsule::SIZE,
                    )?;
                    let mut account = Account::<Capsule>::try_from_unchecked(*info)?;
                    account.set_inner(Capsule {
                        bump,
                        ..capsule.clone()
                    });
                    account.exit(&crate::ID)?;
                }
                (None, Record::Existing(account)) => account.close(env.payer.clone())?,
                (None, Record::Vacant(_)) => {}
            }
        }

        for ((owner, mint), record) in &mut self.leftovers {
            let Some(leftover) = book.leftover(owner, mint) else {
                continue;
            };
            match record {
                Record::Existing(account) => {
                    account.set_inner(leftover.clone());
                    account.exit(&crate::ID)?;
                }
                Record::Vacant(_) if leftover.amount == 0 => {}
                Record::Vacant(info) => {
                    init_pda(
                        env,
                        *info,
                        &[LEFTOVER_SEED, owner.as_ref(), mint.as_ref(), &[leftover.bump]],
                        8 + Leftover::SIZE,
                    )?;
                    let mut account = Account::<Leftover>::try_from_unchecked(*info)?;
                    account.set_inner(leftover.clone());
                    account.exit(&crate::ID)?;
                }
            }
        }
        for leftover in book.leftovers() {
            let key = (leftover.owner, leftover.mint);
            require!(
                leftover.amount == 0 || self.leftovers.iter().any(|(k, _)| *k == key),
                VestingError::InvalidAccount
            );
        }

        for payout in book.payouts() {
            let token_program = env.token_program.ok_or(VestingError::InvalidAccount)?;
            let vault = self
                .vaults
                .iter()
                .find(|v| v.mint == payout.mint)
                .ok_or(VestingError::InvalidAccount)?;
            let destination = self
                .destinations
                .iter()
                .find(|d| d.owner == payout.recipient && d.mint == payout.mint)
                .ok_or(VestingError::InvalidTokenAccount)?;
            push_tokens(
                token_program,
                &vault.to_account_info(),
                &destination.to_account_info(),
                env.ledger,
                env.ledger_bump,
                payout.amount,
            )?;
        }

        Ok(())
    }
}
