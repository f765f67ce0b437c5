#![allow(dead_code)]

use anchor_lang::error::ERROR_CODE_OFFSET;
use anchor_lang::prelude::AccountInfo;
use anchor_lang::solana_program::entrypoint::ProgramResult;
use anchor_lang::{AccountDeserialize, InstructionData, ToAccountMetas};
use anchor_spl::token::{spl_token, Mint, TokenAccount};
use solana_program_test::{processor, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::{
    clock::Clock,
    instruction::{AccountMeta, Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    sysvar,
    transaction::{Transaction, TransactionError},
};

use capsule_vesting::error::VestingError;
use capsule_vesting::state::{Capsule, Leftover, OwnerIndex, Schedule};
use capsule_vesting::utils::accounts::reserve_vault_address;

pub const T0: i64 = 1_700_000_000;
pub const CLIFF: u64 = 100;
pub const DURATION: u64 = 1_000;
pub const RATE: u64 = 1;
pub const DECIMALS: u8 = 6;

pub struct TestContext {
    pub ctx: ProgramTestContext,
    pub mint: Pubkey,
}

/// A funded wallet with a token account for the test mint.
pub struct User {
    pub keypair: Keypair,
    pub tokens: Pubkey,
}

impl User {
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

pub struct Users {
    /// Creates the schedules and funds them.
    pub creator: User,
    pub alice: User,
    pub bob: User,
}

fn process_instruction<'a>(
    program_id: &Pubkey,
    accounts: &[AccountInfo<'a>],
    data: &[u8],
) -> ProgramResult {
    // The entrypoint wants `&'info [AccountInfo<'info>]`.
    let accounts: &'a [AccountInfo<'a>] = Box::leak(accounts.to_vec().into_boxed_slice());
    capsule_vesting::entry(program_id, accounts, data)
}

pub fn ledger_pda() -> Pubkey {
    Pubkey::find_program_address(
        &[capsule_vesting::constants::LEDGER_SEED],
        &capsule_vesting::ID,
    )
    .0
}

pub fn schedule_pda(id: u64) -> Pubkey {
    Schedule::address(id).0
}

pub fn capsule_pda(id: u64) -> Pubkey {
    Capsule::address(id).0
}

pub fn leftover_pda(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    Leftover::address(owner, mint).0
}

pub fn owner_index_pda(owner: &Pubkey) -> Pubkey {
    OwnerIndex::address(owner).0
}

pub fn vault_pda(mint: &Pubkey) -> Pubkey {
    reserve_vault_address(mint).0
}

pub async fn setup_test_context() -> (TestContext, Users) {
    let program_test = ProgramTest::new(
        "capsule_vesting",
        capsule_vesting::ID,
        processor!(process_instruction),
    );
    let mut ctx = program_test.start_with_context().await;
    warp_to(&mut ctx, T0).await;

    let mint_authority = Keypair::new();
    let mint = create_mint(&mut ctx, &mint_authority.pubkey()).await;
    let mut users = Vec::with_capacity(3);
    for _ in 0..3 {
        let keypair = Keypair::new();
        airdrop(&mut ctx, &keypair.pubkey(), 10_000_000_000).await;
        let tokens = create_token_account(&mut ctx, &mint, &keypair.pubkey()).await;
        users.push(User { keypair, tokens });
    }
    let bob = users.pop().expect("bob");
    let alice = users.pop().expect("alice");
    let creator = users.pop().expect("creator");
    mint_to(&mut ctx, &mint, &mint_authority, &creator.tokens, 1_000_000).await;

    let initialize = instruction(
        capsule_vesting::accounts::InitializeLedger {
            ledger: ledger_pda(),
            payer: creator.pubkey(),
            system_program: anchor_lang::system_program::ID,
        },
        capsule_vesting::instruction::InitializeLedger {},
    );
    send(&mut ctx, &[initialize], &[&creator.keypair])
        .await
        .expect("initialize ledger");

    (
        TestContext { ctx, mint },
        Users {
            creator,
            alice,
            bob,
        },
    )
}

// ---- transactions ------------------------------------------------------

pub fn instruction(accounts: impl ToAccountMetas, data: impl InstructionData) -> Instruction {
    Instruction {
        program_id: capsule_vesting::ID,
        accounts: accounts.to_account_metas(None),
        data: data.data(),
    }
}

pub async fn send(
    ctx: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let blockhash = ctx
        .get_new_latest_blockhash()
        .await
        .expect("fresh blockhash");
    let mut all_signers = vec![&ctx.payer];
    all_signers.extend_from_slice(signers);
    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&ctx.payer.pubkey()),
        &all_signers,
        blockhash,
    );
    ctx.banks_client.process_transaction(tx).await
}

pub async fn airdrop(ctx: &mut ProgramTestContext, to: &Pubkey, lamports: u64) {
    let ix = system_instruction::transfer(&ctx.payer.pubkey(), to, lamports);
    send(ctx, &[ix], &[]).await.expect("airdrop");
}

pub async fn create_mint(ctx: &mut ProgramTestContext, authority: &Pubkey) -> Pubkey {
    let mint = Keypair::new();
    let rent = ctx.banks_client.get_rent().await.expect("rent");
    let ixs = [
        system_instruction::create_account(
            &ctx.payer.pubkey(),
            &mint.pubkey(),
            rent.minimum_balance(Mint::LEN),
            Mint::LEN as u64,
            &spl_token::ID,
        ),
        spl_token::instruction::initialize_mint2(
            &spl_token::ID,
            &mint.pubkey(),
            authority,
            None,
            DECIMALS,
        )
        .expect("initialize mint"),
    ];
    send(ctx, &ixs, &[&mint]).await.expect("create mint");
    mint.pubkey()
}

pub async fn create_token_account(
    ctx: &mut ProgramTestContext,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Pubkey {
    let account = Keypair::new();
    let rent = ctx.banks_client.get_rent().await.expect("rent");
    let ixs = [
        system_instruction::create_account(
            &ctx.payer.pubkey(),
            &account.pubkey(),
            rent.minimum_balance(TokenAccount::LEN),
            TokenAccount::LEN as u64,
            &spl_token::ID,
        ),
        spl_token::instruction::initialize_account3(&spl_token::ID, &account.pubkey(), mint, owner)
            .expect("initialize token account"),
    ];
    send(ctx, &ixs, &[&account])
        .await
        .expect("create token account");
    account.pubkey()
}

pub async fn mint_to(
    ctx: &mut ProgramTestContext,
    mint: &Pubkey,
    authority: &Keypair,
    to: &Pubkey,
    amount: u64,
) {
    let ix = spl_token::instruction::mint_to(
        &spl_token::ID,
        mint,
        to,
        &authority.pubkey(),
        &[],
        amount,
    )
    .expect("mint_to");
    send(ctx, &[ix], &[authority]).await.expect("mint tokens");
}

pub async fn warp_to(ctx: &mut ProgramTestContext, unix_timestamp: i64) {
    let mut clock: Clock = ctx.banks_client.get_sysvar().await.expect("clock");
    clock.unix_timestamp = unix_timestamp;
    ctx.set_sysvar(&clock);
}

// ---- reads -------------------------------------------------------------

pub async fn fetch<T: AccountDeserialize>(ctx: &mut ProgramTestContext, address: Pubkey) -> Option<T> {
    let account = ctx.banks_client.get_account(address).await.ok()??;
    T::try_deserialize(&mut account.data.as_slice()).ok()
}

pub async fn token_balance(ctx: &mut ProgramTestContext, address: Pubkey) -> u64 {
    fetch::<TokenAccount>(ctx, address)
        .await
        .map_or(0, |account| account.amount)
}

pub async fn capsules_of(ctx: &mut ProgramTestContext, owner: &Pubkey) -> Vec<u64> {
    fetch::<OwnerIndex>(ctx, owner_index_pda(owner))
        .await
        .map(|index| index.capsule_ids)
        .unwrap_or_default()
}

#[track_caller]
pub fn assert_vesting_error(result: Result<(), BanksClientError>, expected: VestingError) {
    let code = ERROR_CODE_OFFSET + expected as u32;
    match result {
        Ok(()) => panic!("expected custom error {code}, transaction succeeded"),
        Err(err) => assert_eq!(
            err.unwrap(),
            TransactionError::InstructionError(0, InstructionError::Custom(code))
        ),
    }
}

// ---- ledger instructions -------------------------------------------------

impl TestContext {
    pub async fn create_schedule(
        &mut self,
        creator: &User,
        schedule_id: u64,
    ) -> Result<(), BanksClientError> {
        let ix = instruction(
            capsule_vesting::accounts::CreateSchedule {
                ledger: ledger_pda(),
                schedule: schedule_pda(schedule_id),
                reserve_vault: vault_pda(&self.mint),
                mint: self.mint,
                creator: creator.pubkey(),
                token_program: spl_token::ID,
                system_program: anchor_lang::system_program::ID,
                rent: sysvar::rent::ID,
            },
            capsule_vesting::instruction::CreateSchedule {
                cliff_seconds: CLIFF,
                duration_seconds: DURATION,
                rate_per_second: RATE,
            },
        );
        send(&mut self.ctx, &[ix], &[&creator.keypair]).await
    }

    pub async fn fill_reserves(
        &mut self,
        funder: &User,
        schedule_id: u64,
        amount: u64,
    ) -> Result<(), BanksClientError> {
        let ix = instruction(
            capsule_vesting::accounts::FillReserves {
                schedule: schedule_pda(schedule_id),
                reserve_vault: vault_pda(&self.mint),
                funder_token_account: funder.tokens,
                funder: funder.pubkey(),
                token_program: spl_token::ID,
            },
            capsule_vesting::instruction::FillReserves {
                schedule_id,
                amount,
            },
        );
        send(&mut self.ctx, &[ix], &[&funder.keypair]).await
    }

    pub async fn create_capsule(
        &mut self,
        creator: &User,
        capsule_id: u64,
        owner: Pubkey,
        schedule_id: u64,
        start_time: i64,
    ) -> Result<(), BanksClientError> {
        let ix = instruction(
            capsule_vesting::accounts::CreateCapsule {
                ledger: ledger_pda(),
                schedule: schedule_pda(schedule_id),
                capsule: capsule_pda(capsule_id),
                owner_index: owner_index_pda(&owner),
                creator: creator.pubkey(),
                system_program: anchor_lang::system_program::ID,
            },
            capsule_vesting::instruction::CreateCapsule {
                owner,
                schedule_id,
                start_time,
            },
        );
        send(&mut self.ctx, &[ix], &[&creator.keypair]).await
    }

    /// `first_capsule_id` is the ledger's next capsule id.
    pub async fn create_multi_capsule(
        &mut self,
        creator: &User,
        first_capsule_id: u64,
        owner: Pubkey,
        schedule_ids: Vec<u64>,
        start_time: i64,
    ) -> Result<(), BanksClientError> {
        let mut ix = instruction(
            capsule_vesting::accounts::CreateMultiCapsule {
                ledger: ledger_pda(),
                owner_index: owner_index_pda(&owner),
                creator: creator.pubkey(),
                system_program: anchor_lang::system_program::ID,
            },
            capsule_vesting::instruction::CreateMultiCapsule {
                owner,
                schedule_ids: schedule_ids.clone(),
                start_time,
            },
        );
        for (capsule_id, schedule_id) in (first_capsule_id..).zip(&schedule_ids) {
            ix.accounts.extend([
                AccountMeta::new(schedule_pda(*schedule_id), false),
                AccountMeta::new(capsule_pda(capsule_id), false),
            ]);
        }
        send(&mut self.ctx, &[ix], &[&creator.keypair]).await
    }

    pub async fn transfer_capsule(
        &mut self,
        owner: &User,
        capsule_id: u64,
        schedule_id: u64,
        new_owner: Pubkey,
    ) -> Result<(), BanksClientError> {
        let ix = instruction(
            capsule_vesting::accounts::TransferCapsule {
                capsule: capsule_pda(capsule_id),
                schedule: schedule_pda(schedule_id),
                leftover: leftover_pda(&owner.pubkey(), &self.mint),
                owner_index: owner_index_pda(&owner.pubkey()),
                new_owner_index: owner_index_pda(&new_owner),
                owner: owner.pubkey(),
                system_program: anchor_lang::system_program::ID,
            },
            capsule_vesting::instruction::TransferCapsule {
                capsule_id,
                new_owner,
            },
        );
        send(&mut self.ctx, &[ix], &[&owner.keypair]).await
    }

    /// Every capsule is expected on `schedule_id`.
    pub async fn transfer_multi_capsule(
        &mut self,
        owner: &User,
        capsule_ids: Vec<u64>,
        schedule_id: u64,
        new_owner: Pubkey,
    ) -> Result<(), BanksClientError> {
        let mut ix = instruction(
            capsule_vesting::accounts::TransferMultiCapsule {
                ledger: ledger_pda(),
                owner_index: owner_index_pda(&owner.pubkey()),
                new_owner_index: owner_index_pda(&new_owner),
                owner: owner.pubkey(),
                system_program: anchor_lang::system_program::ID,
            },
            capsule_vesting::instruction::TransferMultiCapsule {
                capsule_ids: capsule_ids.clone(),
                new_owner,
            },
        );
        for capsule_id in &capsule_ids {
            ix.accounts.extend([
                AccountMeta::new(capsule_pda(*capsule_id), false),
                AccountMeta::new(schedule_pda(schedule_id), false),
                AccountMeta::new(leftover_pda(&owner.pubkey(), &self.mint), false),
            ]);
        }
        send(&mut self.ctx, &[ix], &[&owner.keypair]).await
    }

    pub async fn withdraw_capsule(
        &mut self,
        owner: &User,
        capsule_id: u64,
        schedule_id: u64,
    ) -> Result<(), BanksClientError> {
        let ix = instruction(
            capsule_vesting::accounts::WithdrawCapsule {
                ledger: ledger_pda(),
                capsule: capsule_pda(capsule_id),
                schedule: schedule_pda(schedule_id),
                owner_index: owner_index_pda(&owner.pubkey()),
                reserve_vault: vault_pda(&self.mint),
                destination: owner.tokens,
                owner: owner.pubkey(),
                token_program: spl_token::ID,
                system_program: anchor_lang::system_program::ID,
            },
            capsule_vesting::instruction::WithdrawCapsule { capsule_id },
        );
        send(&mut self.ctx, &[ix], &[&owner.keypair]).await
    }

    /// Every capsule is expected on `schedule_id`.
    pub async fn withdraw_multi_capsule(
        &mut self,
        owner: &User,
        capsule_ids: Vec<u64>,
        schedule_id: u64,
    ) -> Result<(), BanksClientError> {
        let mut ix = instruction(
            capsule_vesting::accounts::WithdrawMultiCapsule {
                ledger: ledger_pda(),
                owner_index: owner_index_pda(&owner.pubkey()),
                owner: owner.pubkey(),
                token_program: spl_token::ID,
                system_program: anchor_lang::system_program::ID,
            },
            capsule_vesting::instruction::WithdrawMultiCapsule {
                capsule_ids: capsule_ids.clone(),
            },
        );
        for capsule_id in &capsule_ids {
            ix.accounts.extend([
                AccountMeta::new(capsule_pda(*capsule_id), false),
                AccountMeta::new(schedule_pda(schedule_id), false),
                AccountMeta::new(vault_pda(&self.mint), false),
                AccountMeta::new(owner.tokens, false),
            ]);
        }
        send(&mut self.ctx, &[ix], &[&owner.keypair]).await
    }

    pub async fn withdraw_leftovers(
        &mut self,
        caller: &User,
        owner: Pubkey,
        destination: Pubkey,
    ) -> Result<(), BanksClientError> {
        let ix = instruction(
            capsule_vesting::accounts::WithdrawLeftovers {
                ledger: ledger_pda(),
                leftover: leftover_pda(&owner, &self.mint),
                reserve_vault: vault_pda(&self.mint),
                destination,
                caller: caller.pubkey(),
                token_program: spl_token::ID,
                system_program: anchor_lang::system_program::ID,
            },
            capsule_vesting::instruction::WithdrawLeftovers {
                owner,
                mint: self.mint,
            },
        );
        send(&mut self.ctx, &[ix], &[&caller.keypair]).await
    }

    pub async fn schedule(&mut self, schedule_id: u64) -> Schedule {
        fetch(&mut self.ctx, schedule_pda(schedule_id))
            .await
            .expect("schedule account")
    }

    pub async fn leftover_balance(&mut self, owner: &Pubkey) -> u64 {
        let address = leftover_pda(owner, &self.mint);
        fetch::<Leftover>(&mut self.ctx, address)
            .await
            .map_or(0, |leftover| leftover.amount)
    }
}
