use anchor_lang::prelude::*;

/// Custom error codes for the capsule vesting ledger.
#[error_code]
pub enum VestingError {
    #[msg("Unknown vesting schedule")]
    InvalidSchedule,

    #[msg("Unknown or retired capsule")]
    InvalidCapsule,

    #[msg("Owner must not be the default public key")]
    ZeroOwner,

    #[msg("Capsule is already owned by the recipient")]
    SelfTransfer,

    #[msg("Caller is not the recorded owner")]
    NotOwner,

    #[msg("Start time precedes the current time")]
    PastStartTime,

    #[msg("Available reserves do not cover the schedule amount")]
    InsufficientReserves,

    #[msg("Capsule is fully vested; withdraw instead of transferring")]
    FullyVested,

    #[msg("Nothing to withdraw")]
    NothingToWithdraw,

    #[msg("Invalid duration (must be > 0)")]
    InvalidDuration,

    #[msg("Invalid rate (must be > 0)")]
    InvalidRate,

    #[msg("Invalid cliff (must be shorter than the duration)")]
    InvalidCliff,

    #[msg("Invalid asset mint")]
    InvalidAsset,

    #[msg("Amount must be > 0")]
    ZeroAmount,

    #[msg("Empty batch")]
    EmptyBatch,

    #[msg("Batch size too large")]
    BatchTooLarge,

    #[msg("Owner index is full")]
    OwnerIndexFull,

    #[msg("Account does not match the expected address")]
    InvalidAccount,

    #[msg("Invalid token mint")]
    InvalidTokenMint,

    #[msg("Invalid token account")]
    InvalidTokenAccount,

    #[msg("Math overflow")]
    MathOverflow,

    #[msg("Reserve counters would break the locked <= total invariant")]
    ReserveInvariant,
}
