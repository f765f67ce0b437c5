//! Program-wide constants.

/// Seed of the singleton ledger PDA (id counters, vault authority).
pub const LEDGER_SEED: &[u8] = b"ledger";

/// Seed prefix of schedule PDAs: `[SCHEDULE_SEED, id.to_le_bytes()]`.
pub const SCHEDULE_SEED: &[u8] = b"schedule";

/// Seed prefix of capsule PDAs: `[CAPSULE_SEED, id.to_le_bytes()]`.
pub const CAPSULE_SEED: &[u8] = b"capsule";

/// Seed prefix of per-asset reserve vaults: `[RESERVE_SEED, mint]`.
pub const RESERVE_SEED: &[u8] = b"reserve";

/// Seed prefix of leftover credits: `[LEFTOVER_SEED, owner, mint]`.
pub const LEFTOVER_SEED: &[u8] = b"leftover";

/// Seed prefix of owner indexes: `[OWNER_INDEX_SEED, owner]`.
pub const OWNER_INDEX_SEED: &[u8] = b"owner_index";

/// Max capsules processed per batch instruction.
pub const MAX_BATCH: usize = 8;

/// Max active capsules tracked per owner.
pub const MAX_CAPSULES_PER_OWNER: usize = 64;
