pub mod create_capsule;
pub mod create_multi_capsule;
pub mod create_schedule;
pub mod fill_reserves;
pub mod initialize_ledger;
pub mod quote_capsule;
pub mod quote_leftover;
pub mod quote_owner;
pub mod quote_schedule;
pub mod transfer_capsule;
pub mod transfer_multi_capsule;
pub mod withdraw_capsule;
pub mod withdraw_leftovers;
pub mod withdraw_multi_capsule;

pub use create_capsule::*;
pub use create_multi_capsule::*;
pub use create_schedule::*;
pub use fill_reserves::*;
pub use initialize_ledger::*;
pub use quote_capsule::*;
pub use quote_leftover::*;
pub use quote_owner::*;
pub use quote_schedule::*;
pub use transfer_capsule::*;
pub use transfer_multi_capsule::*;
pub use withdraw_capsule::*;
pub use withdraw_leftovers::*;
pub use withdraw_multi_capsule::*;
