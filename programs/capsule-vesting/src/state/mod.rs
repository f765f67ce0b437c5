pub mod capsule;
pub mod ledger;
pub mod leftover;
pub mod owner_index;
pub mod schedule;

pub use capsule::*;
pub use ledger::*;
pub use leftover::*;
pub use owner_index::*;
pub use schedule::*;
