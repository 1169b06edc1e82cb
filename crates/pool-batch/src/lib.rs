//! Batch controller around the matching engine: message admission, the
//! begin/end-block lifecycle, escrow movement, and keyed storage.

pub mod bank;
pub mod ctx;
pub mod keeper;
pub mod store;

pub use bank::{BankKeeper, MemBank};
pub use ctx::Ctx;
pub use keeper::{BATCH_ESCROW_ACCOUNT, FEE_COLLECTOR_ACCOUNT, Keeper};
pub use store::BatchStore;
