//! Deterministic batch matching for a constant-product pool.
//!
//! The engine is pure: it reads a snapshot of reserves and swap states,
//! discovers the single clearing price of the batch, allocates fills, and
//! applies the settlement transition. All I/O (escrow transfers, storage,
//! events) stays with the caller, which is what keeps every replica's run
//! bit-identical.

pub mod book;
pub mod fill;
pub mod invariants;
pub mod price;
pub mod settlement;

pub use book::{OrderBook, build_book, order_direction};
pub use fill::{SideDeltas, find_order_match};
pub use price::match_orders;
pub use settlement::{SettlementOutcome, apply_match_results};
