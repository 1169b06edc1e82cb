//! Shared fixtures for the integration suites: swap-state builders, a funded
//! keeper harness, and seeded random order sets for determinism checks.

pub mod fixture;
pub mod orders;

pub use fixture::Harness;
pub use orders::{OrderSpec, SwapOrderBuilder, dec, random_order_set};
