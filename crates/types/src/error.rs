use thiserror::Error;

use crate::{coin::Coin, dec::Dec};

/// Errors surfaced to the message submitter. The order never reaches the
/// batch; nothing about pool or batch state has changed when one of these is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiquidityError {
    #[error("pool {0} does not exist")]
    PoolNotFound(u64),
    #[error("pool for denom pair {0}/{1} already exists")]
    PoolAlreadyExists(String, String),
    #[error("unknown pool type {0}")]
    UnknownPoolType(u32),
    #[error("denom {denom} does not belong to pool {pool_id}")]
    DenomNotInPool { pool_id: u64, denom: String },
    #[error("offer and demand denom are both {0}")]
    SameDenom(String),
    #[error("amount {got} is below the minimum {min}")]
    AmountBelowMinimum { got: u128, min: u128 },
    #[error("order of {got} exceeds {max} ({ratio} of the offer-side reserve)")]
    OrderTooLarge { got: u128, max: u128, ratio: Dec },
    #[error("order price {0} must be positive")]
    InvalidOrderPrice(Dec),
    #[error("order expiry height {expiry} is not after the current height {height}")]
    ExpiryInPast { expiry: u64, height: u64 },
    #[error("account {account} holds {have}, needs {want}")]
    InsufficientFunds { account: String, have: u128, want: Coin },
    #[error("pool {0} has an empty reserve and cannot accept orders")]
    DepletedPool(u64),
    #[error("deposit must name both reserve denoms of pool {0} exactly once")]
    InvalidDepositCoins(u64),
    #[error("coin {0} is not the pool coin of pool {1}")]
    InvalidPoolCoin(Coin, u64),
}

/// Consensus-fatal invariant violations.
///
/// These must never happen for legitimate inputs; the host state machine has
/// to halt rather than let replicas diverge, so callers propagate them
/// unconditionally and never convert them into a [`LiquidityError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("subtracting {amount} from {coin} would go negative")]
    InsufficientCoin { coin: Coin, amount: u128 },
    #[error("order {msg_index}: {detail}")]
    SettlementMismatch { msg_index: u64, detail: &'static str },
    #[error("order {0} appears twice in the match results")]
    DuplicateMatchIndex(u64),
    #[error("post-settlement order book is crossed at last price {0}")]
    OrderBookCrossed(Dec),
    #[error("pool delta diverged: matcher {matcher}, settled {settled}, decimal error {decimal_error}")]
    PoolDeltaDiverged { matcher: Dec, settled: Dec, decimal_error: Dec },
    #[error("reserve product decreased beyond the truncation slack: {before} -> {after}")]
    ReserveProductDecreased { before: Dec, after: Dec },
    #[error("order {msg_index} offers {denom}, which is not in the pool's pair")]
    ForeignOfferDenom { msg_index: u64, denom: String },
    #[error("swap state for order {0} is missing from the batch store")]
    MissingSwapState(u64),
    #[error("order {msg_index} settled while not marked executed")]
    NotExecuted { msg_index: u64 },
    #[error("escrow transfer failed: {0}")]
    BankTransfer(#[source] LiquidityError),
    #[error("pool {0} vanished mid-execution")]
    PoolVanished(u64),
}
