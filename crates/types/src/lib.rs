//! Domain types for the batch-cleared liquidity engine: fixed-point decimal
//! and coin arithmetic, persistent pool/batch/order records, match results,
//! parameters, events, and the user/fatal error split.

pub mod coin;
pub mod dec;
pub mod error;
pub mod event;
pub mod orders;
pub mod params;
pub mod pool;

pub use coin::{Coin, sorted_denom_pair};
pub use dec::Dec;
pub use error::{FatalError, LiquidityError};
pub use event::Event;
pub use orders::{
    BatchResult, DepositMsgState, MatchResult, MatchType, MsgIndex, OrderDirection, PoolId,
    PriceDirection, SwapMsgState, WithdrawMsgState
};
pub use params::{Params, PoolType};
pub use pool::{Pool, PoolBatch};
