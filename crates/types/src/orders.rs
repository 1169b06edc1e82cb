use serde::{Deserialize, Serialize};

use crate::{coin::Coin, dec::Dec};

pub type PoolId = u64;
pub type MsgIndex = u64;

/// Which way a swap crosses the pair. Denoms are canonically ordered, so
/// `XtoY` offers the lexicographically smaller denom and is the buy side of
/// the book (prices are x-per-y throughout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderDirection {
    XtoY,
    YtoX
}

/// Which way the batch will move the pool price relative to the price at
/// rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceDirection {
    Increase,
    Decrease,
    Stay
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    NoMatch,
    Exact,
    /// Fractional remainder sits on the x (buy) side.
    FractionalX,
    /// Fractional remainder sits on the y (sell) side.
    FractionalY
}

impl MatchType {
    pub fn is_match(&self) -> bool {
        !matches!(self, MatchType::NoMatch)
    }
}

/// Persistent state of one swap intent across the batches it participates in.
///
/// The `executed`/`succeeded`/`to_be_deleted` flags are persisted too: they
/// must survive an in-block crash-and-replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapMsgState {
    pub pool_id:                 PoolId,
    pub batch_index:             u64,
    pub msg_index:               MsgIndex,
    pub orderer:                 String,
    pub offer_coin:              Coin,
    pub demand_denom:            String,
    pub order_price:             Dec,
    pub remaining_offer_coin:    Coin,
    pub exchanged_offer_coin:    Coin,
    pub reserved_offer_coin_fee: Coin,
    pub order_expiry_height:     u64,
    pub executed:                bool,
    pub succeeded:               bool,
    pub to_be_deleted:           bool
}

impl SwapMsgState {
    pub fn expired_at(&self, height: u64) -> bool {
        self.order_expiry_height <= height
    }

    /// True while the order can still contribute volume to a book.
    pub fn live(&self) -> bool {
        !self.to_be_deleted && !self.remaining_offer_coin.is_zero()
    }
}

/// One deposit intent queued into the pool's batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositMsgState {
    pub pool_id:       PoolId,
    pub batch_index:   u64,
    pub msg_index:     MsgIndex,
    pub depositor:     String,
    pub deposit_coins: [Coin; 2],
    pub executed:      bool,
    pub succeeded:     bool,
    pub to_be_deleted: bool
}

/// One withdrawal intent queued into the pool's batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawMsgState {
    pub pool_id:       PoolId,
    pub batch_index:   u64,
    pub msg_index:     MsgIndex,
    pub withdrawer:    String,
    pub pool_coin:     Coin,
    pub executed:      bool,
    pub succeeded:     bool,
    pub to_be_deleted: bool
}

/// One fill produced by the matcher. All amounts are decimals; settlement is
/// where they are truncated onto the integer ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub direction:                OrderDirection,
    pub msg_index:                MsgIndex,
    pub order_price:              Dec,
    /// Remaining offer amount the order brought into this round.
    pub offer_coin_amt:           Dec,
    pub transacted_coin_amt:      Dec,
    pub exchanged_demand_coin_amt: Dec,
    pub offer_coin_fee_amt:       Dec,
    pub exchanged_coin_fee_amt:   Dec,
    pub fractional:               bool
}

/// Outcome of price discovery over one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub match_type:  MatchType,
    pub direction:   PriceDirection,
    pub swap_price:  Dec,
    /// Executable x-side volume at the swap price, possibly clipped to what
    /// the other side plus the pool can absorb.
    pub ex:          Dec,
    /// Executable y-side volume, same convention.
    pub ey:          Dec,
    /// Executable volumes before clipping.
    pub original_ex: Dec,
    pub original_ey: Dec,
    /// Reserve x the pool supplies at the swap price (decrease direction).
    pub pool_x:      Dec,
    /// Reserve y the pool supplies at the swap price (increase direction).
    pub pool_y:      Dec,
    /// Matched volume of the chosen scenario, denominated on the driving
    /// side (x for increase/stay, y for decrease).
    pub transact_amt: Dec
}

impl BatchResult {
    pub fn no_match(direction: PriceDirection, swap_price: Dec) -> Self {
        Self {
            match_type: MatchType::NoMatch,
            direction,
            swap_price,
            ex: Dec::ZERO,
            ey: Dec::ZERO,
            original_ex: Dec::ZERO,
            original_ey: Dec::ZERO,
            pool_x: Dec::ZERO,
            pool_y: Dec::ZERO,
            transact_amt: Dec::ZERO
        }
    }
}
