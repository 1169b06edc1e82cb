use serde::{Deserialize, Serialize};

use crate::{coin::Coin, dec::Dec, orders::{MsgIndex, PoolId}};

/// Typed events collected by the execution context. One `SwapTransacted` is
/// emitted per fill, all carrying the batch's single swap price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    PoolCreated {
        pool_id: PoolId,
        creator: String
    },
    SwapTransacted {
        pool_id:          PoolId,
        batch_index:      u64,
        msg_index:        MsgIndex,
        swap_price:       Dec,
        transacted:       u128,
        exchanged_demand: u128,
        offer_fee:        u128,
        demand_fee:       u128,
        succeeded:        bool
    },
    DepositProcessed {
        pool_id:     PoolId,
        batch_index: u64,
        msg_index:   MsgIndex,
        accepted:    [Coin; 2],
        minted:      Coin,
        succeeded:   bool
    },
    WithdrawProcessed {
        pool_id:     PoolId,
        batch_index: u64,
        msg_index:   MsgIndex,
        burned:      Coin,
        withdrawn:   Vec<Coin>,
        succeeded:   bool
    },
    OrderRefunded {
        pool_id:   PoolId,
        msg_index: MsgIndex,
        refunded:  Vec<Coin>
    },
    BatchExecuted {
        pool_id:            PoolId,
        batch_index:        u64,
        executed_msg_count: u64
    }
}
