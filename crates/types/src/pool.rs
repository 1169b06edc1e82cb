use serde::{Deserialize, Serialize};

use crate::orders::PoolId;

/// A constant-product pool over a canonically ordered denom pair. The actual
/// reserves are the bank balances of the pool's escrow account; the record
/// only carries identity and pool-coin supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id:               PoolId,
    pub type_id:          u32,
    /// `[x, y]` with `x` lexicographically smaller.
    pub reserve_denoms:   [String; 2],
    pub pool_coin_denom:  String,
    pub pool_coin_supply: u128
}

impl Pool {
    pub fn denom_x(&self) -> &str {
        &self.reserve_denoms[0]
    }

    pub fn denom_y(&self) -> &str {
        &self.reserve_denoms[1]
    }

    /// Escrow account holding the pool reserves.
    pub fn reserve_account(&self) -> String {
        format!("ambar/pool/{}", self.id)
    }

    pub fn pool_coin_denom_for(id: PoolId) -> String {
        format!("ambarpool{id}")
    }
}

/// One batch of same-block intents against a pool. A new batch opens the
/// block after its predecessor drained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBatch {
    pub pool_id:            PoolId,
    pub index:              u64,
    pub begin_height:       u64,
    /// Next message index to hand out, one sequence per message kind.
    pub deposit_msg_index:  u64,
    pub withdraw_msg_index: u64,
    pub swap_msg_index:     u64,
    pub executed:           bool
}

impl PoolBatch {
    pub fn new(pool_id: PoolId, height: u64) -> Self {
        Self {
            pool_id,
            index: 1,
            begin_height: height,
            deposit_msg_index: 1,
            withdraw_msg_index: 1,
            swap_msg_index: 1,
            executed: false
        }
    }

    pub fn next_swap_index(&mut self) -> u64 {
        let idx = self.swap_msg_index;
        self.swap_msg_index += 1;
        idx
    }

    pub fn next_deposit_index(&mut self) -> u64 {
        let idx = self.deposit_msg_index;
        self.deposit_msg_index += 1;
        idx
    }

    pub fn next_withdraw_index(&mut self) -> u64 {
        let idx = self.withdraw_msg_index;
        self.withdraw_msg_index += 1;
        idx
    }
}
