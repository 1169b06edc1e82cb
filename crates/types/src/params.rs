use serde::{Deserialize, Serialize};

use crate::dec::Dec;

/// Governance-set module parameters. The engine treats them as configuration
/// handed in by the host; it never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub swap_fee_rate:              Dec,
    pub withdraw_fee_rate:          Dec,
    /// An order's offer amount may not exceed this fraction of the
    /// offer-side reserve.
    pub max_order_amount_ratio:     Dec,
    pub min_init_deposit:           u128,
    pub init_pool_coin_mint_amount: u128,
    pub pool_types:                 Vec<PoolType>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolType {
    pub id:   u32,
    pub name: String
}

impl Default for Params {
    fn default() -> Self {
        Self {
            swap_fee_rate: "0.003".parse().expect("static literal"),
            withdraw_fee_rate: Dec::ZERO,
            max_order_amount_ratio: "0.1".parse().expect("static literal"),
            min_init_deposit: 1_000_000,
            init_pool_coin_mint_amount: 1_000_000,
            pool_types: vec![PoolType { id: 1, name: "constant-product".into() }]
        }
    }
}

impl Params {
    pub fn has_pool_type(&self, id: u32) -> bool {
        self.pool_types.iter().any(|t| t.id == id)
    }

    /// Half the swap fee is reserved on the offer side, the other half is
    /// charged on the demand side at settlement.
    pub fn half_swap_fee_rate(&self) -> Dec {
        self.swap_fee_rate / Dec::from_int(2)
    }
}
