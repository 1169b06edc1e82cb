use std::collections::BTreeMap;

use ambar_types::{
    DepositMsgState, MsgIndex, Pool, PoolBatch, PoolId, SwapMsgState, WithdrawMsgState
};
use serde::{Deserialize, Serialize};

/// Keyed storage for pools, batches, and the three message-state families.
///
/// Everything sits in `BTreeMap`s so iteration order, and with it the
/// execution order inside a block, is a function of the keys alone. The
/// whole store serializes, transient flags included, so a snapshot taken
/// mid-block replays to the identical state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStore {
    next_pool_id:  PoolId,
    pools:         BTreeMap<PoolId, Pool>,
    batches:       BTreeMap<PoolId, PoolBatch>,
    deposit_msgs:  BTreeMap<PoolId, BTreeMap<MsgIndex, DepositMsgState>>,
    withdraw_msgs: BTreeMap<PoolId, BTreeMap<MsgIndex, WithdrawMsgState>>,
    swap_msgs:     BTreeMap<PoolId, BTreeMap<MsgIndex, SwapMsgState>>
}

impl BatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_pool_id(&mut self) -> PoolId {
        self.next_pool_id += 1;
        self.next_pool_id
    }

    pub fn pool(&self, id: PoolId) -> Option<&Pool> {
        self.pools.get(&id)
    }

    pub fn pool_mut(&mut self, id: PoolId) -> Option<&mut Pool> {
        self.pools.get_mut(&id)
    }

    pub fn set_pool(&mut self, pool: Pool) {
        self.pools.insert(pool.id, pool);
    }

    pub fn pool_ids(&self) -> Vec<PoolId> {
        self.pools.keys().copied().collect()
    }

    pub fn pool_by_denoms(&self, denom_x: &str, denom_y: &str) -> Option<&Pool> {
        self.pools
            .values()
            .find(|p| p.denom_x() == denom_x && p.denom_y() == denom_y)
    }

    pub fn batch(&self, pool_id: PoolId) -> Option<&PoolBatch> {
        self.batches.get(&pool_id)
    }

    pub fn batch_mut(&mut self, pool_id: PoolId) -> Option<&mut PoolBatch> {
        self.batches.get_mut(&pool_id)
    }

    pub fn set_batch(&mut self, batch: PoolBatch) {
        self.batches.insert(batch.pool_id, batch);
    }

    pub fn set_swap_state(&mut self, state: SwapMsgState) {
        self.swap_msgs
            .entry(state.pool_id)
            .or_default()
            .insert(state.msg_index, state);
    }

    /// Swap states of a pool in `msg_index` order.
    pub fn swap_states(&self, pool_id: PoolId) -> Vec<SwapMsgState> {
        self.swap_msgs
            .get(&pool_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn swap_state(&self, pool_id: PoolId, msg_index: MsgIndex) -> Option<&SwapMsgState> {
        self.swap_msgs.get(&pool_id)?.get(&msg_index)
    }

    pub fn remove_swap_states<F>(&mut self, pool_id: PoolId, predicate: F)
    where
        F: Fn(&SwapMsgState) -> bool
    {
        if let Some(states) = self.swap_msgs.get_mut(&pool_id) {
            states.retain(|_, s| !predicate(s));
        }
    }

    pub fn set_deposit_state(&mut self, state: DepositMsgState) {
        self.deposit_msgs
            .entry(state.pool_id)
            .or_default()
            .insert(state.msg_index, state);
    }

    pub fn deposit_states(&self, pool_id: PoolId) -> Vec<DepositMsgState> {
        self.deposit_msgs
            .get(&pool_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn remove_deposit_states<F>(&mut self, pool_id: PoolId, predicate: F)
    where
        F: Fn(&DepositMsgState) -> bool
    {
        if let Some(states) = self.deposit_msgs.get_mut(&pool_id) {
            states.retain(|_, s| !predicate(s));
        }
    }

    pub fn set_withdraw_state(&mut self, state: WithdrawMsgState) {
        self.withdraw_msgs
            .entry(state.pool_id)
            .or_default()
            .insert(state.msg_index, state);
    }

    pub fn withdraw_states(&self, pool_id: PoolId) -> Vec<WithdrawMsgState> {
        self.withdraw_msgs
            .get(&pool_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn remove_withdraw_states<F>(&mut self, pool_id: PoolId, predicate: F)
    where
        F: Fn(&WithdrawMsgState) -> bool
    {
        if let Some(states) = self.withdraw_msgs.get_mut(&pool_id) {
            states.retain(|_, s| !predicate(s));
        }
    }

    /// Whether the pool has any message waiting for end-block execution.
    pub fn has_pending_msgs(&self, pool_id: PoolId) -> bool {
        let pending_swaps = self
            .swap_msgs
            .get(&pool_id)
            .is_some_and(|m| m.values().any(|s| !s.executed));
        let pending_deposits = self
            .deposit_msgs
            .get(&pool_id)
            .is_some_and(|m| m.values().any(|s| !s.executed));
        let pending_withdraws = self
            .withdraw_msgs
            .get(&pool_id)
            .is_some_and(|m| m.values().any(|s| !s.executed));
        pending_swaps || pending_deposits || pending_withdraws
    }
}
