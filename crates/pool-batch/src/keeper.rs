use std::collections::BTreeMap;

use ambar_types::{
    BatchResult, Coin, Dec, DepositMsgState, Event, FatalError, LiquidityError, MatchResult,
    MsgIndex, OrderDirection, Params, Pool, PoolBatch, PoolId, PriceDirection, SwapMsgState,
    WithdrawMsgState, sorted_denom_pair
};
use matching_engine::{
    SideDeltas, apply_match_results, book::build_book, fill::find_order_match, invariants,
    order_direction, price::match_orders
};
use tracing::debug;

use crate::{bank::BankKeeper, ctx::Ctx, store::BatchStore};

/// Module escrow holding offer coins and reserved fees between submission and
/// settlement.
pub const BATCH_ESCROW_ACCOUNT: &str = "ambar/batch_escrow";
/// Destination of both halves of the swap fee.
pub const FEE_COLLECTOR_ACCOUNT: &str = "ambar/fee_collector";

/// The batch controller: owns the store, drives message admission during the
/// block and the collect, freeze, match, settle, delete lifecycle around it.
/// Single-threaded by contract; the host guarantees exclusive store access
/// inside the block hooks.
pub struct Keeper<B: BankKeeper> {
    store:  BatchStore,
    bank:   B,
    params: Params
}

impl<B: BankKeeper> Keeper<B> {
    pub fn new(bank: B, params: Params) -> Self {
        Self { store: BatchStore::new(), bank, params }
    }

    pub fn store(&self) -> &BatchStore {
        &self.store
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Reserve balances of a pool, `(x, y)` in canonical order.
    pub fn reserves(&self, pool: &Pool) -> (u128, u128) {
        let account = pool.reserve_account();
        (
            self.bank.balance(&account, pool.denom_x()),
            self.bank.balance(&account, pool.denom_y())
        )
    }

    // ------------------------------------------------------------------
    // message handlers
    // ------------------------------------------------------------------

    pub fn create_pool(
        &mut self,
        ctx: &mut Ctx,
        creator: &str,
        type_id: u32,
        deposit_coins: [Coin; 2]
    ) -> Result<PoolId, LiquidityError> {
        if !self.params.has_pool_type(type_id) {
            return Err(LiquidityError::UnknownPoolType(type_id));
        }
        let [a, b] = deposit_coins;
        let (denom_x, denom_y) = sorted_denom_pair(&a.denom, &b.denom)
            .ok_or_else(|| LiquidityError::SameDenom(a.denom.clone()))?;
        let (coin_x, coin_y) = if a.denom == denom_x { (a, b) } else { (b, a) };
        for coin in [&coin_x, &coin_y] {
            if coin.amount < self.params.min_init_deposit {
                return Err(LiquidityError::AmountBelowMinimum {
                    got: coin.amount,
                    min: self.params.min_init_deposit
                });
            }
        }
        if self.store.pool_by_denoms(&denom_x, &denom_y).is_some() {
            return Err(LiquidityError::PoolAlreadyExists(denom_x, denom_y));
        }

        let id = self.store.next_pool_id();
        let pool = Pool {
            id,
            type_id,
            reserve_denoms: [denom_x, denom_y],
            pool_coin_denom: Pool::pool_coin_denom_for(id),
            pool_coin_supply: self.params.init_pool_coin_mint_amount
        };
        self.bank
            .send(creator, &pool.reserve_account(), &[coin_x, coin_y])?;
        self.bank.mint_to(
            creator,
            &Coin::new(&pool.pool_coin_denom, self.params.init_pool_coin_mint_amount)
        )?;
        self.store.set_pool(pool);
        self.store.set_batch(PoolBatch::new(id, ctx.block_height()));
        ctx.emit(Event::PoolCreated { pool_id: id, creator: creator.to_owned() });
        Ok(id)
    }

    /// Admits a swap intent into the pool's current batch. The offer coin and
    /// the ceiled half-fee move into escrow here; nothing else happens until
    /// end-block.
    pub fn swap(
        &mut self,
        ctx: &mut Ctx,
        orderer: &str,
        pool_id: PoolId,
        offer_coin: Coin,
        demand_denom: &str,
        order_price: Dec,
        order_expiry_height: u64
    ) -> Result<MsgIndex, LiquidityError> {
        let pool = self
            .store
            .pool(pool_id)
            .ok_or(LiquidityError::PoolNotFound(pool_id))?
            .clone();
        if offer_coin.denom == demand_denom {
            return Err(LiquidityError::SameDenom(offer_coin.denom));
        }
        let pair_matches = (offer_coin.denom == pool.denom_x() && demand_denom == pool.denom_y())
            || (offer_coin.denom == pool.denom_y() && demand_denom == pool.denom_x());
        if !pair_matches {
            let denom = if offer_coin.denom != pool.denom_x() && offer_coin.denom != pool.denom_y()
            {
                offer_coin.denom.clone()
            } else {
                demand_denom.to_owned()
            };
            return Err(LiquidityError::DenomNotInPool { pool_id, denom });
        }
        if !order_price.is_positive() {
            return Err(LiquidityError::InvalidOrderPrice(order_price));
        }
        if offer_coin.is_zero() {
            return Err(LiquidityError::AmountBelowMinimum { got: 0, min: 1 });
        }
        if order_expiry_height <= ctx.block_height() {
            return Err(LiquidityError::ExpiryInPast {
                expiry: order_expiry_height,
                height: ctx.block_height()
            });
        }
        let (rx, ry) = self.reserves(&pool);
        if rx == 0 || ry == 0 {
            return Err(LiquidityError::DepletedPool(pool_id));
        }
        let offer_side_reserve = if offer_coin.denom == pool.denom_x() { rx } else { ry };
        let max_amount = (Dec::from_int(offer_side_reserve) * self.params.max_order_amount_ratio)
            .truncate_amount();
        if offer_coin.amount > max_amount {
            return Err(LiquidityError::OrderTooLarge {
                got:   offer_coin.amount,
                max:   max_amount,
                ratio: self.params.max_order_amount_ratio
            });
        }

        let reserved_fee =
            (offer_coin.dec_amount() * self.params.half_swap_fee_rate()).ceil_amount();
        self.bank.send(
            orderer,
            BATCH_ESCROW_ACCOUNT,
            &[offer_coin.add_amount(reserved_fee)]
        )?;

        let batch = self
            .store
            .batch_mut(pool_id)
            .ok_or(LiquidityError::PoolNotFound(pool_id))?;
        let msg_index = batch.next_swap_index();
        let batch_index = batch.index;
        let state = SwapMsgState {
            pool_id,
            batch_index,
            msg_index,
            orderer: orderer.to_owned(),
            remaining_offer_coin: offer_coin.clone(),
            exchanged_offer_coin: Coin::zero(&offer_coin.denom),
            reserved_offer_coin_fee: Coin::new(&offer_coin.denom, reserved_fee),
            offer_coin,
            demand_denom: demand_denom.to_owned(),
            order_price,
            order_expiry_height,
            executed: false,
            succeeded: false,
            to_be_deleted: false
        };
        self.store.set_swap_state(state);
        Ok(msg_index)
    }

    pub fn deposit(
        &mut self,
        depositor: &str,
        pool_id: PoolId,
        deposit_coins: [Coin; 2]
    ) -> Result<MsgIndex, LiquidityError> {
        let pool = self
            .store
            .pool(pool_id)
            .ok_or(LiquidityError::PoolNotFound(pool_id))?
            .clone();
        let [a, b] = deposit_coins;
        let (coin_x, coin_y) = if a.denom == pool.denom_x() { (a, b) } else { (b, a) };
        if coin_x.denom != pool.denom_x() || coin_y.denom != pool.denom_y() {
            return Err(LiquidityError::InvalidDepositCoins(pool_id));
        }
        if coin_x.is_zero() || coin_y.is_zero() {
            return Err(LiquidityError::AmountBelowMinimum { got: 0, min: 1 });
        }
        self.bank.send(
            depositor,
            BATCH_ESCROW_ACCOUNT,
            &[coin_x.clone(), coin_y.clone()]
        )?;
        let batch = self
            .store
            .batch_mut(pool_id)
            .ok_or(LiquidityError::PoolNotFound(pool_id))?;
        let msg_index = batch.next_deposit_index();
        let batch_index = batch.index;
        self.store.set_deposit_state(DepositMsgState {
            pool_id,
            batch_index,
            msg_index,
            depositor: depositor.to_owned(),
            deposit_coins: [coin_x, coin_y],
            executed: false,
            succeeded: false,
            to_be_deleted: false
        });
        Ok(msg_index)
    }

    pub fn withdraw(
        &mut self,
        withdrawer: &str,
        pool_id: PoolId,
        pool_coin: Coin
    ) -> Result<MsgIndex, LiquidityError> {
        let pool = self
            .store
            .pool(pool_id)
            .ok_or(LiquidityError::PoolNotFound(pool_id))?
            .clone();
        if pool_coin.denom != pool.pool_coin_denom {
            return Err(LiquidityError::InvalidPoolCoin(pool_coin, pool_id));
        }
        if pool_coin.is_zero() {
            return Err(LiquidityError::AmountBelowMinimum { got: 0, min: 1 });
        }
        self.bank
            .send(withdrawer, BATCH_ESCROW_ACCOUNT, &[pool_coin.clone()])?;
        let batch = self
            .store
            .batch_mut(pool_id)
            .ok_or(LiquidityError::PoolNotFound(pool_id))?;
        let msg_index = batch.next_withdraw_index();
        let batch_index = batch.index;
        self.store.set_withdraw_state(WithdrawMsgState {
            pool_id,
            batch_index,
            msg_index,
            withdrawer: withdrawer.to_owned(),
            pool_coin,
            executed: false,
            succeeded: false,
            to_be_deleted: false
        });
        Ok(msg_index)
    }

    // ------------------------------------------------------------------
    // begin-block
    // ------------------------------------------------------------------

    /// Drops the message states the last execution marked for deletion,
    /// re-arms surviving fractional orders, and reopens the batch. The index
    /// advances only once the batch is fully drained; carried orders finish
    /// under the index they entered with. Idempotent: a batch that has not
    /// executed since is left untouched.
    pub fn delete_and_init_pool_batch(&mut self, ctx: &mut Ctx) {
        for pool_id in self.store.pool_ids() {
            let Some(batch) = self.store.batch(pool_id) else { continue };
            if !batch.executed {
                continue;
            }
            self.store.remove_deposit_states(pool_id, |m| m.to_be_deleted);
            self.store.remove_withdraw_states(pool_id, |m| m.to_be_deleted);
            self.store.remove_swap_states(pool_id, |m| m.to_be_deleted);
            let survivors = self.store.swap_states(pool_id);
            for mut state in survivors.clone() {
                state.executed = false;
                state.succeeded = false;
                self.store.set_swap_state(state);
            }
            let drained = survivors.is_empty()
                && self.store.deposit_states(pool_id).is_empty()
                && self.store.withdraw_states(pool_id).is_empty();
            let batch = self.store.batch_mut(pool_id).expect("checked above");
            if drained {
                batch.index += 1;
            }
            batch.begin_height = ctx.block_height();
            batch.executed = false;
            debug!(pool_id, batch_index = batch.index, drained, "reopened batch");
        }
    }

    // ------------------------------------------------------------------
    // end-block
    // ------------------------------------------------------------------

    /// Executes every pool batch that collected at least one message this
    /// block. Deposits run first, then withdrawals, then the swap match,
    /// each kind in `msg_index` order.
    pub fn execute_pool_batches(&mut self, ctx: &mut Ctx) -> Result<(), FatalError> {
        for pool_id in self.store.pool_ids() {
            if self.store.has_pending_msgs(pool_id) {
                self.execute_pool_batch(ctx, pool_id)?;
            }
        }
        Ok(())
    }

    pub fn execute_pool_batch(
        &mut self,
        ctx: &mut Ctx,
        pool_id: PoolId
    ) -> Result<(u64, Option<BatchResult>), FatalError> {
        let batch_index = self
            .store
            .batch(pool_id)
            .ok_or(FatalError::PoolVanished(pool_id))?
            .index;
        let mut executed_count = 0u64;

        let deposits: Vec<DepositMsgState> = self
            .store
            .deposit_states(pool_id)
            .into_iter()
            .filter(|m| !m.executed)
            .collect();
        for mut msg in deposits {
            self.execute_deposit(ctx, pool_id, &mut msg)?;
            self.store.set_deposit_state(msg);
            executed_count += 1;
        }

        let withdraws: Vec<WithdrawMsgState> = self
            .store
            .withdraw_states(pool_id)
            .into_iter()
            .filter(|m| !m.executed)
            .collect();
        for mut msg in withdraws {
            self.execute_withdraw(ctx, pool_id, &mut msg)?;
            self.store.set_withdraw_state(msg);
            executed_count += 1;
        }

        let (swap_count, result) = self.swap_execution(ctx, pool_id)?;
        executed_count += swap_count;

        if executed_count > 0 {
            let batch = self
                .store
                .batch_mut(pool_id)
                .ok_or(FatalError::PoolVanished(pool_id))?;
            batch.executed = true;
            ctx.emit(Event::BatchExecuted {
                pool_id,
                batch_index,
                executed_msg_count: executed_count
            });
        }
        Ok((executed_count, result))
    }

    fn execute_deposit(
        &mut self,
        ctx: &mut Ctx,
        pool_id: PoolId,
        msg: &mut DepositMsgState
    ) -> Result<(), FatalError> {
        msg.executed = true;
        let pool = self
            .store
            .pool(pool_id)
            .ok_or(FatalError::PoolVanished(pool_id))?
            .clone();
        let (rx, ry) = self.reserves(&pool);
        let [coin_x, coin_y] = msg.deposit_coins.clone();

        let mint = if rx == 0 || ry == 0 || pool.pool_coin_supply == 0 {
            0
        } else {
            let ratio_x = coin_x.dec_amount() / Dec::from_int(rx);
            let ratio_y = coin_y.dec_amount() / Dec::from_int(ry);
            (Dec::from_int(pool.pool_coin_supply) * ratio_x.min(ratio_y)).truncate_amount()
        };
        if mint == 0 {
            // Too small to mint a single pool coin unit, or the pool is
            // depleted: a user-level failure, everything goes back.
            self.bank
                .send(BATCH_ESCROW_ACCOUNT, &msg.depositor, &[coin_x.clone(), coin_y.clone()])
                .map_err(FatalError::BankTransfer)?;
            msg.succeeded = false;
            msg.to_be_deleted = true;
            ctx.emit(Event::DepositProcessed {
                pool_id,
                batch_index: msg.batch_index,
                msg_index: msg.msg_index,
                accepted: [Coin::zero(&coin_x.denom), Coin::zero(&coin_y.denom)],
                minted: Coin::zero(&pool.pool_coin_denom),
                succeeded: false
            });
            return Ok(());
        }

        // Accept exactly the proportion the mint represents, rounded against
        // the depositor; the remainder is refunded.
        let mint_ratio = Dec::from_int(mint) / Dec::from_int(pool.pool_coin_supply);
        let accepted_x = Coin::new(&coin_x.denom, (Dec::from_int(rx) * mint_ratio).ceil_amount());
        let accepted_y = Coin::new(&coin_y.denom, (Dec::from_int(ry) * mint_ratio).ceil_amount());
        let refund_x = coin_x
            .checked_sub(accepted_x.amount)?;
        let refund_y = coin_y
            .checked_sub(accepted_y.amount)?;

        self.bank
            .send(
                BATCH_ESCROW_ACCOUNT,
                &pool.reserve_account(),
                &[accepted_x.clone(), accepted_y.clone()]
            )
            .map_err(FatalError::BankTransfer)?;
        self.bank
            .send(BATCH_ESCROW_ACCOUNT, &msg.depositor, &[refund_x, refund_y])
            .map_err(FatalError::BankTransfer)?;
        let minted = Coin::new(&pool.pool_coin_denom, mint);
        self.bank
            .mint_to(&msg.depositor, &minted)
            .map_err(FatalError::BankTransfer)?;
        let pool_record = self
            .store
            .pool_mut(pool_id)
            .ok_or(FatalError::PoolVanished(pool_id))?;
        pool_record.pool_coin_supply = pool_record
            .pool_coin_supply
            .checked_add(mint)
            .expect("pool coin supply overflow");

        msg.succeeded = true;
        msg.to_be_deleted = true;
        ctx.emit(Event::DepositProcessed {
            pool_id,
            batch_index: msg.batch_index,
            msg_index: msg.msg_index,
            accepted: [accepted_x, accepted_y],
            minted,
            succeeded: true
        });
        Ok(())
    }

    fn execute_withdraw(
        &mut self,
        ctx: &mut Ctx,
        pool_id: PoolId,
        msg: &mut WithdrawMsgState
    ) -> Result<(), FatalError> {
        msg.executed = true;
        let pool = self
            .store
            .pool(pool_id)
            .ok_or(FatalError::PoolVanished(pool_id))?
            .clone();
        let (rx, ry) = self.reserves(&pool);
        let pc = msg.pool_coin.amount;

        let mut outputs = Vec::new();
        if pool.pool_coin_supply > 0 && pc <= pool.pool_coin_supply {
            let ratio = Dec::from_int(pc) / Dec::from_int(pool.pool_coin_supply);
            let keep = Dec::ONE - self.params.withdraw_fee_rate;
            let out_x = (Dec::from_int(rx) * ratio * keep).truncate_amount();
            let out_y = (Dec::from_int(ry) * ratio * keep).truncate_amount();
            if out_x > 0 {
                outputs.push(Coin::new(pool.denom_x(), out_x));
            }
            if out_y > 0 {
                outputs.push(Coin::new(pool.denom_y(), out_y));
            }
        }

        if outputs.is_empty() {
            self.bank
                .send(BATCH_ESCROW_ACCOUNT, &msg.withdrawer, &[msg.pool_coin.clone()])
                .map_err(FatalError::BankTransfer)?;
            msg.succeeded = false;
            msg.to_be_deleted = true;
            ctx.emit(Event::WithdrawProcessed {
                pool_id,
                batch_index: msg.batch_index,
                msg_index: msg.msg_index,
                burned: Coin::zero(&pool.pool_coin_denom),
                withdrawn: Vec::new(),
                succeeded: false
            });
            return Ok(());
        }

        self.bank
            .send(&pool.reserve_account(), &msg.withdrawer, &outputs)
            .map_err(FatalError::BankTransfer)?;
        self.bank
            .burn_from(BATCH_ESCROW_ACCOUNT, &msg.pool_coin)
            .map_err(FatalError::BankTransfer)?;
        let pool_record = self
            .store
            .pool_mut(pool_id)
            .ok_or(FatalError::PoolVanished(pool_id))?;
        pool_record.pool_coin_supply -= pc;

        msg.succeeded = true;
        msg.to_be_deleted = true;
        ctx.emit(Event::WithdrawProcessed {
            pool_id,
            batch_index: msg.batch_index,
            msg_index: msg.msg_index,
            burned: msg.pool_coin.clone(),
            withdrawn: outputs,
            succeeded: true
        });
        Ok(())
    }

    /// The swap leg of batch execution: freeze the pending states, discover
    /// the clearing price, allocate and settle fills, then move the coins and
    /// pay refunds.
    fn swap_execution(
        &mut self,
        ctx: &mut Ctx,
        pool_id: PoolId
    ) -> Result<(u64, Option<BatchResult>), FatalError> {
        let pool = self
            .store
            .pool(pool_id)
            .ok_or(FatalError::PoolVanished(pool_id))?
            .clone();
        let batch_index = self
            .store
            .batch(pool_id)
            .ok_or(FatalError::PoolVanished(pool_id))?
            .index;

        let mut states: Vec<SwapMsgState> = self
            .store
            .swap_states(pool_id)
            .into_iter()
            .filter(|s| !s.executed && !s.to_be_deleted)
            .collect();
        if states.is_empty() {
            return Ok((0, None));
        }
        for state in &mut states {
            state.executed = true;
        }

        let height = ctx.block_height();
        let (rx, ry) = self.reserves(&pool);
        let x = Dec::from_int(rx);
        let y = Dec::from_int(ry);
        debug!(pool_id, batch_index, rx, ry, orders = states.len(), "executing swap batch");

        let book = build_book(&states, pool.denom_x(), pool.denom_y())?;
        let batch_result = if rx > 0 && ry > 0 {
            match_orders(x, y, &book)
        } else {
            BatchResult::no_match(PriceDirection::Stay, Dec::ZERO)
        };

        let mut x_to_y = Vec::new();
        let mut y_to_x = Vec::new();
        for state in states {
            match order_direction(&state, pool.denom_x(), pool.denom_y())? {
                OrderDirection::XtoY => x_to_y.push(state),
                OrderDirection::YtoX => y_to_x.push(state)
            }
        }

        let mut match_map: BTreeMap<MsgIndex, MatchResult> = BTreeMap::new();
        if batch_result.match_type.is_match() {
            let half_fee = self.params.half_swap_fee_rate();
            let (results_x, deltas_x) = find_order_match(
                OrderDirection::XtoY,
                &x_to_y,
                batch_result.ex,
                batch_result.swap_price,
                half_fee
            );
            let (results_y, deltas_y) = find_order_match(
                OrderDirection::YtoX,
                &y_to_x,
                batch_result.ey,
                batch_result.swap_price,
                half_fee
            );
            let matcher_deltas = SideDeltas {
                pool_x: deltas_x.pool_x + deltas_y.pool_x,
                pool_y: deltas_x.pool_y + deltas_y.pool_y
            };

            let outcome =
                apply_match_results(x, y, &mut x_to_y, &mut y_to_x, &results_x, &results_y)?;
            let last_price =
                if outcome.y.is_positive() { outcome.x / outcome.y } else { batch_result.swap_price };
            debug!(%batch_result.swap_price, %last_price, ?batch_result.match_type, "batch settled");

            if invariants::enabled() {
                invariants::check_match_results(&results_x, &results_y, &batch_result)?;
                invariants::check_pool_deltas(matcher_deltas, &outcome)?;
                invariants::check_post_book(
                    &x_to_y,
                    &y_to_x,
                    pool.denom_x(),
                    pool.denom_y(),
                    last_price
                )?;
                invariants::check_reserve_product(x, y, outcome.x, outcome.y)?;
            }

            // The duplicate guard is a consensus check, not an optional one.
            for result in results_x.into_iter().chain(results_y) {
                let msg_index = result.msg_index;
                if match_map.insert(msg_index, result).is_some() {
                    return Err(FatalError::DuplicateMatchIndex(msg_index));
                }
            }
        }

        let mut all: Vec<SwapMsgState> = x_to_y.into_iter().chain(y_to_x).collect();
        all.sort_by_key(|s| s.msg_index);
        for state in &mut all {
            if state.remaining_offer_coin.is_zero() && !(state.succeeded && state.to_be_deleted) {
                return Err(FatalError::SettlementMismatch {
                    msg_index: state.msg_index,
                    detail:    "drained order with inconsistent flags"
                });
            }
            if state.expired_at(height) {
                state.to_be_deleted = true;
            }
        }

        self.transact_and_refund(ctx, &pool, batch_index, &mut all, &match_map, batch_result.swap_price)?;

        let executed = all.len() as u64;
        for state in all {
            self.store.set_swap_state(state);
        }
        Ok((executed, Some(batch_result)))
    }

    /// Moves the matched coins through escrow and reserve, routes both fee
    /// halves to the collector, and refunds everything a deleted order still
    /// holds. Transfer failures are fatal: the escrow held these funds by
    /// construction.
    fn transact_and_refund(
        &mut self,
        ctx: &mut Ctx,
        pool: &Pool,
        batch_index: u64,
        states: &mut [SwapMsgState],
        match_map: &BTreeMap<MsgIndex, MatchResult>,
        swap_price: Dec
    ) -> Result<(), FatalError> {
        let reserve_account = pool.reserve_account();
        for sms in states.iter_mut() {
            if !sms.executed {
                return Err(FatalError::NotExecuted { msg_index: sms.msg_index });
            }
            if let Some(result) = match_map.get(&sms.msg_index) {
                let transacted = result.transacted_coin_amt.truncate_amount();
                let offer_fee = result.offer_coin_fee_amt.truncate_amount();
                let demand_fee = result.exchanged_coin_fee_amt.truncate_amount();
                let receive = (result.exchanged_demand_coin_amt - result.exchanged_coin_fee_amt)
                    .truncate_amount();
                let offer_denom = sms.offer_coin.denom.clone();
                let demand_denom = sms.demand_denom.clone();

                self.bank
                    .send(
                        BATCH_ESCROW_ACCOUNT,
                        &reserve_account,
                        &[Coin::new(&offer_denom, transacted)]
                    )
                    .map_err(FatalError::BankTransfer)?;
                self.bank
                    .send(
                        BATCH_ESCROW_ACCOUNT,
                        FEE_COLLECTOR_ACCOUNT,
                        &[Coin::new(&offer_denom, offer_fee)]
                    )
                    .map_err(FatalError::BankTransfer)?;
                self.bank
                    .send(
                        &reserve_account,
                        &sms.orderer,
                        &[Coin::new(&demand_denom, receive)]
                    )
                    .map_err(FatalError::BankTransfer)?;
                self.bank
                    .send(
                        &reserve_account,
                        FEE_COLLECTOR_ACCOUNT,
                        &[Coin::new(&demand_denom, demand_fee)]
                    )
                    .map_err(FatalError::BankTransfer)?;

                ctx.emit(Event::SwapTransacted {
                    pool_id: pool.id,
                    batch_index,
                    msg_index: sms.msg_index,
                    swap_price,
                    transacted,
                    exchanged_demand: receive,
                    offer_fee,
                    demand_fee,
                    succeeded: sms.succeeded
                });
            }

            if sms.to_be_deleted {
                let refund = sms
                    .remaining_offer_coin
                    .amount
                    .checked_add(sms.reserved_offer_coin_fee.amount)
                    .expect("coin amount overflow");
                if refund > 0 {
                    let coin = Coin::new(&sms.offer_coin.denom, refund);
                    self.bank
                        .send(BATCH_ESCROW_ACCOUNT, &sms.orderer, &[coin.clone()])
                        .map_err(FatalError::BankTransfer)?;
                    sms.remaining_offer_coin.amount = 0;
                    sms.reserved_offer_coin_fee.amount = 0;
                    ctx.emit(Event::OrderRefunded {
                        pool_id:   pool.id,
                        msg_index: sms.msg_index,
                        refunded:  vec![coin]
                    });
                }
            }
        }
        Ok(())
    }
}
