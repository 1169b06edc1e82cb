use ambar_types::{Coin, FatalError, Params, PoolId};
use pool_batch::{Ctx, Keeper, MemBank};

use crate::orders::OrderSpec;

pub const DENOM_X: &str = "denomx";
pub const DENOM_Y: &str = "denomy";
pub const CREATOR: &str = "creator";

/// A keeper over an in-memory bank plus a block counter, so tests read like
/// block timelines: submit, `end_block`, `next_block`, assert.
pub struct Harness {
    pub keeper: Keeper<MemBank>,
    pub height: u64
}

impl Harness {
    pub fn new(params: Params) -> Self {
        Self { keeper: Keeper::new(MemBank::new(), params), height: 1 }
    }

    /// Default params with the swap fee zeroed: volumes then come out as the
    /// matcher computed them, which keeps scenario arithmetic exact.
    pub fn without_fees() -> Self {
        let params = Params {
            swap_fee_rate: ambar_types::Dec::ZERO,
            ..Params::default()
        };
        Self::new(params)
    }

    pub fn ctx(&self) -> Ctx {
        Ctx::new(self.height)
    }

    pub fn fund(&mut self, account: &str, coins: &[Coin]) {
        self.keeper.bank_mut().fund(account, coins);
    }

    /// Creates the default `denomx`/`denomy` pool with the given reserves,
    /// funding the creator on the fly.
    pub fn create_default_pool(&mut self, x_amount: u128, y_amount: u128) -> PoolId {
        self.fund(
            CREATOR,
            &[Coin::new(DENOM_X, x_amount), Coin::new(DENOM_Y, y_amount)]
        );
        let mut ctx = self.ctx();
        self.keeper
            .create_pool(
                &mut ctx,
                CREATOR,
                1,
                [Coin::new(DENOM_X, x_amount), Coin::new(DENOM_Y, y_amount)]
            )
            .expect("fixture pool creation")
    }

    /// Funds the orderer and submits the spec against the given pool.
    pub fn submit(&mut self, pool_id: PoolId, spec: &OrderSpec) -> u64 {
        // The escrow takes offer plus reserved fee; over-fund by a little so
        // fee params don't matter to callers.
        let cushion = spec.offer.amount / 100 + 2;
        self.fund(
            &spec.orderer,
            &[spec.offer.add_amount(cushion)]
        );
        let mut ctx = self.ctx();
        self.keeper
            .swap(
                &mut ctx,
                &spec.orderer,
                pool_id,
                spec.offer.clone(),
                &spec.demand_denom,
                spec.price,
                spec.expiry
            )
            .expect("fixture swap submission")
    }

    /// Runs the end-block hook and returns the events it emitted.
    pub fn end_block(&mut self) -> Result<Ctx, FatalError> {
        let mut ctx = self.ctx();
        self.keeper.execute_pool_batches(&mut ctx)?;
        Ok(ctx)
    }

    /// Advances to the next block and runs the begin-block hook.
    pub fn next_block(&mut self) -> Ctx {
        self.height += 1;
        let mut ctx = self.ctx();
        self.keeper.delete_and_init_pool_batch(&mut ctx);
        ctx
    }
}
