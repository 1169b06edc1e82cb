use ambar_types::{Coin, Dec, SwapMsgState};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Parses a decimal literal; panics on garbage, which is what a fixture
/// should do.
pub fn dec(s: &str) -> Dec {
    s.parse().unwrap_or_else(|_| panic!("bad decimal literal {s:?}"))
}

/// Builder for a [`SwapMsgState`] the way it looks right after submission:
/// remaining equals the offer, nothing exchanged, flags clear.
#[derive(Debug, Clone)]
pub struct SwapOrderBuilder {
    pool_id:     u64,
    batch_index: u64,
    msg_index:   u64,
    orderer:     Option<String>,
    offer:       Coin,
    demand:      String,
    price:       Dec,
    fee:         u128,
    expiry:      u64,
    executed:    bool
}

impl Default for SwapOrderBuilder {
    fn default() -> Self {
        Self {
            pool_id:     1,
            batch_index: 1,
            msg_index:   1,
            orderer:     None,
            offer:       Coin::new("denomx", 100),
            demand:      "denomy".into(),
            price:       Dec::ONE,
            fee:         0,
            expiry:      1_000,
            executed:    false
        }
    }
}

impl SwapOrderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn msg_index(mut self, msg_index: u64) -> Self {
        self.msg_index = msg_index;
        self
    }

    pub fn orderer(mut self, orderer: impl Into<String>) -> Self {
        self.orderer = Some(orderer.into());
        self
    }

    pub fn offer(mut self, denom: &str, amount: u128) -> Self {
        self.offer = Coin::new(denom, amount);
        self
    }

    pub fn demand(mut self, denom: &str) -> Self {
        self.demand = denom.into();
        self
    }

    pub fn price(mut self, price: &str) -> Self {
        self.price = dec(price);
        self
    }

    pub fn reserved_fee(mut self, fee: u128) -> Self {
        self.fee = fee;
        self
    }

    pub fn expiry(mut self, height: u64) -> Self {
        self.expiry = height;
        self
    }

    pub fn executed(mut self) -> Self {
        self.executed = true;
        self
    }

    pub fn build(self) -> SwapMsgState {
        SwapMsgState {
            pool_id: self.pool_id,
            batch_index: self.batch_index,
            msg_index: self.msg_index,
            orderer: self
                .orderer
                .unwrap_or_else(|| format!("orderer{}", self.msg_index)),
            remaining_offer_coin: self.offer.clone(),
            exchanged_offer_coin: Coin::zero(&self.offer.denom),
            reserved_offer_coin_fee: Coin::new(&self.offer.denom, self.fee),
            offer_coin: self.offer,
            demand_denom: self.demand,
            order_price: self.price,
            order_expiry_height: self.expiry,
            executed: self.executed,
            succeeded: false,
            to_be_deleted: false
        }
    }
}

/// A swap submission before it has touched the keeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub orderer:      String,
    pub offer:        Coin,
    pub demand_denom: String,
    pub price:        Dec,
    pub expiry:       u64
}

/// Seeded random order set over the default `denomx`/`denomy` pair. Prices
/// land on two decimals around parity so books cross often; the seed makes
/// the set reproducible across runs and permutations.
pub fn random_order_set(seed: u64, count: usize, expiry: u64) -> Vec<OrderSpec> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let buy = rng.gen_bool(0.5);
            let amount = rng.gen_range(1_u128..=5_000);
            let price_cents = rng.gen_range(80_u32..=120);
            let (denom, demand) = if buy { ("denomx", "denomy") } else { ("denomy", "denomx") };
            OrderSpec {
                orderer:      format!("trader{i}"),
                offer:        Coin::new(denom, amount),
                demand_denom: demand.into(),
                price:        dec(&format!("{}.{:02}", price_cents / 100, price_cents % 100)),
                expiry
            }
        })
        .collect()
}
