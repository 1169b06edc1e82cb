use std::collections::BTreeMap;

use ambar_types::{Dec, FatalError, OrderDirection, PriceDirection, SwapMsgState};
use serde::Serialize;

/// One price bucket of the order book: the summed live offer volume of both
/// directions at a single limit price. Buy volume is denominated in x, sell
/// volume in y.
#[derive(Debug, Clone, Serialize)]
pub struct BookOrder {
    pub price:        Dec,
    pub buy_offer_x:  Dec,
    pub sell_offer_y: Dec
}

/// Price-indexed view over the live swap states of one batch, ascending by
/// price. Derived, never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderBook {
    orders: Vec<BookOrder>
}

/// Classifies a swap state against the pool's canonical pair.
pub fn order_direction(
    sms: &SwapMsgState,
    denom_x: &str,
    denom_y: &str
) -> Result<OrderDirection, FatalError> {
    if sms.offer_coin.denom == denom_x {
        Ok(OrderDirection::XtoY)
    } else if sms.offer_coin.denom == denom_y {
        Ok(OrderDirection::YtoX)
    } else {
        Err(FatalError::ForeignOfferDenom {
            msg_index: sms.msg_index,
            denom:     sms.offer_coin.denom.clone()
        })
    }
}

/// Builds the book from the live states of a batch. The `BTreeMap` keyed by
/// price is what makes the bucket order deterministic.
pub fn build_book(
    states: &[SwapMsgState],
    denom_x: &str,
    denom_y: &str
) -> Result<OrderBook, FatalError> {
    let mut buckets: BTreeMap<Dec, (Dec, Dec)> = BTreeMap::new();
    for sms in states.iter().filter(|s| s.live()) {
        let (buy, sell) = buckets.entry(sms.order_price).or_default();
        match order_direction(sms, denom_x, denom_y)? {
            OrderDirection::XtoY => *buy += sms.remaining_offer_coin.dec_amount(),
            OrderDirection::YtoX => *sell += sms.remaining_offer_coin.dec_amount()
        }
    }
    let orders = buckets
        .into_iter()
        .map(|(price, (buy_offer_x, sell_offer_y))| BookOrder { price, buy_offer_x, sell_offer_y })
        .collect();
    Ok(OrderBook { orders })
}

impl OrderBook {
    pub fn orders(&self) -> &[BookOrder] {
        &self.orders
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Executable volume at `price`: buys stay in limit down to their price,
    /// sells up to theirs.
    pub fn executable_amounts(&self, price: Dec) -> (Dec, Dec) {
        let mut ex = Dec::ZERO;
        let mut ey = Dec::ZERO;
        for order in &self.orders {
            if order.price >= price {
                ex += order.buy_offer_x;
            }
            if order.price <= price {
                ey += order.sell_offer_y;
            }
        }
        (ex, ey)
    }

    /// Which way the batch will push the pool price. Sell volume is priced in
    /// y, so it is scaled by the current price before comparing against the
    /// buy side.
    pub fn price_direction(&self, current_price: Dec) -> PriceDirection {
        let mut buy_over = Dec::ZERO;
        let mut buy_at = Dec::ZERO;
        let mut sell_under = Dec::ZERO;
        let mut sell_at = Dec::ZERO;
        for order in &self.orders {
            match order.price.cmp(&current_price) {
                std::cmp::Ordering::Greater => buy_over += order.buy_offer_x,
                std::cmp::Ordering::Equal => {
                    buy_at += order.buy_offer_x;
                    sell_at += order.sell_offer_y;
                }
                std::cmp::Ordering::Less => sell_under += order.sell_offer_y
            }
        }
        if buy_over > current_price * (sell_under + sell_at) {
            PriceDirection::Increase
        } else if current_price * sell_under > buy_over + buy_at {
            PriceDirection::Decrease
        } else {
            PriceDirection::Stay
        }
    }

    /// A settled book is uncrossed: every surviving buy sits at or below the
    /// last price, every surviving sell at or above it. One decimal unit of
    /// slack on each side absorbs the quotient truncation in the last price:
    /// a marginal survivor sits exactly at the swap price, and `X'/Y'` may
    /// land one increment off it.
    pub fn validate(&self, last_price: Dec) -> bool {
        let max_buy = self
            .orders
            .iter()
            .filter(|o| o.buy_offer_x.is_positive())
            .map(|o| o.price)
            .max();
        let min_sell = self
            .orders
            .iter()
            .filter(|o| o.sell_offer_y.is_positive())
            .map(|o| o.price)
            .min();
        max_buy.is_none_or(|p| p <= last_price + Dec::EPSILON)
            && min_sell.is_none_or(|p| p + Dec::EPSILON >= last_price)
    }
}
