use ambar_types::{BatchResult, Dec, MatchType, PriceDirection};
use tracing::debug;

use crate::book::OrderBook;

/// Price discovery over one batch: picks the direction, walks the candidate
/// prices, and returns the scenario with the greatest matched volume.
///
/// Candidates are the pool price at rest and every limit price on the chosen
/// side of it; walking outward from the pool price means the first scenario
/// with a given volume is also the one closest to it, which is the tie-break
/// that keeps replicas in lockstep.
///
/// Both reserves must be positive; pools without liquidity never reach the
/// matcher.
pub fn match_orders(x: Dec, y: Dec, book: &OrderBook) -> BatchResult {
    let current_price = x / y;
    if book.is_empty() {
        return BatchResult::no_match(PriceDirection::Stay, current_price);
    }
    let direction = book.price_direction(current_price);
    debug!(?direction, %current_price, "price discovery");
    match direction {
        PriceDirection::Stay => match_stay(current_price, book),
        _ => calculate_match(direction, x, y, book)
    }
}

/// The book balances at the pool price itself; no reserve movement. The
/// shorter side caps the longer one, and any imbalance left by truncation is
/// a fractional fill on the longer side.
fn match_stay(current_price: Dec, book: &OrderBook) -> BatchResult {
    let (ex, ey) = book.executable_amounts(current_price);
    let mut result = BatchResult {
        match_type: MatchType::NoMatch,
        direction: PriceDirection::Stay,
        swap_price: current_price,
        ex,
        ey,
        original_ex: ex,
        original_ey: ey,
        pool_x: Dec::ZERO,
        pool_y: Dec::ZERO,
        transact_amt: Dec::ZERO
    };
    let sell_in_x = current_price * ey;
    if ex.is_zero() || ey.is_zero() {
        return result;
    }
    if ex == sell_in_x {
        result.match_type = MatchType::Exact;
    } else if ex > sell_in_x {
        result.match_type = MatchType::FractionalX;
        result.ex = sell_in_x;
    } else {
        result.match_type = MatchType::FractionalY;
        result.ey = ex / current_price;
    }
    result.transact_amt = result.ex;
    result
}

fn calculate_match(direction: PriceDirection, x: Dec, y: Dec, book: &OrderBook) -> BatchResult {
    let current_price = x / y;
    let mut last_price = current_price;
    let mut best = BatchResult::no_match(direction, current_price);

    let candidates: Vec<Dec> = match direction {
        PriceDirection::Increase => book
            .orders()
            .iter()
            .map(|o| o.price)
            .filter(|p| *p >= current_price)
            .collect(),
        PriceDirection::Decrease => book
            .orders()
            .iter()
            .rev()
            .map(|o| o.price)
            .filter(|p| *p <= current_price)
            .collect(),
        PriceDirection::Stay => unreachable!("stay is handled before candidate iteration")
    };

    for order_price in candidates {
        let scenario = calculate_swap(direction, x, y, order_price, last_price, book);
        debug!(%order_price, ?scenario.match_type, %scenario.swap_price, %scenario.transact_amt, "scenario");
        last_price = order_price;
        if scenario.match_type == MatchType::Exact && scenario.transact_amt.is_positive() {
            return scenario;
        }
        if scenario.transact_amt > best.transact_amt {
            best = scenario;
        }
    }

    if !best.transact_amt.is_positive() {
        return BatchResult::no_match(direction, current_price);
    }
    best
}

/// One candidate scenario. The trial price `(X + 2·EX)/(Y + 2·EY)` is the
/// rational identity that solves `X'·Y' = X·Y` together with `X'/Y' = p` for
/// the order-book imbalance, so the constant-product condition never needs a
/// square root. If the trial price falls strictly between the previous and
/// the candidate limit price the whole executable volume clears; otherwise
/// the batch clears at the limit price itself and the heavy side is clipped
/// to what the light side plus the pool absorbs.
fn calculate_swap(
    direction: PriceDirection,
    x: Dec,
    y: Dec,
    order_price: Dec,
    last_price: Dec,
    book: &OrderBook
) -> BatchResult {
    let two = Dec::from_int(2);
    let mid_price = (last_price + order_price) / two;
    let (mut ex, mut ey) = book.executable_amounts(mid_price);
    let mut original_ex = ex;
    let mut original_ey = ey;
    let mut swap_price = (x + ex * two) / (y + ey * two);
    let mut pool_x = Dec::ZERO;
    let mut pool_y = Dec::ZERO;

    let mut match_type = None;
    match direction {
        PriceDirection::Increase => {
            pool_y = (swap_price * y - x) / (swap_price * two);
            if last_price < swap_price && swap_price < order_price && !pool_y.is_negative() {
                match_type = Some(if ex.is_zero() && ey.is_zero() {
                    MatchType::NoMatch
                } else {
                    MatchType::Exact
                });
            }
        }
        PriceDirection::Decrease => {
            pool_x = (x - swap_price * y) / two;
            if order_price < swap_price && swap_price < last_price && !pool_x.is_negative() {
                match_type = Some(if ex.is_zero() && ey.is_zero() {
                    MatchType::NoMatch
                } else {
                    MatchType::Exact
                });
            }
        }
        PriceDirection::Stay => unreachable!("stay scenarios never reach calculate_swap")
    }

    let match_type = match match_type {
        Some(mt) => mt,
        None => {
            let at_limit = book.executable_amounts(order_price);
            ex = at_limit.0;
            ey = at_limit.1;
            original_ex = ex;
            original_ey = ey;
            swap_price = order_price;
            match direction {
                PriceDirection::Increase => {
                    pool_y = (swap_price * y - x) / (swap_price * two);
                    ex = ex.min((ey + pool_y) * swap_price);
                    ey = (ex / swap_price - pool_y).min(ey).max(Dec::ZERO);
                    MatchType::FractionalX
                }
                PriceDirection::Decrease => {
                    pool_x = (x - swap_price * y) / two;
                    ey = ey.min((ex + pool_x) / swap_price);
                    ex = (ey * swap_price - pool_x).min(ex).max(Dec::ZERO);
                    MatchType::FractionalY
                }
                PriceDirection::Stay => unreachable!()
            }
        }
    };

    let current_price = x / y;
    let transact_amt = match direction {
        PriceDirection::Increase => {
            if swap_price < current_price || pool_y.is_negative() {
                Dec::ZERO
            } else {
                ex.min((ey + pool_y) * swap_price)
            }
        }
        PriceDirection::Decrease => {
            if swap_price > current_price || pool_x.is_negative() {
                Dec::ZERO
            } else {
                ey.min((ex + pool_x) / swap_price)
            }
        }
        PriceDirection::Stay => unreachable!()
    };

    BatchResult {
        match_type,
        direction,
        swap_price,
        ex,
        ey,
        original_ex,
        original_ey,
        pool_x,
        pool_y,
        transact_amt
    }
}

#[cfg(test)]
mod tests {
    use ambar_types::{Coin, SwapMsgState};

    use super::*;
    use crate::book::build_book;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    fn order(msg_index: u64, denom: &str, amount: u128, demand: &str, price: &str) -> SwapMsgState {
        SwapMsgState {
            pool_id: 1,
            batch_index: 1,
            msg_index,
            orderer: format!("orderer{msg_index}"),
            offer_coin: Coin::new(denom, amount),
            demand_denom: demand.into(),
            order_price: dec(price),
            remaining_offer_coin: Coin::new(denom, amount),
            exchanged_offer_coin: Coin::zero(denom),
            reserved_offer_coin_fee: Coin::zero(denom),
            order_expiry_height: 100,
            executed: true,
            succeeded: false,
            to_be_deleted: false
        }
    }

    fn book(states: &[SwapMsgState]) -> OrderBook {
        build_book(states, "denomx", "denomy").unwrap()
    }

    #[test]
    fn opposing_orders_at_pool_price_clear_exactly() {
        // Balanced pool, 500 x of buys and 500 y of sells crossing: volume
        // annihilates at the pool price with no reserve movement.
        let states = vec![
            order(1, "denomx", 500, "denomy", "1.2"),
            order(2, "denomy", 500, "denomx", "0.8"),
        ];
        let r = match_orders(Dec::from_int(1_000_000), Dec::from_int(1_000_000), &book(&states));
        assert_eq!(r.match_type, MatchType::Exact);
        assert_eq!(r.direction, PriceDirection::Stay);
        assert_eq!(r.swap_price, Dec::ONE);
        assert_eq!(r.ex, Dec::from_int(500));
        assert_eq!(r.ey, Dec::from_int(500));
        assert!(r.pool_x.is_zero() && r.pool_y.is_zero());
    }

    #[test]
    fn lone_buy_clears_against_the_pool_above_rest_price() {
        let states = vec![order(1, "denomx", 1_000, "denomy", "1.1")];
        let r = match_orders(Dec::from_int(1_000_000), Dec::from_int(1_000_000), &book(&states));
        assert_eq!(r.match_type, MatchType::Exact);
        assert_eq!(r.direction, PriceDirection::Increase);
        // Trial price (X + 2·1000)/Y lands inside (1.0, 1.1).
        assert_eq!(r.swap_price, dec("1.002"));
        assert_eq!(r.ex, Dec::from_int(1_000));
        assert!(r.pool_y.is_positive());
        // The pool supplies the entire countervolume.
        assert_eq!(r.transact_amt, (r.ey + r.pool_y) * r.swap_price);
    }

    #[test]
    fn lone_sell_clears_against_the_pool_below_rest_price() {
        // P0 = 2, a sell with limit 1.5 is in limit anywhere in [1.5, 2).
        let states = vec![order(1, "denomy", 100, "denomx", "1.5")];
        let r = match_orders(Dec::from_int(2_000_000), Dec::from_int(1_000_000), &book(&states));
        assert_eq!(r.match_type, MatchType::Exact);
        assert_eq!(r.direction, PriceDirection::Decrease);
        assert!(r.swap_price > dec("1.5") && r.swap_price < dec("2"));
        assert_eq!(r.ey, Dec::from_int(100));
        assert!(r.pool_x.is_positive());
    }

    #[test]
    fn out_of_limit_buy_never_matches() {
        // Buying below the rest price cannot push it up to the limit.
        let states = vec![order(1, "denomx", 1_000, "denomy", "0.5")];
        let r = match_orders(Dec::from_int(1_000_000), Dec::from_int(1_000_000), &book(&states));
        assert_eq!(r.match_type, MatchType::NoMatch);
        assert!(r.transact_amt.is_zero());
    }

    #[test]
    fn buy_exactly_at_pool_price_finds_no_counterparty() {
        let states = vec![order(1, "denomx", 3, "denomy", "1.0")];
        let r = match_orders(Dec::from_int(1_000_000), Dec::from_int(1_000_000), &book(&states));
        assert_eq!(r.match_type, MatchType::NoMatch);
    }

    #[test]
    fn stay_direction_clips_the_heavy_side() {
        // Buys: 199 above price + 2 at price; sells: 200 below price. Volumes
        // keep the direction at Stay, and the one-x imbalance is clipped off
        // the buy side.
        let states = vec![
            order(1, "denomx", 199, "denomy", "1.2"),
            order(2, "denomx", 2, "denomy", "1.0"),
            order(3, "denomy", 200, "denomx", "0.8"),
        ];
        let r = match_orders(Dec::from_int(1_000_000), Dec::from_int(1_000_000), &book(&states));
        assert_eq!(r.direction, PriceDirection::Stay);
        assert_eq!(r.match_type, MatchType::FractionalX);
        assert_eq!(r.swap_price, Dec::ONE);
        assert_eq!(r.ex, Dec::from_int(200));
        assert_eq!(r.original_ex, Dec::from_int(201));
        assert_eq!(r.ey, Dec::from_int(200));
    }

    #[test]
    fn deeper_limit_wins_when_it_moves_more_volume() {
        // Two buy levels; the scenario at the lower level moves less volume
        // than the exact scenario between the levels.
        let states = vec![
            order(1, "denomx", 2_000, "denomy", "1.004"),
            order(2, "denomx", 3_000, "denomy", "1.1"),
        ];
        let r = match_orders(Dec::from_int(1_000_000), Dec::from_int(1_000_000), &book(&states));
        assert!(r.match_type.is_match());
        assert!(r.swap_price > Dec::ONE);
        // Everything executable at the chosen price is in limit.
        assert!(r.ex <= Dec::from_int(5_000));
        assert!(r.transact_amt.is_positive());
    }

    #[test]
    fn empty_book_is_a_no_match() {
        let r = match_orders(Dec::from_int(10), Dec::from_int(10), &OrderBook::default());
        assert_eq!(r.match_type, MatchType::NoMatch);
    }
}
