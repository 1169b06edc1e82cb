use ambar_types::{Dec, MatchType, OrderDirection, PriceDirection, SwapMsgState};
use matching_engine::{
    SideDeltas, apply_match_results, book::build_book, fill::find_order_match, invariants,
    price::match_orders
};
use testing_tools::{SwapOrderBuilder, dec};
use tracing::Level;

pub fn with_tracing<T>(f: impl FnOnce() -> T) -> T {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

const X: u128 = 1_000_000;
const Y: u128 = 1_000_000;

fn buy(msg_index: u64, amount: u128, price: &str) -> SwapMsgState {
    SwapOrderBuilder::new()
        .msg_index(msg_index)
        .offer("denomx", amount)
        .demand("denomy")
        .price(price)
        .executed()
        .build()
}

fn sell(msg_index: u64, amount: u128, price: &str) -> SwapMsgState {
    SwapOrderBuilder::new()
        .msg_index(msg_index)
        .offer("denomy", amount)
        .demand("denomx")
        .price(price)
        .executed()
        .build()
}

/// Full pure-engine pass: discovery, fills on both sides, settlement.
fn run_batch(
    x: u128,
    y: u128,
    states: Vec<SwapMsgState>
) -> (ambar_types::BatchResult, Vec<SwapMsgState>, Vec<SwapMsgState>, matching_engine::SettlementOutcome) {
    let xd = Dec::from_int(x);
    let yd = Dec::from_int(y);
    let book = build_book(&states, "denomx", "denomy").unwrap();
    let result = match_orders(xd, yd, &book);
    let (mut x_to_y, mut y_to_x): (Vec<_>, Vec<_>) =
        states.into_iter().partition(|s| s.offer_coin.denom == "denomx");
    let (results_x, deltas_x) = find_order_match(
        OrderDirection::XtoY,
        &x_to_y,
        result.ex,
        result.swap_price,
        Dec::ZERO
    );
    let (results_y, deltas_y) = find_order_match(
        OrderDirection::YtoX,
        &y_to_x,
        result.ey,
        result.swap_price,
        Dec::ZERO
    );
    let outcome =
        apply_match_results(xd, yd, &mut x_to_y, &mut y_to_x, &results_x, &results_y).unwrap();

    // The invariant suite must accept everything a legitimate run produces.
    let matcher_deltas = SideDeltas {
        pool_x: deltas_x.pool_x + deltas_y.pool_x,
        pool_y: deltas_x.pool_y + deltas_y.pool_y
    };
    invariants::check_match_results(&results_x, &results_y, &result).unwrap();
    invariants::check_pool_deltas(matcher_deltas, &outcome).unwrap();
    invariants::check_reserve_product(xd, yd, outcome.x, outcome.y).unwrap();
    if outcome.y.is_positive() {
        invariants::check_post_book(&x_to_y, &y_to_x, "denomx", "denomy", outcome.x / outcome.y)
            .unwrap();
    }

    (result, x_to_y, y_to_x, outcome)
}

#[test]
fn crossing_orders_annihilate_at_the_pool_price() {
    with_tracing(|| {
        let (result, x_to_y, y_to_x, outcome) =
            run_batch(X, Y, vec![buy(1, 500, "1.2"), sell(2, 500, "0.8")]);
        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(result.swap_price, Dec::ONE);

        for sms in x_to_y.iter().chain(&y_to_x) {
            assert!(sms.succeeded && sms.to_be_deleted);
            assert_eq!(sms.remaining_offer_coin.amount, 0);
            assert_eq!(sms.exchanged_offer_coin.amount, 500);
        }
        // The pool never moved.
        assert!(outcome.pool_x_delta.is_zero());
        assert!(outcome.pool_y_delta.is_zero());
        assert_eq!(outcome.x, Dec::from_int(X));
    });
}

#[test]
fn lone_buy_moves_the_pool_and_fills_fully() {
    with_tracing(|| {
        let (result, x_to_y, _, outcome) = run_batch(X, Y, vec![buy(1, 1_000, "1.1")]);
        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(result.direction, PriceDirection::Increase);
        assert_eq!(result.swap_price, dec("1.002"));

        let sms = &x_to_y[0];
        assert!(sms.succeeded && sms.to_be_deleted);
        assert_eq!(sms.exchanged_offer_coin.amount, 1_000);

        // Pool took the offered x and paid y at the clearing price.
        assert_eq!(outcome.pool_x_delta, Dec::from_int(1_000));
        assert_eq!(outcome.pool_y_delta, -(Dec::from_int(1_000) / dec("1.002")));
        // Conservation: the product may only grow.
        assert!(outcome.x * outcome.y >= Dec::from_int(X) * Dec::from_int(Y));
    });
}

#[test]
fn lone_sell_below_rest_price_clears_downward() {
    with_tracing(|| {
        let (result, _, y_to_x, outcome) =
            run_batch(2_000_000, 1_000_000, vec![sell(1, 100, "1.5")]);
        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(result.direction, PriceDirection::Decrease);
        assert!(result.swap_price > dec("1.5") && result.swap_price < dec("2"));

        let sms = &y_to_x[0];
        assert!(sms.succeeded && sms.to_be_deleted);
        assert_eq!(sms.exchanged_offer_coin.amount, 100);
        assert_eq!(outcome.pool_y_delta, Dec::from_int(100));
        assert!(outcome.pool_x_delta.is_negative());
    });
}

#[test]
fn resubmitted_identical_orders_fill_with_equal_deltas() {
    with_tracing(|| {
        let (result, x_to_y, _, _) =
            run_batch(X, Y, vec![buy(1, 10, "2.0"), buy(2, 10, "2.0")]);
        assert_eq!(result.match_type, MatchType::Exact);
        assert!(result.swap_price > Dec::ONE);

        assert_eq!(x_to_y.len(), 2);
        for sms in &x_to_y {
            assert!(sms.succeeded && sms.to_be_deleted);
            assert_eq!(sms.exchanged_offer_coin.amount, 10);
            assert_eq!(sms.remaining_offer_coin.amount, 0);
        }
    });
}

#[test]
fn marginal_order_lands_in_the_decimal_error_ledger() {
    with_tracing(|| {
        // Stay direction with a one-x imbalance: 199 + 2 of buys against 200
        // of sells. The marginal buy transacts a single unit out of two and
        // the leftover unit is clamped into the pool's x delta.
        let states = vec![buy(1, 199, "1.2"), buy(2, 2, "1.0"), sell(3, 200, "0.8")];
        let (result, x_to_y, y_to_x, outcome) = run_batch(X, Y, states);
        assert_eq!(result.match_type, MatchType::FractionalX);
        assert_eq!(result.swap_price, Dec::ONE);

        let marginal = x_to_y.iter().find(|s| s.msg_index == 2).unwrap();
        assert!(marginal.succeeded && marginal.to_be_deleted);
        assert_eq!(marginal.remaining_offer_coin.amount, 0);
        assert_eq!(marginal.exchanged_offer_coin.amount, 1);

        assert_eq!(outcome.decimal_error_x, Dec::ONE);
        assert_eq!(outcome.pool_x_delta, Dec::ONE);
        assert!(outcome.pool_y_delta.is_zero());
        assert!(y_to_x[0].to_be_deleted);
    });
}

#[test]
fn fractional_survivor_carries_into_the_next_batch() {
    with_tracing(|| {
        // Buys outweigh sells at the pool price by more than one unit, so the
        // marginal buy is left genuinely fractional.
        let states = vec![buy(1, 150, "1.2"), buy(2, 100, "1.0"), sell(3, 200, "0.8")];
        let (result, x_to_y, _, _) = run_batch(X, Y, states);
        assert_eq!(result.match_type, MatchType::FractionalX);

        let marginal = x_to_y.iter().find(|s| s.msg_index == 2).unwrap();
        assert!(marginal.succeeded && !marginal.to_be_deleted);
        assert_eq!(marginal.remaining_offer_coin.amount, 50);
        assert_eq!(marginal.exchanged_offer_coin.amount, 50);
        // Conservation per order.
        assert!(
            marginal.remaining_offer_coin.amount + marginal.exchanged_offer_coin.amount
                <= marginal.offer_coin.amount
        );
    });
}

#[test]
fn out_of_limit_sell_is_carried_not_matched() {
    with_tracing(|| {
        // Asking 2.5 x per y in a pool at 2.0: nothing to do this block.
        let (result, _, y_to_x, outcome) =
            run_batch(2_000_000, 1_000_000, vec![sell(1, 100, "2.5")]);
        assert_eq!(result.match_type, MatchType::NoMatch);
        let sms = &y_to_x[0];
        assert!(!sms.succeeded && !sms.to_be_deleted);
        assert_eq!(sms.remaining_offer_coin.amount, 100);
        assert!(outcome.pool_x_delta.is_zero() && outcome.pool_y_delta.is_zero());
    });
}

#[test]
fn every_fill_respects_its_limit_price() {
    with_tracing(|| {
        let states = vec![
            buy(1, 800, "1.05"),
            buy(2, 500, "0.99"),
            sell(3, 300, "0.95"),
            sell(4, 400, "1.08"),
        ];
        let xd = Dec::from_int(X);
        let yd = Dec::from_int(Y);
        let book = build_book(&states, "denomx", "denomy").unwrap();
        let result = match_orders(xd, yd, &book);
        assert!(result.match_type.is_match());

        let (x_to_y, y_to_x): (Vec<_>, Vec<_>) =
            states.into_iter().partition(|s| s.offer_coin.denom == "denomx");
        let (results_x, _) = find_order_match(
            OrderDirection::XtoY,
            &x_to_y,
            result.ex,
            result.swap_price,
            Dec::ZERO
        );
        let (results_y, _) = find_order_match(
            OrderDirection::YtoX,
            &y_to_x,
            result.ey,
            result.swap_price,
            Dec::ZERO
        );
        assert!(!results_x.is_empty());
        for fill in &results_x {
            assert!(fill.order_price >= result.swap_price);
        }
        for fill in &results_y {
            assert!(fill.order_price <= result.swap_price);
        }
    });
}
