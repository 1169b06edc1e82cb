//! Post-settlement validators. They re-derive what the matcher and the
//! settlement claim from independent inputs; a failure means replicas could
//! diverge, so every check returns a [`FatalError`].
//!
//! Compiled unconditionally so they stay testable; whether the keeper invokes
//! them is decided at compile time through the `invariant-check` feature.

use std::collections::HashSet;

use ambar_types::{BatchResult, Dec, FatalError, MatchResult, OrderDirection, SwapMsgState};
use itertools::Itertools;

use crate::{book::build_book, fill::SideDeltas, settlement::SettlementOutcome};

/// True when the keeper should run these checks.
pub const fn enabled() -> bool {
    cfg!(feature = "invariant-check")
}

/// Every fill carries the batch's single swap price implicitly; what can
/// diverge is limit respect, duplicate indexes, and volume overruns.
pub fn check_match_results(
    results_x: &[MatchResult],
    results_y: &[MatchResult],
    batch: &BatchResult
) -> Result<(), FatalError> {
    let mut seen = HashSet::new();
    for result in results_x.iter().chain(results_y) {
        if !seen.insert(result.msg_index) {
            return Err(FatalError::DuplicateMatchIndex(result.msg_index));
        }
        let in_limit = match result.direction {
            OrderDirection::XtoY => result.order_price >= batch.swap_price,
            OrderDirection::YtoX => result.order_price <= batch.swap_price
        };
        if !in_limit {
            return Err(FatalError::SettlementMismatch {
                msg_index: result.msg_index,
                detail:    "fill crosses the order's limit price"
            });
        }
        if result.transacted_coin_amt.is_negative() {
            return Err(FatalError::SettlementMismatch {
                msg_index: result.msg_index,
                detail:    "negative transacted amount"
            });
        }
    }

    let total_x: Dec = results_x.iter().map(|r| r.transacted_coin_amt).sum();
    let total_y: Dec = results_y.iter().map(|r| r.transacted_coin_amt).sum();
    if total_x > batch.ex || total_y > batch.ey {
        return Err(FatalError::SettlementMismatch {
            msg_index: 0,
            detail:    "matched volume exceeds the executable volume"
        });
    }
    Ok(())
}

/// The settlement's recomputed deltas must equal the matcher's plus exactly
/// the accumulated decimal error.
pub fn check_pool_deltas(
    matcher: SideDeltas,
    outcome: &SettlementOutcome
) -> Result<(), FatalError> {
    if outcome.pool_x_delta != matcher.pool_x + outcome.decimal_error_x {
        return Err(FatalError::PoolDeltaDiverged {
            matcher:       matcher.pool_x,
            settled:       outcome.pool_x_delta,
            decimal_error: outcome.decimal_error_x
        });
    }
    if outcome.pool_y_delta != matcher.pool_y + outcome.decimal_error_y {
        return Err(FatalError::PoolDeltaDiverged {
            matcher:       matcher.pool_y,
            settled:       outcome.pool_y_delta,
            decimal_error: outcome.decimal_error_y
        });
    }
    Ok(())
}

/// Constant-product conservation: the product may shrink by at most
/// `X + Y + 2` (one truncated unit per side, cross-multiplied).
pub fn check_reserve_product(
    x_before: Dec,
    y_before: Dec,
    x_after: Dec,
    y_after: Dec
) -> Result<(), FatalError> {
    let before = x_before * y_before;
    let after = x_after * y_after;
    let slack = x_before + y_before + Dec::from_int(2);
    if after + slack < before {
        return Err(FatalError::ReserveProductDecreased { before, after });
    }
    Ok(())
}

/// Rebuilds the book from the surviving orders and checks nothing crossed is
/// left: the matcher must have consumed every order whose limit the final
/// price satisfies.
pub fn check_post_book(
    x_to_y: &[SwapMsgState],
    y_to_x: &[SwapMsgState],
    denom_x: &str,
    denom_y: &str,
    last_price: Dec
) -> Result<(), FatalError> {
    let survivors = x_to_y
        .iter()
        .chain(y_to_x)
        .filter(|s| s.live())
        .cloned()
        .collect_vec();
    let book = build_book(&survivors, denom_x, denom_y)?;
    if !book.validate(last_price) {
        return Err(FatalError::OrderBookCrossed(last_price));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ambar_types::{MatchType, PriceDirection};

    use super::*;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    fn batch(swap_price: &str, ex: u128, ey: u128) -> BatchResult {
        BatchResult {
            match_type: MatchType::Exact,
            direction: PriceDirection::Increase,
            swap_price: dec(swap_price),
            ex: Dec::from_int(ex),
            ey: Dec::from_int(ey),
            original_ex: Dec::from_int(ex),
            original_ey: Dec::from_int(ey),
            pool_x: Dec::ZERO,
            pool_y: Dec::ZERO,
            transact_amt: Dec::from_int(ex)
        }
    }

    fn result(msg_index: u64, direction: OrderDirection, price: &str, transacted: u128) -> MatchResult {
        MatchResult {
            direction,
            msg_index,
            order_price: dec(price),
            offer_coin_amt: Dec::from_int(transacted),
            transacted_coin_amt: Dec::from_int(transacted),
            exchanged_demand_coin_amt: Dec::from_int(transacted),
            offer_coin_fee_amt: Dec::ZERO,
            exchanged_coin_fee_amt: Dec::ZERO,
            fractional: false
        }
    }

    #[test]
    fn duplicate_msg_index_is_caught() {
        let results = vec![
            result(1, OrderDirection::XtoY, "1.2", 10),
            result(1, OrderDirection::XtoY, "1.2", 10),
        ];
        assert_eq!(
            check_match_results(&results, &[], &batch("1.0", 100, 100)).unwrap_err(),
            FatalError::DuplicateMatchIndex(1)
        );
    }

    #[test]
    fn crossed_fill_is_caught() {
        let results = vec![result(1, OrderDirection::XtoY, "0.9", 10)];
        assert!(matches!(
            check_match_results(&results, &[], &batch("1.0", 100, 100)),
            Err(FatalError::SettlementMismatch { msg_index: 1, .. })
        ));
    }

    #[test]
    fn volume_overrun_is_caught() {
        let results = vec![result(1, OrderDirection::XtoY, "1.2", 200)];
        assert!(check_match_results(&results, &[], &batch("1.0", 100, 100)).is_err());
    }

    #[test]
    fn reserve_product_tolerates_truncation_slack_only() {
        let x = Dec::from_int(1_000_000);
        let y = Dec::from_int(1_000_000);
        check_reserve_product(x, y, x - Dec::ONE, y + Dec::ONE).unwrap();
        assert!(check_reserve_product(x, y, x / Dec::from_int(2), y).is_err());
    }
}
