use std::collections::HashMap;

use ambar_types::{Dec, FatalError, MatchResult, SwapMsgState};
use tracing::debug;

/// Aggregate outcome of applying one batch's fills to the swap states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementOutcome {
    /// Reserves after the deltas (decimal form; the integer ledger moves in
    /// the transfer step).
    pub x: Dec,
    pub y: Dec,
    /// Recomputed deltas, decimal error included. The matcher's own deltas
    /// must agree with these up to exactly that error.
    pub pool_x_delta:    Dec,
    pub pool_y_delta:    Dec,
    pub fractional_x:    usize,
    pub fractional_y:    usize,
    pub decimal_error_x: Dec,
    pub decimal_error_y: Dec
}

/// Applies the match results to the persistent swap states and rolls the
/// reserve deltas forward.
///
/// Each fill lands in one of three branches: full, off-by-one (the decimal
/// imbalance between rational volume and integer coins), or fractional. The
/// off-by-one unit is accumulated into the pool delta of the offer side so
/// the integer ledger and the decimal computation stay reconciled.
pub fn apply_match_results(
    x: Dec,
    y: Dec,
    x_to_y: &mut [SwapMsgState],
    y_to_x: &mut [SwapMsgState],
    results_x: &[MatchResult],
    results_y: &[MatchResult]
) -> Result<SettlementOutcome, FatalError> {
    let mut pool_x_delta = Dec::ZERO;
    let mut pool_y_delta = Dec::ZERO;
    let mut fractional_x = 0;
    let mut fractional_y = 0;
    let mut decimal_error_x = Dec::ZERO;
    let mut decimal_error_y = Dec::ZERO;

    let x_index: HashMap<u64, usize> = x_to_y
        .iter()
        .enumerate()
        .map(|(pos, s)| (s.msg_index, pos))
        .collect();
    for result in results_x {
        pool_x_delta += result.transacted_coin_amt;
        pool_y_delta -= result.exchanged_demand_coin_amt;
        let pos = *x_index
            .get(&result.msg_index)
            .ok_or(FatalError::MissingSwapState(result.msg_index))?;
        if settle_order(&mut x_to_y[pos], result, &mut decimal_error_x)? {
            fractional_x += 1;
        }
    }

    let y_index: HashMap<u64, usize> = y_to_x
        .iter()
        .enumerate()
        .map(|(pos, s)| (s.msg_index, pos))
        .collect();
    for result in results_y {
        pool_y_delta += result.transacted_coin_amt;
        pool_x_delta -= result.exchanged_demand_coin_amt;
        let pos = *y_index
            .get(&result.msg_index)
            .ok_or(FatalError::MissingSwapState(result.msg_index))?;
        if settle_order(&mut y_to_x[pos], result, &mut decimal_error_y)? {
            fractional_y += 1;
        }
    }

    pool_x_delta += decimal_error_x;
    pool_y_delta += decimal_error_y;

    Ok(SettlementOutcome {
        x: x + pool_x_delta,
        y: y + pool_y_delta,
        pool_x_delta,
        pool_y_delta,
        fractional_x,
        fractional_y,
        decimal_error_x,
        decimal_error_y
    })
}

/// Returns whether the fill was fractional.
fn settle_order(
    sms: &mut SwapMsgState,
    result: &MatchResult,
    decimal_error: &mut Dec
) -> Result<bool, FatalError> {
    if !sms.executed {
        return Err(FatalError::NotExecuted { msg_index: sms.msg_index });
    }
    let offer = sms.offer_coin.dec_amount();
    let remaining = sms.remaining_offer_coin.dec_amount();
    let transacted = result.transacted_coin_amt;

    let transacted_int = transacted.truncate_amount();
    let fee_int = result.offer_coin_fee_amt.truncate_amount();
    sms.exchanged_offer_coin = sms.exchanged_offer_coin.add_amount(transacted_int);
    sms.remaining_offer_coin = sms.remaining_offer_coin.safe_sub_amount(transacted_int);
    sms.reserved_offer_coin_fee = sms.reserved_offer_coin_fee.safe_sub_amount(fee_int);

    let fractional = if offer == transacted || remaining == transacted {
        debug!(msg_index = sms.msg_index, %transacted, "full fill");
        check_drained(sms)?;
        false
    } else if offer - transacted == Dec::ONE || remaining - transacted == Dec::ONE {
        // The rational volume fell one whole unit short of the integer offer;
        // the stranded unit goes to the pool via the decimal-error ledger.
        debug!(msg_index = sms.msg_index, %transacted, "off-by-one fill");
        *decimal_error += Dec::ONE;
        if sms.remaining_offer_coin.amount == 1 {
            sms.remaining_offer_coin.amount = 0;
        }
        check_drained(sms)?;
        false
    } else {
        debug!(msg_index = sms.msg_index, %transacted, "fractional fill");
        true
    };

    sms.succeeded = true;
    sms.to_be_deleted = !fractional;
    Ok(fractional)
}

fn check_drained(sms: &SwapMsgState) -> Result<(), FatalError> {
    let spent = sms
        .remaining_offer_coin
        .amount
        .checked_add(sms.exchanged_offer_coin.amount)
        .expect("coin amount overflow");
    if spent > sms.offer_coin.amount {
        return Err(FatalError::SettlementMismatch {
            msg_index: sms.msg_index,
            detail:    "remaining plus exchanged exceeds the original offer"
        });
    }
    if sms.remaining_offer_coin.amount != 0 {
        return Err(FatalError::SettlementMismatch {
            msg_index: sms.msg_index,
            detail:    "fully-filled order left a remaining offer"
        });
    }
    if sms.reserved_offer_coin_fee.amount >= 2 {
        return Err(FatalError::SettlementMismatch {
            msg_index: sms.msg_index,
            detail:    "fully-filled order left more than one unit of reserved fee"
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ambar_types::{Coin, OrderDirection};

    use super::*;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    fn buy_state(msg_index: u64, amount: u128, fee: u128) -> SwapMsgState {
        SwapMsgState {
            pool_id: 1,
            batch_index: 1,
            msg_index,
            orderer: format!("orderer{msg_index}"),
            offer_coin: Coin::new("denomx", amount),
            demand_denom: "denomy".into(),
            order_price: dec("1.1"),
            remaining_offer_coin: Coin::new("denomx", amount),
            exchanged_offer_coin: Coin::zero("denomx"),
            reserved_offer_coin_fee: Coin::new("denomx", fee),
            order_expiry_height: 100,
            executed: true,
            succeeded: false,
            to_be_deleted: false
        }
    }

    fn fill(msg_index: u64, transacted: Dec, price: Dec, fee: Dec) -> MatchResult {
        let exchanged = transacted / price;
        MatchResult {
            direction: OrderDirection::XtoY,
            msg_index,
            order_price: dec("1.1"),
            offer_coin_amt: transacted,
            transacted_coin_amt: transacted,
            exchanged_demand_coin_amt: exchanged,
            offer_coin_fee_amt: fee,
            exchanged_coin_fee_amt: exchanged * dec("0.0015"),
            fractional: false
        }
    }

    #[test]
    fn full_fill_drains_and_schedules_deletion() {
        let mut states = vec![buy_state(1, 1_000, 2)];
        let results = vec![fill(1, Dec::from_int(1_000), Dec::ONE, dec("1.5"))];
        let out = apply_match_results(
            Dec::from_int(1_000_000),
            Dec::from_int(1_000_000),
            &mut states,
            &mut [],
            &results,
            &[]
        )
        .unwrap();
        let sms = &states[0];
        assert!(sms.succeeded && sms.to_be_deleted);
        assert_eq!(sms.remaining_offer_coin.amount, 0);
        assert_eq!(sms.exchanged_offer_coin.amount, 1_000);
        assert_eq!(sms.reserved_offer_coin_fee.amount, 1);
        assert_eq!(out.pool_x_delta, Dec::from_int(1_000));
        assert_eq!(out.pool_y_delta, -Dec::from_int(1_000));
        assert_eq!(out.fractional_x, 0);
    }

    #[test]
    fn off_by_one_fill_feeds_the_decimal_error_ledger() {
        let mut states = vec![buy_state(1, 1_000, 2)];
        let results = vec![fill(1, Dec::from_int(999), Dec::ONE, dec("1.4"))];
        let out = apply_match_results(
            Dec::from_int(1_000_000),
            Dec::from_int(1_000_000),
            &mut states,
            &mut [],
            &results,
            &[]
        )
        .unwrap();
        let sms = &states[0];
        assert!(sms.succeeded && sms.to_be_deleted);
        assert_eq!(sms.remaining_offer_coin.amount, 0);
        assert_eq!(out.decimal_error_x, Dec::ONE);
        // 999 transacted plus the stranded unit.
        assert_eq!(out.pool_x_delta, Dec::from_int(1_000));
    }

    #[test]
    fn fractional_fill_survives_into_the_next_batch() {
        let mut states = vec![buy_state(1, 1_000, 2)];
        let results = vec![fill(1, Dec::from_int(400), Dec::ONE, dec("0.6"))];
        apply_match_results(
            Dec::from_int(1_000_000),
            Dec::from_int(1_000_000),
            &mut states,
            &mut [],
            &results,
            &[]
        )
        .unwrap();
        let sms = &states[0];
        assert!(sms.succeeded && !sms.to_be_deleted);
        assert_eq!(sms.remaining_offer_coin.amount, 600);
        assert_eq!(sms.exchanged_offer_coin.amount, 400);
        assert_eq!(sms.reserved_offer_coin_fee.amount, 2);
    }

    #[test]
    fn overfill_is_fatal() {
        let mut states = vec![buy_state(1, 1_000, 2)];
        // Remaining says 1000 but 300 were already exchanged: a full fill of
        // 1000 now overruns the original offer.
        states[0].exchanged_offer_coin.amount = 300;
        let results = vec![fill(1, Dec::from_int(1_000), Dec::ONE, Dec::ZERO)];
        let err = apply_match_results(
            Dec::from_int(1_000_000),
            Dec::from_int(1_000_000),
            &mut states,
            &mut [],
            &results,
            &[]
        )
        .unwrap_err();
        assert!(matches!(err, FatalError::SettlementMismatch { msg_index: 1, .. }));
    }

    #[test]
    fn unknown_msg_index_is_fatal() {
        let mut states = vec![buy_state(1, 1_000, 2)];
        let results = vec![fill(7, Dec::from_int(10), Dec::ONE, Dec::ZERO)];
        let err = apply_match_results(
            Dec::from_int(1_000_000),
            Dec::from_int(1_000_000),
            &mut states,
            &mut [],
            &results,
            &[]
        )
        .unwrap_err();
        assert_eq!(err, FatalError::MissingSwapState(7));
    }
}
