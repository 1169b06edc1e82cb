use ambar_types::{Dec, MatchResult, OrderDirection, SwapMsgState};
use tracing::debug;

/// Signed reserve movement produced by one side's fills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideDeltas {
    pub pool_x: Dec,
    pub pool_y: Dec
}

/// Allocates one side's executable volume across its orders.
///
/// `states` must arrive in submission order (`msg_index` ascending); the
/// stable sort by limit price then keeps time priority inside a price bucket.
/// Orders are filled whole while volume lasts; the order that exhausts it is
/// the single fractional fill and everything behind it stays untouched.
pub fn find_order_match(
    direction: OrderDirection,
    states: &[SwapMsgState],
    executable_amt: Dec,
    swap_price: Dec,
    half_fee_rate: Dec
) -> (Vec<MatchResult>, SideDeltas) {
    let mut results = Vec::new();
    let mut deltas = SideDeltas::default();
    if !executable_amt.is_positive() {
        return (results, deltas);
    }

    let mut queue: Vec<&SwapMsgState> = states.iter().filter(|s| s.live()).collect();
    match direction {
        OrderDirection::XtoY => {
            queue.sort_by(|a, b| b.order_price.cmp(&a.order_price));
        }
        OrderDirection::YtoX => {
            queue.sort_by(|a, b| a.order_price.cmp(&b.order_price));
        }
    }

    let mut leftover = executable_amt;
    for sms in queue {
        let in_limit = match direction {
            OrderDirection::XtoY => sms.order_price >= swap_price,
            OrderDirection::YtoX => sms.order_price <= swap_price
        };
        if !in_limit || !leftover.is_positive() {
            break;
        }

        let remaining = sms.remaining_offer_coin.dec_amount();
        let (transacted, fractional) =
            if remaining <= leftover { (remaining, false) } else { (leftover, true) };
        leftover -= transacted;

        let exchanged = match direction {
            OrderDirection::XtoY => transacted / swap_price,
            OrderDirection::YtoX => transacted * swap_price
        };
        match direction {
            OrderDirection::XtoY => {
                deltas.pool_x += transacted;
                deltas.pool_y -= exchanged;
            }
            OrderDirection::YtoX => {
                deltas.pool_y += transacted;
                deltas.pool_x -= exchanged;
            }
        }
        debug!(
            msg_index = sms.msg_index,
            %transacted,
            %exchanged,
            fractional,
            "fill"
        );
        results.push(MatchResult {
            direction,
            msg_index: sms.msg_index,
            order_price: sms.order_price,
            offer_coin_amt: remaining,
            transacted_coin_amt: transacted,
            exchanged_demand_coin_amt: exchanged,
            offer_coin_fee_amt: transacted * half_fee_rate,
            exchanged_coin_fee_amt: exchanged * half_fee_rate,
            fractional
        });
    }

    (results, deltas)
}
