use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{dec::Dec, error::FatalError};

/// An integer amount of a single denomination. Amounts are unsigned; a
/// balance can never go negative, which is why subtraction is fallible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom:  String,
    pub amount: u128
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self { denom: denom.into(), amount }
    }

    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn dec_amount(&self) -> Dec {
        Dec::from_int(self.amount)
    }

    pub fn add_amount(&self, amount: u128) -> Coin {
        Coin::new(
            self.denom.clone(),
            self.amount.checked_add(amount).expect("coin amount overflow")
        )
    }

    /// Subtraction that fails loudly when the result would go negative.
    pub fn checked_sub(&self, amount: u128) -> Result<Coin, FatalError> {
        match self.amount.checked_sub(amount) {
            Some(rest) => Ok(Coin::new(self.denom.clone(), rest)),
            None => Err(FatalError::InsufficientCoin { coin: self.clone(), amount })
        }
    }

    /// Clamping subtraction. Only for settling integer truncation remainders;
    /// everywhere else use [`Coin::checked_sub`] so shortfalls surface.
    pub fn safe_sub_amount(&self, amount: u128) -> Coin {
        Coin::new(self.denom.clone(), self.amount.saturating_sub(amount))
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Orders two denoms into the canonical `(x, y)` pair, `x` lexicographically
/// smaller. Returns `None` when the denoms are equal.
pub fn sorted_denom_pair(a: &str, b: &str) -> Option<(String, String)> {
    match a.cmp(b) {
        std::cmp::Ordering::Less => Some((a.to_owned(), b.to_owned())),
        std::cmp::Ordering::Greater => Some((b.to_owned(), a.to_owned())),
        std::cmp::Ordering::Equal => None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_sub_fails_loudly() {
        let c = Coin::new("uatom", 10);
        assert_eq!(c.checked_sub(4).unwrap().amount, 6);
        assert!(matches!(c.checked_sub(11), Err(FatalError::InsufficientCoin { .. })));
    }

    #[test]
    fn safe_sub_clamps_at_zero() {
        let c = Coin::new("uatom", 10);
        assert_eq!(c.safe_sub_amount(11).amount, 0);
        assert_eq!(c.safe_sub_amount(3).amount, 7);
    }

    #[test]
    fn denom_pair_is_lexicographic() {
        assert_eq!(
            sorted_denom_pair("uusd", "uatom"),
            Some(("uatom".into(), "uusd".into()))
        );
        assert_eq!(sorted_denom_pair("uatom", "uatom"), None);
    }
}
