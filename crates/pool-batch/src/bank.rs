use std::collections::BTreeMap;

use ambar_types::{Coin, LiquidityError};

/// Token custody seam. Implementations must be atomic-or-fail: either every
/// coin of a call moves or none does. The engine owns no balances itself;
/// escrow, reserves, and fees are all accounts behind this trait.
pub trait BankKeeper {
    fn send(&mut self, from: &str, to: &str, coins: &[Coin]) -> Result<(), LiquidityError>;
    fn mint_to(&mut self, account: &str, coin: &Coin) -> Result<(), LiquidityError>;
    fn burn_from(&mut self, account: &str, coin: &Coin) -> Result<(), LiquidityError>;
    fn balance(&self, account: &str, denom: &str) -> u128;
}

/// In-memory bank for tests and single-process embeddings. `BTreeMap` keeps
/// account iteration deterministic when snapshots are compared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemBank {
    balances: BTreeMap<String, BTreeMap<String, u128>>
}

impl MemBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund(&mut self, account: &str, coins: &[Coin]) {
        for coin in coins {
            *self
                .balances
                .entry(account.to_owned())
                .or_default()
                .entry(coin.denom.clone())
                .or_default() += coin.amount;
        }
    }

    fn debit(&mut self, account: &str, coin: &Coin) -> Result<(), LiquidityError> {
        let have = self.balance(account, &coin.denom);
        if have < coin.amount {
            return Err(LiquidityError::InsufficientFunds {
                account: account.to_owned(),
                have,
                want: coin.clone()
            });
        }
        *self
            .balances
            .get_mut(account)
            .expect("balance checked above")
            .get_mut(&coin.denom)
            .expect("balance checked above") = have - coin.amount;
        Ok(())
    }

    fn credit(&mut self, account: &str, coin: &Coin) {
        *self
            .balances
            .entry(account.to_owned())
            .or_default()
            .entry(coin.denom.clone())
            .or_default() += coin.amount;
    }
}

impl BankKeeper for MemBank {
    fn send(&mut self, from: &str, to: &str, coins: &[Coin]) -> Result<(), LiquidityError> {
        // Validate the whole transfer before moving anything.
        for coin in coins.iter().filter(|c| !c.is_zero()) {
            let have = self.balance(from, &coin.denom);
            if have < coin.amount {
                return Err(LiquidityError::InsufficientFunds {
                    account: from.to_owned(),
                    have,
                    want: coin.clone()
                });
            }
        }
        for coin in coins.iter().filter(|c| !c.is_zero()) {
            self.debit(from, coin).expect("validated above");
            self.credit(to, coin);
        }
        Ok(())
    }

    fn mint_to(&mut self, account: &str, coin: &Coin) -> Result<(), LiquidityError> {
        if !coin.is_zero() {
            self.credit(account, coin);
        }
        Ok(())
    }

    fn burn_from(&mut self, account: &str, coin: &Coin) -> Result<(), LiquidityError> {
        if !coin.is_zero() {
            self.debit(account, coin)?;
        }
        Ok(())
    }

    fn balance(&self, account: &str, denom: &str) -> u128 {
        self.balances
            .get(account)
            .and_then(|coins| coins.get(denom))
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_is_atomic() {
        let mut bank = MemBank::new();
        bank.fund("alice", &[Coin::new("uatom", 100), Coin::new("uusd", 1)]);
        let err = bank.send(
            "alice",
            "bob",
            &[Coin::new("uatom", 50), Coin::new("uusd", 2)]
        );
        assert!(err.is_err());
        // Nothing moved.
        assert_eq!(bank.balance("alice", "uatom"), 100);
        assert_eq!(bank.balance("bob", "uatom"), 0);
    }

    #[test]
    fn zero_coins_are_skipped() {
        let mut bank = MemBank::new();
        bank.send("alice", "bob", &[Coin::zero("uatom")]).unwrap();
    }
}
