use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign},
    str::FromStr,
    sync::OnceLock
};

use alloy_primitives::{I256, U256};
use malachite::{
    Natural,
    num::arithmetic::traits::{DivMod, DivRound},
    rounding_modes::RoundingMode
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of fractional digits carried by [`Dec`].
pub const DEC_PRECISION: u32 = 18;

const ONE_RAW: U256 = U256::from_limbs([1_000_000_000_000_000_000_u64, 0, 0, 0]);

fn const_1e18() -> &'static Natural {
    static UNIT: OnceLock<Natural> = OnceLock::new();
    UNIT.get_or_init(|| Natural::from(1_000_000_000_000_000_000_u64))
}

/// Signed fixed-point decimal with 18 fractional digits, backed by an `I256`.
///
/// Multiplication and division go through `malachite::Natural` so the widening
/// step never overflows and every rounding is an explicit `RoundingMode`;
/// both always truncate toward zero. Truncation is the single source of the
/// decimal error the settlement path accounts for, so no other rounding mode
/// is exposed.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(I256);

impl Dec {
    pub const ONE: Dec = Dec(I256::from_raw(ONE_RAW));
    pub const ZERO: Dec = Dec(I256::ZERO);
    /// Smallest representable increment, `1e-18`.
    pub const EPSILON: Dec = Dec(I256::ONE);

    pub fn from_int(amount: u128) -> Self {
        let raw = U256::from(amount)
            .checked_mul(ONE_RAW)
            .expect("amount out of decimal range");
        Dec(I256::from_raw(raw))
    }

    pub fn from_raw(raw: I256) -> Self {
        Dec(raw)
    }

    pub fn into_raw(self) -> I256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// Truncates toward zero to a whole number of units, kept as a `Dec`.
    pub fn truncate(&self) -> Dec {
        let mag = self.0.unsigned_abs() / ONE_RAW * ONE_RAW;
        let signed = I256::from_raw(mag);
        Dec(if self.0.is_negative() { -signed } else { signed })
    }

    /// Truncates toward zero into an integer coin amount.
    ///
    /// Only meaningful for non-negative values; a negative input here means
    /// the matcher produced an impossible fill and the process must not
    /// continue.
    pub fn truncate_amount(&self) -> u128 {
        assert!(!self.0.is_negative(), "truncating negative decimal {self} to a coin amount");
        u128::try_from(self.0.unsigned_abs() / ONE_RAW).expect("amount overflows u128")
    }

    /// Rounds up into an integer coin amount. Used when reserving fees so the
    /// escrow always covers the truncated amounts spent later.
    pub fn ceil_amount(&self) -> u128 {
        assert!(!self.0.is_negative(), "ceiling negative decimal {self} to a coin amount");
        let raw = self.0.unsigned_abs();
        let floored = u128::try_from(raw / ONE_RAW).expect("amount overflows u128");
        if (raw % ONE_RAW).is_zero() {
            floored
        } else {
            floored.checked_add(1).expect("amount overflows u128")
        }
    }

    fn natural_abs(&self) -> Natural {
        Natural::from_limbs_asc(self.0.unsigned_abs().as_limbs())
    }

    fn from_sign_magnitude(negative: bool, mag: Natural) -> Dec {
        let limbs = mag.into_limbs_asc();
        assert!(limbs.len() <= 4, "decimal magnitude overflows 256 bits");
        let raw = U256::from_limbs_slice(&limbs);
        assert!(raw <= I256::MAX.into_raw(), "decimal magnitude overflows 255 bits");
        let signed = I256::from_raw(raw);
        Dec(if negative && !signed.is_zero() { -signed } else { signed })
    }
}

impl Add for Dec {
    type Output = Dec;

    fn add(self, rhs: Self) -> Self::Output {
        Dec(self.0.checked_add(rhs.0).expect("decimal overflow in add"))
    }
}

impl AddAssign for Dec {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Dec {
    type Output = Dec;

    fn sub(self, rhs: Self) -> Self::Output {
        Dec(self.0.checked_sub(rhs.0).expect("decimal overflow in sub"))
    }
}

impl SubAssign for Dec {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Dec {
    type Output = Dec;

    fn neg(self) -> Self::Output {
        Dec(-self.0)
    }
}

impl Mul for Dec {
    type Output = Dec;

    /// `self * rhs / 1e18`, truncated toward zero.
    fn mul(self, rhs: Self) -> Self::Output {
        let negative = self.0.is_negative() != rhs.0.is_negative();
        let (mag, _) = (self.natural_abs() * rhs.natural_abs()).div_round(const_1e18(), RoundingMode::Down);
        Dec::from_sign_magnitude(negative, mag)
    }
}

impl Div for Dec {
    type Output = Dec;

    /// `self * 1e18 / rhs`, truncated toward zero.
    fn div(self, rhs: Self) -> Self::Output {
        assert!(!rhs.is_zero(), "decimal division by zero");
        let negative = self.0.is_negative() != rhs.0.is_negative();
        let (mag, _) = (self.natural_abs() * const_1e18()).div_round(rhs.natural_abs(), RoundingMode::Down);
        Dec::from_sign_magnitude(negative, mag)
    }
}

impl Mul<u128> for Dec {
    type Output = Dec;

    fn mul(self, rhs: u128) -> Self::Output {
        Dec::from_sign_magnitude(self.0.is_negative(), self.natural_abs() * Natural::from(rhs))
    }
}

impl Sum for Dec {
    fn sum<I: Iterator<Item = Dec>>(iter: I) -> Self {
        let mut acc = Dec::ZERO;
        for d in iter {
            acc += d;
        }
        acc
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_negative() {
            write!(f, "-")?;
        }
        let (int, frac) = self.natural_abs().div_mod(const_1e18().clone());
        if frac == 0 {
            return write!(f, "{int}");
        }
        let digits = format!("{frac:0>18}");
        write!(f, "{int}.{}", digits.trim_end_matches('0'))
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid decimal literal {0:?}")]
pub struct ParseDecError(String);

impl FromStr for Dec {
    type Err = ParseDecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseDecError(s.to_owned());
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s)
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, "")
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(bad());
        }
        if frac_part.len() > DEC_PRECISION as usize {
            return Err(bad());
        }
        let digits_ok = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if !digits_ok(int_part) || !digits_ok(frac_part) {
            return Err(bad());
        }
        let int = if int_part.is_empty() {
            Natural::from(0_u32)
        } else {
            Natural::from_str(int_part).map_err(|_| bad())?
        };
        let mut mag = int * const_1e18();
        if !frac_part.is_empty() {
            let scale = 10_u64.pow(DEC_PRECISION - frac_part.len() as u32);
            mag += Natural::from_str(frac_part).map_err(|_| bad())? * Natural::from(scale);
        }
        Ok(Dec::from_sign_magnitude(negative, mag))
    }
}

impl Serialize for Dec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    #[test]
    fn mul_truncates_toward_zero() {
        assert_eq!(dec("1.5") * dec("1.5"), dec("2.25"));
        assert_eq!(dec("0.000000000000000001") * dec("0.1"), Dec::ZERO);
        assert_eq!(-dec("0.000000000000000001") * dec("0.1"), Dec::ZERO);
    }

    #[test]
    fn quo_truncates_toward_zero() {
        assert_eq!(dec("1") / dec("3"), dec("0.333333333333333333"));
        assert_eq!(-dec("1") / dec("3"), -dec("0.333333333333333333"));
        assert_eq!(dec("7") / dec("2"), dec("3.5"));
    }

    #[test]
    fn truncate_amount_floors() {
        assert_eq!(dec("42.999999999999999999").truncate_amount(), 42);
        assert_eq!(Dec::from_int(7).truncate_amount(), 7);
        assert_eq!(Dec::ZERO.truncate_amount(), 0);
    }

    #[test]
    #[should_panic(expected = "negative decimal")]
    fn truncate_amount_rejects_negative() {
        (-Dec::ONE).truncate_amount();
    }

    #[test]
    fn display_round_trips_through_parse() {
        for s in ["0", "1", "-1", "0.5", "123.456", "-0.000000000000000001"] {
            assert_eq!(dec(s).to_string(), s);
        }
    }

    #[test]
    fn handles_ledger_scale_products() {
        let x = Dec::from_int(u128::MAX);
        assert_eq!(x * Dec::ONE, x);
        assert_eq!(x / Dec::ONE, x);
    }

    #[test]
    fn serde_uses_canonical_string() {
        let d = dec("1.002");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"1.002\"");
        assert_eq!(serde_json::from_str::<Dec>(&json).unwrap(), d);
    }
}
