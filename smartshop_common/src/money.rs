use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "DH";
pub const CURRENCY_CODE_LOWER: &str = "dh";

//--------------------------------------       Money        ----------------------------------------------------------
/// A monetary amount in centimes (hundredths of a dirham).
///
/// Storing centimes in an `i64` makes every amount an exact 2-decimal value, so "round to two decimal places" is a
/// property of the representation rather than something callers must remember to do. The only place rounding actually
/// happens is [`Money::percent_bps`], which rounds half-up to the nearest centime.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in centimes: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}{}.{:02} {CURRENCY_CODE}", abs / 100, abs % 100)
    }
}

impl Money {
    /// One centime. The tolerance used for "is this order fully paid" style comparisons.
    pub const EPSILON: Money = Money(1);
    pub const ZERO: Money = Money(0);

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Creates an amount from whole dirhams.
    pub const fn from_dh(dh: i64) -> Self {
        Self(dh * 100)
    }

    pub const fn from_centimes(centimes: i64) -> Self {
        Self(centimes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a percentage given in basis points (500 = 5%), rounding half-up to the nearest centime.
    ///
    /// For non-negative amounts this reproduces decimal round-half-up at 2 fractional digits exactly, which the
    /// settlement ledger relies on for numeric parity with invoice arithmetic.
    pub fn percent_bps(&self, bps: i64) -> Money {
        let centimes = (i128::from(self.0) * i128::from(bps) + 5_000) / 10_000;
        #[allow(clippy::cast_possible_truncation)]
        Money(centimes as i64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn centimes_and_dirhams() {
        let m = Money::from_dh(12);
        assert_eq!(m.value(), 1_200);
        assert_eq!(Money::from_centimes(1_234).value(), 1_234);
    }

    #[test]
    fn display() {
        assert_eq!(Money::from_centimes(1_234).to_string(), "12.34 DH");
        assert_eq!(Money::from_centimes(5).to_string(), "0.05 DH");
        assert_eq!(Money::from_centimes(-1_250).to_string(), "-12.50 DH");
        assert_eq!(Money::ZERO.to_string(), "0.00 DH");
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_dh(10);
        let b = Money::from_centimes(250);
        assert_eq!((a + b).value(), 1_250);
        assert_eq!((a - b).value(), 750);
        assert_eq!((b * 3).value(), 750);
        assert_eq!((-b).value(), -250);
        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.value(), 1_500);
    }

    #[test]
    fn percent_rounds_half_up() {
        // 5% of 1.25 DH = 0.0625 DH -> 0.06 DH (6.25 centimes rounds down)
        assert_eq!(Money::from_centimes(125).percent_bps(500).value(), 6);
        // 5% of 1.30 DH = 0.065 DH -> 0.07 DH (half rounds up)
        assert_eq!(Money::from_centimes(130).percent_bps(500).value(), 7);
        // 20% of 570.00 DH = 114.00 DH
        assert_eq!(Money::from_dh(570).percent_bps(2_000), Money::from_dh(114));
        // 15% of 1200.00 DH = 180.00 DH
        assert_eq!(Money::from_dh(1_200).percent_bps(1_500), Money::from_dh(180));
    }

    #[test]
    fn percent_of_zero() {
        assert_eq!(Money::ZERO.percent_bps(500), Money::ZERO);
        assert_eq!(Money::from_dh(100).percent_bps(0), Money::ZERO);
    }
}
