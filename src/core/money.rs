//! Integer money in minor currency units.
//!
//! Every amount inside the ledger engine is a whole number of minor units (cents,
//! paise, ...). Decimal values only appear at the edges: parsing user input and
//! formatting for display, where the currency's minor-unit exponent is applied.

use crate::errors::{Error, Result};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    iter::Sum,
    str::FromStr,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

/// A signed amount of money expressed in minor units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero minor units
    pub const ZERO: Self = Self(0);

    /// Wraps a raw minor-unit amount.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Raw minor-unit amount.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// `None` for `i64::MIN` minor units.
    #[must_use]
    pub const fn checked_neg(self) -> Option<Self> {
        match self.0.checked_neg() {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// `None` for `i64::MIN` minor units.
    #[must_use]
    pub const fn checked_abs(self) -> Option<Self> {
        match self.0.checked_abs() {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Sums `amounts`, or `None` if the total does not fit in minor units.
    pub fn checked_sum<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, Self::checked_add)
    }

    /// Converts a decimal amount (e.g. `12.34`) into minor units using the
    /// currency's exponent (`2` for cents).
    ///
    /// Amounts with more fractional digits than the currency allows are rejected
    /// rather than rounded.
    pub fn from_decimal(value: Decimal, minor_unit_digits: u32) -> Result<Self> {
        let factor = 10_i64
            .checked_pow(minor_unit_digits)
            .ok_or(Error::InvalidAmount { amount: value })?;
        let scaled = value
            .checked_mul(Decimal::from(factor))
            .ok_or(Error::InvalidAmount { amount: value })?;

        if !scaled.fract().is_zero() {
            return Err(Error::InvalidAmount { amount: value });
        }

        scaled
            .to_i64()
            .map(Self)
            .ok_or(Error::InvalidAmount { amount: value })
    }

    /// Parses user input such as `"12.34"` or `"1200"` into minor units.
    ///
    /// # Errors
    /// [`Error::InvalidAmount`] for text that is not a decimal number, or one with
    /// more fractional digits than the currency allows.
    pub fn parse(input: &str, minor_unit_digits: u32) -> Result<Self> {
        let value = Decimal::from_str(input.trim()).map_err(|_| Error::InvalidAmount {
            amount: Decimal::ZERO,
        })?;
        Self::from_decimal(value, minor_unit_digits)
    }

    /// Converts back to a decimal amount with `minor_unit_digits` fractional digits.
    #[must_use]
    pub fn to_decimal(self, minor_unit_digits: u32) -> Decimal {
        Decimal::new(self.0, minor_unit_digits)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
