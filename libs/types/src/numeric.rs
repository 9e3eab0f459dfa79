//! Fixed-width integer types for money and odds
//!
//! All monetary values are non-negative integers in a minor unit (cents).
//! Odds are decimal multipliers scaled by 100, so `150` reads as 1.50.
//! Every derived quantity is computed with integer-truncating division;
//! floating point is never used for money.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Scale factor shared by all odds values: `Odds(150)` is a 1.50 multiplier.
pub const ODDS_SCALE: u64 = 100;

/// A monetary amount in minor units
///
/// Non-negative by construction. Subtraction panics on underflow rather
/// than wrapping, so a bookkeeping error surfaces immediately instead of
/// minting money.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Create an amount from minor units
    pub fn new(minor_units: u64) -> Self {
        Self(minor_units)
    }

    /// Get the raw minor-unit value
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtraction returning `None` on underflow
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(
            self.0
                .checked_add(rhs.0)
                .expect("Amount addition overflowed"),
        )
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        assert!(self.0 >= rhs.0, "Amount subtraction would go negative");
        Amount(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Amount) {
        *self = *self - rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decimal odds scaled by 100
///
/// Must be strictly greater than `ODDS_SCALE` (a 1.00 multiplier would make
/// lay liability undefined). The conversion helpers below are the only
/// places in the workspace where stake, return, and liability are related
/// to one another, so the truncation policy lives here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Odds(u64);

impl Odds {
    /// Create new odds
    ///
    /// # Panics
    /// Panics if the value is not strictly greater than 100
    pub fn new(scaled: u64) -> Self {
        assert!(scaled > ODDS_SCALE, "odds must exceed 1.00");
        Self(scaled)
    }

    /// Try to create odds, returning `None` for values of 1.00 or below
    pub fn try_new(scaled: u64) -> Option<Self> {
        if scaled > ODDS_SCALE {
            Some(Self(scaled))
        } else {
            None
        }
    }

    /// Get the scaled value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Gross return on a winning back stake: `stake * odds / 100`, truncated
    pub fn gross_return(&self, stake: Amount) -> Amount {
        Amount::new((stake.value() as u128 * self.0 as u128 / ODDS_SCALE as u128) as u64)
    }

    /// Lay liability covering a back stake: `stake * (odds - 100) / 100`,
    /// truncated
    pub fn liability_on(&self, stake: Amount) -> Amount {
        let profit_part = (self.0 - ODDS_SCALE) as u128;
        Amount::new((stake.value() as u128 * profit_part / ODDS_SCALE as u128) as u64)
    }

    /// Back stake absorbed by a given lay liability:
    /// `liability * 100 / (odds - 100)`, truncated
    pub fn backer_stake_for(&self, liability: Amount) -> Amount {
        let profit_part = (self.0 - ODDS_SCALE) as u128;
        Amount::new((liability.value() as u128 * ODDS_SCALE as u128 / profit_part) as u64)
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / ODDS_SCALE, self.0 % ODDS_SCALE)
    }
}
