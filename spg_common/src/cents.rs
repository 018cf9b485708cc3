use std::{fmt::Display, iter::Sum, ops::Add};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------       Cents         ---------------------------------------------------------
/// An amount of money in minor currency units (centavos). Order totals are always stored in this form so that no
/// floating point drift can creep into the amounts that are compared during reconciliation.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<Decimal> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_from_major(value)
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R$ {:.2}", self.to_major())
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The amount in major currency units (reais), with exactly two decimal places.
    pub fn to_major(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Converts an amount in major currency units into cents. Sub-cent fractions are rounded half away from zero.
    pub fn try_from_major(value: Decimal) -> Result<Self, CentsConversionError> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|v| v.to_i64())
            .map(Self)
            .ok_or_else(|| CentsConversionError(format!("{value} is out of range")))
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
