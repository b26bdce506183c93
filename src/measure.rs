//! Strongly typed measures used throughout the crate.
//!
//! All measures are 64-bit signed integers with saturating arithmetic, so a
//! `MAX` sentinel ("infinity" for open time windows and unbounded distance or
//! reload limits) survives sums without wrapping around.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

macro_rules! measure {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Sentinel for "unbounded"; saturating arithmetic keeps it stable.
            pub const MAX: $name = $name(i64::MAX);
            pub const ZERO: $name = $name(0);

            pub const fn new(value: i64) -> Self {
                $name(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }

            pub fn max(self, other: Self) -> Self {
                $name(self.0.max(other.0))
            }

            pub fn min(self, other: Self) -> Self {
                $name(self.0.min(other.0))
            }

            /// Clamps negative values to zero.
            pub fn non_negative(self) -> Self {
                $name(self.0.max(0))
            }
        }

        impl Add for $name {
            type Output = $name;

            fn add(self, rhs: $name) -> $name {
                $name(self.0.saturating_add(rhs.0))
            }
        }

        impl Sub for $name {
            type Output = $name;

            fn sub(self, rhs: $name) -> $name {
                $name(self.0.saturating_sub(rhs.0))
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: $name) {
                self.0 = self.0.saturating_add(rhs.0);
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: $name) {
                self.0 = self.0.saturating_sub(rhs.0);
            }
        }

        impl Mul<i64> for $name {
            type Output = $name;

            fn mul(self, rhs: i64) -> $name {
                $name(self.0.saturating_mul(rhs))
            }
        }

        impl Neg for $name {
            type Output = $name;

            fn neg(self) -> $name {
                $name(self.0.saturating_neg())
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = $name>>(iter: I) -> $name {
                iter.fold($name(0), |acc, item| acc + item)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> $name {
                $name(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

measure!(
    /// A monetary cost, prize, or penalised objective value.
    Cost
);
measure!(
    /// A travelled distance.
    Distance
);
measure!(
    /// An elapsed duration, or a point in time when measured from time zero.
    Duration
);
measure!(
    /// A carried load in one load dimension.
    Load
);
measure!(
    /// A planar coordinate component.
    Coordinate
);

impl Distance {
    /// Converts to cost at the given unit rate.
    pub fn cost(self, unit_cost: Cost) -> Cost {
        Cost::new(self.0.saturating_mul(unit_cost.get()))
    }
}

impl Duration {
    /// Converts to cost at the given unit rate.
    pub fn cost(self, unit_cost: Cost) -> Cost {
        Cost::new(self.0.saturating_mul(unit_cost.get()))
    }
}

impl Load {
    /// Converts to cost at the given unit penalty.
    pub fn cost(self, unit_cost: Cost) -> Cost {
        Cost::new(self.0.saturating_mul(unit_cost.get()))
    }
}
