// src/number.rs

//! # Numeric Requirements
//!
//! Every component in this crate is generic over a [`Number`], so the same
//! code runs with `f32` on a hardware FPU or with a fixed-point type such as
//! `fixed::types::I16F16` on cores without one.

use core::fmt::Display;
use num_traits::{Bounded, FromPrimitive, ToPrimitive};
use piddiy::Number as PiddiyNumber;

/// Custom trait to encapsulate base number requirements.
pub trait Number: PiddiyNumber + Bounded + FromPrimitive + ToPrimitive + Display {
    /// Clamps generic PartialOrd values within a given range.
    fn clamp(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if max < self {
            max
        } else {
            self
        }
    }

    /// Absolute value using only ordering and negation.
    fn magnitude(self) -> Self {
        if self < Self::zero() {
            -self
        } else {
            self
        }
    }

    /// Converts an `f32`, falling back to zero when the value cannot be
    /// represented by `Self`.
    fn from_f32_lossy(value: f32) -> Self {
        Self::from_f32(value).unwrap_or_else(Self::zero)
    }

    /// Converts an `f32`, saturating to the bounds of `Self` when the value
    /// is out of range.
    fn from_f32_saturating(value: f32) -> Self {
        match Self::from_f32(value) {
            Some(converted) => converted,
            None if value < 0.0 => Self::min_value(),
            None => Self::max_value(),
        }
    }

    /// Addition that stops at the bounds of `Self` instead of overflowing.
    fn bounded_add(self, rhs: Self) -> Self {
        if rhs > Self::zero() && Self::max_value() - rhs < self {
            Self::max_value()
        } else if rhs < Self::zero() && self < Self::min_value() - rhs {
            Self::min_value()
        } else {
            self + rhs
        }
    }

    /// Division that stops at the bounds of `Self` instead of overflowing.
    /// The quotient is formed in `f32`, so fixed-point results carry `f32`
    /// precision.
    fn bounded_div(self, rhs: Self) -> Self {
        match (self.to_f32(), rhs.to_f32()) {
            (Some(numerator), Some(denominator)) => {
                Self::from_f32_saturating(numerator / denominator)
            }
            _ => self / rhs,
        }
    }
}

impl<T: PiddiyNumber + Bounded + FromPrimitive + ToPrimitive + Display> Number for T {}
