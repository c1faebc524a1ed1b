// src/pid/balance.rs

//! # Balance PID Compute Module
//!
//! This module provides the compute callback and control data structure
//! for the pitch balance loop. The callback adds two things on top of a
//! plain PID step:
//!
//! - anti-windup: the integral accumulator is clamped so that `ki * integral`
//!   stays inside the output bounds, with no clamp at all when `ki` is zero;
//! - no derivative kick: the derivative term is zero on the first step after
//!   initialization or reset, when there is no meaningful previous error.
//!   A textbook step would differentiate against a zero previous error there
//!   and add `kd * error / dt` to the first output; this callback deliberately
//!   leaves that term out.
//!
//! Divisions and the integral sum saturate at the bounds of the number type,
//! so a small `ki` or a 1 ms step stays finite on fixed-point types.

use crate::Number;
use piddiy::PidController;

/// Control data for the balance PID compute callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BalanceControlData<T> {
    /// The measured pitch angle, typically the filtered estimate.
    pub measurement: T,
    /// The time delta since the last computation, in seconds. Must be positive.
    pub dt: T,
    /// Lower output bound, used to derive the integral clamp.
    pub output_min: T,
    /// Upper output bound, used to derive the integral clamp.
    pub output_max: T,
    /// Set on the first computation after init or reset to suppress the
    /// derivative term.
    pub first_update: bool,
}

/// Returns the accumulator range that keeps `ki * integral` within
/// `[output_min, output_max]`, or `None` when `ki` is zero. A bound beyond the
/// range of `T` saturates to that range.
pub fn integral_bounds<T: Number>(ki: T, output_min: T, output_max: T) -> Option<(T, T)> {
    if ki == T::zero() {
        return None;
    }
    let low = output_min.bounded_div(ki);
    let high = output_max.bounded_div(ki);
    if ki < T::zero() {
        Some((high, low))
    } else {
        Some((low, high))
    }
}

/// Balance PID compute callback.
pub fn compute_balance<T: Number>(
    pid: &mut PidController<T, BalanceControlData<T>>,
    data: BalanceControlData<T>,
) -> (T, T, T) {
    let error = pid.set_point - data.measurement;
    let mut integral = pid.integral.bounded_add(error * data.dt);
    if let Some((low, high)) = integral_bounds(pid.ki, data.output_min, data.output_max) {
        integral = integral.clamp(low, high);
    }
    let derivative = if data.first_update {
        T::zero()
    } else {
        (error - pid.error).bounded_div(data.dt)
    };

    (error, integral, derivative)
}
