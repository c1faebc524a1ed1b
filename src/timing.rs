// src/timing.rs

//! # Millisecond Tick Arithmetic
//!
//! The estimator and the controller integrate over the time elapsed since
//! their previous update, measured on a free-running `u32` millisecond
//! counter (a SysTick style timebase). The counter wraps after roughly
//! 49.7 days; subtraction is done with wrapping arithmetic so a rollover
//! yields the correct short interval instead of a negative one.
//!
//! Converting an interval to seconds can fail on narrow fixed-point types
//! (an `I16F16` holds at most 32767 s). Callers restamp their timestamp
//! before converting, so one unrepresentable gap skips a single step instead
//! of freezing every later one.

use crate::Number;

/// Milliseconds per second.
pub const MS_PER_SECOND: f32 = 1000.0;

/// Largest forward step accepted between two updates. A larger wrapped
/// difference means the caller handed in an older timestamp than the last
/// one, which is treated like a clock that did not advance.
pub const MAX_FORWARD_STEP_MS: u32 = u32::MAX / 2;

/// Returns the milliseconds elapsed from `last_ms` to `now_ms`, or `None`
/// when the clock did not advance.
pub fn elapsed_ms(last_ms: u32, now_ms: u32) -> Option<u32> {
    let elapsed = now_ms.wrapping_sub(last_ms);
    if elapsed == 0 || elapsed > MAX_FORWARD_STEP_MS {
        None
    } else {
        Some(elapsed)
    }
}

/// Converts a millisecond interval to seconds as a `T`, or `None` when `T`
/// cannot represent it.
pub fn ms_to_seconds<T: Number>(ms: u32) -> Option<T> {
    T::from_f32(ms as f32 / MS_PER_SECOND)
}
