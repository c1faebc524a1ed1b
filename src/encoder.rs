// src/encoder.rs

//! # Wheel Rotation Counters
//!
//! Signed pulse totals for both wheels. The pulse-capture interrupt adds the
//! signed count read from the quadrature timer with
//! [`accumulate`](RotationCounters::accumulate); any other context reads or
//! drains the totals. Each wheel is a single `AtomicI32`, so a reader never
//! observes a torn value and no lock is needed.
//!
//! ```
//! use balance_stabilization::{RotationCounters, Wheel};
//!
//! static COUNTERS: RotationCounters = RotationCounters::new();
//!
//! // Timer overflow interrupt.
//! COUNTERS.accumulate(Wheel::Left, 12);
//! COUNTERS.accumulate(Wheel::Left, -2);
//!
//! assert_eq!(COUNTERS.take(Wheel::Left), 10);
//! assert_eq!(COUNTERS.count(Wheel::Left), 0);
//! ```

use crate::actuation::Wheel;
use core::sync::atomic::{AtomicI32, Ordering};

/// Pulse counters for both wheels, shareable between contexts.
#[derive(Debug, Default)]
pub struct RotationCounters {
    left: AtomicI32,
    right: AtomicI32,
}

impl RotationCounters {
    /// Creates zeroed counters, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            left: AtomicI32::new(0),
            right: AtomicI32::new(0),
        }
    }

    fn counter(&self, wheel: Wheel) -> &AtomicI32 {
        match wheel {
            Wheel::Left => &self.left,
            Wheel::Right => &self.right,
        }
    }

    /// Adds a signed pulse delta to one wheel. Totals wrap on overflow.
    pub fn accumulate(&self, wheel: Wheel, delta: i16) {
        self.counter(wheel)
            .fetch_add(i32::from(delta), Ordering::Relaxed);
    }

    /// Current pulse total of one wheel.
    pub fn count(&self, wheel: Wheel) -> i32 {
        self.counter(wheel).load(Ordering::Relaxed)
    }

    /// Returns the pulse total of one wheel and zeroes it in the same step.
    pub fn take(&self, wheel: Wheel) -> i32 {
        self.counter(wheel).swap(0, Ordering::Relaxed)
    }

    /// Zeroes both totals.
    pub fn reset(&self) {
        self.left.store(0, Ordering::Relaxed);
        self.right.store(0, Ordering::Relaxed);
    }
}
