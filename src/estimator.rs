// src/estimator.rs

//! # Pitch Attitude Estimator
//!
//! Two-state Kalman filter fusing the tilt angle derived from the
//! accelerometer with the pitch rate reported by the gyroscope. The state is
//! the angle and the slowly drifting gyro bias; the filter outputs the
//! corrected angle and the unbiased rate.
//!
//! The gyro drives the prediction step:
//!
//! ```text
//! rate   = gyro_rate - bias
//! angle += dt * rate
//! ```
//!
//! and the accelerometer angle corrects it with a gain derived from the
//! error covariance `P`. Each update is computed from a snapshot of `P`, so
//! the covariance correction always uses the pre-correction entries.
//!
//! `P` is not re-symmetrized. `P01` and `P10` start at zero and their
//! updates are equal in exact arithmetic, so they only differ by rounding.

use crate::timing::{elapsed_ms, ms_to_seconds};
use crate::{BalanceConfig, Number};

/// Kalman filter state for one attitude axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeEstimator<T: Number> {
    q_angle: T,
    q_gyro: T,
    r_angle: T,
    angle: T,
    bias: T,
    rate: T,
    p: [[T; 2]; 2],
    last_update_ms: u32,
}

impl<T: Number> AttitudeEstimator<T> {
    /// Creates an estimator with the given noise terms, zero state and zero
    /// covariance, stamped at `now_ms`.
    pub fn new(q_angle: T, q_gyro: T, r_angle: T, now_ms: u32) -> Self {
        Self {
            q_angle,
            q_gyro,
            r_angle,
            angle: T::zero(),
            bias: T::zero(),
            rate: T::zero(),
            p: [[T::zero(); 2]; 2],
            last_update_ms: now_ms,
        }
    }

    /// Creates an estimator using the noise terms of `config`.
    pub fn with_config(config: &BalanceConfig<T>, now_ms: u32) -> Self {
        Self::new(config.q_angle, config.q_gyro, config.r_angle, now_ms)
    }

    /// Zeroes state and covariance and restamps the update time.
    pub fn init(&mut self, now_ms: u32) {
        *self = Self::new(self.q_angle, self.q_gyro, self.r_angle, now_ms);
    }

    /// Runs one predict/correct cycle and returns the filtered angle.
    ///
    /// - `now_ms`: current millisecond tick.
    /// - `measured_angle`: accelerometer tilt angle in degrees.
    /// - `gyro_rate`: offset corrected gyro rate in degrees per second.
    ///
    /// When the tick did not advance since the previous update the previous
    /// angle is returned and no state changes. An interval `T` cannot hold
    /// also returns the previous angle, but restamps the update time.
    pub fn update(&mut self, now_ms: u32, measured_angle: T, gyro_rate: T) -> T {
        let Some(elapsed) = elapsed_ms(self.last_update_ms, now_ms) else {
            log::trace!("estimator update skipped, tick {} did not advance", now_ms);
            return self.angle;
        };
        self.last_update_ms = now_ms;
        let Some(dt) = ms_to_seconds::<T>(elapsed) else {
            log::warn!("estimator update skipped, {} ms interval out of range", elapsed);
            return self.angle;
        };

        // Predict
        self.rate = gyro_rate - self.bias;
        self.angle = self.angle + dt * self.rate;

        let [[p00, p01], [p10, p11]] = self.p;
        let p00 = p00 + dt * (dt * p11 - p01 - p10 + self.q_angle);
        let p01 = p01 - dt * p11;
        let p10 = p10 - dt * p11;
        let p11 = p11 + self.q_gyro * dt;

        let s = p00 + self.r_angle;
        if s <= T::zero() {
            // Degenerate noise configuration, keep the prediction.
            self.p = [[p00, p01], [p10, p11]];
            return self.angle;
        }
        let k0 = p00 / s;
        let k1 = p10 / s;

        // Correct
        let y = measured_angle - self.angle;
        self.angle = self.angle + k0 * y;
        self.bias = self.bias + k1 * y;

        self.p = [
            [p00 - k0 * p00, p01 - k0 * p01],
            [p10 - k1 * p00, p11 - k1 * p01],
        ];

        self.angle
    }

    /// Seeds the angle estimate, e.g. with the first accelerometer reading.
    pub fn set_angle(&mut self, angle: T) {
        self.angle = angle;
    }

    /// Current filtered angle.
    pub fn angle(&self) -> T {
        self.angle
    }

    /// Unbiased rate computed by the last update.
    pub fn rate(&self) -> T {
        self.rate
    }

    /// Current gyro bias estimate.
    pub fn bias(&self) -> T {
        self.bias
    }

    /// Current error covariance matrix.
    pub fn covariance(&self) -> [[T; 2]; 2] {
        self.p
    }
}
