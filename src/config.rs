// src/config.rs

//! # Tuning Defaults and Configuration
//!
//! Compile-time defaults for a small balancing robot driven by an MPU-6050
//! class IMU and a dual H-bridge with 8-bit PWM. [`BalanceConfig`] gathers
//! them into one structure that the caller adjusts field by field before
//! building a [`ControlLoop`](crate::ControlLoop).

use crate::Number;

/// Default proportional gain.
pub const PID_KP: f32 = 15.0;
/// Default integral gain.
pub const PID_KI: f32 = 0.05;
/// Default derivative gain.
pub const PID_KD: f32 = 0.1;

/// Kalman process noise variance for the angle state.
pub const Q_ANGLE: f32 = 0.001;
/// Kalman process noise variance for the gyro bias state.
pub const Q_GYRO: f32 = 0.003;
/// Kalman measurement noise variance of the accelerometer angle.
pub const R_ANGLE: f32 = 0.03;

/// Largest motor command magnitude, also the default PID output bound.
pub const MAX_OUTPUT: i16 = 255;
/// Control outputs smaller than this, in either direction, drive nothing.
pub const DEAD_ZONE: f32 = 2.0;
/// Nominal control loop period in milliseconds.
pub const SAMPLE_TIME_MS: u32 = 10;

/// Size of the command line receive buffer, terminator slot included.
pub const RX_BUFFER_SIZE: usize = 64;
/// Gyro samples averaged when estimating the rate offset at startup.
pub const CALIBRATION_SAMPLES: u16 = 1000;

/// Configuration for the whole balance stabilizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceConfig<T: Number> {
    /// Proportional gain.
    pub kp: T,
    /// Integral gain.
    pub ki: T,
    /// Derivative gain.
    pub kd: T,
    /// Kalman process noise for the angle.
    pub q_angle: T,
    /// Kalman process noise for the gyro bias.
    pub q_gyro: T,
    /// Kalman measurement noise.
    pub r_angle: T,
    /// Symmetric output bound of the controller and the motor mapper.
    pub max_output: T,
    /// Dead zone applied before driving the motors.
    pub dead_zone: T,
    /// Initial target pitch angle in degrees.
    pub target_angle: T,
    /// Control loop period in milliseconds.
    pub sample_time_ms: u32,
}

impl<T: Number> BalanceConfig<T> {
    /// Creates a configuration holding the crate defaults.
    /// The gains are a starting point and should be tuned for the hardware,
    /// either here or live over the command channel.
    ///
    /// Example Usage
    /// ```
    /// use balance_stabilization::{BalanceConfig, ControlLoop};
    ///
    /// let mut config = BalanceConfig::<f32>::new();
    ///
    /// // Softer proportional response for a tall chassis.
    /// config.kp = 12.0;
    ///
    /// // Lean slightly forward to compensate for an off-centre battery.
    /// config.target_angle = 1.5;
    ///
    /// let control_loop = ControlLoop::with_config(&config, 0);
    /// assert_eq!(control_loop.target_angle(), 1.5);
    /// ```
    pub fn new() -> Self {
        Self {
            kp: T::from_f32_lossy(PID_KP),
            ki: T::from_f32_lossy(PID_KI),
            kd: T::from_f32_lossy(PID_KD),
            q_angle: T::from_f32_lossy(Q_ANGLE),
            q_gyro: T::from_f32_lossy(Q_GYRO),
            r_angle: T::from_f32_lossy(R_ANGLE),
            max_output: T::from_f32_lossy(MAX_OUTPUT as f32),
            dead_zone: T::from_f32_lossy(DEAD_ZONE),
            target_angle: T::zero(),
            sample_time_ms: SAMPLE_TIME_MS,
        }
    }
}

impl<T: Number> Default for BalanceConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    /// Test that the defaults carry the documented constants.
    #[test]
    fn test_config_defaults() {
        let config = BalanceConfig::<f32>::new();
        assert!(value_close(15.0, config.kp));
        assert!(value_close(0.05, config.ki));
        assert!(value_close(0.1, config.kd));
        assert!(value_close(255.0, config.max_output));
        assert!(value_close(2.0, config.dead_zone));
        assert!(value_close(0.0, config.target_angle));
        assert_eq!(10, config.sample_time_ms);
    }
}
