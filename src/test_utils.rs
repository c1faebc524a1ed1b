// src/test_utils.rs

//! This module contains utilities for testing: float comparison helpers
//! and test doubles for the sensor, delay, motor driver and byte feed.

use crate::actuation::{MotorDriver, Wheel};
use crate::imu::{Imu, InertialSensor, RawSample, WHO_AM_I_VALUE};
use crate::protocol::{ByteOutcome, CommandProtocol};
use core::fmt::Write;
use embedded_hal::delay::DelayNs;
use heapless::Vec;

/// A constant defining the tolerance within which floating-point values
/// are considered close enough to be equal.
pub const TEST_TOLERANCE: f32 = 1e-5;

/// Checks if two floating point numbers are close enough to be considered
/// equal.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` is less than
/// `TEST_TOLERANCE`, otherwise `false`.
pub fn value_close(target: f32, value: f32) -> bool {
    (target - value).abs() < TEST_TOLERANCE
}

/// Checks if two floating point numbers are not close enough to be
/// considered equal.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` exceeds
/// `TEST_TOLERANCE`, otherwise `false`.
pub fn value_not_close(target: f32, value: f32) -> bool {
    TEST_TOLERANCE <= (target - value).abs()
}

/// Transport error of [`ScriptedSensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorFault;

/// Inertial sensor returning a fixed sample.
#[derive(Debug)]
pub struct ScriptedSensor {
    /// Identity register value.
    pub identity: u8,
    /// Sample returned by every read.
    pub sample: RawSample,
    /// Fail every read when set.
    pub fail_reads: bool,
    /// Set once `configure` was called.
    pub configured: bool,
    /// Number of successful reads.
    pub reads: u32,
}

impl Default for ScriptedSensor {
    fn default() -> Self {
        Self {
            identity: WHO_AM_I_VALUE,
            sample: RawSample {
                accel: [0, 0, 16384],
                gyro: [0, 0, 0],
            },
            fail_reads: false,
            configured: false,
            reads: 0,
        }
    }
}

impl InertialSensor for ScriptedSensor {
    type Error = SensorFault;

    fn identity(&mut self) -> Result<u8, SensorFault> {
        Ok(self.identity)
    }

    fn configure(&mut self) -> Result<(), SensorFault> {
        self.configured = true;
        Ok(())
    }

    fn read_raw(&mut self) -> Result<RawSample, SensorFault> {
        if self.fail_reads {
            return Err(SensorFault);
        }
        self.reads += 1;
        Ok(self.sample)
    }
}

/// Initialized IMU over a [`ScriptedSensor`] returning `sample`, without
/// calibration.
pub fn scripted_imu(sample: RawSample) -> Imu<ScriptedSensor> {
    let sensor = ScriptedSensor {
        sample,
        ..Default::default()
    };
    Imu::init(sensor, &mut NoDelay::default(), 0).unwrap()
}

/// Delay that returns immediately and records the requested time.
#[derive(Debug, Default)]
pub struct NoDelay {
    /// Total requested delay in nanoseconds.
    pub total_ns: u64,
}

impl NoDelay {
    /// Total requested delay in milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

/// Error of [`RecordingDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverFault;

/// Motor driver recording every channel command.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    /// Commands in call order.
    pub calls: Vec<(Wheel, u16, bool), 32>,
    /// Fail every call when set.
    pub fail: bool,
}

impl MotorDriver for RecordingDriver {
    type Error = DriverFault;

    fn set_channel_duty_and_direction(
        &mut self,
        channel: Wheel,
        magnitude: u16,
        forward: bool,
    ) -> Result<(), DriverFault> {
        if self.fail {
            return Err(DriverFault);
        }
        let _ = self.calls.push((channel, magnitude, forward));
        Ok(())
    }
}

/// Feeds `bytes` one at a time and returns the outcome of the last one.
pub fn feed<const N: usize, W: Write>(
    protocol: &mut CommandProtocol<N>,
    bytes: &[u8],
    out: &mut W,
) -> ByteOutcome {
    let mut outcome = ByteOutcome::Accumulating;
    for &byte in bytes {
        outcome = protocol.on_byte_received(byte, out).unwrap();
    }
    outcome
}
