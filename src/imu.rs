// src/imu.rs

//! # Inertial Measurement
//!
//! Conversion layer between an MPU-6050 class sensor and the estimator. The
//! register transport stays outside the crate behind [`InertialSensor`];
//! this module checks the device identity, scales raw counts into physical
//! units, derives tilt angles from the gravity vector and removes the gyro
//! rate offset measured at startup.
//!
//! Ranges are fixed at ±2 g and ±250 °/s.

use crate::Error;
use embedded_hal::delay::DelayNs;
use libm::{atan2f, sqrtf};

/// Expected identity register value.
pub const WHO_AM_I_VALUE: u8 = 0x68;
/// Accelerometer sensitivity at ±2 g, in LSB per g.
pub const ACCEL_SCALE: f32 = 16384.0;
/// Gyroscope sensitivity at ±250 °/s, in LSB per °/s.
pub const GYRO_SCALE: f32 = 131.0;
/// Radians to degrees.
pub const RAD_TO_DEG: f32 = 57.29578;
/// Wait after waking the sensor before the first reads.
pub const WAKE_DELAY_MS: u32 = 100;
/// Pause between two calibration samples.
pub const CALIBRATION_INTERVAL_MS: u32 = 5;

/// Raw sensor counts, axes in X, Y, Z order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    /// Accelerometer counts.
    pub accel: [i16; 3],
    /// Gyroscope counts.
    pub gyro: [i16; 3],
}

/// Register level access to the inertial sensor.
pub trait InertialSensor {
    /// Transport error type.
    type Error;

    /// Reads the identity register.
    fn identity(&mut self) -> Result<u8, Self::Error>;

    /// Wakes the device and selects the ±2 g and ±250 °/s ranges.
    fn configure(&mut self) -> Result<(), Self::Error>;

    /// Reads one accelerometer and gyroscope sample.
    fn read_raw(&mut self) -> Result<RawSample, Self::Error>;
}

/// One converted sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuReading {
    /// Tilt about the X axis from the accelerometer, in degrees.
    pub angle_x: f32,
    /// Tilt about the Y axis from the accelerometer, in degrees.
    pub angle_y: f32,
    /// Offset corrected rate about X, in degrees per second.
    pub gyro_x: f32,
    /// Offset corrected rate about Y, in degrees per second.
    pub gyro_y: f32,
}

impl ImuReading {
    /// Converts raw counts, subtracting the per-axis gyro offset.
    pub fn from_raw(raw: &RawSample, gyro_offset: &[f32; 3]) -> Self {
        let [ax, ay, az] = raw.accel.map(|count| f32::from(count) / ACCEL_SCALE);
        let [gx, gy, _] = scale_gyro(raw);

        Self {
            angle_x: atan2f(ay, az) * RAD_TO_DEG,
            angle_y: atan2f(-ax, sqrtf(ay * ay + az * az)) * RAD_TO_DEG,
            gyro_x: gx - gyro_offset[0],
            gyro_y: gy - gyro_offset[1],
        }
    }
}

fn scale_gyro(raw: &RawSample) -> [f32; 3] {
    raw.gyro.map(|count| f32::from(count) / GYRO_SCALE)
}

/// Initialized inertial sensor with its gyro offsets.
#[derive(Debug)]
pub struct Imu<S: InertialSensor> {
    sensor: S,
    gyro_offset: [f32; 3],
}

impl<S: InertialSensor> Imu<S> {
    /// Checks the sensor identity, configures it, waits for it to settle and
    /// calibrates the gyro offsets over `calibration_samples` reads.
    ///
    /// The robot must be held still while this runs.
    pub fn init<D: DelayNs>(
        mut sensor: S,
        delay: &mut D,
        calibration_samples: u16,
    ) -> Result<Self, Error<S::Error>> {
        let found = sensor.identity().map_err(Error::Sensor)?;
        if found != WHO_AM_I_VALUE {
            log::warn!("unexpected inertial sensor identity 0x{:02x}", found);
            return Err(Error::SensorIdentity { found });
        }
        sensor.configure().map_err(Error::Sensor)?;
        delay.delay_ms(WAKE_DELAY_MS);
        log::info!("inertial sensor configured");

        let mut imu = Self {
            sensor,
            gyro_offset: [0.0; 3],
        };
        imu.calibrate(delay, calibration_samples)?;
        Ok(imu)
    }

    /// Averages the scaled gyro rate over `samples` reads, pausing between
    /// reads, and stores the result as the new offset. Zero samples leave the
    /// offsets unchanged.
    pub fn calibrate<D: DelayNs>(
        &mut self,
        delay: &mut D,
        samples: u16,
    ) -> Result<(), Error<S::Error>> {
        if samples == 0 {
            return Ok(());
        }

        let mut sum = [0.0_f32; 3];
        for _ in 0..samples {
            let raw = self.sensor.read_raw().map_err(Error::Sensor)?;
            for (total, rate) in sum.iter_mut().zip(scale_gyro(&raw)) {
                *total += rate;
            }
            delay.delay_ms(CALIBRATION_INTERVAL_MS);
        }

        let count = f32::from(samples);
        self.gyro_offset = sum.map(|total| total / count);
        log::info!(
            "gyro offsets over {} samples: {:.3}, {:.3}, {:.3}",
            samples,
            self.gyro_offset[0],
            self.gyro_offset[1],
            self.gyro_offset[2]
        );
        Ok(())
    }

    /// Reads and converts one sample.
    pub fn read(&mut self) -> Result<ImuReading, Error<S::Error>> {
        let raw = self.sensor.read_raw().map_err(Error::Sensor)?;
        Ok(ImuReading::from_raw(&raw, &self.gyro_offset))
    }

    /// Gyro offsets in degrees per second, X, Y, Z.
    pub fn gyro_offset(&self) -> [f32; 3] {
        self.gyro_offset
    }

    /// Borrows the underlying sensor.
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// Mutably borrows the underlying sensor.
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Returns the underlying sensor.
    pub fn release(self) -> S {
        self.sensor
    }
}
