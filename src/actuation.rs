// src/actuation.rs

//! # Actuation Mapper
//!
//! Converts the scalar controller output into a pair of signed, saturated
//! wheel speeds and hands them to the motor driver. Both wheels receive the
//! same speed since yaw is not controlled.
//!
//! Speeds are integers in `[-max_output, max_output]`. The sign selects the
//! direction and the magnitude becomes the PWM duty register value. A bound
//! wider than `i16` saturates at `i16::MAX`.

use crate::{BalanceConfig, Number};

/// Motor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    /// Left wheel motor.
    Left,
    /// Right wheel motor.
    Right,
}

/// Signed speed command for both wheels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelSpeeds {
    /// Left wheel speed, positive is forward.
    pub left: i16,
    /// Right wheel speed, positive is forward.
    pub right: i16,
}

/// Dual H-bridge motor driver.
///
/// Implementations translate one channel command into the direction pins and
/// the PWM compare register of the hardware.
pub trait MotorDriver {
    /// Driver error type.
    type Error;

    /// Sets the duty magnitude and the rotation direction of one channel.
    fn set_channel_duty_and_direction(
        &mut self,
        channel: Wheel,
        magnitude: u16,
        forward: bool,
    ) -> Result<(), Self::Error>;
}

/// Maps controller output onto wheel speed commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuationMapper<T: Number> {
    dead_zone: T,
    max_output: T,
    limit: i16,
    speeds: WheelSpeeds,
}

impl<T: Number> ActuationMapper<T> {
    /// Creates a mapper with the given dead zone and symmetric output bound.
    pub fn new(dead_zone: T, max_output: T) -> Self {
        let bound = max_output.magnitude();
        let limit = saturate_to_i16(bound);
        if bound.to_i16().is_none() {
            log::warn!("output bound {} saturates wheel speeds at {}", max_output, limit);
        }
        Self {
            dead_zone,
            max_output: max_output.magnitude(),
            limit,
            speeds: WheelSpeeds::default(),
        }
    }

    /// Creates a mapper from the dead zone and output bound of `config`.
    pub fn with_config(config: &BalanceConfig<T>) -> Self {
        Self::new(config.dead_zone, config.max_output)
    }

    /// Maps a control output to identical wheel speeds.
    ///
    /// Outputs inside the dead zone map to zero, larger ones are clamped to
    /// the output bound and truncated toward zero.
    pub fn map_to_motors(&self, control_output: T) -> WheelSpeeds {
        if control_output.magnitude() < self.dead_zone {
            return WheelSpeeds::default();
        }
        let clamped = control_output.clamp(-self.max_output, self.max_output);
        let magnitude = Ord::min(saturate_to_i16(clamped.magnitude()), self.limit);
        let speed = if clamped < T::zero() { -magnitude } else { magnitude };
        WheelSpeeds {
            left: speed,
            right: speed,
        }
    }

    /// Clamps each speed, records the pair, and writes one command per wheel
    /// to `driver`.
    pub fn set_speed<D: MotorDriver>(
        &mut self,
        driver: &mut D,
        left: i16,
        right: i16,
    ) -> Result<(), D::Error> {
        let speeds = WheelSpeeds {
            left: Ord::clamp(left, -self.limit, self.limit),
            right: Ord::clamp(right, -self.limit, self.limit),
        };
        self.speeds = speeds;

        driver.set_channel_duty_and_direction(
            Wheel::Left,
            speeds.left.unsigned_abs(),
            speeds.left >= 0,
        )?;
        driver.set_channel_duty_and_direction(
            Wheel::Right,
            speeds.right.unsigned_abs(),
            speeds.right >= 0,
        )
    }

    /// Maps `control_output` and drives both wheels with the result.
    pub fn drive<D: MotorDriver>(
        &mut self,
        driver: &mut D,
        control_output: T,
    ) -> Result<WheelSpeeds, D::Error> {
        let speeds = self.map_to_motors(control_output);
        self.set_speed(driver, speeds.left, speeds.right)?;
        Ok(self.speeds)
    }

    /// Commands zero speed on both wheels.
    pub fn stop<D: MotorDriver>(&mut self, driver: &mut D) -> Result<(), D::Error> {
        self.set_speed(driver, 0, 0)
    }

    /// Last speeds written to the driver.
    pub fn speeds(&self) -> WheelSpeeds {
        self.speeds
    }
}

/// Truncates a non-negative value toward zero into an `i16`, saturating above
/// the range. NaN maps to zero.
fn saturate_to_i16<T: Number>(value: T) -> i16 {
    value
        .to_i16()
        .unwrap_or_else(|| value.to_f32().map_or(0, |wide| wide as i16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use fixed::types::I16F16;

    fn default_mapper() -> ActuationMapper<f32> {
        ActuationMapper::with_config(&BalanceConfig::new())
    }

    /// Test that outputs inside the dead zone stop the wheels.
    #[test]
    fn test_actuation_dead_zone() {
        let mapper = default_mapper();
        assert_eq!(WheelSpeeds { left: 0, right: 0 }, mapper.map_to_motors(1.0));
        assert_eq!(WheelSpeeds { left: 0, right: 0 }, mapper.map_to_motors(-1.99));
        assert_eq!(WheelSpeeds { left: 2, right: 2 }, mapper.map_to_motors(2.0));
    }

    /// Test saturation in both directions.
    #[test]
    fn test_actuation_saturation() {
        let mapper = default_mapper();
        assert_eq!(WheelSpeeds { left: 255, right: 255 }, mapper.map_to_motors(300.0));
        assert_eq!(WheelSpeeds { left: -255, right: -255 }, mapper.map_to_motors(-300.0));
    }

    /// Test that a bound wider than `i16` saturates instead of stopping the
    /// wheels.
    #[test]
    fn test_actuation_wide_bound() {
        let mapper = ActuationMapper::<f32>::new(2.0, 40000.0);
        assert_eq!(
            WheelSpeeds { left: i16::MAX, right: i16::MAX },
            mapper.map_to_motors(35000.0)
        );
        assert_eq!(
            WheelSpeeds { left: -i16::MAX, right: -i16::MAX },
            mapper.map_to_motors(-50000.0)
        );
        assert_eq!(
            WheelSpeeds { left: 1000, right: 1000 },
            mapper.map_to_motors(1000.0)
        );
    }

    /// Test that a NaN output stops the wheels.
    #[test]
    fn test_actuation_nan_output() {
        let mapper = default_mapper();
        assert_eq!(WheelSpeeds { left: 0, right: 0 }, mapper.map_to_motors(f32::NAN));
    }

    /// Test truncation toward zero.
    #[test]
    fn test_actuation_truncation() {
        let mapper = default_mapper();
        assert_eq!(WheelSpeeds { left: 99, right: 99 }, mapper.map_to_motors(99.9));
        assert_eq!(WheelSpeeds { left: -99, right: -99 }, mapper.map_to_motors(-99.9));

        let fixed_mapper = ActuationMapper::with_config(&BalanceConfig::<I16F16>::new());
        assert_eq!(
            WheelSpeeds { left: -42, right: -42 },
            fixed_mapper.map_to_motors(I16F16::from_num(-42.75))
        );
    }

    /// Test that each wheel is clamped independently and written once.
    #[test]
    fn test_actuation_set_speed() {
        let mut mapper = default_mapper();
        let mut driver = RecordingDriver::default();

        mapper.set_speed(&mut driver, 400, -30).unwrap();

        assert_eq!(WheelSpeeds { left: 255, right: -30 }, mapper.speeds());
        assert_eq!(
            &[(Wheel::Left, 255, true), (Wheel::Right, 30, false)],
            driver.calls.as_slice()
        );
    }

    /// Test drive and stop against the recording driver.
    #[test]
    fn test_actuation_drive_and_stop() {
        let mut mapper = default_mapper();
        let mut driver = RecordingDriver::default();

        let speeds = mapper.drive(&mut driver, -120.6).unwrap();
        assert_eq!(WheelSpeeds { left: -120, right: -120 }, speeds);

        mapper.stop(&mut driver).unwrap();
        assert_eq!(WheelSpeeds::default(), mapper.speeds());
        assert_eq!(
            &[(Wheel::Left, 0, true), (Wheel::Right, 0, true)],
            &driver.calls[2..]
        );
    }

    /// Test that a failing driver propagates its error.
    #[test]
    fn test_actuation_driver_error() {
        let mut mapper = default_mapper();
        let mut driver = RecordingDriver {
            fail: true,
            ..Default::default()
        };
        assert_eq!(Err(DriverFault), mapper.drive(&mut driver, 50.0));
    }
}
