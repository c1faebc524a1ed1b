// src/control_loop.rs

//! # Balance Control Loop
//!
//! Fixed period orchestrator owning the estimator, the controller, the
//! actuation mapper and the target angle. Each tick runs the full chain
//! to completion:
//!
//! 1. read one IMU sample;
//! 2. fuse the accelerometer angle and gyro rate into the filtered angle;
//! 3. compute the PID output toward the target angle;
//! 4. map the output to wheel speeds and drive the motors;
//! 5. write the telemetry line `Angle:<a>, Output:<o>`;
//! 6. apply at most one pending operator command.
//!
//! The command channel is polled, never awaited, so a tick always takes
//! bounded time.

use crate::actuation::{ActuationMapper, MotorDriver, WheelSpeeds};
use crate::imu::{Imu, InertialSensor};
use crate::protocol::{send_banner, send_line, Command, CommandSource};
use crate::{AttitudeEstimator, BalanceConfig, BalanceController, Error, Number};
use core::fmt::Write;

/// Outcome of one control tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport<T> {
    /// Filtered pitch angle in degrees.
    pub angle: T,
    /// Clamped controller output.
    pub output: T,
    /// Speeds written to the motors.
    pub speeds: WheelSpeeds,
    /// Operator command applied at the end of the tick.
    pub command: Option<Command>,
}

/// Self-balancing control loop.
pub struct ControlLoop<T: Number> {
    estimator: AttitudeEstimator<T>,
    controller: BalanceController<T>,
    mapper: ActuationMapper<T>,
    target_angle: T,
    period_ms: u32,
    last_tick_ms: u32,
}

impl<T: Number> ControlLoop<T> {
    /// Creates a loop using the provided configuration, stamped at `now_ms`.
    pub fn with_config(config: &BalanceConfig<T>, now_ms: u32) -> Self {
        Self {
            estimator: AttitudeEstimator::with_config(config, now_ms),
            controller: BalanceController::with_config(config, now_ms),
            mapper: ActuationMapper::with_config(config),
            target_angle: config.target_angle,
            period_ms: config.sample_time_ms,
            last_tick_ms: now_ms,
        }
    }

    /// Creates a loop with the default configuration.
    pub fn new(now_ms: u32) -> Self {
        Self::with_config(&BalanceConfig::new(), now_ms)
    }

    /// Seeds the estimator with the current accelerometer angle, restamps
    /// all timers and writes the ready banner.
    pub fn start<S: InertialSensor, W: Write>(
        &mut self,
        now_ms: u32,
        imu: &mut Imu<S>,
        out: &mut W,
    ) -> Result<(), Error<S::Error>> {
        let reading = imu.read()?;
        self.estimator.init(now_ms);
        self.estimator.set_angle(T::from_f32_lossy(reading.angle_x));
        self.controller.reset(now_ms);
        self.last_tick_ms = now_ms;
        log::info!("control loop started at {:.2} deg", reading.angle_x);
        send_banner(out)?;
        Ok(())
    }

    /// Returns `true` once a full period elapsed since the last tick.
    pub fn is_due(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.last_tick_ms) >= self.period_ms
    }

    /// Runs one tick unconditionally.
    pub fn tick<S, M, C, W>(
        &mut self,
        now_ms: u32,
        imu: &mut Imu<S>,
        driver: &mut M,
        commands: &mut C,
        out: &mut W,
    ) -> Result<TickReport<T>, Error<S::Error, M::Error>>
    where
        S: InertialSensor,
        M: MotorDriver,
        C: CommandSource,
        W: Write,
    {
        self.last_tick_ms = now_ms;

        let reading = imu.read().map_err(|error| error.with_motor_error())?;
        let measured = T::from_f32_lossy(reading.angle_x);
        let gyro_rate = T::from_f32_lossy(reading.gyro_x);

        let angle = self.estimator.update(now_ms, measured, gyro_rate);
        let output = self.controller.calculate(now_ms, self.target_angle, angle);
        let speeds = self.mapper.drive(driver, output).map_err(Error::Motor)?;

        send_line(out, format_args!("Angle:{:.2}, Output:{:.2}", angle, output))?;

        let command = if commands.has_command() {
            commands.process_command(&mut self.controller, &mut self.target_angle, now_ms, out)?
        } else {
            None
        };

        Ok(TickReport {
            angle,
            output,
            speeds,
            command,
        })
    }

    /// Runs one tick if a period elapsed, otherwise does nothing.
    pub fn poll<S, M, C, W>(
        &mut self,
        now_ms: u32,
        imu: &mut Imu<S>,
        driver: &mut M,
        commands: &mut C,
        out: &mut W,
    ) -> Result<Option<TickReport<T>>, Error<S::Error, M::Error>>
    where
        S: InertialSensor,
        M: MotorDriver,
        C: CommandSource,
        W: Write,
    {
        if !self.is_due(now_ms) {
            return Ok(None);
        }
        self.tick(now_ms, imu, driver, commands, out).map(Some)
    }

    /// Target pitch angle in degrees.
    pub fn target_angle(&self) -> T {
        self.target_angle
    }

    /// Replaces the target pitch angle.
    pub fn set_target_angle(&mut self, target_angle: T) {
        self.target_angle = target_angle;
    }

    /// Loop period in milliseconds.
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// The attitude estimator.
    pub fn estimator(&self) -> &AttitudeEstimator<T> {
        &self.estimator
    }

    /// The PID controller.
    pub fn controller(&self) -> &BalanceController<T> {
        &self.controller
    }

    /// Mutable access to the PID controller.
    pub fn controller_mut(&mut self) -> &mut BalanceController<T> {
        &mut self.controller
    }

    /// The actuation mapper.
    pub fn mapper(&self) -> &ActuationMapper<T> {
        &self.mapper
    }

    /// Mutable access to the actuation mapper, e.g. to stop the motors.
    pub fn mapper_mut(&mut self) -> &mut ActuationMapper<T> {
        &mut self.mapper
    }
}
