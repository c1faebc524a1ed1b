// src/controller.rs

//! # Balance PID Controller
//!
//! Wraps a `piddiy::PidController` configured with
//! [`compute_balance`](crate::pid::compute_balance) and adds the state the
//! balance loop needs around it: the millisecond timestamp used to derive
//! `dt`, the output bounds, and the last output.
//!
//! Each [`calculate`](BalanceController::calculate) call:
//!
//! 1. derives `dt` from the tick counter and returns the previous output when
//!    the clock did not advance;
//! 2. runs the PID step with the anti-windup integral clamp;
//! 3. hard-clamps the sum of the terms to `[output_min, output_max]`.

use crate::config::MAX_OUTPUT;
use crate::pid::{compute_balance, BalanceControlData};
use crate::timing::{elapsed_ms, ms_to_seconds};
use crate::{BalanceConfig, Number};
use piddiy::PidController;

/// PID controller driving the pitch angle to its setpoint.
pub struct BalanceController<T: Number> {
    pid: PidController<T, BalanceControlData<T>>,
    output: T,
    output_min: T,
    output_max: T,
    last_update_ms: u32,
    first_update: bool,
}

impl<T: Number> BalanceController<T> {
    /// Creates a controller with the given gains, zeroed running state and
    /// symmetric output bounds of `±MAX_OUTPUT`.
    pub fn new(kp: T, ki: T, kd: T, now_ms: u32) -> Self {
        let max_output = T::from_f32_lossy(MAX_OUTPUT as f32);
        let mut pid = PidController::new();
        pid.compute_fn(compute_balance)
            .set_point(T::zero())
            .kp(kp)
            .ki(ki)
            .kd(kd);

        Self {
            pid,
            output: T::zero(),
            output_min: -max_output,
            output_max: max_output,
            last_update_ms: now_ms,
            first_update: true,
        }
    }

    /// Creates a controller from the gains and output bound of `config`.
    pub fn with_config(config: &BalanceConfig<T>, now_ms: u32) -> Self {
        let mut controller = Self::new(config.kp, config.ki, config.kd, now_ms);
        controller.set_output_limits(-config.max_output, config.max_output);
        controller
    }

    /// Replaces the output bounds without touching the integral state.
    /// Bounds with `min > max` are rejected.
    pub fn set_output_limits(&mut self, min: T, max: T) {
        if max < min {
            log::warn!("rejected output limits {} > {}", min, max);
            return;
        }
        self.output_min = min;
        self.output_max = max;
    }

    /// Runs one PID step toward `setpoint` and returns the clamped output.
    ///
    /// When the tick did not advance since the previous step the previous
    /// output is returned and no state changes. An interval `T` cannot hold
    /// also returns the previous output, but restamps the timer.
    pub fn calculate(&mut self, now_ms: u32, setpoint: T, measured: T) -> T {
        let Some(elapsed) = elapsed_ms(self.last_update_ms, now_ms) else {
            log::trace!("controller step skipped, tick {} did not advance", now_ms);
            return self.output;
        };
        self.last_update_ms = now_ms;
        let Some(dt) = ms_to_seconds::<T>(elapsed) else {
            log::warn!("controller step skipped, {} ms interval out of range", elapsed);
            return self.output;
        };

        self.pid.set_point(setpoint);
        let raw = self.pid.compute(BalanceControlData {
            measurement: measured,
            dt,
            output_min: self.output_min,
            output_max: self.output_max,
            first_update: self.first_update,
        });
        self.first_update = false;
        self.output = raw.clamp(self.output_min, self.output_max);
        self.output
    }

    /// Zeroes the integral, previous error and output and restamps the timer.
    pub fn reset(&mut self, now_ms: u32) {
        self.pid.integral = T::zero();
        self.pid.error = T::zero();
        self.output = T::zero();
        self.last_update_ms = now_ms;
        self.first_update = true;
    }

    /// Replaces all three gains, keeping the running state.
    pub fn set_tunings(&mut self, kp: T, ki: T, kd: T) {
        self.pid.kp(kp).ki(ki).kd(kd);
    }

    /// Replaces the proportional gain.
    pub fn set_kp(&mut self, kp: T) {
        self.pid.kp(kp);
    }

    /// Replaces the integral gain.
    pub fn set_ki(&mut self, ki: T) {
        self.pid.ki(ki);
    }

    /// Replaces the derivative gain.
    pub fn set_kd(&mut self, kd: T) {
        self.pid.kd(kd);
    }

    /// Proportional gain.
    pub fn kp(&self) -> T {
        self.pid.kp
    }

    /// Integral gain.
    pub fn ki(&self) -> T {
        self.pid.ki
    }

    /// Derivative gain.
    pub fn kd(&self) -> T {
        self.pid.kd
    }

    /// Setpoint used by the last step.
    pub fn setpoint(&self) -> T {
        self.pid.set_point
    }

    /// Integral accumulator.
    pub fn integral(&self) -> T {
        self.pid.integral
    }

    /// Error of the last step.
    pub fn previous_error(&self) -> T {
        self.pid.error
    }

    /// Last clamped output.
    pub fn output(&self) -> T {
        self.output
    }

    /// Current `(min, max)` output bounds.
    pub fn output_limits(&self) -> (T, T) {
        (self.output_min, self.output_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use fixed::types::I16F16;

    fn default_controller() -> BalanceController<f32> {
        BalanceController::with_config(&BalanceConfig::new(), 0)
    }

    /// Test the first step with the default gains and a 10 degree lean.
    #[test]
    fn test_controller_first_step_proportional() {
        let mut controller = default_controller();
        let output = controller.calculate(10, 0.0, 10.0);

        assert!(
            (-150.0 - output).abs() < 0.01,
            "Output should be dominated by kp * error: {}",
            output
        );
        assert!(value_close(-10.0, controller.previous_error()));
    }

    /// Test that sustained error never drives the output past its bound.
    #[test]
    fn test_controller_integral_windup() {
        let mut controller = BalanceController::new(1.0_f32, 10.0, 0.0, 0);
        for tick in 1..=1000 {
            let output = controller.calculate(tick * 10, 0.0, -10.0);
            assert!(output.abs() <= 255.0, "Output exceeded bound: {}", output);
            assert!(
                (controller.ki() * controller.integral()).abs() <= 255.0 + TEST_TOLERANCE,
                "Integral term exceeded bound."
            );
        }
        assert!(value_close(255.0, controller.output()), "Output should saturate.");
    }

    /// Test that a zero integral gain accumulates without a clamp.
    #[test]
    fn test_controller_zero_ki() {
        let mut controller = BalanceController::new(0.0_f32, 0.0, 0.0, 0);
        for tick in 1..=100 {
            let output = controller.calculate(tick * 10, 10.0, 0.0);
            assert!(value_close(0.0, output));
        }
        assert!(
            (10.0 - controller.integral()).abs() < 1e-3,
            "Integral should be error * elapsed time: {}",
            controller.integral()
        );
    }

    /// Test that a step on a stalled clock returns the previous output.
    #[test]
    fn test_controller_no_time_elapsed() {
        let mut controller = default_controller();
        let first = controller.calculate(10, 0.0, 10.0);
        let integral = controller.integral();

        let second = controller.calculate(10, 0.0, -40.0);
        assert_eq!(first, second, "Output should be unchanged.");
        assert_eq!(integral, controller.integral(), "Integral should be unchanged.");

        let third = controller.calculate(5, 0.0, -40.0);
        assert_eq!(first, third, "A backwards clock should be ignored.");
    }

    /// Test the derivative term on the second step.
    #[test]
    fn test_controller_derivative() {
        let mut controller = BalanceController::new(0.0_f32, 0.0, 1.0, 0);
        let _ = controller.calculate(10, 0.0, 10.0);
        let output = controller.calculate(20, 0.0, 11.0);
        assert!(
            (-100.0 - output).abs() < 0.01,
            "Derivative should be -1 / 0.01: {}",
            output
        );
    }

    /// Test that reset clears the running state and avoids a derivative kick.
    #[test]
    fn test_controller_reset() {
        let mut controller = BalanceController::new(1.0_f32, 1.0, 1.0, 0);
        for tick in 1..=10 {
            let _ = controller.calculate(tick * 10, 0.0, 5.0);
        }
        controller.reset(500);

        assert!(value_close(0.0, controller.integral()));
        assert!(value_close(0.0, controller.previous_error()));
        assert!(value_close(0.0, controller.output()));

        let output = controller.calculate(510, 0.0, 5.0);
        assert!(
            (-5.05 - output).abs() < 1e-3,
            "No derivative kick after reset: {}",
            output
        );
    }

    /// Test that changing gains keeps the integral.
    #[test]
    fn test_controller_bumpless_tunings() {
        let mut controller = default_controller();
        for tick in 1..=5 {
            let _ = controller.calculate(tick * 10, 0.0, 1.0);
        }
        let integral = controller.integral();

        controller.set_tunings(20.0, 0.1, 0.2);
        assert_eq!(integral, controller.integral());
        assert!(value_close(20.0, controller.kp()));
        assert!(value_close(0.1, controller.ki()));
        assert!(value_close(0.2, controller.kd()));

        controller.set_kp(1.0);
        controller.set_ki(2.0);
        controller.set_kd(3.0);
        assert!(value_close(1.0, controller.kp()));
        assert!(value_close(2.0, controller.ki()));
        assert!(value_close(3.0, controller.kd()));
    }

    /// Test custom output limits, including rejected inverted bounds.
    #[test]
    fn test_controller_output_limits() {
        let mut controller = default_controller();
        controller.set_output_limits(-50.0, 100.0);
        assert_eq!((-50.0, 100.0), controller.output_limits());

        let output = controller.calculate(10, 0.0, 10.0);
        assert!(value_close(-50.0, output), "Output should clamp to the new min.");

        controller.set_output_limits(10.0, -10.0);
        assert_eq!((-50.0, 100.0), controller.output_limits());
    }

    /// Test that a gap too long for a fixed-point type skips one step only.
    #[test]
    fn test_controller_fixed_point_long_gap() {
        let config = BalanceConfig::<I16F16>::new();
        let mut controller = BalanceController::with_config(&config, 0);

        let output = controller.calculate(40_000_000, I16F16::from_num(0), I16F16::from_num(10));
        assert_eq!(I16F16::from_num(0), output, "Gap should skip the step.");

        let output: f32 = controller
            .calculate(40_000_010, I16F16::from_num(0), I16F16::from_num(10))
            .to_num();
        assert!(
            (-150.0 - output).abs() < 0.05,
            "Next step should run from the restamped tick: {}",
            output
        );
    }

    /// Test that the controller also runs on a fixed-point type.
    #[test]
    fn test_controller_fixed_point() {
        let config = BalanceConfig::<I16F16>::new();
        let mut controller = BalanceController::with_config(&config, 0);
        let output = controller.calculate(10, I16F16::from_num(0), I16F16::from_num(10));

        let output: f32 = output.to_num();
        assert!(
            (-150.0 - output).abs() < 0.05,
            "Fixed-point output should match f32: {}",
            output
        );
    }
}
