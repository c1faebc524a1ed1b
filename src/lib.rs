// src/lib.rs

//! # Self-Balancing Robot Stabilization
//!
//! This crate provides a `no_std`, no-alloc balance controller for a
//! two-wheeled self-balancing robot. It fuses accelerometer and gyroscope
//! readings into a pitch estimate with a Kalman filter, drives that estimate
//! to a target angle with an anti-windup PID controller, maps the result to
//! saturated wheel commands, and accepts live retuning over a line-based
//! serial command channel.
//!
//! All numeric components are generic over [`Number`], so the same code runs
//! with `f32` or with a fixed-point type such as `fixed::types::I16F16`.
//!
//! Hardware stays behind three traits: [`InertialSensor`] for the IMU
//! register transport, [`MotorDriver`] for the H-bridge, and
//! `core::fmt::Write` for the serial output.

#![no_std]
#![deny(missing_docs)]

pub mod actuation;
pub mod config;
pub mod control_loop;
pub mod controller;
pub mod encoder;
pub mod error;
pub mod estimator;
pub mod imu;
pub mod number;
pub mod pid;
pub mod protocol;
pub mod timing;

#[doc(inline)]
pub use actuation::{ActuationMapper, MotorDriver, Wheel, WheelSpeeds};
#[doc(inline)]
pub use config::BalanceConfig;
#[doc(inline)]
pub use control_loop::{ControlLoop, TickReport};
#[doc(inline)]
pub use controller::BalanceController;
#[doc(inline)]
pub use encoder::RotationCounters;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use estimator::AttitudeEstimator;
#[doc(inline)]
pub use imu::{Imu, ImuReading, InertialSensor, RawSample};
#[doc(inline)]
pub use number::Number;
#[doc(inline)]
pub use protocol::{Command, CommandProtocol, CommandSource, Gain};

#[cfg(test)]
mod test_utils;
