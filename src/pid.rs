// src/pid.rs

//! # PID Control Module
//!
//! This module provides the compute function and control data structure
//! used by the balance controller's PID (Proportional-Integral-Derivative)
//! calculation.

pub mod balance;
pub use balance::*;
