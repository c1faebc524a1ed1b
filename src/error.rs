// src/error.rs

//! Error type shared by the fallible entry points of the crate.
//!
//! The numeric core never fails. Errors only come from the collaborators
//! around it: the inertial sensor transport, the motor driver and the text
//! output channel.

use core::convert::Infallible;
use core::fmt::{self, Debug, Display, Formatter};

/// Failure reported by a collaborator of the stabilizer.
///
/// `S` is the inertial sensor transport error and `M` the motor driver
/// error. Calls that never touch the motors use the default `Infallible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<S, M = Infallible> {
    /// The sensor answered the identity query with an unexpected value.
    SensorIdentity {
        /// Identity register value that was read.
        found: u8,
    },
    /// The sensor transport failed.
    Sensor(S),
    /// The motor driver rejected a command.
    Motor(M),
    /// Writing a reply or telemetry line failed.
    Output,
}

impl<S> Error<S> {
    /// Carries a sensor side error into a context that also drives motors.
    pub fn with_motor_error<M>(self) -> Error<S, M> {
        match self {
            Error::SensorIdentity { found } => Error::SensorIdentity { found },
            Error::Sensor(error) => Error::Sensor(error),
            Error::Motor(never) => match never {},
            Error::Output => Error::Output,
        }
    }
}

impl<S, M> From<fmt::Error> for Error<S, M> {
    fn from(_: fmt::Error) -> Self {
        Error::Output
    }
}

impl<S: Debug, M: Debug> Display for Error<S, M> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Error::SensorIdentity { found } => {
                write!(f, "inertial sensor identity mismatch: 0x{:02x}", found)
            }
            Error::Sensor(error) => write!(f, "inertial sensor error {:?}", error),
            Error::Motor(error) => write!(f, "motor driver error {:?}", error),
            Error::Output => write!(f, "output channel write failed"),
        }
    }
}
