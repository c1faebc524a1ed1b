// src/protocol/command.rs

//! # Command Grammar
//!
//! Operator commands are single ASCII lines of whitespace separated tokens.
//! Tokens are case-sensitive.
//!
//! | line                | command                |
//! |---------------------|------------------------|
//! | `set kp <float>`    | `SetGain(Gain::P, v)`  |
//! | `set ki <float>`    | `SetGain(Gain::I, v)`  |
//! | `set kd <float>`    | `SetGain(Gain::D, v)`  |
//! | `set angle <float>` | `SetTargetAngle(v)`    |
//! | `get status`        | `GetStatus`            |
//! | `reset`             | `Reset`                |
//!
//! Anything else, including extra tokens and non-finite values, parses as
//! `Unrecognized`.

/// PID gain selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gain {
    /// Proportional gain.
    P,
    /// Integral gain.
    I,
    /// Derivative gain.
    D,
}

impl Gain {
    /// Label used in replies.
    pub fn label(self) -> &'static str {
        match self {
            Gain::P => "KP",
            Gain::I => "KI",
            Gain::D => "KD",
        }
    }
}

/// Decoded operator command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Replace one PID gain.
    SetGain(Gain, f32),
    /// Replace the target pitch angle in degrees.
    SetTargetAngle(f32),
    /// Report gains and target.
    GetStatus,
    /// Reset the PID running state.
    Reset,
    /// Line that matches no rule.
    Unrecognized,
}

impl Command {
    /// Parses one line without its terminator.
    pub fn parse(line: &str) -> Self {
        let mut tokens = line.split_ascii_whitespace();
        let command = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some("set"), Some(name), Some(value)) => match parse_value(value) {
                Some(value) => match name {
                    "kp" => Command::SetGain(Gain::P, value),
                    "ki" => Command::SetGain(Gain::I, value),
                    "kd" => Command::SetGain(Gain::D, value),
                    "angle" => Command::SetTargetAngle(value),
                    _ => Command::Unrecognized,
                },
                None => Command::Unrecognized,
            },
            (Some("get"), Some("status"), None) => Command::GetStatus,
            (Some("reset"), None, None) => Command::Reset,
            _ => Command::Unrecognized,
        };

        if tokens.next().is_some() {
            Command::Unrecognized
        } else {
            command
        }
    }
}

fn parse_value(token: &str) -> Option<f32> {
    token.parse::<f32>().ok().filter(|value| value.is_finite())
}
