// src/protocol/dispatch.rs

//! # Command Dispatch
//!
//! Applies decoded commands to the controller and the target angle and
//! writes one acknowledgment line per command. Dispatch runs in the control
//! loop context, so gains and target are never written concurrently.

use super::{send_line, Command, Gain};
use crate::{BalanceController, Number};
use core::fmt::{self, Write};

/// Reply to a command that matched no rule.
pub const UNKNOWN_COMMAND_REPLY: &str = "unknown command";
/// Reply to a value the numeric type cannot represent.
pub const OUT_OF_RANGE_REPLY: &str = "value out of range";
/// Reply to a reset.
pub const RESET_REPLY: &str = "PID reset";
/// Reply to a target angle change.
pub const TARGET_REPLY: &str = "Target angle updated";

/// Side of the command channel read by the control loop.
///
/// Checking for a command never blocks; the loop polls once per tick.
pub trait CommandSource {
    /// Returns `true` when a command is waiting.
    fn has_command(&self) -> bool;

    /// Removes and returns the waiting command.
    fn take_command(&mut self) -> Option<Command>;

    /// Applies the waiting command, if any, and writes its reply to `out`.
    /// Returns the applied command.
    fn process_command<T: Number, W: Write>(
        &mut self,
        pid: &mut BalanceController<T>,
        target_angle: &mut T,
        now_ms: u32,
        out: &mut W,
    ) -> Result<Option<Command>, fmt::Error> {
        match self.take_command() {
            Some(command) => {
                apply_command(command, pid, target_angle, now_ms, out)?;
                Ok(Some(command))
            }
            None => Ok(None),
        }
    }
}

/// Applies one command and writes its reply.
pub fn apply_command<T: Number, W: Write>(
    command: Command,
    pid: &mut BalanceController<T>,
    target_angle: &mut T,
    now_ms: u32,
    out: &mut W,
) -> fmt::Result {
    log::debug!("applying {:?}", command);
    match command {
        Command::SetGain(gain, value) => {
            let Some(value) = T::from_f32(value) else {
                return send_line(out, format_args!("{}", OUT_OF_RANGE_REPLY));
            };
            match gain {
                Gain::P => pid.set_kp(value),
                Gain::I => pid.set_ki(value),
                Gain::D => pid.set_kd(value),
            }
            send_line(out, format_args!("{} updated", gain.label()))
        }
        Command::SetTargetAngle(value) => {
            let Some(value) = T::from_f32(value) else {
                return send_line(out, format_args!("{}", OUT_OF_RANGE_REPLY));
            };
            *target_angle = value;
            send_line(out, format_args!("{}", TARGET_REPLY))
        }
        Command::GetStatus => send_line(
            out,
            format_args!(
                "KP:{:.2}, KI:{:.2}, KD:{:.2}, Target:{:.2}",
                pid.kp(),
                pid.ki(),
                pid.kd(),
                *target_angle
            ),
        ),
        Command::Reset => {
            pid.reset(now_ms);
            send_line(out, format_args!("{}", RESET_REPLY))
        }
        Command::Unrecognized => send_line(out, format_args!("{}", UNKNOWN_COMMAND_REPLY)),
    }
}
