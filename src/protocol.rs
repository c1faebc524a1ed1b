// src/protocol.rs

//! # Operator Command Protocol
//!
//! Line oriented text protocol used to retune the balance controller while it
//! runs. Bytes arrive one at a time from a receive interrupt; complete lines
//! are parsed there and handed to the control loop through a single-slot
//! lock-free queue, so the loop only ever sees whole, immutable commands.
//!
//! ```text
//! receive interrupt                      control loop
//! CommandReceiver::on_byte_received ──▶ [slot] ──▶ CommandDispatcher::process_command
//!   LineBuffer ─▶ Command::parse
//! ```
//!
//! If a second line completes before the loop drained the slot, the newer
//! command is dropped, the operator is told so, and the byte reports
//! [`ByteOutcome::Busy`].
//!
//! Replies and telemetry are plain text lines ending in CRLF, written to any
//! `core::fmt::Write` sink.
//!
//! Example Usage
//! ```
//! use balance_stabilization::protocol::{CommandProtocol, CommandSource};
//! use balance_stabilization::{BalanceConfig, BalanceController};
//! use heapless::String;
//!
//! let mut protocol: CommandProtocol = CommandProtocol::new();
//! let (mut receiver, mut dispatcher) = protocol.split();
//! let mut pid = BalanceController::with_config(&BalanceConfig::<f32>::new(), 0);
//! let mut target = 0.0;
//! let mut uart: String<64> = String::new();
//!
//! for &byte in b"set kp 20.0\r" {
//!     receiver.on_byte_received(byte, &mut uart).unwrap();
//! }
//! assert!(dispatcher.has_command());
//!
//! dispatcher.process_command(&mut pid, &mut target, 10, &mut uart).unwrap();
//! assert!(!dispatcher.has_command());
//! assert_eq!(pid.kp(), 20.0);
//! assert_eq!(uart.as_str(), "KP updated\r\n");
//! ```

pub mod command;
pub use command::*;
pub mod dispatch;
pub use dispatch::*;
pub mod line;
pub use line::*;

use crate::config::RX_BUFFER_SIZE;
use core::fmt::{self, Write};
use heapless::spsc::{Consumer, Producer, Queue};

/// Banner written once the controller is up.
pub const READY_BANNER: &str = "balance controller ready";
/// Notice written when a line outgrew the receive buffer.
pub const OVERFLOW_REPLY: &str = "buffer full, line discarded";
/// Notice written when a command was dropped behind a pending one.
pub const BUSY_REPLY: &str = "command dropped, busy";

/// Queue storage for one pending command. A heapless queue of size `N` holds
/// `N - 1` items.
pub const COMMAND_SLOT_SIZE: usize = 2;

/// Result of one received byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOutcome {
    /// Byte consumed, no line complete.
    Accumulating,
    /// A line completed and its command is waiting for the loop.
    Queued,
    /// A line completed while the previous command was still waiting; the
    /// new command was dropped.
    Busy,
    /// The line outgrew the buffer and was discarded.
    Overflow,
}

/// Owner of the line buffer and the pending command slot.
///
/// Either drive it from one context through its own methods, or
/// [`split`](CommandProtocol::split) it into an interrupt side receiver and
/// a loop side dispatcher.
pub struct CommandProtocol<const N: usize = RX_BUFFER_SIZE> {
    line: LineBuffer<N>,
    slot: Queue<Command, COMMAND_SLOT_SIZE>,
}

impl<const N: usize> CommandProtocol<N> {
    /// Creates an empty protocol state, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            line: LineBuffer::new(),
            slot: Queue::new(),
        }
    }

    /// Splits into the receive half and the dispatch half.
    pub fn split(&mut self) -> (CommandReceiver<'_, N>, CommandDispatcher<'_>) {
        let (producer, consumer) = self.slot.split();
        (
            CommandReceiver {
                line: &mut self.line,
                producer,
            },
            CommandDispatcher { consumer },
        )
    }

    /// Feeds one received byte when ingress and dispatch share a context.
    pub fn on_byte_received<W: Write>(
        &mut self,
        byte: u8,
        out: &mut W,
    ) -> Result<ByteOutcome, fmt::Error> {
        let (mut receiver, _) = self.split();
        receiver.on_byte_received(byte, out)
    }
}

impl<const N: usize> Default for CommandProtocol<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CommandSource for CommandProtocol<N> {
    fn has_command(&self) -> bool {
        !self.slot.is_empty()
    }

    fn take_command(&mut self) -> Option<Command> {
        self.slot.dequeue()
    }
}

/// Receive half, owned by the byte arrival interrupt.
pub struct CommandReceiver<'a, const N: usize> {
    line: &'a mut LineBuffer<N>,
    producer: Producer<'a, Command, COMMAND_SLOT_SIZE>,
}

impl<'a, const N: usize> CommandReceiver<'a, N> {
    /// Feeds one received byte. A completed line is parsed and queued for the
    /// loop; an overflow or a dropped command writes a notice to `out`.
    pub fn on_byte_received<W: Write>(
        &mut self,
        byte: u8,
        out: &mut W,
    ) -> Result<ByteOutcome, fmt::Error> {
        match self.line.push(byte) {
            LineEvent::Accumulating => Ok(ByteOutcome::Accumulating),
            LineEvent::Overflow => {
                log::warn!("receive buffer overflow, line discarded");
                send_line(out, format_args!("{}", OVERFLOW_REPLY))?;
                Ok(ByteOutcome::Overflow)
            }
            LineEvent::Line(command) => match self.producer.enqueue(command) {
                Ok(()) => Ok(ByteOutcome::Queued),
                Err(dropped) => {
                    log::warn!("dropped {:?}, previous command still pending", dropped);
                    send_line(out, format_args!("{}", BUSY_REPLY))?;
                    Ok(ByteOutcome::Busy)
                }
            },
        }
    }
}

/// Dispatch half, owned by the control loop.
pub struct CommandDispatcher<'a> {
    consumer: Consumer<'a, Command, COMMAND_SLOT_SIZE>,
}

impl<'a> CommandSource for CommandDispatcher<'a> {
    fn has_command(&self) -> bool {
        self.consumer.ready()
    }

    fn take_command(&mut self) -> Option<Command> {
        self.consumer.dequeue()
    }
}

/// Writes one line followed by CRLF.
pub fn send_line<W: Write>(out: &mut W, args: fmt::Arguments) -> fmt::Result {
    out.write_fmt(args)?;
    out.write_str("\r\n")
}

/// Writes the ready banner.
pub fn send_banner<W: Write>(out: &mut W) -> fmt::Result {
    send_line(out, format_args!("{}", READY_BANNER))
}
