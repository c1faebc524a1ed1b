// src/protocol/line.rs

//! # Line Accumulator
//!
//! Byte at a time state machine that turns the receive stream into lines.
//! CR and LF both terminate a line, backspace and delete erase the last
//! byte, and a line that outgrows the buffer is discarded as a whole.
//!
//! A buffer of `N` bytes holds at most `N - 1` line bytes, so the `N`th
//! consecutive non-terminator byte overflows. The overflowing byte is
//! dropped, not used to start the next line.

use super::Command;
use heapless::Vec;

/// Backspace control byte.
pub const BACKSPACE: u8 = 0x08;
/// Delete control byte, sent by most terminals for the backspace key.
pub const DELETE: u8 = 0x7F;

/// Result of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineEvent {
    /// Byte consumed, no line complete.
    Accumulating,
    /// A terminator completed a non-empty line.
    Line(Command),
    /// The buffer was full and has been cleared.
    Overflow,
}

/// Bounded receive line buffer.
#[derive(Debug, Default)]
pub struct LineBuffer<const N: usize> {
    bytes: Vec<u8, N>,
}

impl<const N: usize> LineBuffer<N> {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Feeds one received byte.
    pub fn push(&mut self, byte: u8) -> LineEvent {
        match byte {
            b'\r' | b'\n' => {
                if self.bytes.is_empty() {
                    return LineEvent::Accumulating;
                }
                let command = match core::str::from_utf8(&self.bytes) {
                    Ok(line) => Command::parse(line),
                    Err(_) => Command::Unrecognized,
                };
                self.bytes.clear();
                LineEvent::Line(command)
            }
            BACKSPACE | DELETE => {
                let _ = self.bytes.pop();
                LineEvent::Accumulating
            }
            _ => {
                if self.bytes.len() + 1 < N && self.bytes.push(byte).is_ok() {
                    LineEvent::Accumulating
                } else {
                    self.bytes.clear();
                    LineEvent::Overflow
                }
            }
        }
    }

    /// Bytes of the line accumulated so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns `true` when no line bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Discards the partial line.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}
