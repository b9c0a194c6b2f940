//! Errors raised while seeking and reading a command stream.

use thiserror::Error;

use crate::command::CommandKind;

/// Faults from navigating or decoding a command stream.
///
/// These indicate a caller or producer bug rather than bad user input; they
/// are reported as errors so a reader never sees corrupted data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("command index {index} out of range (stream holds {count} commands)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("line {line} out of range (stream holds {line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("expected {expected:?} at command {index}, found {found:?}")]
    KindMismatch {
        expected: CommandKind,
        found: CommandKind,
        index: usize,
    },

    #[error("cursor is at the end of the stream")]
    EndOfStream,

    #[error("line mark at command {index} was taken before the stream was cleared")]
    StaleLineMark { index: usize },

    #[error("invalid command tag 0x{0:02X}")]
    InvalidCommand(u8),

    #[error("unexpected end of command data")]
    UnexpectedEnd,

    #[error("no {kind} registered at index {index}")]
    UnknownResource { kind: &'static str, index: u32 },

    #[error("text run {offset}+{length} is outside the current source")]
    InvalidTextRun { offset: u32, length: u32 },
}
