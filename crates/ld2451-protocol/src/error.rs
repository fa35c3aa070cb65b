//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when decoding or encoding LD2451 frames.
///
/// Framing-level conditions (incomplete frames, resync and overflow discards)
/// are not errors; they are handled inside [`FrameLocator`](crate::FrameLocator)
/// and only show up in its statistics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Command frame payload too short to carry a command id and status.
    #[error("malformed response: expected at least 2 payload bytes, got {actual}")]
    MalformedResponse {
        /// Actual payload length.
        actual: usize,
    },

    /// Response data too short for the layout of its command.
    #[error("malformed payload for command 0x{command_id:02X}: expected at least {expected} bytes, got {actual}")]
    MalformedPayload {
        /// Command the payload belongs to.
        command_id: u8,
        /// Minimum length required by the layout.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// A data frame arrived where a command response was expected.
    #[error("received a streaming data frame instead of a command response")]
    UnexpectedStreamingReply,

    /// Baud rate not present in the device's code table.
    #[error("unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// Baud-rate code not present in the device's code table.
    #[error("unknown baud rate code: {0}")]
    UnknownBaudRateCode(u8),

    /// A command parameter is outside the range the device accepts.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
