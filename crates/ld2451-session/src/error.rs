//! Error types for the session engine.

use std::io;
use std::time::Duration;

use ld2451_protocol::ProtocolError;
use thiserror::Error;

use crate::state::DeviceMode;

/// Errors that can occur while exchanging commands with the radar.
///
/// None of these is fatal: the session can keep sending commands and
/// reading data after any of them.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Frame or payload decoding failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The byte transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// No reply to the command within the timeout.
    #[error("timeout after {waited:?} waiting for reply to command 0x{command_id:02X}")]
    Timeout {
        /// Command awaiting a reply.
        command_id: u8,
        /// Time spent waiting.
        waited: Duration,
    },

    /// Only data frames arrived while waiting for a reply.
    #[error("radar kept streaming instead of answering command 0x{command_id:02X}")]
    UnexpectedStreamingReply {
        /// Command awaiting a reply.
        command_id: u8,
    },

    /// The radar acknowledged the command (status 0x00) without reporting
    /// it as executed.
    #[error("command 0x{command_id:02X} acknowledged but not executed")]
    NotExecuted {
        /// Acknowledged command.
        command_id: u8,
    },

    /// The reply carried a status other than acknowledged or executed.
    #[error("command 0x{command_id:02X} rejected with status 0x{status:02X}")]
    Rejected {
        /// Rejected command.
        command_id: u8,
        /// Status byte of the reply.
        status: u8,
    },

    /// The radar sent the command frame back unchanged.
    #[error("command 0x{command_id:02X} was echoed back without being processed")]
    Echoed {
        /// Echoed command.
        command_id: u8,
    },

    /// The reply did not carry the data block its command needs.
    #[error("unexpected reply body for command 0x{command_id:02X}")]
    UnexpectedResponse {
        /// Command whose reply was not understood.
        command_id: u8,
    },

    /// The command requires configuration mode.
    #[error("command 0x{command_id:02X} requires configuration mode (believed mode: {mode:?})")]
    NotConfiguring {
        /// Command that was refused.
        command_id: u8,
        /// Mode the session believes the radar is in.
        mode: DeviceMode,
    },

    /// `apply_parameter` was given a command that does not set parameters.
    #[error("command 0x{command_id:02X} is not a parameter command")]
    NotAParameter {
        /// Offending command.
        command_id: u8,
    },

    /// Entering configuration mode failed.
    #[error("failed to enter configuration mode: {0}")]
    ConfigEntryFailed(#[source] Box<SessionError>),

    /// Leaving configuration mode failed.
    #[error("failed to exit configuration mode: {0}")]
    ConfigExitFailed(#[source] Box<SessionError>),
}

impl SessionError {
    /// Innermost error, looking through entry/exit wrappers.
    pub fn root_cause(&self) -> &SessionError {
        match self {
            SessionError::ConfigEntryFailed(inner) | SessionError::ConfigExitFailed(inner) => {
                inner.root_cause()
            }
            other => other,
        }
    }

    /// Whether the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.root_cause(), SessionError::Timeout { .. })
    }
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
