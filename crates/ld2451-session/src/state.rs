//! Per-connection session state.

use serde::{Deserialize, Serialize};

/// What the host believes the radar is doing.
///
/// This is a belief, not ground truth: the radar leaves configuration mode
/// on its own after a period of inactivity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    /// Nothing confirmed yet.
    #[default]
    Unknown,
    /// Reporting targets.
    Streaming,
    /// Accepting configuration commands.
    Configuring,
}

/// Mode plus command counters for one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Believed device mode.
    pub mode: DeviceMode,
    /// Commands written to the transport.
    pub commands_sent: u32,
    /// Commands answered with success.
    pub commands_succeeded: u32,
    /// Commands that failed for any reason.
    pub commands_failed: u32,
}

impl SessionState {
    /// Whether configuration commands may be sent.
    pub fn is_configuring(&self) -> bool {
        self.mode == DeviceMode::Configuring
    }
}
