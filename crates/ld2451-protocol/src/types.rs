//! Common types used in the protocol.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

// ============================================================================
// Targets
// ============================================================================

/// Movement direction of a target relative to the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Moving towards the radar.
    Approaching,
    /// Moving away from the radar.
    Receding,
}

impl From<u8> for Direction {
    fn from(flag: u8) -> Self {
        if flag == 0 {
            Direction::Approaching
        } else {
            Direction::Receding
        }
    }
}

/// One detected object within a data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Angle in degrees, negative to the left of boresight.
    pub angle: i16,
    /// Distance in meters.
    pub distance_m: u8,
    /// Movement direction.
    pub direction: Direction,
    /// Speed in km/h.
    pub speed_kmh: u8,
    /// Signal-to-noise ratio.
    pub snr: u8,
}

impl Target {
    /// Whether the target is moving towards the radar.
    pub fn is_approaching(&self) -> bool {
        self.direction == Direction::Approaching
    }
}

/// Decoded contents of one data frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFrameEvent {
    /// Alarm/status byte carried by the frame.
    pub alarm_or_status: u8,
    /// Targets in the order the radar reported them.
    pub targets: Vec<Target>,
}

impl DataFrameEvent {
    /// An idle frame reports no targets.
    pub fn is_idle(&self) -> bool {
        self.targets.is_empty()
    }
}

// ============================================================================
// Command Status
// ============================================================================

/// Outcome carried by the status byte of a command reply.
///
/// Only `0x01` is treated as success. `0x00` is kept apart because the
/// device uses it for acknowledgements that did not (yet) execute, and it is
/// also what an echo of a host frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    /// Command acknowledged (`0x00`).
    Acknowledged,
    /// Command executed (`0x01`).
    Executed,
    /// Any other status byte.
    Rejected(u8),
}

impl CommandStatus {
    /// Whether this is the success status.
    pub fn is_success(&self) -> bool {
        matches!(self, CommandStatus::Executed)
    }
}

impl From<u8> for CommandStatus {
    fn from(value: u8) -> Self {
        match value {
            STATUS_ACKNOWLEDGED => CommandStatus::Acknowledged,
            STATUS_SUCCESS => CommandStatus::Executed,
            other => CommandStatus::Rejected(other),
        }
    }
}

impl From<CommandStatus> for u8 {
    fn from(value: CommandStatus) -> Self {
        match value {
            CommandStatus::Acknowledged => STATUS_ACKNOWLEDGED,
            CommandStatus::Executed => STATUS_SUCCESS,
            CommandStatus::Rejected(code) => code,
        }
    }
}

// ============================================================================
// Baud Rate
// ============================================================================

/// Serial baud rates the radar can be switched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaudRate {
    /// 9600 bit/s.
    B9600,
    /// 19200 bit/s.
    B19200,
    /// 38400 bit/s.
    B38400,
    /// 57600 bit/s.
    B57600,
    /// 115200 bit/s.
    B115200,
    /// 230400 bit/s.
    B230400,
    /// 256000 bit/s.
    B256000,
    /// 460800 bit/s.
    B460800,
}

impl BaudRate {
    const ALL: [BaudRate; 8] = [
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
        BaudRate::B230400,
        BaudRate::B256000,
        BaudRate::B460800,
    ];

    /// Wire code of this rate.
    pub fn code(self) -> u8 {
        BAUD_RATE_TABLE[self as usize].0
    }

    /// Rate in bits per second.
    pub fn bits_per_second(self) -> u32 {
        BAUD_RATE_TABLE[self as usize].1
    }

    /// Look up a rate by its wire code.
    pub fn from_code(code: u8) -> ProtocolResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|rate| rate.code() == code)
            .ok_or(ProtocolError::UnknownBaudRateCode(code))
    }

    /// Look up a rate by bits per second.
    pub fn from_bits_per_second(bps: u32) -> ProtocolResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|rate| rate.bits_per_second() == bps)
            .ok_or(ProtocolError::UnsupportedBaudRate(bps))
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        BaudRate::B115200
    }
}

impl std::fmt::Display for BaudRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits_per_second())
    }
}

// ============================================================================
// Configuration Parameters (host → radar)
// ============================================================================

/// Which movement directions the radar reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionFilter {
    /// Only targets moving away.
    RecedingOnly,
    /// Only targets moving closer.
    ApproachingOnly,
    /// Both directions.
    Both,
}

impl From<DirectionFilter> for u8 {
    fn from(value: DirectionFilter) -> Self {
        match value {
            DirectionFilter::RecedingOnly => 0,
            DirectionFilter::ApproachingOnly => 1,
            DirectionFilter::Both => 2,
        }
    }
}

/// Target detection settings written with the 0x02 command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Maximum detection distance in meters.
    pub max_distance_m: u8,
    /// Reported movement directions.
    pub direction_filter: DirectionFilter,
    /// Minimum speed in km/h for a target to be reported.
    pub min_speed_kmh: u8,
    /// Seconds without a target before the radar reports none.
    pub no_target_delay_s: u8,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            max_distance_m: 20,
            direction_filter: DirectionFilter::ApproachingOnly,
            min_speed_kmh: 1,
            no_target_delay_s: 2,
        }
    }
}

/// Sensitivity settings written with the 0x03 command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityConfig {
    /// Consecutive detections required before a target is reported.
    pub trigger_count: u8,
    /// SNR threshold on the 0-9 scale.
    pub snr_threshold: u8,
}

impl SensitivityConfig {
    /// Sensitivity update with the vendor's default trigger count.
    pub fn with_snr(snr_threshold: u8) -> Self {
        SensitivityConfig {
            trigger_count: DEFAULT_TRIGGER_COUNT,
            snr_threshold,
        }
    }
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        SensitivityConfig::with_snr(4)
    }
}

/// Output format flags written with the 0x90 command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat {
    /// Report target information.
    pub target_info: bool,
    /// Report engineering data.
    pub engineering: bool,
}

impl OutputFormat {
    /// Encode as the flag byte.
    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.target_info {
            flags |= OUTPUT_FLAG_TARGET_INFO;
        }
        if self.engineering {
            flags |= OUTPUT_FLAG_ENGINEERING;
        }
        flags
    }

    /// Decode from the flag byte. Unknown bits are ignored.
    pub fn from_flags(flags: u8) -> Self {
        OutputFormat {
            target_info: flags & OUTPUT_FLAG_TARGET_INFO != 0,
            engineering: flags & OUTPUT_FLAG_ENGINEERING != 0,
        }
    }
}

// ============================================================================
// Reported Parameters (radar → host)
// ============================================================================

/// Detection parameters as reported by the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Maximum distance in meters.
    pub max_distance_m: u16,
    /// Minimum distance in meters.
    pub min_distance_m: u16,
    /// Maximum angle in degrees.
    pub max_angle: i16,
    /// Minimum angle in degrees.
    pub min_angle: i16,
}

/// Sensitivity parameters as reported by the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityParams {
    /// Approach sensitivity (0-9).
    pub approach_sensitivity: u8,
    /// Away sensitivity (0-9).
    pub away_sensitivity: u8,
    /// Detection threshold.
    pub threshold: u16,
}

/// Firmware version block (0xA0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    /// Raw data bytes.
    pub raw: Vec<u8>,
}

impl FirmwareVersion {
    /// Best-effort `major.minor.patch` rendering.
    ///
    /// Layout: firmware type (u16), major (u16 LE), then minor and patch bytes.
    /// Returns `None` when fewer than six bytes were reported.
    pub fn version_string(&self) -> Option<String> {
        if self.raw.len() < 6 {
            return None;
        }
        let major = u16::from_le_bytes([self.raw[2], self.raw[3]]);
        Some(format!("{}.{}.{}", major, self.raw[4], self.raw[5]))
    }
}

/// System information (0xA1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Raw baud-rate code.
    pub baud_code: u8,
    /// Baud rate for the code, when it is in the table.
    pub baud_rate: Option<BaudRate>,
    /// Second data byte.
    pub extra: u8,
}

/// System status (0xA2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// First status byte.
    pub primary: u8,
    /// Second status byte.
    pub secondary: u8,
}

impl SystemStatus {
    /// Both status bytes zero means the radar runs factory settings.
    pub fn is_factory_default(&self) -> bool {
        self.primary == 0 && self.secondary == 0
    }
}

/// Device information block (0xA3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Raw data bytes.
    pub raw: Vec<u8>,
}
