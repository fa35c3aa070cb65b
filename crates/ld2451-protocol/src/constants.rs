//! Protocol constants
//!
//! These constants define the frame markers, command identifiers, status
//! values and size limits used by the LD2451 UART protocol.

// ============================================================================
// Frame Markers
// ============================================================================

/// Header of a data frame (radar → host target reports).
pub const DATA_FRAME_HEADER: [u8; 4] = [0xF4, 0xF3, 0xF2, 0xF1];
/// Tail of a data frame.
pub const DATA_FRAME_TAIL: [u8; 4] = [0xF8, 0xF7, 0xF6, 0xF5];
/// Header of a command frame (host ↔ radar commands and acknowledgements).
pub const COMMAND_FRAME_HEADER: [u8; 4] = [0xFD, 0xFC, 0xFB, 0xFA];
/// Tail of a command frame.
pub const COMMAND_FRAME_TAIL: [u8; 4] = [0x04, 0x03, 0x02, 0x01];

// ============================================================================
// Sizes
// ============================================================================

/// Size of a frame header marker.
pub const HEADER_LEN: usize = 4;
/// Size of the little-endian length field following the header.
pub const LENGTH_FIELD_LEN: usize = 2;
/// Size of a frame tail marker.
pub const TAIL_LEN: usize = 4;
/// Smallest possible frame (empty payload).
pub const MIN_FRAME_LEN: usize = HEADER_LEN + LENGTH_FIELD_LEN + TAIL_LEN;
/// Size of one target record inside a data frame.
pub const TARGET_RECORD_LEN: usize = 5;
/// Largest payload the device can produce: count + alarm + 255 targets.
pub const MAX_PAYLOAD_LEN: usize = 2 + TARGET_RECORD_LEN * 255;
/// Default accumulator ceiling before a header-less buffer is discarded.
pub const DEFAULT_BUFFER_CEILING: usize = 1024;

// ============================================================================
// Value Transforms
// ============================================================================

/// Bias subtracted from the raw target angle byte.
pub const TARGET_ANGLE_BIAS: i16 = 0x80;
/// Bias subtracted from angles reported in detection parameter replies.
pub const PARAM_ANGLE_BIAS: i16 = 60;

// ============================================================================
// Command Identifiers (host → radar)
// ============================================================================

/// Enter configuration mode.
pub const CMD_ENABLE_CONFIG: u8 = 0xFF;
/// Leave configuration mode and resume streaming.
pub const CMD_END_CONFIG: u8 = 0xFE;
/// Read firmware version.
pub const CMD_READ_FIRMWARE: u8 = 0xA0;
/// Baud-rate get/set and system info.
pub const CMD_SET_BAUD_RATE: u8 = 0xA1;
/// Factory reset / system status.
pub const CMD_FACTORY_RESET: u8 = 0xA2;
/// Restart / device info.
pub const CMD_RESTART: u8 = 0xA3;
/// Set target detection parameters.
pub const CMD_SET_DETECTION_PARAMS: u8 = 0x02;
/// Set sensitivity parameters.
pub const CMD_SET_SENSITIVITY_PARAMS: u8 = 0x03;
/// Read target detection parameters.
pub const CMD_READ_DETECTION_PARAMS: u8 = 0x12;
/// Read sensitivity parameters.
pub const CMD_READ_SENSITIVITY_PARAMS: u8 = 0x13;
/// Set output format flags.
pub const CMD_SET_OUTPUT_FORMAT: u8 = 0x90;

/// High byte of every host command word.
pub const COMMAND_WORD_HIGH: u8 = 0x00;

// ============================================================================
// Reply Identifiers
// ============================================================================

// Some firmware revisions answer parameter reads with these ids instead of
// echoing the request id.

/// Detection parameter reply id.
pub const RESP_DETECTION_PARAMS: u8 = 0x61;
/// Sensitivity parameter reply id.
pub const RESP_SENSITIVITY_PARAMS: u8 = 0x65;

// ============================================================================
// Status Bytes
// ============================================================================

/// Command acknowledged (also what an echoed host frame carries).
pub const STATUS_ACKNOWLEDGED: u8 = 0x00;
/// Command executed successfully.
pub const STATUS_SUCCESS: u8 = 0x01;

// ============================================================================
// Parameter Values
// ============================================================================

/// Protocol value sent with the enter-configuration command.
pub const CONFIG_PROTOCOL_VALUE: u16 = 0x0001;
/// Trigger count the vendor tool always sends with sensitivity updates.
pub const DEFAULT_TRIGGER_COUNT: u8 = 2;
/// Highest value on the device's 0-9 sensitivity scale.
pub const MAX_SENSITIVITY: u8 = 9;

/// Output format flag: target information enabled.
pub const OUTPUT_FLAG_TARGET_INFO: u8 = 0x01;
/// Output format flag: engineering mode enabled.
pub const OUTPUT_FLAG_ENGINEERING: u8 = 0x02;

/// Baud-rate code table used by the 0xA1 command.
pub const BAUD_RATE_TABLE: [(u8, u32); 8] = [
    (1, 9600),
    (2, 19200),
    (3, 38400),
    (4, 57600),
    (5, 115200),
    (6, 230400),
    (7, 256000),
    (8, 460800),
];
