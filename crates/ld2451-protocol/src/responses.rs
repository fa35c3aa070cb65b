//! Responses from the radar.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::frame::{FrameFamily, RawFrame};
use crate::types::*;

/// A decoded command frame: `[command_id][status][data...]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Command the frame answers.
    pub command_id: u8,
    /// Raw status byte.
    pub status: u8,
    /// Command-specific data.
    pub data: Vec<u8>,
}

impl CommandResponse {
    /// Decode a located frame.
    ///
    /// A data frame here means the radar is still streaming and did not take
    /// the preceding bytes as a command.
    pub fn decode(frame: &RawFrame) -> ProtocolResult<Self> {
        match frame.family() {
            FrameFamily::Data => Err(ProtocolError::UnexpectedStreamingReply),
            FrameFamily::Command => Self::decode_payload(frame.payload()),
        }
    }

    /// Decode the payload of a command frame.
    pub fn decode_payload(payload: &[u8]) -> ProtocolResult<Self> {
        if payload.len() < 2 {
            return Err(ProtocolError::MalformedResponse {
                actual: payload.len(),
            });
        }
        Ok(CommandResponse {
            command_id: payload[0],
            status: payload[1],
            data: payload[2..].to_vec(),
        })
    }

    /// Status outcome.
    pub fn outcome(&self) -> CommandStatus {
        CommandStatus::from(self.status)
    }

    /// Whether the device reported success.
    pub fn is_success(&self) -> bool {
        self.outcome().is_success()
    }

    /// Whether this frame answers `command_id`, allowing the reply ids some
    /// firmware uses for parameter reads.
    pub fn answers(&self, command_id: u8) -> bool {
        self.command_id == command_id
            || matches!(
                (command_id, self.command_id),
                (CMD_READ_DETECTION_PARAMS, RESP_DETECTION_PARAMS)
                    | (CMD_READ_SENSITIVITY_PARAMS, RESP_SENSITIVITY_PARAMS)
            )
    }

    /// Interpret the data block according to the command id.
    pub fn body(&self) -> ProtocolResult<ResponseBody> {
        ResponseBody::interpret(self)
    }
}

/// Command-specific meaning of a response's data block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseBody {
    /// Plain acknowledgement; any data is kept raw.
    Ack {
        /// Data bytes, usually empty.
        data: Vec<u8>,
    },
    /// Firmware version (0xA0).
    FirmwareVersion(FirmwareVersion),
    /// Baud rate / system info (0xA1).
    SystemInfo(SystemInfo),
    /// System status (0xA2).
    SystemStatus(SystemStatus),
    /// Device info (0xA3).
    DeviceInfo(DeviceInfo),
    /// Detection parameters (0x12 / 0x61).
    DetectionParams(DetectionParams),
    /// Sensitivity parameters (0x13 / 0x65).
    SensitivityParams(SensitivityParams),
}

impl ResponseBody {
    /// Dispatch on the command id.
    pub fn interpret(response: &CommandResponse) -> ProtocolResult<Self> {
        let data = response.data.as_slice();
        match response.command_id {
            CMD_READ_DETECTION_PARAMS | RESP_DETECTION_PARAMS => {
                decode_detection_params(response.command_id, data).map(ResponseBody::DetectionParams)
            }
            CMD_READ_SENSITIVITY_PARAMS | RESP_SENSITIVITY_PARAMS => {
                decode_sensitivity_params(response.command_id, data)
                    .map(ResponseBody::SensitivityParams)
            }
            CMD_READ_FIRMWARE => Ok(ResponseBody::FirmwareVersion(FirmwareVersion {
                raw: data.to_vec(),
            })),
            CMD_SET_BAUD_RATE => decode_system_info(data).map(ResponseBody::SystemInfo),
            CMD_FACTORY_RESET => decode_system_status(data).map(ResponseBody::SystemStatus),
            CMD_RESTART => Ok(ResponseBody::DeviceInfo(DeviceInfo { raw: data.to_vec() })),
            _ => Ok(ResponseBody::Ack {
                data: data.to_vec(),
            }),
        }
    }
}

fn require(command_id: u8, data: &[u8], expected: usize) -> ProtocolResult<()> {
    if data.len() < expected {
        return Err(ProtocolError::MalformedPayload {
            command_id,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// `max_dist(u16 LE) min_dist(u16 LE) max_angle(u8, -60) min_angle(u8, -60)`.
pub fn decode_detection_params(command_id: u8, data: &[u8]) -> ProtocolResult<DetectionParams> {
    require(command_id, data, 6)?;
    Ok(DetectionParams {
        max_distance_m: u16::from_le_bytes([data[0], data[1]]),
        min_distance_m: u16::from_le_bytes([data[2], data[3]]),
        max_angle: data[4] as i16 - PARAM_ANGLE_BIAS,
        min_angle: data[5] as i16 - PARAM_ANGLE_BIAS,
    })
}

/// `approach(u8) away(u8) threshold(u16 LE)`.
pub fn decode_sensitivity_params(
    command_id: u8,
    data: &[u8],
) -> ProtocolResult<SensitivityParams> {
    require(command_id, data, 4)?;
    Ok(SensitivityParams {
        approach_sensitivity: data[0],
        away_sensitivity: data[1],
        threshold: u16::from_le_bytes([data[2], data[3]]),
    })
}

/// `baud_code(u8) extra(u8)`.
pub fn decode_system_info(data: &[u8]) -> ProtocolResult<SystemInfo> {
    require(CMD_SET_BAUD_RATE, data, 2)?;
    Ok(SystemInfo {
        baud_code: data[0],
        baud_rate: BaudRate::from_code(data[0]).ok(),
        extra: data[1],
    })
}

/// Two status bytes.
pub fn decode_system_status(data: &[u8]) -> ProtocolResult<SystemStatus> {
    require(CMD_FACTORY_RESET, data, 2)?;
    Ok(SystemStatus {
        primary: data[0],
        secondary: data[1],
    })
}
