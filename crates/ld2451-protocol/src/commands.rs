//! Commands that can be sent to the radar.
//!
//! Command frame payload layout:
//!
//! ```text
//! [command_id][0x00][parameters...]
//! ```
//!
//! The first two bytes form the little-endian command word; the length field
//! counts them together with the parameters.

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::frame::{FrameFamily, RawFrame};
use crate::responses::CommandResponse;
use crate::types::*;

/// An untyped command: identifier plus parameter bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Command identifier.
    pub command_id: u8,
    /// Parameter bytes following the command word.
    pub parameters: Vec<u8>,
}

impl CommandRequest {
    /// Create a request.
    pub fn new(command_id: u8, parameters: impl Into<Vec<u8>>) -> Self {
        CommandRequest {
            command_id,
            parameters: parameters.into(),
        }
    }

    /// Encode as a complete command frame.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        CommandCodec::encode(self)
    }
}

/// Codec for command-family frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandCodec;

impl CommandCodec {
    /// Frame a request:
    /// `FD FC FB FA | le_u16(len(parameters) + 2) | command_id 00 | parameters | 04 03 02 01`.
    ///
    /// Fails when the parameters do not fit in a frame the radar (or a
    /// [`FrameLocator`](crate::FrameLocator)) would accept.
    pub fn encode(request: &CommandRequest) -> ProtocolResult<Vec<u8>> {
        check_parameter_len(request)?;
        Ok(write_frame(request.command_id, &request.parameters))
    }

    /// Build the [`RawFrame`] a request encodes to.
    pub fn to_frame(request: &CommandRequest) -> ProtocolResult<RawFrame> {
        check_parameter_len(request)?;
        let mut payload = Vec::with_capacity(request.parameters.len() + 2);
        payload.push(request.command_id);
        payload.push(COMMAND_WORD_HIGH);
        payload.extend_from_slice(&request.parameters);
        RawFrame::new(FrameFamily::Command, payload)
    }

    /// Decode a located command frame into `[command_id][status][data]`.
    pub fn decode(frame: &RawFrame) -> ProtocolResult<CommandResponse> {
        CommandResponse::decode(frame)
    }
}

fn check_parameter_len(request: &CommandRequest) -> ProtocolResult<()> {
    let max = MAX_PAYLOAD_LEN - 2;
    if request.parameters.len() > max {
        return Err(ProtocolError::InvalidParameter(format!(
            "command 0x{:02X} carries {} parameter bytes (max {})",
            request.command_id,
            request.parameters.len(),
            max
        )));
    }
    Ok(())
}

/// Caller guarantees `parameters.len() + 2 <= MAX_PAYLOAD_LEN`.
fn write_frame(command_id: u8, parameters: &[u8]) -> Vec<u8> {
    let len = (parameters.len() + 2) as u16;
    let mut buf = Vec::with_capacity(MIN_FRAME_LEN + len as usize);
    buf.extend_from_slice(&COMMAND_FRAME_HEADER);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.push(command_id);
    buf.push(COMMAND_WORD_HIGH);
    buf.extend_from_slice(parameters);
    buf.extend_from_slice(&COMMAND_FRAME_TAIL);
    buf
}

/// Typed commands understood by the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Enter configuration mode.
    EnableConfiguration,
    /// Leave configuration mode and resume streaming.
    EndConfiguration,
    /// Read the firmware version.
    ReadFirmwareVersion,
    /// Switch the serial baud rate (takes effect after restart).
    SetBaudRate(BaudRate),
    /// Restore factory settings.
    FactoryReset,
    /// Restart the module.
    Restart,
    /// Write target detection parameters.
    SetDetectionParams(DetectionConfig),
    /// Write sensitivity parameters.
    SetSensitivityParams(SensitivityConfig),
    /// Read target detection parameters.
    ReadDetectionParams,
    /// Read sensitivity parameters.
    ReadSensitivityParams,
    /// Select which data the radar streams.
    SetOutputFormat(OutputFormat),
}

impl Command {
    /// Identifier of this command.
    pub fn command_id(&self) -> u8 {
        match self {
            Command::EnableConfiguration => CMD_ENABLE_CONFIG,
            Command::EndConfiguration => CMD_END_CONFIG,
            Command::ReadFirmwareVersion => CMD_READ_FIRMWARE,
            Command::SetBaudRate(_) => CMD_SET_BAUD_RATE,
            Command::FactoryReset => CMD_FACTORY_RESET,
            Command::Restart => CMD_RESTART,
            Command::SetDetectionParams(_) => CMD_SET_DETECTION_PARAMS,
            Command::SetSensitivityParams(_) => CMD_SET_SENSITIVITY_PARAMS,
            Command::ReadDetectionParams => CMD_READ_DETECTION_PARAMS,
            Command::ReadSensitivityParams => CMD_READ_SENSITIVITY_PARAMS,
            Command::SetOutputFormat(_) => CMD_SET_OUTPUT_FORMAT,
        }
    }

    /// Whether this command switches between configuration and streaming mode.
    pub fn is_mode_change(&self) -> bool {
        matches!(self, Command::EnableConfiguration | Command::EndConfiguration)
    }

    /// Whether this command writes detection or sensitivity parameters.
    pub fn is_parameter_set(&self) -> bool {
        matches!(
            self,
            Command::SetDetectionParams(_) | Command::SetSensitivityParams(_)
        )
    }

    /// Check parameter ranges the device documents.
    pub fn validate(&self) -> ProtocolResult<()> {
        match self {
            Command::SetSensitivityParams(config) if config.snr_threshold > MAX_SENSITIVITY => {
                Err(ProtocolError::InvalidParameter(format!(
                    "snr threshold {} exceeds {}",
                    config.snr_threshold, MAX_SENSITIVITY
                )))
            }
            Command::SetSensitivityParams(config) if config.trigger_count == 0 => Err(
                ProtocolError::InvalidParameter("trigger count must be at least 1".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Convert to an untyped request.
    pub fn to_request(&self) -> CommandRequest {
        let mut params = Vec::new();

        match self {
            Command::EnableConfiguration => {
                params.extend_from_slice(&CONFIG_PROTOCOL_VALUE.to_le_bytes());
            }

            Command::EndConfiguration
            | Command::ReadFirmwareVersion
            | Command::FactoryReset
            | Command::Restart
            | Command::ReadDetectionParams
            | Command::ReadSensitivityParams => {}

            Command::SetBaudRate(rate) => {
                params.push(rate.code());
                params.push(0x00);
            }

            Command::SetDetectionParams(config) => {
                params.push(config.max_distance_m);
                params.push(config.direction_filter.into());
                params.push(config.min_speed_kmh);
                params.push(config.no_target_delay_s);
            }

            Command::SetSensitivityParams(config) => {
                params.push(config.trigger_count);
                params.push(config.snr_threshold);
                // Reserved
                params.extend_from_slice(&[0x00, 0x00]);
            }

            Command::SetOutputFormat(format) => {
                params.push(format.flags());
                params.push(0x00);
            }
        }

        CommandRequest::new(self.command_id(), params)
    }

    /// Encode as a complete command frame.
    ///
    /// Typed commands carry at most four parameter bytes, so this cannot fail.
    pub fn encode(&self) -> Vec<u8> {
        let request = self.to_request();
        write_frame(request.command_id, &request.parameters)
    }
}

impl From<Command> for CommandRequest {
    fn from(command: Command) -> Self {
        command.to_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ByteAccumulator, FrameLocator};

    fn hex(s: &str) -> Vec<u8> {
        hex::decode(s.replace(' ', "")).expect("valid hex")
    }

    #[test]
    fn test_encode_enable_configuration() {
        assert_eq!(
            Command::EnableConfiguration.encode(),
            hex("FD FC FB FA 04 00 FF 00 01 00 04 03 02 01")
        );
    }

    #[test]
    fn test_decode_echo_keeps_parameters() {
        let request = CommandRequest::new(CMD_SET_SENSITIVITY_PARAMS, vec![0x02, 0x07, 0x00, 0x00]);
        let frame = CommandCodec::to_frame(&request).unwrap();
        assert_eq!(frame.to_bytes(), request.encode().unwrap());

        let response = CommandCodec::decode(&frame).unwrap();
        assert_eq!(response.command_id, 0x03);
        assert_eq!(response.status, 0x00);
        assert_eq!(response.data, request.parameters);
    }

    #[test]
    fn test_encode_end_configuration() {
        assert_eq!(
            Command::EndConfiguration.encode(),
            hex("FD FC FB FA 02 00 FE 00 04 03 02 01")
        );
    }

    #[test]
    fn test_encode_reads() {
        assert_eq!(
            Command::ReadDetectionParams.encode(),
            hex("FD FC FB FA 02 00 12 00 04 03 02 01")
        );
        assert_eq!(
            Command::ReadSensitivityParams.encode(),
            hex("FD FC FB FA 02 00 13 00 04 03 02 01")
        );
        assert_eq!(
            Command::FactoryReset.encode(),
            hex("FD FC FB FA 02 00 A2 00 04 03 02 01")
        );
        assert_eq!(
            Command::Restart.encode(),
            hex("FD FC FB FA 02 00 A3 00 04 03 02 01")
        );
    }

    #[test]
    fn test_encode_sensitivity() {
        let cmd = Command::SetSensitivityParams(SensitivityConfig::with_snr(5));
        assert_eq!(cmd.encode(), hex("FD FC FB FA 06 00 03 00 02 05 00 00 04 03 02 01"));
    }

    #[test]
    fn test_encode_detection() {
        let cmd = Command::SetDetectionParams(DetectionConfig {
            max_distance_m: 20,
            direction_filter: DirectionFilter::ApproachingOnly,
            min_speed_kmh: 1,
            no_target_delay_s: 2,
        });
        assert_eq!(cmd.encode(), hex("FD FC FB FA 06 00 02 00 14 01 01 02 04 03 02 01"));
    }

    #[test]
    fn test_encode_baud_rate_and_output_format() {
        assert_eq!(
            Command::SetBaudRate(BaudRate::B115200).encode(),
            hex("FD FC FB FA 04 00 A1 00 05 00 04 03 02 01")
        );
        let format = OutputFormat { target_info: true, engineering: true };
        assert_eq!(
            Command::SetOutputFormat(format).encode(),
            hex("FD FC FB FA 04 00 90 00 03 00 04 03 02 01")
        );
    }

    #[test]
    fn test_encode_matches_frame() {
        let request = CommandRequest::new(0x42, vec![0xAA, 0xBB, 0xCC]);
        let frame = CommandCodec::to_frame(&request).unwrap();
        assert_eq!(frame.declared_length(), 5);
        assert_eq!(frame.to_bytes(), request.encode().unwrap());
    }

    #[test]
    fn test_encode_rejects_oversized_parameters() {
        let largest = CommandRequest::new(0x42, vec![0x00; MAX_PAYLOAD_LEN - 2]);
        let bytes = largest.encode().unwrap();
        assert_eq!(bytes.len(), MIN_FRAME_LEN + MAX_PAYLOAD_LEN);

        let mut acc = ByteAccumulator::new();
        acc.append(&bytes);
        let frame = FrameLocator::new().next_frame(&mut acc).expect("own output is locatable");
        assert_eq!(frame.payload().len(), MAX_PAYLOAD_LEN);

        for len in [MAX_PAYLOAD_LEN - 1, 65535] {
            let request = CommandRequest::new(0x42, vec![0x00; len]);
            assert!(matches!(request.encode(), Err(ProtocolError::InvalidParameter(_))));
            assert!(CommandCodec::to_frame(&request).is_err());
        }
    }

    #[test]
    fn test_validate_sensitivity_range() {
        assert!(Command::SetSensitivityParams(SensitivityConfig::with_snr(9))
            .validate()
            .is_ok());
        assert!(matches!(
            Command::SetSensitivityParams(SensitivityConfig::with_snr(10)).validate(),
            Err(ProtocolError::InvalidParameter(_))
        ));
        let zero_trigger = SensitivityConfig { trigger_count: 0, snr_threshold: 4 };
        assert!(Command::SetSensitivityParams(zero_trigger).validate().is_err());
    }

    #[test]
    fn test_command_classification() {
        assert!(Command::EnableConfiguration.is_mode_change());
        assert!(Command::EndConfiguration.is_mode_change());
        assert!(!Command::Restart.is_mode_change());
        assert!(Command::SetSensitivityParams(SensitivityConfig::default()).is_parameter_set());
        assert!(!Command::ReadSensitivityParams.is_parameter_set());
    }
}
