//! Target list decoding for data frames.
//!
//! Data frame payload layout:
//!
//! ```text
//! [target_count][alarm] ([angle][distance][direction][speed][snr])*
//! ```
//!
//! The radar never receives data frames, so there is no encode direction.

use crate::constants::*;
use crate::types::{DataFrameEvent, Direction, Target};

/// Decoder for the payload of data frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetListCodec;

impl TargetListCodec {
    /// Decode a data frame payload.
    ///
    /// Never fails: a payload shorter than two bytes is an idle frame, and a
    /// target count larger than the records actually present yields only the
    /// complete records.
    pub fn decode(payload: &[u8]) -> DataFrameEvent {
        if payload.len() < 2 {
            return DataFrameEvent::default();
        }

        let target_count = payload[0] as usize;
        let alarm_or_status = payload[1];
        let records = &payload[2..];

        let targets: Vec<Target> = records
            .chunks_exact(TARGET_RECORD_LEN)
            .take(target_count)
            .filter_map(|chunk| chunk.try_into().ok())
            .map(decode_target)
            .collect();

        if targets.len() < target_count {
            log::trace!(
                "data frame claims {} targets, only {} complete records present",
                target_count,
                targets.len()
            );
        }

        DataFrameEvent {
            alarm_or_status,
            targets,
        }
    }
}

/// Decode one 5-byte target record.
pub fn decode_target(record: &[u8; TARGET_RECORD_LEN]) -> Target {
    Target {
        angle: record[0] as i16 - TARGET_ANGLE_BIAS,
        distance_m: record[1],
        direction: Direction::from(record[2]),
        speed_kmh: record[3],
        snr: record[4],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_target_at_boresight() {
        let target = decode_target(&[0x80, 0x0A, 0x00, 0x05, 0x1E]);
        assert_eq!(
            target,
            Target {
                angle: 0,
                distance_m: 10,
                direction: Direction::Approaching,
                speed_kmh: 5,
                snr: 30,
            }
        );
    }

    #[test]
    fn test_decode_target_negative_angle() {
        let target = decode_target(&[0x70, 0x03, 0x01, 0x02, 0x0A]);
        assert_eq!(target.angle, -16);
        assert_eq!(target.distance_m, 3);
        assert_eq!(target.direction, Direction::Receding);
        assert_eq!(target.speed_kmh, 2);
        assert_eq!(target.snr, 10);
    }

    #[test]
    fn test_decode_angle_extremes() {
        assert_eq!(decode_target(&[0x00, 0, 0, 0, 0]).angle, -128);
        assert_eq!(decode_target(&[0xFF, 0, 0, 0, 0]).angle, 127);
    }

    #[test]
    fn test_short_record_cannot_be_decoded() {
        let short: &[u8] = &[0x80, 0x0A];
        assert!(<&[u8; TARGET_RECORD_LEN]>::try_from(short).is_err());
        assert!(TargetListCodec::decode(&[0x01, 0x00, 0x80, 0x0A]).targets.is_empty());
    }

    #[test]
    fn test_decode_idle_frames() {
        assert_eq!(TargetListCodec::decode(&[]), DataFrameEvent::default());
        assert_eq!(TargetListCodec::decode(&[0x03]), DataFrameEvent::default());

        let event = TargetListCodec::decode(&[0x00, 0x00]);
        assert!(event.is_idle());
        assert_eq!(event.alarm_or_status, 0);
    }

    #[test]
    fn test_decode_two_targets() {
        let payload = [
            0x02, 0x01, //
            0x80, 0x0A, 0x00, 0x05, 0x1E, //
            0x70, 0x03, 0x01, 0x02, 0x0A,
        ];
        let event = TargetListCodec::decode(&payload);
        assert_eq!(event.alarm_or_status, 0x01);
        assert_eq!(event.targets.len(), 2);
        assert_eq!(event.targets[0].distance_m, 10);
        assert_eq!(event.targets[1].angle, -16);
    }

    #[test]
    fn test_decode_truncated_record_is_dropped() {
        let payload = [0x02, 0x00, 0x80, 0x0A, 0x00, 0x05, 0x1E, 0x70, 0x03];
        let event = TargetListCodec::decode(&payload);
        assert_eq!(event.targets.len(), 1);
        assert_eq!(event.targets[0].snr, 30);
    }

    #[test]
    fn test_decode_ignores_records_beyond_count() {
        let payload = [0x01, 0x00, 0x80, 0x0A, 0x00, 0x05, 0x1E, 0x70, 0x03, 0x01, 0x02, 0x0A];
        let event = TargetListCodec::decode(&payload);
        assert_eq!(event.targets.len(), 1);
    }
}
