//! Frame location and buffering.
//!
//! The radar multiplexes two frame families over one serial line. Both share
//! the same outer shape, differing only in their markers:
//!
//! ```text
//! +-------------+--------+--------+--------------------+-------------+
//! | header (4)  | len_lo | len_hi | payload[0..len]    | tail (4)    |
//! +-------------+--------+--------+--------------------+-------------+
//!  data:    F4 F3 F2 F1                                  F8 F7 F6 F5
//!  command: FD FC FB FA                                  04 03 02 01
//! ```
//!
//! There is no checksum; integrity comes from the markers and the length
//! field only. A candidate whose tail does not match is not trusted: one byte
//! is dropped at the candidate's header and the search starts over.

use bytes::{Buf, Bytes, BytesMut};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

/// The two frame families spoken by the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameFamily {
    /// Target reports streamed by the radar.
    Data,
    /// Commands and their acknowledgements.
    Command,
}

impl FrameFamily {
    /// Header marker of this family.
    pub fn header(self) -> &'static [u8; HEADER_LEN] {
        match self {
            FrameFamily::Data => &DATA_FRAME_HEADER,
            FrameFamily::Command => &COMMAND_FRAME_HEADER,
        }
    }

    /// Tail marker of this family.
    pub fn tail(self) -> &'static [u8; TAIL_LEN] {
        match self {
            FrameFamily::Data => &DATA_FRAME_TAIL,
            FrameFamily::Command => &COMMAND_FRAME_TAIL,
        }
    }

    fn from_header(window: &[u8]) -> Option<Self> {
        if window == DATA_FRAME_HEADER {
            Some(FrameFamily::Data)
        } else if window == COMMAND_FRAME_HEADER {
            Some(FrameFamily::Command)
        } else {
            None
        }
    }
}

// ============================================================================
// Raw Frame
// ============================================================================

/// A complete, marker-delimited frame.
///
/// The payload length always equals the declared length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    family: FrameFamily,
    declared_length: u16,
    payload: Bytes,
}

impl RawFrame {
    /// Build a frame around a payload.
    pub fn new(family: FrameFamily, payload: impl Into<Bytes>) -> ProtocolResult<Self> {
        let payload = payload.into();
        let declared_length = u16::try_from(payload.len()).map_err(|_| {
            ProtocolError::InvalidParameter(format!(
                "payload of {} bytes does not fit the length field",
                payload.len()
            ))
        })?;
        Ok(RawFrame {
            family,
            declared_length,
            payload,
        })
    }

    /// Frame family.
    pub fn family(&self) -> FrameFamily {
        self.family
    }

    /// Value of the length field.
    pub fn declared_length(&self) -> u16 {
        self.declared_length
    }

    /// Bytes between the length field and the tail marker.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Total size on the wire.
    pub fn wire_len(&self) -> usize {
        MIN_FRAME_LEN + self.payload.len()
    }

    /// Serialize the frame back to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_len());
        buf.extend_from_slice(self.family.header());
        buf.extend_from_slice(&self.declared_length.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(self.family.tail());
        buf
    }
}

// ============================================================================
// Byte Accumulator
// ============================================================================

/// Bounded buffer of bytes received from the transport.
///
/// Bytes only leave the buffer through [`consume`](Self::consume) or the
/// bounded-growth policy applied by [`FrameLocator`].
#[derive(Debug)]
pub struct ByteAccumulator {
    buffer: BytesMut,
    ceiling: usize,
}

impl Default for ByteAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteAccumulator {
    /// Create an accumulator with the default ceiling.
    pub fn new() -> Self {
        Self::with_ceiling(DEFAULT_BUFFER_CEILING)
    }

    /// Create an accumulator that is discarded once it holds more than
    /// `ceiling` bytes without any frame header.
    pub fn with_ceiling(ceiling: usize) -> Self {
        ByteAccumulator {
            buffer: BytesMut::with_capacity(ceiling),
            ceiling,
        }
    }

    /// Add received bytes to the end of the buffer.
    pub fn append(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Remove up to `n` bytes from the front.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buffer.len());
        self.buffer.advance(n);
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Read-only view of `start..end`, clamped to the buffered bytes.
    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        let end = end.min(self.buffer.len());
        let start = start.min(end);
        &self.buffer[start..end]
    }

    /// All buffered bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Configured ceiling.
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn split_to(&mut self, n: usize) -> Bytes {
        self.buffer.split_to(n).freeze()
    }
}

// ============================================================================
// Frame Locator
// ============================================================================

/// Counters kept by a [`FrameLocator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorStats {
    /// Data frames accepted.
    pub data_frames: u64,
    /// Command frames accepted.
    pub command_frames: u64,
    /// Candidates abandoned by dropping one byte.
    pub resync_discards: u64,
    /// Times a header-less buffer was cleared.
    pub overflow_discards: u64,
    /// Bytes dropped without being part of an accepted frame.
    pub bytes_discarded: u64,
}

/// Finds complete frames of either family in a [`ByteAccumulator`].
#[derive(Debug, Clone)]
pub struct FrameLocator {
    max_payload_len: usize,
    stats: LocatorStats,
}

impl Default for FrameLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLocator {
    /// Create a locator accepting payloads up to [`MAX_PAYLOAD_LEN`].
    pub fn new() -> Self {
        Self::with_max_payload_len(MAX_PAYLOAD_LEN)
    }

    /// Create a locator with a custom payload limit.
    ///
    /// Candidates declaring a longer payload are resynchronized immediately
    /// instead of waiting for bytes that would never form a valid frame.
    pub fn with_max_payload_len(max_payload_len: usize) -> Self {
        FrameLocator {
            max_payload_len,
            stats: LocatorStats::default(),
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> LocatorStats {
        self.stats
    }

    /// Extract the next complete frame.
    ///
    /// Returns `None` when no complete frame is buffered yet. Partial frames
    /// are left in the accumulator untouched, so feeding more bytes later
    /// resumes where this call stopped.
    pub fn next_frame(&mut self, acc: &mut ByteAccumulator) -> Option<RawFrame> {
        loop {
            let Some((start, family)) = find_header(acc.as_slice()) else {
                self.apply_ceiling(acc);
                return None;
            };

            let body_start = start + HEADER_LEN + LENGTH_FIELD_LEN;
            if acc.len() < body_start {
                return None;
            }

            let len_bytes = acc.slice(start + HEADER_LEN, body_start);
            let declared_length = u16::from_le_bytes([len_bytes[0], len_bytes[1]]);
            let payload_len = declared_length as usize;

            if payload_len > self.max_payload_len {
                debug!(
                    "{:?} candidate at offset {} declares {} bytes (max {}), resyncing",
                    family, start, payload_len, self.max_payload_len
                );
                self.resync(acc, start);
                continue;
            }

            let total_len = MIN_FRAME_LEN + payload_len;
            if acc.len() < start + total_len {
                return None;
            }

            let tail_start = start + total_len - TAIL_LEN;
            if acc.slice(tail_start, start + total_len) != family.tail() {
                debug!(
                    "{:?} candidate at offset {} has a bad tail, resyncing",
                    family, start
                );
                self.resync(acc, start);
                continue;
            }

            if start > 0 {
                self.stats.bytes_discarded += start as u64;
                acc.consume(start);
            }
            let frame = acc.split_to(total_len);
            let payload = frame.slice(HEADER_LEN + LENGTH_FIELD_LEN..total_len - TAIL_LEN);

            match family {
                FrameFamily::Data => self.stats.data_frames += 1,
                FrameFamily::Command => self.stats.command_frames += 1,
            }

            return Some(RawFrame {
                family,
                declared_length,
                payload,
            });
        }
    }

    /// Drop the candidate's first byte (and any noise before it).
    fn resync(&mut self, acc: &mut ByteAccumulator, start: usize) {
        self.stats.resync_discards += 1;
        self.stats.bytes_discarded += (start + 1) as u64;
        acc.consume(start + 1);
    }

    /// Clear a header-less buffer that grew past its ceiling.
    ///
    /// A trailing partial header survives so a marker split across two reads
    /// is not lost.
    fn apply_ceiling(&mut self, acc: &mut ByteAccumulator) {
        if acc.len() <= acc.ceiling() {
            return;
        }
        let keep = partial_header_suffix(acc.as_slice());
        let dropped = acc.len() - keep;
        warn!(
            "no frame header in {} buffered bytes, discarding {} bytes",
            acc.len(),
            dropped
        );
        acc.consume(dropped);
        self.stats.overflow_discards += 1;
        self.stats.bytes_discarded += dropped as u64;
    }
}

/// Earliest header of either family.
fn find_header(buf: &[u8]) -> Option<(usize, FrameFamily)> {
    buf.windows(HEADER_LEN)
        .enumerate()
        .find_map(|(i, window)| FrameFamily::from_header(window).map(|family| (i, family)))
}

/// Length of the longest buffer suffix that is a proper prefix of a header.
fn partial_header_suffix(buf: &[u8]) -> usize {
    (1..HEADER_LEN)
        .rev()
        .filter(|&n| n <= buf.len())
        .find(|&n| {
            let suffix = &buf[buf.len() - n..];
            DATA_FRAME_HEADER.starts_with(suffix) || COMMAND_FRAME_HEADER.starts_with(suffix)
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_frame(payload: &[u8]) -> Vec<u8> {
        RawFrame::new(FrameFamily::Data, payload.to_vec())
            .unwrap()
            .to_bytes()
    }

    fn command_frame(payload: &[u8]) -> Vec<u8> {
        RawFrame::new(FrameFamily::Command, payload.to_vec())
            .unwrap()
            .to_bytes()
    }

    fn collect(bytes: &[u8], chunk: usize) -> Vec<RawFrame> {
        let mut acc = ByteAccumulator::new();
        let mut locator = FrameLocator::new();
        let mut frames = Vec::new();
        for piece in bytes.chunks(chunk) {
            acc.append(piece);
            while let Some(frame) = locator.next_frame(&mut acc) {
                frames.push(frame);
            }
        }
        frames
    }

    #[test]
    fn test_accumulator_basics() {
        let mut acc = ByteAccumulator::new();
        assert!(acc.is_empty());
        acc.append(&[1, 2, 3, 4, 5]);
        assert_eq!(acc.len(), 5);
        assert_eq!(acc.slice(1, 3), &[2, 3]);
        assert_eq!(acc.slice(3, 100), &[4, 5]);
        acc.consume(2);
        assert_eq!(acc.as_slice(), &[3, 4, 5]);
        acc.consume(10);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_locate_single_data_frame() {
        let bytes = data_frame(&[0x00, 0x00]);
        assert_eq!(
            bytes,
            vec![0xF4, 0xF3, 0xF2, 0xF1, 0x02, 0x00, 0x00, 0x00, 0xF8, 0xF7, 0xF6, 0xF5]
        );

        let mut acc = ByteAccumulator::new();
        acc.append(&bytes);
        let mut locator = FrameLocator::new();
        let frame = locator.next_frame(&mut acc).expect("frame");
        assert_eq!(frame.family(), FrameFamily::Data);
        assert_eq!(frame.declared_length(), 2);
        assert_eq!(frame.payload(), &[0x00, 0x00]);
        assert!(acc.is_empty());
        assert!(locator.next_frame(&mut acc).is_none());
    }

    #[test]
    fn test_locate_empty_payload() {
        let bytes = data_frame(&[]);
        let frames = collect(&bytes, bytes.len());
        assert_eq!(frames.len(), 1);
        assert!(frames[0].payload().is_empty());
    }

    #[test]
    fn test_incomplete_header_waits() {
        let bytes = command_frame(&[0xFF, 0x01, 0x00, 0x00]);
        let mut acc = ByteAccumulator::new();
        let mut locator = FrameLocator::new();

        acc.append(&bytes[..5]);
        assert!(locator.next_frame(&mut acc).is_none());
        assert_eq!(acc.len(), 5);

        acc.append(&bytes[5..9]);
        assert!(locator.next_frame(&mut acc).is_none());
        assert_eq!(acc.len(), 9);

        acc.append(&bytes[9..]);
        let frame = locator.next_frame(&mut acc).expect("frame");
        assert_eq!(frame.family(), FrameFamily::Command);
        assert_eq!(frame.payload(), &[0xFF, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_earliest_family_wins() {
        let mut bytes = command_frame(&[0xFE, 0x01]);
        bytes.extend(data_frame(&[0x00, 0x00]));
        let frames = collect(&bytes, bytes.len());
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].family(), FrameFamily::Command);
        assert_eq!(frames[1].family(), FrameFamily::Data);
    }

    #[test]
    fn test_noise_before_header_is_dropped() {
        let mut bytes = vec![0x55];
        bytes.extend(data_frame(&[0x00, 0x07]));

        let mut acc = ByteAccumulator::new();
        acc.append(&bytes);
        let mut locator = FrameLocator::new();
        let frame = locator.next_frame(&mut acc).expect("frame");
        assert_eq!(frame.payload(), &[0x00, 0x07]);
        assert!(acc.is_empty());
        assert!(locator.next_frame(&mut acc).is_none());
        assert_eq!(locator.stats().bytes_discarded, 1);
        assert_eq!(locator.stats().resync_discards, 0);
    }

    #[test]
    fn test_corrupted_tail_resyncs_one_byte() {
        let mut bad = data_frame(&[0x00, 0x00]);
        let last = bad.len() - 1;
        bad[last] = 0x00;
        let good = data_frame(&[0x01, 0x00, 0x80, 0x0A, 0x00, 0x05, 0x1E]);

        let mut bytes = bad.clone();
        bytes.extend(&good);

        let mut acc = ByteAccumulator::new();
        acc.append(&bytes);
        let mut locator = FrameLocator::new();
        let frame = locator.next_frame(&mut acc).expect("valid frame survives");
        assert_eq!(frame.payload(), &good[6..good.len() - 4]);
        assert!(acc.is_empty());
        assert_eq!(locator.stats().resync_discards, 1);
        assert_eq!(locator.stats().data_frames, 1);
    }

    #[test]
    fn test_oversize_length_resyncs() {
        let mut bytes = DATA_FRAME_HEADER.to_vec();
        bytes.extend_from_slice(&0xFFFFu16.to_le_bytes());
        bytes.extend(command_frame(&[0xFE, 0x01]));

        let frames = collect(&bytes, bytes.len());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].family(), FrameFamily::Command);
    }

    #[test]
    fn test_ceiling_clears_headerless_buffer() {
        let mut acc = ByteAccumulator::with_ceiling(16);
        let mut locator = FrameLocator::new();

        acc.append(&[0x11; 16]);
        assert!(locator.next_frame(&mut acc).is_none());
        assert_eq!(acc.len(), 16);

        acc.append(&[0x11]);
        assert!(locator.next_frame(&mut acc).is_none());
        assert!(acc.is_empty());
        assert_eq!(locator.stats().overflow_discards, 1);
        assert_eq!(locator.stats().bytes_discarded, 17);
    }

    #[test]
    fn test_ceiling_keeps_partial_header() {
        let mut acc = ByteAccumulator::with_ceiling(8);
        let mut locator = FrameLocator::new();

        let mut noise = vec![0x22; 10];
        noise.extend_from_slice(&[0xF4, 0xF3]);
        acc.append(&noise);
        assert!(locator.next_frame(&mut acc).is_none());
        assert_eq!(acc.as_slice(), &[0xF4, 0xF3]);

        let frame = data_frame(&[0x00, 0x00]);
        acc.append(&frame[2..]);
        let located = locator.next_frame(&mut acc).expect("frame split across the clear");
        assert_eq!(located.family(), FrameFamily::Data);
    }

    #[test]
    fn test_chunking_does_not_change_output() {
        let mut bytes = vec![0x00, 0xF4, 0x13];
        bytes.extend(data_frame(&[0x00, 0x00]));
        bytes.extend(command_frame(&[0xFF, 0x01, 0x00, 0x00]));
        let mut corrupt = data_frame(&[0x01, 0x01, 0x70, 0x03, 0x01, 0x02, 0x0A]);
        corrupt[8] ^= 0xFF;
        let tail = corrupt.len() - 2;
        corrupt[tail] = 0x00;
        bytes.extend(corrupt);
        bytes.extend(data_frame(&[0x01, 0x01, 0x70, 0x03, 0x01, 0x02, 0x0A]));
        bytes.extend_from_slice(&[0xFD, 0xFC]);

        let whole = collect(&bytes, bytes.len());
        assert_eq!(whole.len(), 3);
        for chunk in 1..bytes.len() {
            assert_eq!(collect(&bytes, chunk), whole, "chunk size {}", chunk);
        }
    }

    #[test]
    fn test_partial_header_suffix() {
        assert_eq!(partial_header_suffix(&[]), 0);
        assert_eq!(partial_header_suffix(&[0x00, 0xF4]), 1);
        assert_eq!(partial_header_suffix(&[0x00, 0xFD, 0xFC, 0xFB]), 3);
        assert_eq!(partial_header_suffix(&[0xF4, 0xF3, 0x00]), 0);
    }
}
