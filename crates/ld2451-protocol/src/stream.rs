//! Streaming decoder combining buffering, frame location and payload codecs.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolResult;
use crate::frame::{ByteAccumulator, FrameFamily, FrameLocator, LocatorStats, RawFrame};
use crate::responses::CommandResponse;
use crate::targets::TargetListCodec;
use crate::types::DataFrameEvent;

/// A decoded protocol event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolEvent {
    /// Target report.
    Data(DataFrameEvent),
    /// Command acknowledgement or response.
    Command(CommandResponse),
}

/// Receive statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    /// Bytes fed into the decoder.
    pub bytes_received: u64,
    /// Frames of either family decoded.
    pub frames_received: u64,
    /// Data frames without targets.
    pub empty_frames: u64,
    /// Data frames with at least one target.
    pub target_frames: u64,
    /// Framing-level counters.
    pub locator: LocatorStats,
}

/// Incremental decoder for the radar's byte stream.
///
/// Feed it whatever the transport returned, in any chunking, then drain
/// events with [`try_decode`](Self::try_decode).
#[derive(Debug, Default)]
pub struct StreamDecoder {
    accumulator: ByteAccumulator,
    locator: FrameLocator,
    bytes_received: u64,
    frames_received: u64,
    empty_frames: u64,
    target_frames: u64,
}

impl StreamDecoder {
    /// Create a decoder with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder whose accumulator uses a custom ceiling.
    pub fn with_buffer_ceiling(ceiling: usize) -> Self {
        StreamDecoder {
            accumulator: ByteAccumulator::with_ceiling(ceiling),
            ..Self::default()
        }
    }

    /// Feed received data into the decoder.
    pub fn feed(&mut self, data: &[u8]) {
        self.bytes_received += data.len() as u64;
        self.accumulator.append(data);
    }

    /// Next complete frame, undecoded.
    pub fn next_frame(&mut self) -> Option<RawFrame> {
        let frame = self.locator.next_frame(&mut self.accumulator)?;
        self.frames_received += 1;
        Some(frame)
    }

    /// Try to decode the next event.
    ///
    /// Returns `Ok(None)` if more data is needed. An error means one
    /// malformed frame was consumed; the decoder stays usable.
    pub fn try_decode(&mut self) -> ProtocolResult<Option<ProtocolEvent>> {
        match self.next_frame() {
            Some(frame) => self.decode_frame(&frame).map(Some),
            None => Ok(None),
        }
    }

    /// Decode an already located frame, updating statistics.
    pub fn decode_frame(&mut self, frame: &RawFrame) -> ProtocolResult<ProtocolEvent> {
        match frame.family() {
            FrameFamily::Data => {
                let event = TargetListCodec::decode(frame.payload());
                if event.is_idle() {
                    self.empty_frames += 1;
                } else {
                    self.target_frames += 1;
                }
                Ok(ProtocolEvent::Data(event))
            }
            FrameFamily::Command => Ok(ProtocolEvent::Command(CommandResponse::decode(frame)?)),
        }
    }

    /// Number of bytes waiting for a complete frame.
    pub fn buffered_len(&self) -> usize {
        self.accumulator.len()
    }

    /// Statistics so far.
    pub fn stats(&self) -> StreamStats {
        StreamStats {
            bytes_received: self.bytes_received,
            frames_received: self.frames_received,
            empty_frames: self.empty_frames,
            target_frames: self.target_frames,
            locator: self.locator.stats(),
        }
    }

    /// Drop buffered bytes. Statistics are kept.
    pub fn reset(&mut self) {
        self.accumulator.clear();
    }
}
