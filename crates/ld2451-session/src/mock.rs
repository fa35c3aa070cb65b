//! Scripted radar for tests.
//!
//! Replies are queued up front and released one per host write, so a reply
//! can never be read before the command it answers was sent. Unsolicited
//! bytes (data frames, noise) can be queued at any time.

use std::collections::VecDeque;
use std::io;

use ld2451_protocol::{FrameFamily, ProtocolResult, RawFrame};

use crate::transport::{ByteSink, ByteSource};

/// In-memory transport that behaves like a scripted radar.
#[derive(Debug, Default)]
pub struct MockTransport {
    inbound: VecDeque<u8>,
    replies: VecDeque<Option<Vec<u8>>>,
    written: Vec<Vec<u8>>,
    chunk_size: Option<usize>,

    // Outstanding-command tracking, in absolute byte positions.
    pushed: usize,
    consumed: usize,
    reply_ends: VecDeque<usize>,
    max_outstanding: usize,
}

impl MockTransport {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit every read to `chunk_size` bytes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    /// Make bytes available to read immediately.
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
        self.pushed += bytes.len();
    }

    /// Queue a data frame carrying `payload`.
    pub fn push_data_frame(&mut self, payload: &[u8]) -> ProtocolResult<()> {
        let bytes = RawFrame::new(FrameFamily::Data, payload.to_vec())?.to_bytes();
        self.push_inbound(&bytes);
        Ok(())
    }

    /// Release `bytes` after the next unanswered host write.
    pub fn script_reply(&mut self, bytes: Vec<u8>) {
        self.replies.push_back(Some(bytes));
    }

    /// Release a command reply frame `[command_id][status][data]` after the
    /// next unanswered host write.
    pub fn script_command_reply(
        &mut self,
        command_id: u8,
        status: u8,
        data: &[u8],
    ) -> ProtocolResult<()> {
        let mut payload = vec![command_id, status];
        payload.extend_from_slice(data);
        self.script_reply(RawFrame::new(FrameFamily::Command, payload)?.to_bytes());
        Ok(())
    }

    /// Stay silent after the next unanswered host write.
    pub fn script_silence(&mut self) {
        self.replies.push_back(None);
    }

    /// Every frame the host wrote, in order.
    pub fn written(&self) -> &[Vec<u8>] {
        &self.written
    }

    /// Command ids of everything the host wrote.
    pub fn written_command_ids(&self) -> Vec<u8> {
        self.written
            .iter()
            .filter_map(|frame| frame.get(6).copied())
            .collect()
    }

    /// Largest number of scripted replies that were pending at once.
    pub fn max_outstanding(&self) -> usize {
        self.max_outstanding
    }

    /// Bytes not yet read by the host.
    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }

    /// Scripted replies not yet released.
    pub fn unused_replies(&self) -> usize {
        self.replies.len()
    }
}

impl ByteSource for MockTransport {
    fn read(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        let limit = self.chunk_size.map_or(max_bytes, |c| c.min(max_bytes));
        let n = limit.min(self.inbound.len());
        let bytes: Vec<u8> = self.inbound.drain(..n).collect();

        self.consumed += n;
        while self.reply_ends.front().is_some_and(|&end| end <= self.consumed) {
            self.reply_ends.pop_front();
        }
        Ok(bytes)
    }
}

impl ByteSink for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.written.push(bytes.to_vec());

        if let Some(Some(reply)) = self.replies.pop_front() {
            self.push_inbound(&reply);
            self.reply_ends.push_back(self.pushed);
            self.max_outstanding = self.max_outstanding.max(self.reply_ends.len());
        }
        Ok(())
    }
}
