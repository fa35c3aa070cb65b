//! HLK-LD2451 Radar UART Protocol
//!
//! This crate turns the radar's serial byte stream into typed events and
//! typed commands into framed bytes. It does no I/O of its own.
//!
//! # Protocol Overview
//!
//! Two frame families share one serial line:
//!
//! - **Data frames** (radar → host): `F4 F3 F2 F1 ... F8 F7 F6 F5`, carrying
//!   an alarm byte and zero or more target records
//! - **Command frames** (host ↔ radar): `FD FC FB FA ... 04 03 02 01`,
//!   carrying a command word and parameters, or a command id, status and data
//!
//! Both use a 2-byte little-endian length after the header. There is no
//! checksum; frames with a bad tail are skipped by dropping one byte and
//! searching again.
//!
//! # Example
//!
//! ```rust,ignore
//! use ld2451_protocol::{Command, ProtocolEvent, SensitivityConfig, StreamDecoder};
//!
//! // Build a command
//! let frame = Command::SetSensitivityParams(SensitivityConfig::with_snr(5)).encode();
//!
//! // Decode whatever the serial port returned
//! let mut decoder = StreamDecoder::new();
//! decoder.feed(&received);
//! while let Some(event) = decoder.try_decode()? {
//!     if let ProtocolEvent::Data(targets) = event { /* ... */ }
//! }
//! ```

mod commands;
mod constants;
mod error;
mod frame;
mod responses;
mod stream;
mod targets;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use responses::*;
pub use stream::*;
pub use targets::*;
pub use types::*;
