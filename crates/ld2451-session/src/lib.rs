//! HLK-LD2451 Session Engine
//!
//! Drives one radar connection over any byte transport: entering and leaving
//! configuration mode, writing parameters, reading reports, and collecting
//! target data in between.
//!
//! # Example
//!
//! ```rust,ignore
//! use ld2451_session::{IoTransport, SessionConfig, SessionController};
//! use ld2451_protocol::{Command, SensitivityConfig};
//!
//! let port = std::fs::OpenOptions::new().read(true).write(true).open("/dev/ttyUSB0")?;
//! let mut session = SessionController::new(IoTransport::new(port), SessionConfig::default());
//!
//! session.enter_configuration()?;
//! session.apply_parameter(Command::SetSensitivityParams(SensitivityConfig::with_snr(5)))?;
//! session.exit_configuration()?;
//! ```

mod config;
mod controller;
mod error;
pub mod mock;
mod shared;
mod state;
mod transport;

pub use config::{ConfigurationPlan, SessionConfig};
pub use controller::{ConfigurationReport, SessionController, StepReport};
pub use error::{SessionError, SessionResult};
pub use shared::SharedSession;
pub use state::{DeviceMode, SessionState};
pub use transport::{ByteSink, ByteSource, IoTransport, Transport};
