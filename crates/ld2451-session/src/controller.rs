//! Command/response session engine.
//!
//! A [`SessionController`] owns one connection: the transport, a stream
//! decoder, and the believed device mode. Commands are issued one at a time;
//! each write is followed by a wait for the matching reply or a timeout, and
//! the next write is held back until the radar's settling delay has passed.
//!
//! Data frames that arrive while a reply is awaited are queued and handed
//! out by [`SessionController::poll_data`].

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use ld2451_protocol::{
    BaudRate, Command, CommandResponse, CommandStatus, DataFrameEvent, DetectionParams, DeviceInfo,
    FirmwareVersion, FrameFamily, OutputFormat, ProtocolEvent, ResponseBody, SensitivityParams,
    StreamDecoder, StreamStats, SystemInfo, SystemStatus,
};
use tracing::{debug, info, trace, warn};

use crate::config::{ConfigurationPlan, SessionConfig};
use crate::error::{SessionError, SessionResult};
use crate::state::{DeviceMode, SessionState};
use crate::transport::Transport;

/// Data events kept while no one polls for them.
const MAX_QUEUED_EVENTS: usize = 256;

// ============================================================================
// Configuration Report
// ============================================================================

/// Outcome of one command in a configuration plan.
#[derive(Debug)]
pub struct StepReport {
    /// Command that was sent.
    pub command: Command,
    /// Reply or failure.
    pub result: SessionResult<CommandResponse>,
}

/// Outcome of [`SessionController::configure`].
#[derive(Debug)]
pub struct ConfigurationReport {
    /// One entry per plan command, in order.
    pub steps: Vec<StepReport>,
    /// Result of leaving configuration mode, wrapped in
    /// [`SessionError::ConfigExitFailed`] on failure.
    pub exit: SessionResult<CommandResponse>,
}

impl ConfigurationReport {
    /// Whether every step and the exit succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.exit.is_ok() && self.steps.iter().all(|step| step.result.is_ok())
    }

    /// Steps that failed.
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|step| step.result.is_err())
    }
}

// ============================================================================
// Session Controller
// ============================================================================

/// One radar connection.
///
/// All command methods take `&mut self`, so a controller can only have one
/// command in flight. Share it between threads with
/// [`SharedSession`](crate::SharedSession).
#[derive(Debug)]
pub struct SessionController<T> {
    transport: T,
    config: SessionConfig,
    decoder: StreamDecoder,
    state: SessionState,

    // Data events received while waiting for replies
    queued: VecDeque<DataFrameEvent>,

    // End of the previous exchange, for the settling delay
    last_exchange: Option<Instant>,
}

impl<T: Transport> SessionController<T> {
    /// Create a controller over `transport`.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        SessionController {
            transport,
            decoder: StreamDecoder::with_buffer_ceiling(config.buffer_ceiling),
            config,
            state: SessionState::default(),
            queued: VecDeque::new(),
            last_exchange: None,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Believed device mode.
    pub fn mode(&self) -> DeviceMode {
        self.state.mode
    }

    /// Mode and counters.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Receive statistics.
    pub fn stream_stats(&self) -> StreamStats {
        self.decoder.stats()
    }

    /// Bytes held for an incomplete frame.
    pub fn buffered_len(&self) -> usize {
        self.decoder.buffered_len()
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    // ------------------------------------------------------------------------
    // Mode transitions
    // ------------------------------------------------------------------------

    /// Put the radar into configuration mode.
    pub fn enter_configuration(&mut self) -> SessionResult<CommandResponse> {
        match self.exchange(&Command::EnableConfiguration) {
            Ok(response) => {
                self.state.mode = DeviceMode::Configuring;
                info!("Session[{}]: entered configuration mode", self.config.name);
                Ok(response)
            }
            Err(e) => {
                warn!(
                    "Session[{}]: failed to enter configuration mode: {}",
                    self.config.name, e
                );
                Err(SessionError::ConfigEntryFailed(Box::new(e)))
            }
        }
    }

    /// Leave configuration mode and resume streaming.
    pub fn exit_configuration(&mut self) -> SessionResult<CommandResponse> {
        match self.exchange(&Command::EndConfiguration) {
            Ok(response) => {
                self.state.mode = DeviceMode::Streaming;
                info!("Session[{}]: resumed streaming", self.config.name);
                Ok(response)
            }
            Err(e) => {
                warn!(
                    "Session[{}]: failed to exit configuration mode: {}",
                    self.config.name, e
                );
                Err(SessionError::ConfigExitFailed(Box::new(e)))
            }
        }
    }

    /// Write detection or sensitivity parameters.
    pub fn apply_parameter(&mut self, command: Command) -> SessionResult<CommandResponse> {
        if !command.is_parameter_set() {
            return Err(SessionError::NotAParameter {
                command_id: command.command_id(),
            });
        }
        self.execute(command)
    }

    /// Send any command and wait for its reply.
    ///
    /// Mode-change commands update the believed mode exactly like
    /// [`enter_configuration`](Self::enter_configuration) and
    /// [`exit_configuration`](Self::exit_configuration). Everything else
    /// requires configuration mode.
    pub fn execute(&mut self, command: Command) -> SessionResult<CommandResponse> {
        match command {
            Command::EnableConfiguration => return self.enter_configuration(),
            Command::EndConfiguration => return self.exit_configuration(),
            _ => {}
        }

        if !self.state.is_configuring() {
            return Err(SessionError::NotConfiguring {
                command_id: command.command_id(),
                mode: self.state.mode,
            });
        }
        self.exchange(&command)
    }

    /// Enter configuration mode, send every command in `plan`, then leave.
    ///
    /// Only a failed entry is returned as an error. Once entry succeeded,
    /// exit is always attempted, and step and exit outcomes are collected
    /// in the report.
    pub fn configure(&mut self, plan: &ConfigurationPlan) -> SessionResult<ConfigurationReport> {
        self.enter_configuration()?;

        let mut steps = Vec::new();
        for command in plan.commands() {
            let result = self.execute(command);
            if let Err(e) = &result {
                warn!(
                    "Session[{}]: command 0x{:02X} failed: {}",
                    self.config.name,
                    command.command_id(),
                    e
                );
            }
            steps.push(StepReport { command, result });
        }

        let exit = self.exit_configuration();
        Ok(ConfigurationReport { steps, exit })
    }

    // ------------------------------------------------------------------------
    // Typed commands
    // ------------------------------------------------------------------------

    /// Read the detection parameters.
    pub fn read_detection_params(&mut self) -> SessionResult<DetectionParams> {
        match self.execute_body(Command::ReadDetectionParams)? {
            ResponseBody::DetectionParams(params) => Ok(params),
            _ => Err(unexpected(&Command::ReadDetectionParams)),
        }
    }

    /// Read the sensitivity parameters.
    pub fn read_sensitivity_params(&mut self) -> SessionResult<SensitivityParams> {
        match self.execute_body(Command::ReadSensitivityParams)? {
            ResponseBody::SensitivityParams(params) => Ok(params),
            _ => Err(unexpected(&Command::ReadSensitivityParams)),
        }
    }

    /// Read the firmware version.
    pub fn read_firmware_version(&mut self) -> SessionResult<FirmwareVersion> {
        match self.execute_body(Command::ReadFirmwareVersion)? {
            ResponseBody::FirmwareVersion(version) => Ok(version),
            _ => Err(unexpected(&Command::ReadFirmwareVersion)),
        }
    }

    /// Switch the baud rate. The radar reports its system info in reply.
    pub fn set_baud_rate(&mut self, rate: BaudRate) -> SessionResult<SystemInfo> {
        let command = Command::SetBaudRate(rate);
        match self.execute_body(command)? {
            ResponseBody::SystemInfo(info) => Ok(info),
            _ => Err(unexpected(&command)),
        }
    }

    /// Restore factory settings.
    pub fn factory_reset(&mut self) -> SessionResult<SystemStatus> {
        match self.execute_body(Command::FactoryReset)? {
            ResponseBody::SystemStatus(status) => Ok(status),
            _ => Err(unexpected(&Command::FactoryReset)),
        }
    }

    /// Restart the radar. The believed mode resets to unknown.
    pub fn restart(&mut self) -> SessionResult<DeviceInfo> {
        match self.execute_body(Command::Restart)? {
            ResponseBody::DeviceInfo(info) => {
                self.state.mode = DeviceMode::Unknown;
                Ok(info)
            }
            _ => Err(unexpected(&Command::Restart)),
        }
    }

    /// Select the streamed output format.
    pub fn set_output_format(&mut self, format: OutputFormat) -> SessionResult<CommandResponse> {
        self.execute(Command::SetOutputFormat(format))
    }

    fn execute_body(&mut self, command: Command) -> SessionResult<ResponseBody> {
        let response = self.execute(command)?;
        Ok(response.body()?)
    }

    // ------------------------------------------------------------------------
    // Streaming
    // ------------------------------------------------------------------------

    /// Next target report, waiting up to `timeout`.
    ///
    /// Returns `Ok(None)` if nothing arrived in time. Unsolicited command
    /// frames are logged and skipped.
    pub fn poll_data(&mut self, timeout: Duration) -> SessionResult<Option<DataFrameEvent>> {
        if let Some(event) = self.queued.pop_front() {
            return Ok(Some(event));
        }

        let deadline = Instant::now() + timeout;
        loop {
            while let Some(frame) = self.decoder.next_frame() {
                match self.decoder.decode_frame(&frame) {
                    Ok(ProtocolEvent::Data(event)) => {
                        if self.state.mode == DeviceMode::Unknown {
                            self.state.mode = DeviceMode::Streaming;
                        }
                        return Ok(Some(event));
                    }
                    Ok(ProtocolEvent::Command(response)) => {
                        debug!(
                            "Session[{}]: ignoring unsolicited reply 0x{:02X}",
                            self.config.name, response.command_id
                        );
                    }
                    Err(e) => {
                        warn!("Session[{}]: dropping malformed frame: {}", self.config.name, e);
                    }
                }
            }

            if !self.fill(deadline)? {
                return Ok(None);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Exchange
    // ------------------------------------------------------------------------

    /// Write one command and wait for its reply.
    fn exchange(&mut self, command: &Command) -> SessionResult<CommandResponse> {
        command.validate()?;
        self.settle();

        let command_id = command.command_id();
        let frame = command.encode();
        debug!(
            "Session[{}]: sending command 0x{:02X} ({} bytes)",
            self.config.name,
            command_id,
            frame.len()
        );
        trace!("Session[{}]: tx {:02X?}", self.config.name, frame);

        let result = match self.transport.write(&frame) {
            Ok(()) => {
                self.state.commands_sent += 1;
                self.await_reply(command_id, &frame)
            }
            Err(e) => Err(SessionError::Transport(e)),
        };
        self.last_exchange = Some(Instant::now());

        match &result {
            Ok(response) => {
                self.state.commands_succeeded += 1;
                debug!(
                    "Session[{}]: command 0x{:02X} succeeded ({} data bytes)",
                    self.config.name,
                    command_id,
                    response.data.len()
                );
            }
            Err(_) => self.state.commands_failed += 1,
        }
        result
    }

    fn await_reply(&mut self, command_id: u8, sent: &[u8]) -> SessionResult<CommandResponse> {
        let started = Instant::now();
        let deadline = started + self.config.response_timeout();
        let mut saw_stream = false;

        loop {
            while let Some(frame) = self.decoder.next_frame() {
                if frame.family() == FrameFamily::Data {
                    saw_stream = true;
                    if let Ok(ProtocolEvent::Data(event)) = self.decoder.decode_frame(&frame) {
                        self.queue(event);
                    }
                    continue;
                }

                if frame.to_bytes() == sent {
                    return Err(SessionError::Echoed { command_id });
                }

                let response = CommandResponse::decode(&frame)?;
                if !response.answers(command_id) {
                    debug!(
                        "Session[{}]: skipping stale reply 0x{:02X} while awaiting 0x{:02X}",
                        self.config.name, response.command_id, command_id
                    );
                    continue;
                }
                return match response.outcome() {
                    CommandStatus::Executed => Ok(response),
                    CommandStatus::Acknowledged => Err(SessionError::NotExecuted { command_id }),
                    CommandStatus::Rejected(status) => {
                        Err(SessionError::Rejected { command_id, status })
                    }
                };
            }

            if !self.fill(deadline)? {
                return Err(if saw_stream {
                    SessionError::UnexpectedStreamingReply { command_id }
                } else {
                    SessionError::Timeout {
                        command_id,
                        waited: started.elapsed(),
                    }
                });
            }
        }
    }

    /// Read once into the decoder, sleeping on an empty read.
    ///
    /// Returns `false` once `deadline` has passed. Buffered bytes are never
    /// discarded here.
    fn fill(&mut self, deadline: Instant) -> SessionResult<bool> {
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }

        let chunk = self.transport.read(self.config.read_chunk)?;
        if chunk.is_empty() {
            thread::sleep(self.config.poll_interval().min(deadline - now));
        } else {
            trace!("Session[{}]: rx {} bytes", self.config.name, chunk.len());
            self.decoder.feed(&chunk);
        }
        Ok(true)
    }

    fn queue(&mut self, event: DataFrameEvent) {
        if self.queued.len() >= MAX_QUEUED_EVENTS {
            self.queued.pop_front();
            trace!("Session[{}]: data queue full, dropped oldest", self.config.name);
        }
        self.queued.push_back(event);
    }

    fn settle(&self) {
        let Some(last) = self.last_exchange else {
            return;
        };
        let delay = self.config.settle_delay();
        let elapsed = last.elapsed();
        if elapsed < delay {
            thread::sleep(delay - elapsed);
        }
    }
}

fn unexpected(command: &Command) -> SessionError {
    SessionError::UnexpectedResponse {
        command_id: command.command_id(),
    }
}
