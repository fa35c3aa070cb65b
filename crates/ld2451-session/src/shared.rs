//! Thread-shareable session handle.

use std::sync::Arc;
use std::time::Duration;

use ld2451_protocol::{Command, CommandResponse, DataFrameEvent};
use parking_lot::{Mutex, MutexGuard};

use crate::controller::SessionController;
use crate::error::SessionResult;
use crate::state::{DeviceMode, SessionState};
use crate::transport::Transport;

/// Clonable handle to one [`SessionController`].
///
/// Every operation holds the connection lock for its whole round trip, so
/// commands from different threads are issued strictly one after another.
pub struct SharedSession<T> {
    inner: Arc<Mutex<SessionController<T>>>,
}

impl<T> Clone for SharedSession<T> {
    fn clone(&self) -> Self {
        SharedSession {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> SharedSession<T> {
    /// Wrap a controller.
    pub fn new(controller: SessionController<T>) -> Self {
        SharedSession {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Lock the controller for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, SessionController<T>> {
        self.inner.lock()
    }

    /// See [`SessionController::enter_configuration`].
    pub fn enter_configuration(&self) -> SessionResult<CommandResponse> {
        self.inner.lock().enter_configuration()
    }

    /// See [`SessionController::exit_configuration`].
    pub fn exit_configuration(&self) -> SessionResult<CommandResponse> {
        self.inner.lock().exit_configuration()
    }

    /// See [`SessionController::apply_parameter`].
    pub fn apply_parameter(&self, command: Command) -> SessionResult<CommandResponse> {
        self.inner.lock().apply_parameter(command)
    }

    /// See [`SessionController::execute`].
    pub fn execute(&self, command: Command) -> SessionResult<CommandResponse> {
        self.inner.lock().execute(command)
    }

    /// See [`SessionController::poll_data`].
    pub fn poll_data(&self, timeout: Duration) -> SessionResult<Option<DataFrameEvent>> {
        self.inner.lock().poll_data(timeout)
    }

    /// Believed device mode.
    pub fn mode(&self) -> DeviceMode {
        self.inner.lock().mode()
    }

    /// Mode and counters.
    pub fn state(&self) -> SessionState {
        self.inner.lock().state()
    }
}
