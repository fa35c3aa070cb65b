use std::path::PathBuf;

use ld2451_protocol::ProtocolError;
use ld2451_session::SessionError;
use thiserror::Error;

/// Failures surfaced to the command line.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open port {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: serialport::Error,
    },

    #[error("invalid hex capture: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("{0} plan step(s) failed")]
    PlanFailed(usize),
}

pub type CliResult<T> = Result<T, CliError>;
