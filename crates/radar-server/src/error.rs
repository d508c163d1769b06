//! Server-side error types.

use std::io;
use std::path::PathBuf;

use radar_core::{NavError, ProtocolError};
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Failure to produce an airport from its definition.
///
/// A failed load never publishes a partial airport.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("airport {0} not found")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid airport data: {0}")]
    Invalid(#[from] NavError),
}

/// Reasons a session ends other than a clean END.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Read or write failure on the connection.
    #[error("transport error: {0}")]
    Transport(#[from] LinesCodecError),

    /// The client closed the connection without END.
    #[error("client disconnected")]
    Disconnected,

    #[error("malformed request: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("failed to load airport: {0}")]
    Load(#[from] LoadError),

    #[error("airport {0} is not available")]
    AirportUnavailable(String),

    #[error("screen size {width}x{height} outside accepted bounds")]
    InvalidScreenSize { width: u32, height: u32 },

    /// A handshake step the current request depends on never happened.
    #[error("handshake step {0} missing")]
    MissingHandshake(&'static str),
}
