//! Client error types.

use getml_config::ConfigError;
use getml_core::CoreError;
use thiserror::Error;

/// Errors that can occur while talking to the getML engine.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Socket or process I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine closed the connection in the middle of a message.
    #[error("Connection to getML engine broken")]
    ConnectionBroken,

    /// The bytes on the wire do not form a valid message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The engine answered with an error message instead of a status.
    #[error("{0}")]
    Engine(String),

    /// No engine accepts connections at the configured address.
    #[error(
        "Cannot connect to getML engine at {address}. Make sure the engine is running and you are logged in."
    )]
    EngineNotRunning {
        /// `host:port` that refused the connection.
        address: String,
    },

    /// Opening a connection took longer than the configured timeout.
    #[error("timed out connecting to getML engine at {address}")]
    ConnectTimeout {
        /// `host:port` that did not answer.
        address: String,
    },

    /// The engine accepted a request but did not reply in time.
    #[error("getML engine did not reply within {secs}s")]
    ReadTimeout {
        /// Read timeout in seconds.
        secs: u64,
    },

    /// `run` started the engine but it never answered.
    #[error("getML engine did not answer within {secs}s after start")]
    StartupTimeout {
        /// Configured startup timeout in seconds.
        secs: u64,
    },

    /// An engine helper script exited unsuccessfully.
    #[error("{script} failed: {status}")]
    ScriptFailed {
        /// Script that was run.
        script: String,
        /// Exit status as reported by the OS.
        status: String,
    },

    /// A model was sent without its data model.
    #[error("{0} cannot be None!")]
    MissingPlaceholder(&'static str),

    /// Training and validation populations disagree on their columns.
    #[error("Training and validation data do not match: {0}")]
    ColumnMismatch(#[source] CoreError),

    /// Invalid local data or parameters.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
