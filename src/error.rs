//! Error types for sshtap.

use std::io;
use thiserror::Error;

/// Main error type for sshtap operations.
///
/// Deadline expiry during a read and prompt-sync exhaustion are *not*
/// errors: they surface as [`CompletionStatus`](crate::channel::CompletionStatus)
/// and the `prompt_synced` flag on [`Response`](crate::session::Response),
/// and partial output is always returned.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Pattern construction errors
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Output sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Transport layer errors (SSH connection, authentication, channel I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Connection establishment timed out
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    /// Channel closed or end-of-stream while reading
    #[error("Connection disconnected")]
    Disconnected,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Matcher construction errors.
///
/// Escaped literal input should never fail to compile, so this is treated
/// as fatal for the command that triggered it.
#[derive(Error, Debug)]
pub enum PatternError {
    /// The assembled pattern did not compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Output sink delivery errors.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Writing to the console failed
    #[error("Console write failed: {0}")]
    Io(#[from] io::Error),

    /// Serializing a bus record failed
    #[error("Record serialization failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The bus receiver was dropped
    #[error("Bus receiver closed")]
    BusClosed,
}

/// Result type alias using sshtap's Error.
pub type Result<T> = std::result::Result<T, Error>;
