//! Server error types.

use std::io;

use thiserror::Error;

use crate::{services::ServiceError, storage::StoreError};

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Listener could not be bound.
    ///
    /// Fatal: reported before the process exits.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested bind address
        addr: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Configuration error (unreadable host key, invalid address, etc.).
    #[error("configuration error: {0}")]
    Config(String),

    /// Error inside one SSH session. Confined to that session.
    #[error("ssh error: {0}")]
    Ssh(#[from] SshError),

    /// Collaborators could not be set up.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Local persistence error.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by an SSH connection.
#[derive(Debug, Error)]
pub enum SshError {
    /// SSH protocol or transport failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] russh::Error),

    /// I/O error while writing to the channel.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
