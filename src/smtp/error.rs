//! Error types for the SMTP server

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The listening socket stopped accepting connections
    #[error("Failed to accept connections: {0}")]
    Accept(#[source] std::io::Error),

    /// The session reached a state the command sequence cannot produce
    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, SmtpError>;
