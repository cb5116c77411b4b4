//! SMTP response handling

use std::fmt::Display;

/// Represents an SMTP response that can be sent to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpResponse {
    /// The SMTP reply code (e.g. 250, 354, 502)
    pub code: u16,
    /// The human-readable message
    pub message: String,
}

impl SmtpResponse {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Greeting sent when a connection is opened (220)
    pub fn greeting(hostname: &str) -> Self {
        Self::new(220, format!("{hostname} ready"))
    }

    /// Reply to an accepted HELO, carrying the server identity (250)
    pub fn helo(hostname: &str) -> Self {
        Self::new(250, hostname)
    }

    /// Generic success (250)
    pub fn ok() -> Self {
        Self::new(250, "OK")
    }

    /// The data block was accepted (250)
    pub fn queued() -> Self {
        Self::new(250, "OK, queued!")
    }

    /// Invitation to send the data block (354)
    pub fn data_start() -> Self {
        Self::new(354, "End data with <CR><LF>.<CR><LF>")
    }

    /// Reply to QUIT (221)
    pub fn quit() -> Self {
        Self::new(221, "Bye")
    }

    /// The command does not belong to the current stage (502)
    pub fn out_of_sequence(expected: &str) -> Self {
        Self::new(502, format!("{expected} awaited."))
    }

    /// The HELO hostname could not be looked up (451)
    pub fn unresolvable(err: impl Display) -> Self {
        Self::new(451, format!("Cannot resolve your address ({err})"))
    }

    /// The HELO hostname resolved to nothing (451)
    pub fn no_addresses() -> Self {
        Self::new(451, "Host found, but no addresses found.")
    }

    /// Reading the data block failed (451)
    pub fn data_failed() -> Self {
        Self::new(451, "Problem processing your data")
    }

    /// Format the response for sending over the wire
    pub fn format(&self) -> String {
        format!("{} {}\r\n", self.code, self.message)
    }

    /// Check if this is a positive completion reply (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}
