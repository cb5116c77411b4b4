//! Mail record handed to the mail handler

use std::time::SystemTime;

/// Line separator used to join the lines of the data block
pub const CRLF: &str = "\r\n";

/// A mail received by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    /// The hostname the client claimed in HELO
    pub hostname: String,

    /// Envelope sender, exactly as given after `MAIL FROM:`
    pub from: String,

    /// Envelope recipients, in the order they were given
    pub recipients: Vec<String>,

    /// Mail content; received lines joined with CRLF.
    ///
    /// Lines are decoded as UTF-8. Bytes that are not valid UTF-8 (8-bit
    /// bodies in legacy charsets) are replaced with U+FFFD, so such content
    /// does not survive byte for byte.
    pub data: String,

    /// When the data block was completed
    pub received_at: SystemTime,
}

impl Mail {
    /// Create an empty mail
    pub fn new() -> Self {
        Self {
            hostname: String::new(),
            from: String::new(),
            recipients: Vec::with_capacity(1),
            data: String::new(),
            received_at: SystemTime::now(),
        }
    }

    /// Check if this mail was addressed to a specific recipient
    pub fn has_recipient(&self, recipient: &str) -> bool {
        self.recipients.iter().any(|rcpt| rcpt == recipient)
    }

    /// Iterate over the received data lines
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.data.split(CRLF)
    }

    /// Size of the mail data in bytes
    pub fn data_size(&self) -> usize {
        self.data.len()
    }
}

impl Default for Mail {
    fn default() -> Self {
        Self::new()
    }
}
