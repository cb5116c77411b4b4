//! SMTP session state management

use std::mem;
use std::time::SystemTime;

use crate::smtp::error::{Result, SmtpError};
use crate::smtp::mail::{CRLF, Mail};

/// The stage a connection is in. Stages are passed strictly in order;
/// a completed data block leads back to `AwaitingMailFrom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpState {
    /// Waiting for HELO
    AwaitingHelo,
    /// HELO accepted - waiting for MAIL FROM
    AwaitingMailFrom,
    /// MAIL FROM accepted - waiting for RCPT TO
    AwaitingRcpt,
    /// RCPT TO accepted - waiting for DATA
    AwaitingData,
}

/// Stage and mail under construction for a single connection
#[derive(Debug)]
pub struct SmtpSession {
    /// Current stage of the session
    pub state: SmtpState,
    /// The mail of the running transaction
    pub mail: Mail,
}

impl SmtpSession {
    pub fn new() -> Self {
        Self {
            state: SmtpState::AwaitingHelo,
            mail: Mail::new(),
        }
    }

    /// Record the client hostname from an accepted HELO
    pub fn greet(&mut self, hostname: &str) -> Result<()> {
        self.expect_state(SmtpState::AwaitingHelo)?;
        self.mail.hostname = hostname.to_string();
        self.state = SmtpState::AwaitingMailFrom;
        Ok(())
    }

    /// Set the envelope sender
    pub fn set_sender(&mut self, sender: &str) -> Result<()> {
        self.expect_state(SmtpState::AwaitingMailFrom)?;
        self.mail.from = sender.to_string();
        self.state = SmtpState::AwaitingRcpt;
        Ok(())
    }

    /// Add an envelope recipient
    pub fn add_recipient(&mut self, recipient: &str) -> Result<()> {
        self.expect_state(SmtpState::AwaitingRcpt)?;
        self.mail.recipients.push(recipient.to_string());
        self.state = SmtpState::AwaitingData;
        Ok(())
    }

    /// Complete the transaction with the lines of the data block.
    ///
    /// The finished mail is handed out and a fresh one takes its place, so
    /// whoever receives it never sees the next transaction. The HELO
    /// hostname carries over since the client is not greeted again.
    pub fn finish_data(&mut self, lines: Vec<String>) -> Result<Mail> {
        self.expect_state(SmtpState::AwaitingData)?;

        let next = Mail {
            hostname: self.mail.hostname.clone(),
            ..Mail::new()
        };
        let mut mail = mem::replace(&mut self.mail, next);
        mail.data = lines.join(CRLF);
        mail.received_at = SystemTime::now();

        self.state = SmtpState::AwaitingMailFrom;
        Ok(mail)
    }

    fn expect_state(&self, expected: SmtpState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SmtpError::InvalidState(format!(
                "expected {expected:?}, session is in {:?}",
                self.state
            )))
        }
    }
}

impl Default for SmtpSession {
    fn default() -> Self {
        Self::new()
    }
}
