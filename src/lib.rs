//! # maild
//!
//! maild is a tiny inbound-only SMTP receiver.
//!
//! It accepts plaintext connections, walks every client through
//! `HELO`, `MAIL FROM`, `RCPT TO` and `DATA`, and hands each completed mail
//! to your own handler. It has no relay capability and no support for any
//! SMTP extension.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use maild::{Mail, SmtpServer};
//! use std::sync::mpsc;
//! use std::thread;
//!
//! let (tx, rx) = mpsc::channel();
//! let server = SmtpServer::new("127.0.0.1:2525", "mx.example.com");
//!
//! thread::spawn(move || {
//!     server
//!         .listen_and_receive(move |mail: Mail| {
//!             let _ = tx.send(mail);
//!         })
//!         .unwrap();
//! });
//!
//! while let Ok(mail) = rx.recv() {
//!     println!("Received mail from {} to {:?}", mail.from, mail.recipients);
//! }
//! ```
//!
//! ## Protocol
//!
//! Commands must arrive in this exact order; anything else is answered with
//! `502` and the client may try again:
//!
//! 1. `HELO <hostname>` - the hostname must resolve to at least one address,
//!    otherwise the server answers `451` and hangs up
//! 2. `MAIL FROM:<address>`
//! 3. `RCPT TO:<address>` (one recipient per mail)
//! 4. `DATA` - followed by the mail, terminated by a line holding a single `.`
//!
//! After the data block the client can start over with `MAIL FROM`.
//! `QUIT` closes the connection at any time.
//!
//! ## Additional Features
//!
//! Enabling the `ehlo` feature also accepts `EHLO` in place of `HELO`. No
//! extensions are advertised.
//!
//! ## Notes
//!
//! - SMTP authentication is not supported.
//! - SSL/TLS connection is not supported.
//! - Mail relay is not supported.
//! - Idle connections are never timed out.
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`]; install a subscriber to see them.

mod smtp;

pub use smtp::{
    LineReader, Mail, MailHandler, Outcome, Resolver, SmtpCommandHandler, SmtpError,
    SmtpResponse, SmtpServer, SmtpSession, SmtpState, SystemResolver,
};
