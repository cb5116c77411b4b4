//! SMTP receiver implementation

pub mod commands;
pub mod error;
pub mod handler;
pub mod mail;
pub mod reader;
pub mod resolver;
pub mod response;
pub mod server;
pub mod session;

pub use commands::{Outcome, SmtpCommandHandler};
pub use error::SmtpError;
pub use handler::MailHandler;
pub use mail::Mail;
pub use reader::LineReader;
pub use resolver::{Resolver, SystemResolver};
pub use response::SmtpResponse;
pub use server::SmtpServer;
pub use session::{SmtpSession, SmtpState};
