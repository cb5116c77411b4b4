//! SMTP server implementation

use crate::smtp::commands::{Outcome, SmtpCommandHandler};
use crate::smtp::error::{Result, SmtpError};
use crate::smtp::handler::MailHandler;
use crate::smtp::reader::LineReader;
use crate::smtp::resolver::{Resolver, SystemResolver};
use crate::smtp::response::SmtpResponse;
use crate::smtp::session::SmtpSession;

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, info_span, trace, warn};

/// Receives mails on one address and hands them to a [`MailHandler`]
#[derive(Clone)]
pub struct SmtpServer {
    /// Address to listen on
    address: String,
    /// Server hostname, announced to clients
    hostname: Arc<str>,
    /// Lookup used to vet the HELO hostname
    resolver: Arc<dyn Resolver>,
}

impl SmtpServer {
    /// Create a new SMTP server using the system resolver
    pub fn new(address: &str, hostname: &str) -> Self {
        Self {
            address: address.to_owned(),
            hostname: Arc::from(hostname),
            resolver: Arc::new(SystemResolver),
        }
    }

    /// Replace the resolver used to look up HELO hostnames
    pub fn with_resolver<R: Resolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Listen on the configured address and receive mails forever.
    ///
    /// Every connection is served on its own thread. Bind and listener
    /// failures are returned; errors of single connections are logged.
    pub fn listen_and_receive<H: MailHandler + 'static>(&self, handler: H) -> Result<()> {
        let listener = TcpListener::bind(&self.address).map_err(|source| SmtpError::Bind {
            address: self.address.clone(),
            source,
        })?;

        self.receive(listener, handler)
    }

    /// Receive mails on an existing listener (blocking).
    ///
    /// Transient accept errors (aborted handshakes, descriptor exhaustion)
    /// are logged and retried after a growing pause. Errors that mean the
    /// listener itself is unusable end the loop.
    pub fn receive<H: MailHandler + 'static>(&self, listener: TcpListener, handler: H) -> Result<()> {
        info!(address = %listener.local_addr()?, hostname = %self.hostname, "SMTP server listening");

        let handler: Arc<dyn MailHandler> = Arc::new(handler);
        let mut backoff = AcceptBackoff::default();

        loop {
            match listener.accept() {
                Ok((stream, peer)) => {
                    backoff.reset();
                    self.spawn_client(stream, peer, Arc::clone(&handler));
                }
                Err(e) if is_fatal_accept_error(&e) => {
                    error!(error = %e, "Listener failed");
                    return Err(SmtpError::Accept(e));
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(error = %e, ?delay, "Error during connection accept");
                    thread::sleep(delay);
                }
            }
        }
    }

    fn spawn_client(&self, stream: TcpStream, peer: SocketAddr, handler: Arc<dyn MailHandler>) {
        let hostname = Arc::clone(&self.hostname);
        let resolver = Arc::clone(&self.resolver);

        let spawned = thread::Builder::new()
            .name("smtp-conn".to_string())
            .spawn(move || {
                let _span = info_span!("connection", %peer).entered();
                debug!("Connection accepted");

                if let Err(e) = handle_client(stream, &hostname, resolver.as_ref(), handler.as_ref())
                {
                    error!(error = %e, "Error handling client");
                }
            });

        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn connection thread");
        }
    }
}

/// Accept errors caused by the listening socket rather than by one client
fn is_fatal_accept_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::InvalidInput | io::ErrorKind::Unsupported
    )
}

/// Pause between failed accepts, doubling up to a ceiling
#[derive(Debug, Default)]
struct AcceptBackoff {
    delay: Option<Duration>,
}

impl AcceptBackoff {
    const INITIAL: Duration = Duration::from_millis(5);
    const MAX: Duration = Duration::from_secs(1);

    fn next_delay(&mut self) -> Duration {
        let delay = self
            .delay
            .map_or(Self::INITIAL, |delay| (delay * 2).min(Self::MAX));
        self.delay = Some(delay);
        delay
    }

    fn reset(&mut self) {
        self.delay = None;
    }
}

/// Handle a client connection
fn handle_client(
    stream: TcpStream,
    hostname: &str,
    resolver: &dyn Resolver,
    handler: &dyn MailHandler,
) -> Result<()> {
    let reader = BufReader::new(stream.try_clone()?);
    serve_connection(reader, stream, hostname, resolver, handler)
}

/// Run the SMTP dialogue on one connection until it is closed
pub(crate) fn serve_connection<R: BufRead, W: Write>(
    reader: R,
    mut writer: W,
    hostname: &str,
    resolver: &dyn Resolver,
    handler: &dyn MailHandler,
) -> Result<()> {
    let mut lines = LineReader::new(reader);
    let mut session = SmtpSession::new();
    let commands = SmtpCommandHandler::new(hostname, resolver);

    send_response(&mut writer, &SmtpResponse::greeting(hostname))?;

    loop {
        let line = match lines.read_line() {
            Ok(line) => line,
            Err(e) => {
                debug!(reason = %e, "Connection closed");
                return Ok(());
            }
        };
        trace!(line = %line, state = ?session.state, "Received line");

        match commands.process_command(&line, &mut session)? {
            Outcome::Reply(response) => send_response(&mut writer, &response)?,
            Outcome::Close(response) => {
                send_response(&mut writer, &response)?;
                debug!(code = response.code, "Closing connection");
                return Ok(());
            }
            Outcome::Data(response) => {
                send_response(&mut writer, &response)?;

                match lines.read_dot_lines() {
                    Ok(data) => {
                        let mail = session.finish_data(data)?;
                        send_response(&mut writer, &SmtpResponse::queued())?;
                        info!(
                            from = %mail.from,
                            recipients = mail.recipients.len(),
                            size = mail.data_size(),
                            "Mail received"
                        );
                        handler.handle(mail);
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read mail data");
                        send_response(&mut writer, &SmtpResponse::data_failed())?;
                    }
                }
            }
        }
    }
}

/// Send a response to the client
fn send_response<W: Write>(writer: &mut W, response: &SmtpResponse) -> Result<()> {
    writer.write_all(response.format().as_bytes())?;
    writer.flush()?;
    Ok(())
}
