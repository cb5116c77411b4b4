use clap::Parser;
use maild::{Mail, SmtpServer};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::UNIX_EPOCH;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Receive mails and store each one as a file
#[derive(Parser, Debug)]
#[command(name = "maild", version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:2525")]
    address: String,

    /// Hostname announced to connecting clients
    #[arg(long, default_value = "localhost")]
    hostname: String,

    /// Directory received mails are written to
    #[arg(short, long, default_value = ".")]
    spool_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        address = %args.address,
        hostname = %args.hostname,
        spool_dir = %args.spool_dir.display(),
        "maild starting"
    );

    let server = SmtpServer::new(&args.address, &args.hostname);
    let spool_dir = args.spool_dir;

    let result = server.listen_and_receive(move |mail: Mail| match save_mail(&spool_dir, &mail) {
        Ok(path) => info!(
            from = %mail.from,
            recipients = ?mail.recipients,
            file = %path.display(),
            "Received mail"
        ),
        Err(e) => error!(from = %mail.from, error = %e, "Failed to store mail"),
    });

    if let Err(e) = result {
        error!(error = %e, "Server stopped");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Write the mail data to `<unix seconds>.mail` in `dir`, adding a counter
/// when several mails arrive within the same second
fn save_mail(dir: &Path, mail: &Mail) -> io::Result<PathBuf> {
    let secs = mail
        .received_at
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();

    for attempt in 0u32.. {
        let name = match attempt {
            0 => format!("{secs}.mail"),
            n => format!("{secs}-{n}.mail"),
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(mail.data.as_bytes())?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::other("no free spool file name"))
}
