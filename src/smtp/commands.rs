//! Implementation of SMTP commands

use tracing::{debug, warn};

use crate::smtp::error::Result;
use crate::smtp::resolver::Resolver;
use crate::smtp::response::SmtpResponse;
use crate::smtp::session::{SmtpSession, SmtpState};

const HELO: &str = "HELO ";
#[cfg(feature = "ehlo")]
const EHLO: &str = "EHLO ";
const MAIL_FROM: &str = "MAIL FROM:";
const RCPT_TO: &str = "RCPT TO:";
const DATA: &str = "DATA";
const QUIT: &str = "quit";

/// What the connection should do after a command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send the reply and wait for the next line
    Reply(SmtpResponse),
    /// Send the reply and close the connection
    Close(SmtpResponse),
    /// Send the reply and read the data block
    Data(SmtpResponse),
}

/// Handles SMTP command lines for one stage at a time
pub struct SmtpCommandHandler<'a> {
    hostname: &'a str,
    resolver: &'a dyn Resolver,
}

impl<'a> SmtpCommandHandler<'a> {
    pub fn new(hostname: &'a str, resolver: &'a dyn Resolver) -> Self {
        Self { hostname, resolver }
    }

    /// Process a command line and decide how to answer it.
    ///
    /// QUIT is honoured in every stage; any other line is checked against
    /// the command the current stage expects.
    pub fn process_command(&self, line: &str, session: &mut SmtpSession) -> Result<Outcome> {
        if line.trim().eq_ignore_ascii_case(QUIT) {
            return Ok(Outcome::Close(SmtpResponse::quit()));
        }

        match session.state {
            SmtpState::AwaitingHelo => self.handle_helo(line, session),
            SmtpState::AwaitingMailFrom => Self::handle_mail(line, session),
            SmtpState::AwaitingRcpt => Self::handle_rcpt(line, session),
            SmtpState::AwaitingData => Ok(Self::handle_data(line)),
        }
    }

    fn handle_helo(&self, line: &str, session: &mut SmtpSession) -> Result<Outcome> {
        let Some(hostname) = greeting_param(line).filter(|host| !host.is_empty()) else {
            debug!(line, "Expected HELO");
            return Ok(Outcome::Reply(SmtpResponse::out_of_sequence("HELO")));
        };

        match self.resolver.lookup_host(hostname) {
            Err(e) => {
                warn!(hostname, error = %e, "Cannot resolve client hostname");
                Ok(Outcome::Close(SmtpResponse::unresolvable(&e)))
            }
            Ok(addrs) if addrs.is_empty() => {
                warn!(hostname, "Client hostname has no addresses");
                Ok(Outcome::Close(SmtpResponse::no_addresses()))
            }
            Ok(addrs) => {
                debug!(hostname, ?addrs, "Client hostname resolved");
                session.greet(hostname)?;
                Ok(Outcome::Reply(SmtpResponse::helo(self.hostname)))
            }
        }
    }

    fn handle_mail(line: &str, session: &mut SmtpSession) -> Result<Outcome> {
        let Some(sender) = param(line, MAIL_FROM) else {
            debug!(line, "Expected MAIL FROM");
            return Ok(Outcome::Reply(SmtpResponse::out_of_sequence("MAIL FROM")));
        };

        session.set_sender(sender)?;
        Ok(Outcome::Reply(SmtpResponse::ok()))
    }

    fn handle_rcpt(line: &str, session: &mut SmtpSession) -> Result<Outcome> {
        let Some(recipient) = param(line, RCPT_TO) else {
            debug!(line, "Expected RCPT TO");
            return Ok(Outcome::Reply(SmtpResponse::out_of_sequence("RCPT TO")));
        };

        session.add_recipient(recipient)?;
        Ok(Outcome::Reply(SmtpResponse::ok()))
    }

    fn handle_data(line: &str) -> Outcome {
        if line.trim() == DATA {
            Outcome::Data(SmtpResponse::data_start())
        } else {
            debug!(line, "Expected DATA");
            Outcome::Reply(SmtpResponse::out_of_sequence("DATA"))
        }
    }
}

/// The argument following `command`, trimmed
fn param<'l>(line: &'l str, command: &str) -> Option<&'l str> {
    line.strip_prefix(command).map(str::trim)
}

fn greeting_param(line: &str) -> Option<&str> {
    let hostname = param(line, HELO);
    #[cfg(feature = "ehlo")]
    let hostname = hostname.or_else(|| param(line, EHLO));
    hostname
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::net::{IpAddr, Ipv4Addr};

    struct TestResolver;

    impl Resolver for TestResolver {
        fn lookup_host(&self, host: &str) -> io::Result<Vec<IpAddr>> {
            match host {
                "nowhere.invalid" => Err(io::Error::new(io::ErrorKind::NotFound, "no such host")),
                "empty.example" => Ok(Vec::new()),
                _ => Ok(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]),
            }
        }
    }

    fn create_handler() -> SmtpCommandHandler<'static> {
        SmtpCommandHandler::new("test.local", &TestResolver)
    }

    fn reply(outcome: Outcome) -> SmtpResponse {
        match outcome {
            Outcome::Reply(response) => response,
            other => panic!("expected a plain reply, got {other:?}"),
        }
    }

    #[test]
    fn test_helo_command() {
        let handler = create_handler();
        let mut session = SmtpSession::new();

        let response = reply(
            handler
                .process_command("HELO client.example", &mut session)
                .unwrap(),
        );

        assert_eq!(response, SmtpResponse::helo("test.local"));
        assert_eq!(session.mail.hostname, "client.example");
        assert_eq!(session.state, SmtpState::AwaitingMailFrom);
    }

    #[test]
    fn test_helo_missing_hostname() {
        let handler = create_handler();
        let mut session = SmtpSession::new();

        for line in ["HELO", "HELO ", "HELO    "] {
            let response = reply(handler.process_command(line, &mut session).unwrap());
            assert_eq!(response.code, 502);
            assert_eq!(session.state, SmtpState::AwaitingHelo);
        }
    }

    #[test]
    fn test_helo_is_case_sensitive() {
        let handler = create_handler();
        let mut session = SmtpSession::new();

        let response = reply(
            handler
                .process_command("helo client.example", &mut session)
                .unwrap(),
        );
        assert_eq!(response.code, 502);
    }

    #[test]
    fn test_helo_unresolvable_closes() {
        let handler = create_handler();
        let mut session = SmtpSession::new();

        let outcome = handler
            .process_command("HELO nowhere.invalid", &mut session)
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Close(SmtpResponse::new(
                451,
                "Cannot resolve your address (no such host)"
            ))
        );
        assert_eq!(session.state, SmtpState::AwaitingHelo);
        assert!(session.mail.hostname.is_empty());
    }

    #[test]
    fn test_helo_without_addresses_closes() {
        let handler = create_handler();
        let mut session = SmtpSession::new();

        let outcome = handler
            .process_command("HELO empty.example", &mut session)
            .unwrap();

        assert_eq!(outcome, Outcome::Close(SmtpResponse::no_addresses()));
    }

    #[cfg(feature = "ehlo")]
    #[test]
    fn test_ehlo_is_greeting_alias() {
        let handler = create_handler();
        let mut session = SmtpSession::new();

        let response = reply(
            handler
                .process_command("EHLO client.example", &mut session)
                .unwrap(),
        );

        assert_eq!(response, SmtpResponse::helo("test.local"));
        assert_eq!(session.state, SmtpState::AwaitingMailFrom);
    }

    #[test]
    fn test_mail_command_keeps_address_verbatim() {
        let handler = create_handler();
        let mut session = SmtpSession::new();
        handler
            .process_command("HELO client.example", &mut session)
            .unwrap();

        let response = reply(
            handler
                .process_command("MAIL FROM:  <a@example.com> ", &mut session)
                .unwrap(),
        );

        assert_eq!(response, SmtpResponse::ok());
        assert_eq!(session.mail.from, "<a@example.com>");
        assert_eq!(session.state, SmtpState::AwaitingRcpt);
    }

    #[test]
    fn test_rcpt_command() {
        let handler = create_handler();
        let mut session = SmtpSession::new();
        handler
            .process_command("HELO client.example", &mut session)
            .unwrap();
        handler
            .process_command("MAIL FROM:<a@example.com>", &mut session)
            .unwrap();

        let response = reply(
            handler
                .process_command("RCPT TO:<b@example.com>", &mut session)
                .unwrap(),
        );

        assert_eq!(response, SmtpResponse::ok());
        assert_eq!(session.mail.recipients, vec!["<b@example.com>"]);
        assert_eq!(session.state, SmtpState::AwaitingData);
    }

    #[test]
    fn test_data_command() {
        let handler = create_handler();
        let mut session = SmtpSession::new();
        handler
            .process_command("HELO client.example", &mut session)
            .unwrap();
        handler
            .process_command("MAIL FROM:<a@example.com>", &mut session)
            .unwrap();
        handler
            .process_command("RCPT TO:<b@example.com>", &mut session)
            .unwrap();

        assert_eq!(
            handler.process_command("data", &mut session).unwrap(),
            Outcome::Reply(SmtpResponse::out_of_sequence("DATA"))
        );
        assert_eq!(
            handler.process_command(" DATA ", &mut session).unwrap(),
            Outcome::Data(SmtpResponse::data_start())
        );
        assert_eq!(session.state, SmtpState::AwaitingData);
    }

    #[test]
    fn test_out_of_sequence_commands_keep_stage() {
        let handler = create_handler();
        let mut session = SmtpSession::new();

        for line in ["MAIL FROM:<a@example.com>", "RCPT TO:<b@example.com>", "DATA", "NOOP"] {
            let response = reply(handler.process_command(line, &mut session).unwrap());
            assert_eq!(response, SmtpResponse::out_of_sequence("HELO"));
            assert_eq!(session.state, SmtpState::AwaitingHelo);
        }

        handler
            .process_command("HELO client.example", &mut session)
            .unwrap();
        for line in ["HELO client.example", "RCPT TO:<b@example.com>", "DATA"] {
            let response = reply(handler.process_command(line, &mut session).unwrap());
            assert_eq!(response, SmtpResponse::out_of_sequence("MAIL FROM"));
            assert_eq!(session.state, SmtpState::AwaitingMailFrom);
        }

        handler
            .process_command("MAIL FROM:<a@example.com>", &mut session)
            .unwrap();
        for line in ["MAIL FROM:<c@example.com>", "DATA", ""] {
            let response = reply(handler.process_command(line, &mut session).unwrap());
            assert_eq!(response, SmtpResponse::out_of_sequence("RCPT TO"));
            assert_eq!(session.state, SmtpState::AwaitingRcpt);
        }
        assert_eq!(session.mail.from, "<a@example.com>");
    }

    #[test]
    fn test_quit_in_every_stage() {
        let handler = create_handler();
        let setup = [
            "HELO client.example",
            "MAIL FROM:<a@example.com>",
            "RCPT TO:<b@example.com>",
        ];

        for stage in 0..=setup.len() {
            let mut session = SmtpSession::new();
            for line in &setup[..stage] {
                handler.process_command(line, &mut session).unwrap();
            }

            for quit in ["QUIT", "quit", "  QuIt \t"] {
                assert_eq!(
                    handler.process_command(quit, &mut session).unwrap(),
                    Outcome::Close(SmtpResponse::quit())
                );
            }
        }
    }
}
