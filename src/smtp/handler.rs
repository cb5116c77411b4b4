//! Delivery of completed mails to the embedding application

use crate::smtp::mail::Mail;

/// Receives every mail the server accepts.
///
/// Called once per completed transaction, on the thread serving the
/// connection. A slow handler only holds up its own connection.
pub trait MailHandler: Send + Sync {
    fn handle(&self, mail: Mail);
}

impl<F> MailHandler for F
where
    F: Fn(Mail) + Send + Sync,
{
    fn handle(&self, mail: Mail) {
        self(mail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_closure_handler_receives_mail() {
        let (tx, rx) = mpsc::channel();
        let handler = move |mail: Mail| {
            tx.send(mail).unwrap();
        };

        let mail = Mail {
            from: "<a@example.com>".to_string(),
            ..Mail::new()
        };
        handler.handle(mail.clone());

        assert_eq!(rx.try_recv().unwrap(), mail);
    }
}
