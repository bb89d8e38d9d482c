//! SMTP adapter for the mail sender capability.
//!
//! One authenticated session is opened on the first send and reused for the
//! rest of the dispatch stage. A rejected message resets the transaction
//! and keeps the session; a broken connection is dropped so the next send
//! reconnects.

use mailreminder_mime::PlainTextMessage;
use mailreminder_smtp::connection::connect_tls;
use mailreminder_smtp::{Address, Authenticated, Client, Envelope, SmtpStream};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use super::MailSender;
use crate::config::{Credentials, SmtpConfig};
use crate::error::SendFailure;

/// Name announced in EHLO.
const EHLO_NAME: &str = "localhost";

/// Mail sender submitting over implicit TLS.
#[derive(Debug)]
pub struct SmtpMailSender {
    server: SmtpConfig,
    credentials: Credentials,
    session: Option<SmtpSession<SmtpStream>>,
}

impl SmtpMailSender {
    /// Creates a sender. No connection is made until the first send.
    #[must_use]
    pub const fn new(server: SmtpConfig, credentials: Credentials) -> Self {
        Self {
            server,
            credentials,
            session: None,
        }
    }

    async fn connect(&self) -> Result<SmtpSession<SmtpStream>, SendFailure> {
        let stream = connect_tls(&self.server.host, self.server.port)
            .await
            .map_err(|e| SendFailure::Connection(e.to_string()))?;
        let session = SmtpSession::open(stream, &self.credentials).await?;
        info!(
            "Connected to SMTP server {}:{}",
            self.server.host, self.server.port
        );
        Ok(session)
    }
}

impl MailSender for SmtpMailSender {
    async fn send(
        &mut self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), SendFailure> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.connect().await?,
        };

        let session = self.session.insert(session);
        let result = session.deliver(from, to, subject, body).await;
        if session.is_broken() {
            debug!("Dropping broken SMTP session");
            self.session = None;
        }
        result
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.quit().await;
        }
    }
}

/// An authenticated SMTP session.
struct SmtpSession<S> {
    client: Client<S, Authenticated>,
    broken: bool,
}

impl<S> std::fmt::Debug for SmtpSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSession")
            .field("client", &self.client)
            .field("broken", &self.broken)
            .finish()
    }
}

impl<S> SmtpSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Greets, says EHLO and authenticates on an open stream.
    async fn open(stream: S, credentials: &Credentials) -> Result<Self, SendFailure> {
        let client = Client::from_stream(stream)
            .await
            .map_err(|e| SendFailure::Connection(e.to_string()))?;
        let client = client
            .ehlo(EHLO_NAME)
            .await
            .map_err(|e| SendFailure::Connection(e.to_string()))?;
        let client = client
            .authenticate(&credentials.address, &credentials.password)
            .await
            .map_err(|e| SendFailure::Authentication(e.to_string()))?;

        Ok(Self {
            client,
            broken: false,
        })
    }

    /// Returns true once the connection can no longer be used.
    const fn is_broken(&self) -> bool {
        self.broken
    }

    /// Runs one mail transaction.
    async fn deliver(
        &mut self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), SendFailure> {
        let sender = Address::new(from).map_err(|e| SendFailure::InvalidAddress(e.to_string()))?;
        let recipient =
            Address::new(to).map_err(|e| SendFailure::InvalidAddress(e.to_string()))?;
        let envelope = Envelope::new(sender, recipient);
        let message = PlainTextMessage::new(from, to, subject, body).to_rfc5322();

        match self.client.send_mail(&envelope, &message).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_reply() => {
                if let Err(reset) = self.client.reset().await {
                    warn!("RSET after rejected message failed: {reset}");
                    self.broken = true;
                }
                Err(SendFailure::Rejected(e.to_string()))
            }
            Err(e) => {
                self.broken = true;
                Err(SendFailure::Connection(e.to_string()))
            }
        }
    }

    async fn quit(self) {
        match self.client.quit().await {
            Ok(()) => debug!("SMTP session closed"),
            Err(e) => warn!("SMTP QUIT failed: {e}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::service::testing::ScriptedStream;

    const LOGIN: &[u8] = b"220 smtp.example.com ESMTP\r\n\
250-smtp.example.com\r\n250 AUTH LOGIN PLAIN\r\n\
235 2.7.0 Accepted\r\n";

    fn credentials() -> Credentials {
        Credentials {
            address: "bot@example.com".into(),
            password: "pass".into(),
        }
    }

    #[tokio::test]
    async fn test_session_reused_across_messages() {
        let mut script = LOGIN.to_vec();
        script.extend_from_slice(b"250 OK\r\n250 OK\r\n354 Go\r\n250 queued\r\n");
        script.extend_from_slice(b"250 OK\r\n250 OK\r\n354 Go\r\n250 queued\r\n");
        script.extend_from_slice(b"221 bye\r\n");
        let (stream, sent) = ScriptedStream::new(&script);

        let mut session = SmtpSession::open(stream, &credentials()).await.unwrap();
        session
            .deliver("bot@example.com", "a@example.com", "Reminder: A in 7 days", "one")
            .await
            .unwrap();
        session
            .deliver("bot@example.com", "b@example.com", "Reminder: B in 2 days", "two")
            .await
            .unwrap();
        assert!(!session.is_broken());
        session.quit().await;

        let sent = sent.text();
        assert_eq!(sent.matches("AUTH PLAIN").count(), 1);
        assert!(sent.contains("RCPT TO:<a@example.com>\r\n"));
        assert!(sent.contains("RCPT TO:<b@example.com>\r\n"));
        assert!(sent.contains("Subject: Reminder: B in 2 days\r\n"));
        assert!(sent.ends_with("QUIT\r\n"));
    }

    #[tokio::test]
    async fn test_rejection_resets_and_keeps_session() {
        let mut script = LOGIN.to_vec();
        script.extend_from_slice(b"250 OK\r\n550 5.1.1 No such user\r\n250 flushed\r\n");
        let (stream, sent) = ScriptedStream::new(&script);

        let mut session = SmtpSession::open(stream, &credentials()).await.unwrap();
        let failure = session
            .deliver("bot@example.com", "ghost@example.com", "s", "b")
            .await
            .unwrap_err();

        assert_eq!(
            failure,
            SendFailure::Rejected("SMTP error 550: 5.1.1 No such user".into())
        );
        assert!(!session.is_broken());
        assert!(sent.text().ends_with("RSET\r\n"));
    }

    #[tokio::test]
    async fn test_transport_failure_breaks_session() {
        let mut script = LOGIN.to_vec();
        script.extend_from_slice(b"250 OK\r\n");
        let (stream, _) = ScriptedStream::new(&script);

        let mut session = SmtpSession::open(stream, &credentials()).await.unwrap();
        let failure = session
            .deliver("bot@example.com", "a@example.com", "s", "b")
            .await
            .unwrap_err();

        assert!(matches!(failure, SendFailure::Connection(_)));
        assert!(session.is_broken());
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let script = b"220 ready\r\n250-hi\r\n250 AUTH PLAIN\r\n535 5.7.8 Bad credentials\r\n";
        let (stream, _) = ScriptedStream::new(script);

        let failure = SmtpSession::open(stream, &credentials()).await.unwrap_err();
        assert!(matches!(failure, SendFailure::Authentication(_)));
    }

    #[tokio::test]
    async fn test_unusable_recipient_never_reaches_server() {
        let (stream, sent) = ScriptedStream::new(LOGIN);

        let mut session = SmtpSession::open(stream, &credentials()).await.unwrap();
        let failure = session
            .deliver("bot@example.com", "a b@example.com", "s", "b")
            .await
            .unwrap_err();

        assert!(matches!(failure, SendFailure::InvalidAddress(_)));
        assert!(!sent.text().contains("MAIL FROM"));
    }
}
