//! IMAP adapter for the mailbox capability.
//!
//! The inbox is opened read-only and messages are fetched with
//! `BODY.PEEK[]`, so scanning never marks notices as seen.

use mailreminder_imap::connection::connect_tls;
use mailreminder_imap::{Client, ImapStream, SearchCriteria, Selected};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use super::Mailbox;
use crate::config::{Credentials, ImapConfig};
use crate::error::MailboxError;

/// Mailbox scanned for notices.
const INBOX: &str = "INBOX";

/// Mailbox reader over implicit-TLS IMAP.
#[derive(Debug)]
pub struct ImapMailbox {
    server: ImapConfig,
    credentials: Credentials,
    session: Option<InboxSession<ImapStream>>,
}

impl ImapMailbox {
    /// Creates a mailbox reader. No connection is made until the first search.
    #[must_use]
    pub const fn new(server: ImapConfig, credentials: Credentials) -> Self {
        Self {
            server,
            credentials,
            session: None,
        }
    }

    async fn session(&mut self) -> Result<&mut InboxSession<ImapStream>, MailboxError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                let stream = connect_tls(&self.server.host, self.server.port)
                    .await
                    .map_err(|e| MailboxError::Connection(e.to_string()))?;
                let session = InboxSession::open(stream, &self.credentials).await?;
                info!(
                    "Connected to IMAP server {}:{}",
                    self.server.host, self.server.port
                );
                session
            }
        };
        Ok(self.session.insert(session))
    }
}

impl Mailbox for ImapMailbox {
    async fn search_from(&mut self, sender: &str) -> Result<Vec<u32>, MailboxError> {
        self.session().await?.search_from(sender).await
    }

    async fn fetch(&mut self, handle: u32) -> Result<Vec<u8>, MailboxError> {
        self.session().await?.fetch(handle).await
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.logout().await;
        }
    }
}

/// A logged-in session with the inbox open read-only.
struct InboxSession<S> {
    client: Client<S, Selected>,
}

impl<S> std::fmt::Debug for InboxSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboxSession")
            .field("client", &self.client)
            .finish()
    }
}

impl<S> InboxSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn open(stream: S, credentials: &Credentials) -> Result<Self, MailboxError> {
        let client = Client::from_stream(stream)
            .await
            .map_err(|e| MailboxError::Connection(e.to_string()))?;
        let client = client
            .login(&credentials.address, &credentials.password)
            .await
            .map_err(|e| MailboxError::Authentication(e.to_string()))?;
        let client = client
            .examine(INBOX)
            .await
            .map_err(command_error)?;

        debug!("{INBOX} holds {} messages", client.exists());
        Ok(Self { client })
    }

    async fn search_from(&mut self, sender: &str) -> Result<Vec<u32>, MailboxError> {
        self.client
            .search(&SearchCriteria::From(sender.to_string()))
            .await
            .map_err(command_error)
    }

    async fn fetch(&mut self, seq: u32) -> Result<Vec<u8>, MailboxError> {
        self.client
            .fetch_body(seq)
            .await
            .map_err(command_error)
    }

    async fn logout(self) {
        match self.client.logout().await {
            Ok(()) => debug!("IMAP session closed"),
            Err(e) => warn!("IMAP LOGOUT failed: {e}"),
        }
    }
}

/// A refused command is an operation error; anything else lost the connection.
fn command_error(e: mailreminder_imap::Error) -> MailboxError {
    if e.is_rejection() {
        MailboxError::Operation(e.to_string())
    } else {
        MailboxError::Connection(e.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::service::testing::ScriptedStream;

    fn credentials() -> Credentials {
        Credentials {
            address: "bot@example.com".into(),
            password: "pass".into(),
        }
    }

    #[tokio::test]
    async fn test_read_only_scan() {
        let script = b"* OK ready\r\n\
A0000 OK logged in\r\n\
* 5 EXISTS\r\nA0001 OK [READ-ONLY] done\r\n\
* SEARCH 2 5\r\nA0002 OK done\r\n\
* 5 FETCH (BODY[] {4}\r\nbody)\r\nA0003 OK done\r\n\
* BYE logging out\r\nA0004 OK bye\r\n";
        let (stream, sent) = ScriptedStream::new(script);

        let mut session = InboxSession::open(stream, &credentials()).await.unwrap();
        let hits = session
            .search_from("mailer-daemon@googlemail.com")
            .await
            .unwrap();
        assert_eq!(hits, vec![2, 5]);
        assert_eq!(session.fetch(5).await.unwrap(), b"body");
        session.logout().await;

        let sent = sent.text();
        assert!(sent.contains("A0001 EXAMINE INBOX\r\n"));
        assert!(sent.contains("A0003 FETCH 5 BODY.PEEK[]\r\n"));
        assert!(!sent.contains("SELECT"));
    }

    #[tokio::test]
    async fn test_login_failure_is_authentication_error() {
        let script = b"* OK ready\r\nA0000 NO [AUTHENTICATIONFAILED] nope\r\n";
        let (stream, _) = ScriptedStream::new(script);

        let err = InboxSession::open(stream, &credentials()).await.unwrap_err();
        assert!(matches!(err, MailboxError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_search_failure_is_operation_error() {
        let script = b"* OK ready\r\nA0000 OK done\r\nA0001 OK done\r\nA0002 BAD parse error\r\n";
        let (stream, _) = ScriptedStream::new(script);

        let mut session = InboxSession::open(stream, &credentials()).await.unwrap();
        let err = session.search_from("x@example.com").await.unwrap_err();
        assert!(matches!(err, MailboxError::Operation(_)));
    }

    #[tokio::test]
    async fn test_dropped_connection_is_connection_error() {
        let script = b"* OK ready\r\nA0000 OK done\r\nA0001 OK done\r\n* SEARCH 3";
        let (stream, _) = ScriptedStream::new(script);

        let mut session = InboxSession::open(stream, &credentials()).await.unwrap();
        let err = session.search_from("x@example.com").await.unwrap_err();
        assert!(matches!(err, MailboxError::Connection(_)));
    }
}
