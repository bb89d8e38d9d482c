//! Type-state SMTP client.

use std::marker::PhantomData;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

use super::{Envelope, ServerInfo};
use crate::command::{Command, encode_data};
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Reply, ReplyCode};

/// Longest reply line accepted before the server is considered broken.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Type-state marker for a greeted, not yet authenticated connection.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for an authenticated connection ready for transactions.
#[derive(Debug)]
pub struct Authenticated;

/// SMTP client with type-state.
pub struct Client<S, State> {
    stream: BufReader<S>,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("server_info", &self.server_info)
            .finish_non_exhaustive()
    }
}

impl<S> Client<S, Connected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or the server refuses
    /// service.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut client = Self {
            stream: BufReader::new(stream),
            server_info: ServerInfo::default(),
            _state: PhantomData,
        };

        let greeting = client.read_reply().await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(greeting.into_error());
        }

        client.server_info.hostname = greeting
            .lines
            .first()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        Ok(client)
    }

    /// Sends EHLO and records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let reply = self
            .command(Command::Ehlo {
                hostname: client_hostname.to_string(),
            })
            .await?;

        self.server_info.extensions = reply
            .lines
            .iter()
            .skip(1)
            .map(|line| line.trim().to_ascii_uppercase())
            .collect();

        Ok(self)
    }

    /// Authenticates with the best supported password mechanism.
    ///
    /// PLAIN is preferred; LOGIN is used when the server only offers that.
    /// A server that advertises no AUTH extension at all is tried with PLAIN.
    ///
    /// # Errors
    ///
    /// Returns an error if neither mechanism is offered or the credentials
    /// are rejected.
    pub async fn authenticate(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let mechanisms = self.server_info.auth_mechanisms();
        if mechanisms.is_empty() || mechanisms.contains(&"PLAIN") {
            self.auth_plain(username, password).await
        } else if mechanisms.contains(&"LOGIN") {
            self.auth_login(username, password).await
        } else {
            Err(Error::NotSupported(format!(
                "a password mechanism (offered: {})",
                mechanisms.join(" ")
            )))
        }
    }

    /// Authenticates using the PLAIN mechanism with an initial response.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let credentials = STANDARD.encode(format!("\0{username}\0{password}"));
        self.command(Command::Auth {
            mechanism: "PLAIN",
            initial_response: Some(credentials),
        })
        .await?;

        Ok(self.into_state())
    }

    /// Authenticates using the LOGIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        self.challenge(Command::Auth {
            mechanism: "LOGIN",
            initial_response: None,
        })
        .await?;
        self.challenge(Command::AuthResponse(STANDARD.encode(username)))
            .await?;
        self.command(Command::AuthResponse(STANDARD.encode(password)))
            .await?;

        Ok(self.into_state())
    }

    /// Sends a command that must be answered with a 334 challenge.
    async fn challenge(&mut self, cmd: Command) -> Result<()> {
        let reply = self.send_command(&cmd).await?;
        if reply.code == ReplyCode::AUTH_CONTINUE {
            Ok(())
        } else {
            Err(reply.into_error())
        }
    }

    fn into_state<T>(self) -> Client<S, T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }
}

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Runs one complete mail transaction: `MAIL FROM`, `RCPT TO`, `DATA`
    /// and the message content.
    ///
    /// On a reply error the server may be mid-transaction; call
    /// [`Client::reset`] before reusing the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Smtp`] when the server rejects a step, or a
    /// transport error when the connection fails.
    pub async fn send_mail(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        self.command(Command::MailFrom(envelope.from.clone()))
            .await?;
        self.command(Command::RcptTo(envelope.to.clone())).await?;

        let reply = self.send_command(&Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(reply.into_error());
        }

        self.write_all(&encode_data(message)).await?;
        let reply = self.read_reply().await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }

        debug!("Message to {} accepted: {}", envelope.to, reply.text());
        Ok(())
    }

    /// Aborts the current transaction, keeping the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn reset(&mut self) -> Result<()> {
        self.command(Command::Rset).await.map(|_| ())
    }
}

// Common implementation for all states
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the server information.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(&Command::Quit).await?;
        if reply.code != ReplyCode::CLOSING && !reply.is_success() {
            return Err(reply.into_error());
        }
        let _ = self.stream.get_mut().shutdown().await;
        Ok(())
    }

    /// Sends a command that must succeed with a 2xx reply.
    async fn command(&mut self, cmd: Command) -> Result<Reply> {
        let reply = self.send_command(&cmd).await?;
        if reply.is_success() {
            Ok(reply)
        } else {
            Err(reply.into_error())
        }
    }

    async fn send_command(&mut self, cmd: &Command) -> Result<Reply> {
        debug!("C: {}", cmd.redacted());
        self.write_all(&cmd.serialize()).await?;
        self.read_reply().await
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line.is_empty() {
                continue;
            }

            let is_last = is_last_reply_line(&line);
            lines.push(line);
            if is_last {
                break;
            }
        }

        let reply = parse_reply(&lines)?;
        debug!("S: {} {}", reply.code, reply.text());
        Ok(reply)
    }

    async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self.stream.read_line(&mut line).await?;
        if read == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed",
            )));
        }
        if line.len() > MAX_LINE_LENGTH {
            return Err(Error::Protocol("reply line too long".to_string()));
        }
        Ok(line.trim_end().to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Address;
    use tokio_test::io::Builder;

    fn envelope() -> Envelope {
        Envelope::new(
            Address::new("bot@example.com").unwrap(),
            Address::new("alice@example.com").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_greeting_and_ehlo() {
        let mock = Builder::new()
            .read(b"220 smtp.example.com ESMTP ready\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250-smtp.example.com greets you\r\n250-SIZE 1000\r\n250 AUTH PLAIN LOGIN\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        assert_eq!(client.server_info().hostname, "smtp.example.com");

        let client = client.ehlo("localhost").await.unwrap();
        assert_eq!(client.server_info().auth_mechanisms(), vec!["PLAIN", "LOGIN"]);
    }

    #[tokio::test]
    async fn test_greeting_refused() {
        let mock = Builder::new()
            .read(b"554 no service for you\r\n")
            .build();

        let err = Client::from_stream(mock).await.unwrap_err();
        assert_eq!(err.to_string(), "SMTP error 554: no service for you");
    }

    #[tokio::test]
    async fn test_auth_plain_and_send() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250-hi\r\n250 AUTH PLAIN\r\n")
            .write(b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n")
            .read(b"235 2.7.0 Accepted\r\n")
            .write(b"MAIL FROM:<bot@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<alice@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"DATA\r\n")
            .read(b"354 Go ahead\r\n")
            .write(b"Subject: x\r\n\r\nhello\r\n.\r\n")
            .read(b"250 2.0.0 OK queued\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 bye\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let client = client.ehlo("localhost").await.unwrap();
        let mut client = client.authenticate("user", "pass").await.unwrap();
        client
            .send_mail(&envelope(), b"Subject: x\n\nhello\n")
            .await
            .unwrap();
        client.quit().await.unwrap();
    }

    #[tokio::test]
    async fn test_auth_login_fallback() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250-hi\r\n250 AUTH LOGIN\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"334 VXNlcm5hbWU6\r\n")
            .write(b"dXNlcg==\r\n")
            .read(b"334 UGFzc3dvcmQ6\r\n")
            .write(b"cGFzcw==\r\n")
            .read(b"235 Accepted\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let client = client.ehlo("localhost").await.unwrap();
        client.authenticate("user", "pass").await.unwrap();
    }

    #[tokio::test]
    async fn test_auth_rejected() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"AUTH PLAIN AHVzZXIAd3Jvbmc=\r\n")
            .read(b"535 5.7.8 Username and Password not accepted\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let err = client.auth_plain("user", "wrong").await.unwrap_err();
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn test_rejected_recipient_then_reset() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n")
            .read(b"235 ok\r\n")
            .write(b"MAIL FROM:<bot@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<alice@example.com>\r\n")
            .read(b"550-5.1.1 The email account that you tried to reach\r\n550 5.1.1 does not exist\r\n")
            .write(b"RSET\r\n")
            .read(b"250 flushed\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let mut client = client.auth_plain("user", "pass").await.unwrap();

        let err = client.send_mail(&envelope(), b"x").await.unwrap_err();
        assert!(err.is_reply());
        assert_eq!(
            err.to_string(),
            "SMTP error 550: 5.1.1 The email account that you tried to reach 5.1.1 does not exist"
        );
        client.reset().await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_closed_mid_reply() {
        let mock = Builder::new().read(b"220-partial\r\n").build();
        let err = Client::from_stream(mock).await.unwrap_err();
        assert!(!err.is_reply());
    }
}
