//! SMTP command serialization.

use crate::types::Address;

/// SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// AUTH - Begin authentication
    Auth {
        /// SASL mechanism name (e.g., "PLAIN")
        mechanism: &'static str,
        /// Initial response (SASL-IR)
        initial_response: Option<String>,
    },
    /// A bare SASL continuation line sent after a 334 challenge.
    AuthResponse(String),
    /// MAIL FROM - Start mail transaction
    MailFrom(Address),
    /// RCPT TO - Add recipient
    RcptTo(Address),
    /// DATA - Begin message data
    Data,
    /// RSET - Reset transaction
    Rset,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Serializes the command to bytes, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let line = match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::Auth {
                mechanism,
                initial_response: Some(response),
            } => format!("AUTH {mechanism} {response}"),
            Self::Auth {
                mechanism,
                initial_response: None,
            } => format!("AUTH {mechanism}"),
            Self::AuthResponse(response) => response.clone(),
            Self::MailFrom(from) => format!("MAIL FROM:<{from}>"),
            Self::RcptTo(to) => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Rset => "RSET".to_string(),
            Self::Quit => "QUIT".to_string(),
        };

        let mut buf = line.into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns a representation safe for logs (credentials elided).
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::Auth { mechanism, .. } => format!("AUTH {mechanism} ****"),
            Self::AuthResponse(_) => "****".to_string(),
            other => String::from_utf8_lossy(&other.serialize())
                .trim_end()
                .to_string(),
        }
    }
}

/// Applies SMTP dot-stuffing and CRLF normalization to message content and
/// appends the `.` terminator.
#[must_use]
pub fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 8);
    let body = message.strip_suffix(b"\n").unwrap_or(message);

    for line in body.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ehlo_command() {
        let cmd = Command::Ehlo {
            hostname: "localhost".to_string(),
        };
        assert_eq!(cmd.serialize(), b"EHLO localhost\r\n");
    }

    #[test]
    fn test_auth_plain_with_initial_response() {
        let cmd = Command::Auth {
            mechanism: "PLAIN",
            initial_response: Some("AHVzZXIAcGFzcw==".to_string()),
        };
        assert_eq!(cmd.serialize(), b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n");
        assert_eq!(cmd.redacted(), "AUTH PLAIN ****");
    }

    #[test]
    fn test_envelope_commands() {
        let from = Command::MailFrom(Address::new("sender@example.com").unwrap());
        assert_eq!(from.serialize(), b"MAIL FROM:<sender@example.com>\r\n");
        assert_eq!(from.redacted(), "MAIL FROM:<sender@example.com>");

        let to = Command::RcptTo(Address::new("recipient@example.com").unwrap());
        assert_eq!(to.serialize(), b"RCPT TO:<recipient@example.com>\r\n");
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::Data.serialize(), b"DATA\r\n");
        assert_eq!(Command::Rset.serialize(), b"RSET\r\n");
        assert_eq!(Command::Quit.serialize(), b"QUIT\r\n");
    }

    #[test]
    fn test_encode_data_normalizes_and_stuffs() {
        let encoded = encode_data(b"Subject: x\n\n.hidden\r\nlast line\n");
        assert_eq!(
            encoded,
            b"Subject: x\r\n\r\n..hidden\r\nlast line\r\n.\r\n".to_vec()
        );
    }

    #[test]
    fn test_encode_data_without_trailing_newline() {
        assert_eq!(encode_data(b"one"), b"one\r\n.\r\n".to_vec());
    }
}
