//! IMAP client errors.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong talking to an IMAP server.
///
/// `No` and `Bad` carry the server's own text; the connection stays usable
/// after them. Any other variant means the session should be dropped.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket failure or unexpected end of stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake failure.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Host name not usable for certificate verification.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A response line the parser does not understand.
    #[error("Malformed response at byte {position}: {message}")]
    Parse {
        /// Offset into the response line.
        position: usize,
        /// What was expected.
        message: String,
    },

    /// Tagged NO: the command failed.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Tagged BAD: the command was not understood.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// The server is closing the connection.
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// The exchange did not follow the protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Returns true if the server completed the command with NO or BAD.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::No(_) | Self::Bad(_))
    }
}
