//! SMTP connection management with type-state pattern.

mod client;
mod stream;

pub use client::{Authenticated, Client, Connected};
pub use stream::{SmtpStream, connect, connect_tls};

use crate::types::Address;

/// Server capabilities from the EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from the EHLO reply.
    pub hostname: String,
    /// Advertised extension lines, uppercased (e.g., `AUTH LOGIN PLAIN`).
    pub extensions: Vec<String>,
}

impl ServerInfo {
    /// Checks if the server advertised an extension keyword.
    #[must_use]
    pub fn supports(&self, keyword: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.split_whitespace().next() == Some(keyword))
    }

    /// Returns advertised SASL mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<&str> {
        self.extensions
            .iter()
            .filter_map(|ext| ext.strip_prefix("AUTH "))
            .flat_map(str::split_whitespace)
            .collect()
    }
}

/// Sender and recipient for one mail transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// `MAIL FROM` address.
    pub from: Address,
    /// `RCPT TO` address.
    pub to: Address,
}

impl Envelope {
    /// Creates an envelope.
    #[must_use]
    pub const fn new(from: Address, to: Address) -> Self {
        Self { from, to }
    }
}
