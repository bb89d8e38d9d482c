//! Mail capabilities used by the engine and their network adapters.

mod mailbox;
mod smtp;
#[cfg(test)]
pub(crate) mod testing;

pub use mailbox::ImapMailbox;
pub use smtp::SmtpMailSender;

use crate::error::{MailboxError, SendFailure};

/// Hands single plain-text messages to a mail server.
#[allow(async_fn_in_trait)]
pub trait MailSender {
    /// Sends one message. Makes exactly one attempt.
    ///
    /// # Errors
    ///
    /// Returns the reason the message was not accepted.
    async fn send(&mut self, from: &str, to: &str, subject: &str, body: &str)
    -> Result<(), SendFailure>;

    /// Releases any open connection. Errors are logged, not returned.
    async fn close(&mut self);
}

/// Read-only access to a mailbox holding delivery-failure notices.
#[allow(async_fn_in_trait)]
pub trait Mailbox {
    /// Returns handles of messages from `sender`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox cannot be reached or searched.
    async fn search_from(&mut self, sender: &str) -> Result<Vec<u32>, MailboxError>;

    /// Returns the raw bytes of one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be fetched.
    async fn fetch(&mut self, handle: u32) -> Result<Vec<u8>, MailboxError>;

    /// Releases any open connection. Errors are logged, not returned.
    async fn close(&mut self);
}
