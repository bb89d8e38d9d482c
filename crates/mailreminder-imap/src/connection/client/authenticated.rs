//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::Client;
use super::states::{Authenticated, Selected};
use crate::Result;
use crate::command::Command;

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Opens a mailbox read-only with EXAMINE.
    ///
    /// Consumes self and returns a selected client on success.
    pub async fn examine(mut self, mailbox: &str) -> Result<Client<S, Selected>> {
        self.exists = 0;
        self.run(&Command::Examine {
            mailbox: mailbox.to_string(),
        })
        .await?;

        debug!("Opened {mailbox} read-only with {} messages", self.exists);
        Ok(self.transition())
    }
}
