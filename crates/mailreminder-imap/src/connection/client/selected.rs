//! Implementation for the selected state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::Selected;
use crate::command::{Command, SearchCriteria};
use crate::parser::{Response, UntaggedResponse};
use crate::{Error, Result};

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the number of messages in the open mailbox.
    #[must_use]
    pub const fn exists(&self) -> u32 {
        self.exists
    }

    /// Searches the mailbox, returning matching sequence numbers in
    /// ascending order.
    pub async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<u32>> {
        let responses = self.run(&Command::Search(criteria.clone())).await?;

        let mut ids: Vec<u32> = responses
            .into_iter()
            .filter_map(|response| match response {
                Response::Untagged(UntaggedResponse::Search(ids)) => Some(ids),
                _ => None,
            })
            .flatten()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// Fetches the complete raw message without marking it seen.
    pub async fn fetch_body(&mut self, seq: u32) -> Result<Vec<u8>> {
        let responses = self.run(&Command::FetchBody { seq }).await?;

        responses
            .into_iter()
            .find_map(|response| match response {
                Response::Untagged(UntaggedResponse::Fetch {
                    seq: fetched,
                    body: Some(body),
                }) if fetched == seq => Some(body),
                _ => None,
            })
            .ok_or_else(|| Error::Protocol(format!("no BODY[] returned for message {seq}")))
    }
}
