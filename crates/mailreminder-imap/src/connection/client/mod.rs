//! Type-state IMAP client connection.
//!
//! The IMAP connection states are:
//!
//! - `NotAuthenticated`: Initial state after connection
//! - `Authenticated`: After successful LOGIN
//! - `Selected`: After successful EXAMINE
//!
//! Each state only exposes methods that are valid for that state.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::framed::{FramedStream, ResponseAccumulator};
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::Status;
use crate::{Error, Result};

/// IMAP client connection with type-state.
///
/// The type parameter `State` tracks the connection state at compile time.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    /// Message count of the open mailbox, tracked from `EXISTS`.
    pub(crate) exists: u32,
    _state: PhantomData<State>,
}

// FramedStream does not implement Debug
impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("exists", &self.exists)
            .finish_non_exhaustive()
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Issues a command and returns all responses once it completed OK.
    ///
    /// Untagged EXISTS counts are recorded on the way.
    pub(crate) async fn run(&mut self, cmd: &Command) -> Result<Vec<Response>> {
        let tag = self.tag_gen.next();
        debug!("C: {}", cmd.redacted(&tag));
        self.stream.write_command(&cmd.serialize(&tag)).await?;

        let raw = ResponseAccumulator::new(tag.as_str())
            .read_until_tagged(&mut self.stream)
            .await?;
        let responses = raw
            .iter()
            .map(|bytes| ResponseParser::parse(bytes))
            .collect::<Result<Vec<_>>>()?;

        for response in &responses {
            if let Response::Untagged(UntaggedResponse::Exists(n)) = response {
                self.exists = *n;
            }
        }

        Self::check_tagged_ok(&responses, &tag)?;
        Ok(responses)
    }

    /// Checks that the tagged completion is OK.
    pub(crate) fn check_tagged_ok(responses: &[Response], tag: &str) -> Result<()> {
        for response in responses.iter().rev() {
            match response {
                Response::Tagged {
                    tag: resp_tag,
                    status,
                    text,
                } if resp_tag == tag => {
                    debug!("S: {resp_tag} {status:?} {text}");
                    return match status {
                        Status::Ok | Status::PreAuth => Ok(()),
                        Status::No => Err(Error::No(text.clone())),
                        Status::Bad => Err(Error::Bad(text.clone())),
                        Status::Bye => Err(Error::Bye(text.clone())),
                    };
                }
                Response::Untagged(UntaggedResponse::Status {
                    status: Status::Bye,
                    text,
                }) => return Err(Error::Bye(text.clone())),
                _ => {}
            }
        }

        Err(Error::Protocol("missing tagged response".to_string()))
    }

    /// Moves the connection into another state.
    pub(crate) fn transition<T>(self) -> Client<S, T> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            exists: self.exists,
            _state: PhantomData,
        }
    }

    /// Sends LOGOUT and closes the connection (available in any state).
    ///
    /// The server's reply is read but not required; a connection that drops
    /// after BYE still counts as a clean logout.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tag_gen.next();
        debug!("C: {}", Command::Logout.redacted(&tag));
        self.stream
            .write_command(&Command::Logout.serialize(&tag))
            .await?;

        let _ = ResponseAccumulator::new(tag.as_str())
            .read_until_tagged(&mut self.stream)
            .await;
        let _ = self.stream.shutdown().await;
        Ok(())
    }
}
