//! Framed I/O for the IMAP protocol.
//!
//! A response is a CRLF-terminated line that may announce a literal
//! (`{n}` at the end of the line); the literal's `n` bytes follow and the
//! response continues on the next line.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

const READ_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Maximum literal size. Bounce notices are small; attachments are not
/// expected.
const MAX_LITERAL_SIZE: usize = 50 * 1024 * 1024;

/// Framed connection for IMAP protocol.
pub struct FramedStream<S> {
    reader: BufReader<S>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, stream),
        }
    }

    /// Reads one complete response including any embedded literals.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = BytesMut::new();

        loop {
            let line = self.read_line().await?;
            let literal = literal_length(&line);
            response.put_slice(&line);

            let Some(len) = literal else {
                break;
            };
            if len > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal too large: {len} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }

            let start = response.len();
            response.resize(start + len, 0);
            self.reader.read_exact(&mut response[start..]).await?;
        }

        Ok(response.to_vec())
    }

    /// Reads one CRLF-terminated line, never buffering more than
    /// `MAX_LINE_LENGTH` bytes of it.
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let budget = MAX_LINE_LENGTH.saturating_sub(line.len());
            if budget == 0 {
                return Err(Error::Protocol("line too long".to_string()));
            }

            let read = (&mut self.reader)
                .take(budget as u64)
                .read_until(b'\n', &mut line)
                .await?;
            if read == 0 {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
            if line.ends_with(b"\r\n") {
                return Ok(line);
            }
        }
    }

    /// Writes a serialized command and flushes it.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Shuts down the write half of the underlying stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }
}

/// Parses a literal announcement (`{123}` or `{123+}`) at the end of a line.
fn literal_length(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r\n")?;
    let inner = line.strip_suffix(b"}")?;
    let open = inner.iter().rposition(|&b| b == b'{')?;
    let digits = &inner[open + 1..];
    let digits = digits.strip_suffix(b"+").unwrap_or(digits);

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Collects responses until the tagged completion for one command arrives.
#[derive(Debug)]
pub struct ResponseAccumulator {
    tag: String,
}

impl ResponseAccumulator {
    /// Creates a new response accumulator for the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Reads responses up to and including the one tagged with our tag.
    ///
    /// An untagged BYE ends the exchange early so the caller can report it.
    pub async fn read_until_tagged<S>(&self, framed: &mut FramedStream<S>) -> Result<Vec<Vec<u8>>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut responses = Vec::new();
        loop {
            let response = framed.read_response().await?;
            let done = self.is_completion(&response) || is_bye(&response);
            responses.push(response);
            if done {
                return Ok(responses);
            }
        }
    }

    fn is_completion(&self, response: &[u8]) -> bool {
        response
            .strip_prefix(self.tag.as_bytes())
            .is_some_and(|rest| rest.first() == Some(&b' '))
    }
}

fn is_bye(response: &[u8]) -> bool {
    response
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case(b"* BYE "))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[test]
    fn test_literal_length() {
        assert_eq!(literal_length(b"BODY[] {123}\r\n"), Some(123));
        assert_eq!(literal_length(b"BODY[] {123+}\r\n"), Some(123));
        assert_eq!(literal_length(b"{0}\r\n"), Some(0));
        assert_eq!(literal_length(b"no literal\r\n"), None);
        assert_eq!(literal_length(b"incomplete {123"), None);
        assert_eq!(literal_length(b"wrong {abc}\r\n"), None);
        assert_eq!(literal_length(b"empty {}\r\n"), None);
    }

    #[tokio::test]
    async fn test_read_simple_line() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_response().await.unwrap(), b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn test_read_literal_split_across_reads() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[] {7}\r\nab")
            .read(b"c\r\nde)\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response().await.unwrap();
        assert_eq!(response, b"* 1 FETCH (BODY[] {7}\r\nabc\r\nde)\r\n");
    }

    #[tokio::test]
    async fn test_bare_lf_does_not_end_line() {
        let mock = Builder::new().read(b"* OK a\nb\r\n").build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_response().await.unwrap(), b"* OK a\nb\r\n");
    }

    #[tokio::test]
    async fn test_literal_too_large() {
        let header = format!("* 1 FETCH (BODY[] {{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        let mock = Builder::new().read(header.as_bytes()).build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("literal too large"));
    }

    #[tokio::test]
    async fn test_line_stops_at_length_limit() {
        let unterminated = vec![b'a'; MAX_LINE_LENGTH];
        let mock = Builder::new().read(&unterminated).build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_response().await.unwrap_err();
        assert!(matches!(&err, Error::Protocol(message) if message == "line too long"));
    }

    #[tokio::test]
    async fn test_eof_is_an_error() {
        let mock = Builder::new().read(b"* OK partial").build();
        let mut framed = FramedStream::new(mock);

        assert!(matches!(
            framed.read_response().await.unwrap_err(),
            Error::Io(_)
        ));
    }

    #[tokio::test]
    async fn test_accumulator_stops_at_own_tag() {
        let mock = Builder::new()
            .read(b"* SEARCH 1 2\r\n")
            .read(b"A00010 OK not ours\r\n")
            .read(b"A0001 OK SEARCH completed\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let responses = ResponseAccumulator::new("A0001")
            .read_until_tagged(&mut framed)
            .await
            .unwrap();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[2], b"A0001 OK SEARCH completed\r\n");
    }

    #[tokio::test]
    async fn test_accumulator_stops_at_bye() {
        let mock = Builder::new()
            .read(b"* BYE shutting down\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let responses = ResponseAccumulator::new("A0001")
            .read_until_tagged(&mut framed)
            .await
            .unwrap();
        assert_eq!(responses, vec![b"* BYE shutting down\r\n".to_vec()]);
    }
}
