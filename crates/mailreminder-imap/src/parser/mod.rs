//! IMAP response parser.
//!
//! Parses one complete response as produced by
//! [`FramedStream::read_response`](crate::connection::FramedStream::read_response):
//! the response line plus any literals it carries, with their CRLFs intact.
//! Only the responses this client acts on are decoded; everything else
//! becomes [`UntaggedResponse::Other`].

mod fetch;

use crate::types::Status;
use crate::{Error, Result};

pub use fetch::extract_body_section;

/// A parsed server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Completion result of a tagged command.
    Tagged {
        /// Command tag.
        tag: String,
        /// Completion status.
        status: Status,
        /// Human-readable text, including any response code.
        text: String,
    },
    /// Untagged server data.
    Untagged(UntaggedResponse),
    /// Command continuation request (`+ ...`).
    Continuation(String),
}

/// Untagged server data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// Untagged status (`* OK`, `* NO`, `* BAD`, `* PREAUTH`, `* BYE`).
    Status {
        /// Status keyword.
        status: Status,
        /// Human-readable text.
        text: String,
    },
    /// `* SEARCH n n n`
    Search(Vec<u32>),
    /// `* n EXISTS`
    Exists(u32),
    /// `* n FETCH (...)` with the `BODY[]` section, when present.
    Fetch {
        /// Message sequence number.
        seq: u32,
        /// Raw message bytes from `BODY[]`, `None` when absent or NIL.
        body: Option<Vec<u8>>,
    },
    /// Anything this client does not interpret.
    Other(String),
}

/// Sans-I/O response parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one complete response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the response is not valid IMAP.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let line = input.strip_suffix(b"\r\n").unwrap_or(input);

        if let Some(rest) = line.strip_prefix(b"+") {
            let text = String::from_utf8_lossy(rest).trim().to_string();
            return Ok(Response::Continuation(text));
        }

        if let Some(rest) = line.strip_prefix(b"* ") {
            return parse_untagged(rest, input).map(Response::Untagged);
        }

        parse_tagged(line)
    }
}

fn parse_tagged(line: &[u8]) -> Result<Response> {
    let text = std::str::from_utf8(line)
        .map_err(|e| Error::parse(e.valid_up_to(), "tagged response is not UTF-8"))?;

    let mut parts = text.splitn(3, ' ');
    let tag = parts
        .next()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::parse(0, "missing tag"))?;
    let keyword = parts
        .next()
        .ok_or_else(|| Error::parse(tag.len(), "missing status"))?;
    let status = Status::from_keyword(keyword)
        .ok_or_else(|| Error::parse(tag.len() + 1, format!("unknown status {keyword}")))?;

    Ok(Response::Tagged {
        tag: tag.to_string(),
        status,
        text: parts.next().unwrap_or_default().to_string(),
    })
}

fn parse_untagged(rest: &[u8], full: &[u8]) -> Result<UntaggedResponse> {
    let word_end = rest.iter().position(|&b| b == b' ').unwrap_or(rest.len());
    let first = String::from_utf8_lossy(&rest[..word_end]).into_owned();
    let tail = rest.get(word_end + 1..).unwrap_or_default();

    if let Ok(number) = first.parse::<u32>() {
        return Ok(parse_numbered(number, tail, full));
    }

    if let Some(status) = Status::from_keyword(&first) {
        return Ok(UntaggedResponse::Status {
            status,
            text: String::from_utf8_lossy(tail).trim_end().to_string(),
        });
    }

    if !first.eq_ignore_ascii_case("SEARCH") {
        return Ok(UntaggedResponse::Other(
            String::from_utf8_lossy(rest).trim_end().to_string(),
        ));
    }

    let ids = String::from_utf8_lossy(tail)
        .split_whitespace()
        .map(|id| {
            id.parse::<u32>()
                .map_err(|_| Error::parse(2 + word_end, format!("bad SEARCH id {id}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(UntaggedResponse::Search(ids))
}

fn parse_numbered(number: u32, tail: &[u8], full: &[u8]) -> UntaggedResponse {
    let keyword_end = tail.iter().position(|&b| b == b' ').unwrap_or(tail.len());
    let keyword = &tail[..keyword_end];

    if keyword.eq_ignore_ascii_case(b"EXISTS") {
        UntaggedResponse::Exists(number)
    } else if keyword.eq_ignore_ascii_case(b"FETCH") {
        UntaggedResponse::Fetch {
            seq: number,
            body: extract_body_section(full),
        }
    } else {
        UntaggedResponse::Other(String::from_utf8_lossy(full).trim_end().to_string())
    }
}
