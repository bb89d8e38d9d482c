//! SMTP reply parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses an SMTP reply from its response lines.
///
/// Replies are single-line (`250 OK`) or multi-line, where every line but
/// the last uses `-` after the code (`250-First`, `250 Last`). All lines
/// must carry the same code.
///
/// # Errors
///
/// Returns an error if the reply is empty, malformed, or mixes codes.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let first = lines
        .first()
        .ok_or_else(|| Error::Protocol("Empty reply".into()))?;
    let code = parse_code(first)?;

    let mut text = Vec::with_capacity(lines.len());
    for line in lines {
        if parse_code(line)? != code {
            return Err(Error::Protocol(format!(
                "Reply code changed mid-reply: {line}"
            )));
        }
        text.push(line.get(4..).unwrap_or_default().to_string());
    }

    Ok(Reply::new(ReplyCode::new(code), text))
}

fn parse_code(line: &str) -> Result<u16> {
    let code = line
        .get(..3)
        .ok_or_else(|| Error::Protocol(format!("Reply too short: {line}")))?;
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Protocol(format!("Invalid reply code: {code}")));
    }
    if !matches!(line.as_bytes().get(3), None | Some(b' ' | b'-')) {
        return Err(Error::Protocol(format!("Malformed reply line: {line}")));
    }
    code.parse()
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {code}")))
}

/// Checks if a line is the last line of a reply.
///
/// A bare code (`250`) also terminates a reply.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    matches!(line.as_bytes().get(3), None | Some(b' '))
}
