//! MIME message structure and parsing.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Maximum multipart nesting followed by the parser.
const MAX_DEPTH: usize = 8;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from a header value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Body of a message or of a multipart entity.
#[derive(Debug, Clone)]
pub enum Body {
    /// Leaf content, still transfer-encoded.
    Single(Vec<u8>),
    /// Child entities of a multipart container.
    Multipart(Vec<Message>),
}

/// A parsed MIME entity: a top-level message or one part of a multipart.
#[derive(Debug, Clone)]
pub struct Message {
    /// Entity headers.
    pub headers: Headers,
    /// Entity body.
    pub body: Body,
}

impl Message {
    /// Parses raw RFC 5322 bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart entity has no boundary or the
    /// nesting is unreasonably deep.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::parse_entity(raw, 0)
    }

    fn parse_entity(raw: &[u8], depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }

        let (header_bytes, body_bytes) = split_headers_body(raw);
        let headers = Headers::parse(&String::from_utf8_lossy(header_bytes));

        let content_type = content_type_of(&headers);
        let body = if content_type.is_multipart() {
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            let parts = split_multipart(body_bytes, boundary)
                .into_iter()
                .map(|part| Self::parse_entity(part, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            Body::Multipart(parts)
        } else {
            Body::Single(body_bytes.to_vec())
        };

        Ok(Self { headers, body })
    }

    /// Gets the content type, defaulting to `text/plain` when absent or
    /// unparseable.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        content_type_of(&self.headers)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// Gets the Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Decodes a leaf body according to its transfer encoding.
    ///
    /// Returns `None` for multipart containers.
    ///
    /// # Errors
    ///
    /// Returns an error if the Base64 or Quoted-Printable content is invalid.
    pub fn decode_body(&self) -> Result<Option<Vec<u8>>> {
        let Body::Single(body) = &self.body else {
            return Ok(None);
        };

        let decoded = match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(body)?,
            TransferEncoding::QuotedPrintable => decode_quoted_printable(body)?,
            _ => body.clone(),
        };
        Ok(Some(decoded))
    }

    /// Returns the first `text/plain` content, searched depth-first.
    ///
    /// Content that fails to transfer-decode is returned raw; bounce bodies
    /// are matched against a text pattern, so a best-effort rendering beats
    /// nothing.
    #[must_use]
    pub fn plain_text(&self) -> Option<String> {
        match &self.body {
            Body::Multipart(parts) => parts.iter().find_map(Self::plain_text),
            Body::Single(raw) => {
                if !self.content_type().is_text_plain() {
                    return None;
                }
                let bytes = self
                    .decode_body()
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| raw.clone());
                Some(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }
}

fn content_type_of(headers: &Headers) -> ContentType {
    headers
        .get("content-type")
        .and_then(|value| ContentType::parse(value).ok())
        .unwrap_or_else(ContentType::text_plain)
}

/// Splits an entity at the first blank line.
fn split_headers_body(raw: &[u8]) -> (&[u8], &[u8]) {
    // An entity that starts with a blank line has no headers at all
    if let Some(rest) = raw.strip_prefix(b"\r\n") {
        return (&[], rest);
    }
    if let Some(rest) = raw.strip_prefix(b"\n") {
        return (&[], rest);
    }

    let crlf = find(raw, b"\r\n\r\n").map(|i| (i, i + 4));
    let lf = find(raw, b"\n\n").map(|i| (i, i + 2));

    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    split.map_or((raw, &[]), |(head_end, body_start)| {
        (&raw[..head_end], &raw[body_start..])
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Splits a multipart body into the raw bytes of each part.
///
/// The preamble before the first delimiter and the epilogue after the
/// closing delimiter are discarded. A missing closing delimiter keeps the
/// final part.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i + 1);
        let line = &body[pos..line_end];

        if let Some(rest) = line.strip_prefix(delimiter.as_bytes()) {
            let closing = rest.starts_with(b"--");
            if closing || rest.iter().all(u8::is_ascii_whitespace) {
                if let Some(start) = part_start.take() {
                    parts.push(trim_trailing_newline(&body[start..pos]));
                }
                if closing {
                    return parts;
                }
                part_start = Some(line_end);
            }
        }

        pos = line_end;
    }

    if let Some(start) = part_start {
        parts.push(&body[start..]);
    }
    parts
}

/// The line break before a delimiter belongs to the delimiter.
fn trim_trailing_newline(part: &[u8]) -> &[u8] {
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}
