//! MIME transfer encodings.
//!
//! Decoding covers what bounce notifications actually use (Base64 and
//! Quoted-Printable bodies). Encoding is limited to RFC 2047 header words,
//! which outgoing reminders need when an event name is not ASCII.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decodes Base64 data, ignoring embedded line breaks and other whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks (`=` at end of line) are removed and `=XX` escapes are
/// turned back into bytes. Works on bytes so multi-byte UTF-8 sequences
/// split over several escapes survive intact.
///
/// # Errors
///
/// Returns an error if an escape sequence is truncated or not hexadecimal.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        match data.get(i + 1..) {
            Some([b'\r', b'\n', ..]) => i += 3,
            Some([b'\n', ..]) => i += 2,
            Some([hi, lo, ..]) => {
                let value = hex_value(*hi)
                    .zip(hex_value(*lo))
                    .map(|(h, l)| (h << 4) | l)
                    .ok_or_else(|| {
                        Error::InvalidEncoding(format!(
                            "Invalid hex escape: ={}{}",
                            char::from(*hi),
                            char::from(*lo)
                        ))
                    })?;
                result.push(value);
                i += 3;
            }
            // A lone '=' at the very end is a soft break with no newline
            Some([]) => i += 1,
            _ => {
                return Err(Error::InvalidEncoding(
                    "Incomplete escape sequence".to_string(),
                ));
            }
        }
    }

    Ok(result)
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Encodes a header value as an RFC 2047 `B` word when it is not plain ASCII.
///
/// ASCII values are returned unchanged.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return text.to_string();
    }

    format!("=?utf-8?B?{}?=", STANDARD.encode(text.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_decode_with_line_breaks() {
        let decoded = decode_base64(b"SGVsbG8s\r\nIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_base64_decode_invalid() {
        assert!(decode_base64(b"not base64!!").is_err());
    }

    #[test]
    fn test_quoted_printable_plain() {
        let decoded = decode_quoted_printable(b"Hello, World!").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_quoted_printable_utf8() {
        let decoded = decode_quoted_printable(b"H=C3=A9llo").unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "Héllo");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        let decoded = decode_quoted_printable(b"wasn't deliv=\r\nered to").unwrap();
        assert_eq!(decoded, b"wasn't delivered to");

        let decoded = decode_quoted_printable(b"deliv=\nered").unwrap();
        assert_eq!(decoded, b"delivered");
    }

    #[test]
    fn test_quoted_printable_bad_escape() {
        assert!(decode_quoted_printable(b"=ZZ").is_err());
        assert!(decode_quoted_printable(b"abc=4").is_err());
    }

    #[test]
    fn test_rfc2047_ascii_untouched() {
        assert_eq!(encode_rfc2047("Reminder: Launch"), "Reminder: Launch");
    }

    #[test]
    fn test_rfc2047_non_ascii() {
        let encoded = encode_rfc2047("Réunion");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(encoded.ends_with("?="));
    }
}
