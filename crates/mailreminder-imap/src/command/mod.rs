//! IMAP command serialization.

mod tag_generator;

pub use tag_generator::TagGenerator;

/// Search criteria for the SEARCH command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Messages whose From header contains the string.
    From(String),
}

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGIN with plaintext credentials.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// EXAMINE a mailbox read-only.
    Examine {
        /// Mailbox name.
        mailbox: String,
    },
    /// SEARCH by criteria, returning sequence numbers.
    Search(SearchCriteria),
    /// FETCH the full message without setting `\Seen` (`BODY.PEEK[]`).
    FetchBody {
        /// Message sequence number.
        seq: u32,
    },
    /// LOGOUT.
    Logout,
}

impl Command {
    /// Serializes the command with the given tag, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }
            Self::Examine { mailbox } => {
                buf.extend_from_slice(b"EXAMINE ");
                write_astring(&mut buf, mailbox);
            }
            Self::Search(criteria) => {
                buf.extend_from_slice(b"SEARCH ");
                let SearchCriteria::From(sender) = criteria;
                buf.extend_from_slice(b"FROM ");
                write_quoted(&mut buf, sender);
            }
            Self::FetchBody { seq } => {
                buf.extend_from_slice(format!("FETCH {seq} BODY.PEEK[]").as_bytes());
            }
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns a representation safe for logs (credentials elided).
    #[must_use]
    pub fn redacted(&self, tag: &str) -> String {
        match self {
            Self::Login { username, .. } => format!("{tag} LOGIN {username} ****"),
            other => String::from_utf8_lossy(&other.serialize(tag))
                .trim_end()
                .to_string(),
        }
    }
}

/// Writes an astring: a bare atom when possible, otherwise a quoted string.
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        write_quoted(buf, s);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes a quoted string, escaping `"` and `\`.
fn write_quoted(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for b in s.bytes() {
        if b == b'"' || b == b'\\' {
            buf.push(b'\\');
        }
        buf.push(b);
    }
    buf.push(b'"');
}

const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b == 0x7F
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_quotes_when_needed() {
        let cmd = Command::Login {
            username: "bot@example.com".into(),
            password: "abcd efgh ijkl".into(),
        };
        assert_eq!(
            cmd.serialize("A0000"),
            b"A0000 LOGIN bot@example.com \"abcd efgh ijkl\"\r\n"
        );
        assert_eq!(cmd.redacted("A0000"), "A0000 LOGIN bot@example.com ****");
    }

    #[test]
    fn test_examine_and_search() {
        let examine = Command::Examine {
            mailbox: "INBOX".into(),
        };
        assert_eq!(examine.serialize("A0001"), b"A0001 EXAMINE INBOX\r\n");

        let search = Command::Search(SearchCriteria::From("mailer-daemon@googlemail.com".into()));
        assert_eq!(
            search.serialize("A0002"),
            b"A0002 SEARCH FROM \"mailer-daemon@googlemail.com\"\r\n"
        );
    }

    #[test]
    fn test_fetch_body_peeks() {
        assert_eq!(
            Command::FetchBody { seq: 42 }.serialize("A0004"),
            b"A0004 FETCH 42 BODY.PEEK[]\r\n"
        );
    }

    #[test]
    fn test_astring_escaping() {
        let mut buf = Vec::new();
        write_astring(&mut buf, r#"a"b\c"#);
        assert_eq!(buf, br#""a\"b\\c""#);

        let mut buf = Vec::new();
        write_astring(&mut buf, "");
        assert_eq!(buf, b"\"\"");
    }
}
