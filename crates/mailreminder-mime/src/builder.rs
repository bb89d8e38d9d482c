//! Outgoing plain-text message generation.

use crate::content_type::ContentType;
use crate::encoding::encode_rfc2047;
use crate::header::Headers;
use crate::message::TransferEncoding;
use chrono::{DateTime, Local};

/// A single-recipient, single-part plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainTextMessage {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line (unencoded).
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

impl PlainTextMessage {
    /// Creates a new message.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Builds the RFC 5322 representation stamped with the current time.
    #[must_use]
    pub fn to_rfc5322(&self) -> Vec<u8> {
        self.to_rfc5322_at(Local::now())
    }

    /// Builds the RFC 5322 representation with an explicit `Date`.
    ///
    /// Body line endings are normalized to CRLF.
    #[must_use]
    pub fn to_rfc5322_at(&self, date: DateTime<Local>) -> Vec<u8> {
        let mut headers = Headers::new();
        headers.add("From", self.from.as_str());
        headers.add("To", self.to.as_str());
        headers.add("Subject", encode_rfc2047(&self.subject));
        headers.add("Date", date.to_rfc2822());
        headers.add("Message-ID", self.message_id(date));
        headers.add("MIME-Version", "1.0");
        headers.add("Content-Type", ContentType::text_plain().to_string());
        headers.add(
            "Content-Transfer-Encoding",
            TransferEncoding::EightBit.to_string(),
        );

        let mut message = headers.to_string();
        message.push_str("\r\n");
        for line in self.body.lines() {
            message.push_str(line);
            message.push_str("\r\n");
        }

        message.into_bytes()
    }

    fn message_id(&self, date: DateTime<Local>) -> String {
        let domain = self
            .from
            .rsplit_once('@')
            .map_or("localhost", |(_, domain)| domain);
        format!(
            "<{}.{}@{domain}>",
            date.timestamp_micros(),
            std::process::id()
        )
    }
}
