//! Bounce reconciliation.
//!
//! Some failures are only reported after the submission server accepted
//! the message: the provider later drops a notice into the sender's inbox.
//! The reconciler reads the most recent of those notices, pulls the failed
//! address out of each, and turns matching events into errors.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use mailreminder_mime::Message;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::MailboxError;
use crate::service::Mailbox;
use crate::store::EventTable;

/// Error text recorded on an event whose reminder bounced.
pub const BOUNCE_DIAGNOSTIC: &str = "Email bounced: message was not delivered";

/// Bounced address (lowercased) to diagnostic.
pub type BounceMap = HashMap<String, String>;

/// Pulls the failed recipient out of a notice body.
pub trait BounceExtractor {
    /// Returns the bounced address, lowercased, or `None` if the body does
    /// not look like a delivery-failure notice.
    fn extract(&self, body: &str) -> Option<String>;
}

/// Characters trimmed from the end of a captured address.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '>', ')', '"', '\''];

/// Finds `<phrase> <address>` in the body.
///
/// The phrase matches case-insensitively, across any run of whitespace
/// including line breaks, and with either a straight or a curly apostrophe.
#[derive(Debug, Clone)]
pub struct RegexBounceExtractor {
    pattern: Regex,
}

impl RegexBounceExtractor {
    /// Builds an extractor for the phrase preceding the failed address.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting pattern does not compile.
    pub fn new(phrase: &str) -> Result<Self, regex::Error> {
        let words: Vec<String> = phrase
            .split_whitespace()
            .map(|word| regex::escape(word).replace('\'', "['’]"))
            .collect();
        let pattern = format!(r"(?i){}\s+<?(?P<address>\S+)", words.join(r"\s+"));

        Ok(Self {
            pattern: Regex::new(&pattern)?,
        })
    }
}

impl BounceExtractor for RegexBounceExtractor {
    fn extract(&self, body: &str) -> Option<String> {
        let captures = self.pattern.captures(body)?;
        let address = captures
            .name("address")?
            .as_str()
            .trim_end_matches(TRAILING_PUNCTUATION);

        address.contains('@').then(|| address.to_lowercase())
    }
}

/// Scans a mailbox for notices and applies them to the event table.
#[derive(Debug, Clone)]
pub struct BounceReconciler<E = RegexBounceExtractor> {
    sender: String,
    scan_limit: usize,
    extractor: E,
}

impl<E: BounceExtractor> BounceReconciler<E> {
    /// Creates a reconciler reading at most `scan_limit` notices from `sender`.
    pub fn new(sender: impl Into<String>, scan_limit: usize, extractor: E) -> Self {
        Self {
            sender: sender.into(),
            scan_limit,
            extractor,
        }
    }

    /// Reads the most recent notices and returns the bounced addresses.
    ///
    /// A mailbox failure abandons the scan and yields an empty map; it is
    /// logged and never fails the cycle.
    pub async fn scan<M: Mailbox>(&self, mailbox: &mut M) -> BounceMap {
        match self.try_scan(mailbox).await {
            Ok(bounces) => bounces,
            Err(e) => {
                warn!("Bounce scan abandoned: {e}");
                BounceMap::new()
            }
        }
    }

    async fn try_scan<M: Mailbox>(&self, mailbox: &mut M) -> Result<BounceMap, MailboxError> {
        let handles = mailbox.search_from(&self.sender).await?;
        debug!("{} notices from {}", handles.len(), self.sender);

        let mut bounces = BounceMap::new();
        for &handle in handles.iter().rev().take(self.scan_limit) {
            let raw = mailbox.fetch(handle).await?;
            match self.extractor.extract(&body_text(&raw)) {
                Some(address) => {
                    info!("Bounce detected for {address}");
                    bounces.insert(address, BOUNCE_DIAGNOSTIC.to_string());
                }
                None => info!("No bounced address found in message {handle}"),
            }
        }

        Ok(bounces)
    }

    /// Marks every event whose recipient bounced as an error.
    ///
    /// Matching is by address alone, so it also overrides events that
    /// already succeeded or failed for another reason. Returns the number of
    /// events changed.
    pub fn apply(&self, table: &mut EventTable, bounces: &BounceMap, now: NaiveDateTime) -> usize {
        if bounces.is_empty() {
            return 0;
        }

        let mut overridden = 0;
        for event in table.events_mut() {
            if let Some(reason) = bounces.get(&event.recipient_key()) {
                warn!("Event '{}': reminder to {} bounced", event.name, event.recipient.trim());
                event.mark_error(reason.clone(), now);
                overridden += 1;
            }
        }
        overridden
    }
}

/// Returns the plain-text body of a raw message, or the raw bytes as text
/// when it has none.
fn body_text(raw: &[u8]) -> String {
    Message::parse(raw)
        .ok()
        .and_then(|message| message.plain_text())
        .unwrap_or_else(|| String::from_utf8_lossy(raw).into_owned())
}
