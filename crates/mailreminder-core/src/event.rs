//! Event model and delivery status.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::EventError;

/// Timestamp format of the `lastChecked` column.
pub const LAST_CHECKED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reason recorded for an error row whose error cell was empty.
const UNKNOWN_ERROR: &str = "Unknown error";

/// Delivery status of an event.
///
/// The error reason lives inside [`Status::Error`], so an error status
/// always has a reason and other statuses never do.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    /// Not yet delivered; evaluated on every pass.
    #[default]
    Pending,
    /// The reminder was accepted by the mail server.
    Successful,
    /// Delivery failed, with the reason.
    Error(String),
    /// A status cell this tool does not know, kept verbatim along with the
    /// error cell. Never reminded; only a bounce can overwrite it.
    Unrecognized {
        /// Raw `status` cell.
        status: String,
        /// Raw `error` cell.
        error: String,
    },
}

impl Status {
    /// Parses the `status` and `error` cells of a stored row.
    ///
    /// An empty status cell is pending.
    #[must_use]
    pub fn from_cells(status: &str, error: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "" | "pending" => Self::Pending,
            "successful" => Self::Successful,
            "error" => {
                let reason = error.trim();
                let reason = if reason.is_empty() { UNKNOWN_ERROR } else { reason };
                Self::Error(reason.to_string())
            }
            _ => Self::Unrecognized {
                status: status.to_string(),
                error: error.to_string(),
            },
        }
    }

    /// Returns the value written to the `status` column.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Successful => "successful",
            Self::Error(_) => "error",
            Self::Unrecognized { status, .. } => status,
        }
    }

    /// Returns the value written to the `error` column.
    #[must_use]
    pub fn error_text(&self) -> &str {
        match self {
            Self::Error(reason) | Self::Unrecognized { error: reason, .. } => reason,
            Self::Pending | Self::Successful => "",
        }
    }

    /// Returns true for statuses the policy no longer evaluates.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked occasion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Display label.
    pub name: String,
    /// Event date, `None` when the cell is missing or unparseable.
    pub date: Option<NaiveDate>,
    /// Recipient address as stored.
    pub recipient: String,
    /// Delivery status.
    pub status: Status,
    /// When the event was last evaluated or changed.
    pub last_checked: Option<NaiveDateTime>,
    /// Days from today to the event. Computed by the policy on each pass
    /// and never persisted.
    pub days_until: Option<i64>,
}

impl Event {
    /// Creates a pending event.
    #[must_use]
    pub fn new(name: impl Into<String>, date: Option<NaiveDate>, recipient: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date,
            recipient: recipient.into(),
            status: Status::Pending,
            last_checked: None,
            days_until: None,
        }
    }

    /// Records an accepted delivery.
    pub fn mark_successful(&mut self, now: NaiveDateTime) {
        self.status = Status::Successful;
        self.last_checked = Some(now);
    }

    /// Records a failure with its reason.
    pub fn mark_error(&mut self, reason: impl Into<String>, now: NaiveDateTime) {
        self.status = Status::Error(reason.into());
        self.last_checked = Some(now);
    }

    /// Records a per-event validation failure.
    pub fn reject(&mut self, error: EventError, now: NaiveDateTime) {
        self.mark_error(error.to_string(), now);
    }

    /// Returns the recipient normalized for address comparison.
    #[must_use]
    pub fn recipient_key(&self) -> String {
        self.recipient.trim().to_lowercase()
    }
}

/// Parses an event date cell.
///
/// Accepts `YYYY-MM-DD`, optionally followed by a time component separated
/// by a space or `T` (spreadsheet exports write `2025-03-14 00:00:00`).
#[must_use]
pub fn parse_event_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    let day = cell.get(..10)?;
    let rest = &cell[10..];
    if !(rest.is_empty() || rest.starts_with([' ', 'T'])) {
        return None;
    }
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Parses a `lastChecked` cell.
#[must_use]
pub fn parse_last_checked(cell: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(cell.trim(), LAST_CHECKED_FORMAT).ok()
}
