//! Delivery dispatcher: one send attempt per due event.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::{info, warn};

use crate::error::EventError;
use crate::event::Event;
use crate::service::MailSender;
use crate::store::EventTable;

/// Minimal address shape: local part, `@`, domain, `.`, suffix.
const ADDRESS_PATTERN: &str = r"^[^@]+@[^@]+\.[^@]+";

/// Counts from one dispatch stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Reminders accepted by the mail server.
    pub sent: usize,
    /// Due events that ended in error, including malformed addresses.
    pub failed: usize,
}

/// Renders reminders and records the result of sending each one.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    from: String,
    signature: String,
    address: Regex,
}

impl Dispatcher {
    /// Creates a dispatcher sending as `from`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address pattern fails to compile.
    pub fn new(from: impl Into<String>, signature: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            from: from.into(),
            signature: signature.into(),
            address: Regex::new(ADDRESS_PATTERN)?,
        })
    }

    /// Returns true if `address` has the minimal shape worth sending to.
    #[must_use]
    pub fn is_valid_address(&self, address: &str) -> bool {
        self.address.is_match(address)
    }

    /// Renders the subject and body of a reminder.
    #[must_use]
    pub fn render_reminder(&self, name: &str, date: NaiveDate, days_until: i64) -> (String, String) {
        let subject = format!("Reminder: {name} in {days_until} days");
        let body = format!(
            "Dear user,\n\nThis is a reminder that '{name}' is scheduled for {}.\n\nRegards,\n{}",
            date.format("%Y-%m-%d"),
            self.signature
        );
        (subject, body)
    }

    /// Sends one reminder per due event and records each outcome.
    ///
    /// Every attempted event ends the stage terminal, with `last_checked`
    /// set to `now`. Failures never stop the batch.
    pub async fn dispatch<M: MailSender>(
        &self,
        table: &mut EventTable,
        due: &[usize],
        sender: &mut M,
        now: NaiveDateTime,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for &index in due {
            let Some(event) = table.get_mut(index) else {
                continue;
            };

            if self.send_one(event, sender, now).await {
                outcome.sent += 1;
            } else {
                outcome.failed += 1;
            }
        }

        outcome
    }

    async fn send_one<M: MailSender>(&self, event: &mut Event, sender: &mut M, now: NaiveDateTime) -> bool {
        let (Some(date), Some(days_until)) = (event.date, event.days_until) else {
            event.reject(EventError::InvalidDate, now);
            return false;
        };

        let recipient = event.recipient.trim().to_string();
        if !self.is_valid_address(&recipient) {
            warn!("Event '{}': invalid address '{recipient}'", event.name);
            event.reject(EventError::InvalidAddress, now);
            return false;
        }

        let (subject, body) = self.render_reminder(&event.name, date, days_until);
        match sender.send(&self.from, &recipient, &subject, &body).await {
            Ok(()) => {
                info!("Reminder for '{}' sent to {recipient}", event.name);
                event.mark_successful(now);
                true
            }
            Err(failure) => {
                warn!("Reminder for '{}' to {recipient} failed: {failure}", event.name);
                event.mark_error(failure.to_string(), now);
                false
            }
        }
    }
}
