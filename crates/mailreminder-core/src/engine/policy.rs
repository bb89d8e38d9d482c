//! Reminder policy: which events are due today.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::EventError;
use crate::store::EventTable;

/// Result of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Row indices of events due for a reminder, in table order.
    pub due: Vec<usize>,
    /// Events rejected for a missing or unparseable date.
    pub invalid_dates: usize,
}

/// Decides which events receive a reminder on a given day.
///
/// An event is due when the number of days until it equals one of the
/// configured offsets exactly. A day the cycle does not run on is a
/// reminder missed for that offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderPolicy {
    offsets: Vec<i64>,
}

impl ReminderPolicy {
    /// Creates a policy for the given day offsets.
    #[must_use]
    pub fn new(offsets: impl Into<Vec<i64>>) -> Self {
        Self {
            offsets: offsets.into(),
        }
    }

    /// Returns the configured offsets.
    #[must_use]
    pub fn offsets(&self) -> &[i64] {
        &self.offsets
    }

    /// Returns true if an event `days_until` days away is due.
    #[must_use]
    pub fn is_due(&self, days_until: i64) -> bool {
        self.offsets.contains(&days_until)
    }

    /// Evaluates every non-terminal event against `today`.
    ///
    /// Computes `days_until` for events with a valid date and rejects the
    /// ones without. Terminal events are left exactly as they are.
    pub fn evaluate(&self, table: &mut EventTable, today: NaiveDate, now: NaiveDateTime) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for (index, event) in table.events_mut().enumerate() {
            if event.status.is_terminal() {
                continue;
            }

            let Some(date) = event.date else {
                warn!("Event '{}' has an invalid date", event.name);
                event.reject(EventError::InvalidDate, now);
                evaluation.invalid_dates += 1;
                continue;
            };

            let days_until = (date - today).num_days();
            event.days_until = Some(days_until);
            if self.is_due(days_until) {
                debug!("Event '{}' is due ({days_until} days away)", event.name);
                evaluation.due.push(index);
            }
        }

        evaluation
    }
}
