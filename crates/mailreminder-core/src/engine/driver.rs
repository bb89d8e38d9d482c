//! Reminder cycle: evaluate, send, settle, reconcile, persist.

use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::info;

use super::bounce::{BounceExtractor, BounceReconciler, RegexBounceExtractor};
use super::dispatch::Dispatcher;
use super::policy::ReminderPolicy;
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::service::{MailSender, Mailbox};
use crate::store::EventStore;

/// Source of the current local time.
pub trait Clock {
    /// Returns the current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Returns the current local date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Summary of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Rows in the event table.
    pub events: usize,
    /// Events rejected for an invalid date.
    pub invalid_dates: usize,
    /// Events due for a reminder.
    pub due: usize,
    /// Reminders accepted by the mail server.
    pub sent: usize,
    /// Due events that failed.
    pub failed: usize,
    /// Events overridden by a bounce notice.
    pub bounced: usize,
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} events, {} invalid dates, {} due, {} sent, {} failed, {} bounced",
            self.events, self.invalid_dates, self.due, self.sent, self.failed, self.bounced
        )
    }
}

/// One pass over the event table.
///
/// Stages run strictly in order. Per-event failures are recorded on the
/// event; only a store failure aborts the cycle.
#[derive(Debug, Clone)]
pub struct ReminderCycle<E = RegexBounceExtractor> {
    policy: ReminderPolicy,
    dispatcher: Dispatcher,
    reconciler: BounceReconciler<E>,
    settle: Duration,
}

impl ReminderCycle {
    /// Builds a cycle from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pattern`] if the bounce phrase does not
    /// compile.
    pub fn new(config: &Config) -> Result<Self> {
        let extractor = RegexBounceExtractor::new(&config.bounce.phrase).map_err(ConfigError::from)?;
        let dispatcher = Dispatcher::new(
            config.credentials.address.clone(),
            config.reminder.signature.clone(),
        )
        .map_err(ConfigError::from)?;

        Ok(Self::from_parts(
            ReminderPolicy::new(config.reminder.offsets.clone()),
            dispatcher,
            BounceReconciler::new(config.bounce.sender.clone(), config.bounce.scan_limit, extractor),
            config.bounce.settle(),
        ))
    }
}

impl<E: BounceExtractor> ReminderCycle<E> {
    /// Assembles a cycle from its stages.
    pub const fn from_parts(
        policy: ReminderPolicy,
        dispatcher: Dispatcher,
        reconciler: BounceReconciler<E>,
        settle: Duration,
    ) -> Self {
        Self {
            policy,
            dispatcher,
            reconciler,
            settle,
        }
    }

    /// Runs one complete cycle and persists the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the event table cannot be loaded or saved.
    pub async fn run<St, Se, Mb, C>(
        &self,
        store: &St,
        sender: &mut Se,
        mailbox: &mut Mb,
        clock: &C,
    ) -> Result<CycleReport>
    where
        St: EventStore,
        Se: MailSender,
        Mb: Mailbox,
        C: Clock,
    {
        let mut table = store.load()?;
        let mut report = CycleReport {
            events: table.len(),
            ..CycleReport::default()
        };
        info!("Loaded {} events", report.events);

        let evaluation = self.policy.evaluate(&mut table, clock.today(), clock.now());
        report.invalid_dates = evaluation.invalid_dates;
        report.due = evaluation.due.len();
        info!("{} events due for a reminder", report.due);

        let outcome = self
            .dispatcher
            .dispatch(&mut table, &evaluation.due, sender, clock.now())
            .await;
        sender.close().await;
        report.sent = outcome.sent;
        report.failed = outcome.failed;

        if !self.settle.is_zero() {
            info!("Waiting {}s for bounce notices", self.settle.as_secs());
            tokio::time::sleep(self.settle).await;
        }

        let bounces = self.reconciler.scan(mailbox).await;
        mailbox.close().await;
        report.bounced = self.reconciler.apply(&mut table, &bounces, clock.now());

        store.save(&table)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let report = CycleReport {
            events: 5,
            invalid_dates: 1,
            due: 2,
            sent: 1,
            failed: 1,
            bounced: 1,
        };
        assert_eq!(
            report.to_string(),
            "5 events, 1 invalid dates, 2 due, 1 sent, 1 failed, 1 bounced"
        );
    }
}
