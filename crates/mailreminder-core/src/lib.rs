//! # mailreminder-core
//!
//! Reminder evaluation and delivery reconciliation engine.
//!
//! This crate provides:
//! - The event model and its delivery status state machine
//! - A CSV event store that rewrites only the cells it owns
//! - The reminder policy (which events are due today)
//! - The delivery dispatcher (one best-effort send per due event)
//! - The bounce reconciler (retroactive failure from mailbox evidence)
//! - The cycle driver tying the stages together
//! - SMTP and IMAP adapters for the mail sender and mailbox capabilities
//! - Configuration from the environment and an optional JSON file

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
mod error;
pub mod event;
pub mod service;
pub mod store;

pub use config::{BounceConfig, Config, Credentials, ImapConfig, ReminderConfig, SmtpConfig};
pub use engine::{
    BOUNCE_DIAGNOSTIC, BounceExtractor, BounceMap, BounceReconciler, Clock, CycleReport,
    DispatchOutcome, Dispatcher, Evaluation, RegexBounceExtractor, ReminderCycle, ReminderPolicy,
    SystemClock,
};
pub use error::{ConfigError, Error, EventError, MailboxError, Result, SendFailure, StoreError};
pub use event::{Event, Status};
pub use service::{ImapMailbox, MailSender, Mailbox, SmtpMailSender};
pub use store::{CsvEventStore, EventStore, EventTable};
