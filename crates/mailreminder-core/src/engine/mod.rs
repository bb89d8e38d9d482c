//! Reminder evaluation and delivery reconciliation.
//!
//! A cycle runs four stages over the event table:
//!
//! 1. [`ReminderPolicy`] rejects events without a valid date and picks the
//!    ones due today.
//! 2. [`Dispatcher`] sends one reminder per due event and records the result.
//! 3. After a settling wait, [`BounceReconciler`] reads delivery-failure
//!    notices and turns bounced recipients into errors.
//! 4. [`ReminderCycle`] persists the table.

mod bounce;
mod dispatch;
mod driver;
mod policy;

pub use bounce::{BOUNCE_DIAGNOSTIC, BounceExtractor, BounceMap, BounceReconciler, RegexBounceExtractor};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use driver::{Clock, CycleReport, ReminderCycle, SystemClock};
pub use policy::{Evaluation, ReminderPolicy};
