//! `mailreminder` - one reminder cycle over the events table.
//!
//! Sends the reminders due today, waits for delivery-failure notices, marks
//! bounced events, and writes the table back. Scheduling is left to cron or
//! a systemd timer.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use mailreminder_core::{
    Config, ConfigError, CsvEventStore, CycleReport, ImapMailbox, ReminderCycle, SmtpMailSender,
    SystemClock,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "mailreminder=info,mailreminder_core=info";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    let log_file = config.as_ref().map_or_else(
        |_| {
            std::env::var_os("REMINDER_LOG")
                .map_or_else(|| Config::default().log_file, PathBuf::from)
        },
        |config| config.log_file.clone(),
    );
    if let Err(e) = init_logging(&log_file) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(report) => {
            info!("Reminder cycle complete: {report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Reminder cycle aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs to stderr and appends to the diagnostic log file.
fn init_logging(path: &Path) -> Result<()> {
    let file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

async fn run(config: Result<Config, ConfigError>) -> Result<CycleReport> {
    let config = config.context("invalid configuration")?;
    let cycle = ReminderCycle::new(&config).context("invalid configuration")?;

    let store = CsvEventStore::new(&config.events_file);
    let mut sender = SmtpMailSender::new(config.smtp.clone(), config.credentials.clone());
    let mut mailbox = ImapMailbox::new(config.imap.clone(), config.credentials.clone());

    info!("Starting reminder cycle on {}", store.path().display());
    cycle
        .run(&store, &mut sender, &mut mailbox, &SystemClock)
        .await
        .context("reminder cycle failed")
}
