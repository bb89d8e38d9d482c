//! Runtime configuration.
//!
//! Values come from three layers, later layers winning: built-in defaults,
//! an optional JSON file named by `REMINDER_CONFIG`, and environment
//! variables. Credentials are only read from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bounce phrase of Gmail delivery-failure notices.
pub const DEFAULT_BOUNCE_PHRASE: &str = "Your message wasn't delivered to";

/// Complete configuration for one reminder cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account used for both sending and bounce scanning.
    pub credentials: Credentials,
    /// Event table location.
    pub events_file: PathBuf,
    /// Diagnostic log location.
    pub log_file: PathBuf,
    /// Outgoing server.
    pub smtp: SmtpConfig,
    /// Incoming server.
    pub imap: ImapConfig,
    /// Reminder policy and content.
    pub reminder: ReminderConfig,
    /// Bounce reconciliation.
    pub bounce: BounceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            events_file: PathBuf::from("events.csv"),
            log_file: PathBuf::from("reminder.log"),
            smtp: SmtpConfig::default(),
            imap: ImapConfig::default(),
            reminder: ReminderConfig::default(),
            bounce: BounceConfig::default(),
        }
    }
}

/// Account credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Sender address, also the login name.
    pub address: String,
    /// Password or app password. Never serialized.
    #[serde(skip)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// SMTP server configuration (implicit TLS).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 465,
        }
    }
}

/// IMAP server configuration (implicit TLS).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImapConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ImapConfig {
    fn default() -> Self {
        Self {
            host: "imap.gmail.com".to_string(),
            port: 993,
        }
    }
}

/// Reminder policy and message content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Days before the event on which a reminder is due.
    pub offsets: Vec<i64>,
    /// Closing line of every reminder.
    pub signature: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            offsets: vec![7, 2],
            signature: "Your M.I.E.R.A. Bot".to_string(),
        }
    }
}

/// Bounce reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceConfig {
    /// Sender of delivery-failure notices.
    pub sender: String,
    /// Phrase that precedes the failed address.
    pub phrase: String,
    /// How many of the most recent notices to inspect.
    pub scan_limit: usize,
    /// Seconds to wait after sending before scanning.
    pub settle_secs: u64,
}

impl BounceConfig {
    /// Returns the settling interval.
    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}

impl Default for BounceConfig {
    fn default() -> Self {
        Self {
            sender: "mailer-daemon@googlemail.com".to_string(),
            phrase: DEFAULT_BOUNCE_PHRASE.to_string(),
            scan_limit: 10,
            settle_secs: 60,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing, a value does not parse,
    /// or the JSON file named by `REMINDER_CONFIG` is unreadable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration using `lookup` to resolve variables.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = match get("REMINDER_CONFIG") {
            Some(path) => Self::from_file(Path::new(path.trim()))?,
            None => Self::default(),
        };

        if let Some(address) = get("EMAIL_ADDRESS") {
            config.credentials.address = address.trim().to_string();
        }
        config.credentials.password = get("EMAIL_PASSWORD").unwrap_or_default();

        if let Some(path) = get("EVENTS_FILE") {
            config.events_file = PathBuf::from(path);
        }
        if let Some(path) = get("REMINDER_LOG") {
            config.log_file = PathBuf::from(path);
        }
        if let Some(host) = get("SMTP_HOST") {
            config.smtp.host = host;
        }
        if let Some(port) = get("SMTP_PORT") {
            config.smtp.port = parse_number("SMTP_PORT", &port)?;
        }
        if let Some(host) = get("IMAP_HOST") {
            config.imap.host = host;
        }
        if let Some(port) = get("IMAP_PORT") {
            config.imap.port = parse_number("IMAP_PORT", &port)?;
        }
        if let Some(offsets) = get("REMINDER_OFFSETS") {
            config.reminder.offsets = parse_offsets(&offsets)?;
        }
        if let Some(signature) = get("REMINDER_SIGNATURE") {
            config.reminder.signature = signature;
        }
        if let Some(sender) = get("BOUNCE_SENDER") {
            config.bounce.sender = sender.trim().to_string();
        }
        if let Some(phrase) = get("BOUNCE_PHRASE") {
            config.bounce.phrase = phrase;
        }
        if let Some(limit) = get("BOUNCE_SCAN_LIMIT") {
            config.bounce.scan_limit = parse_number("BOUNCE_SCAN_LIMIT", &limit)?;
        }
        if let Some(secs) = get("BOUNCE_SETTLE_SECS") {
            config.bounce.settle_secs = parse_number("BOUNCE_SETTLE_SECS", &secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.address.is_empty() {
            return Err(ConfigError::Missing("EMAIL_ADDRESS"));
        }
        if self.credentials.password.is_empty() {
            return Err(ConfigError::Missing("EMAIL_PASSWORD"));
        }
        if self.reminder.offsets.is_empty() {
            return Err(ConfigError::Invalid {
                name: "REMINDER_OFFSETS",
                value: String::new(),
                reason: "at least one offset is required".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_offsets(value: &str) -> Result<Vec<i64>, ConfigError> {
    let mut offsets = value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_number("REMINDER_OFFSETS", part))
        .collect::<Result<Vec<i64>, _>>()?;
    offsets.sort_unstable_by(|a, b| b.cmp(a));
    offsets.dedup();
    Ok(offsets)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const CREDS: [(&str, &str); 2] = [
        ("EMAIL_ADDRESS", "bot@example.com"),
        ("EMAIL_PASSWORD", "app password"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&CREDS)).unwrap();

        assert_eq!(config.credentials.address, "bot@example.com");
        assert_eq!(config.events_file, PathBuf::from("events.csv"));
        assert_eq!(config.log_file, PathBuf::from("reminder.log"));
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 465);
        assert_eq!(config.imap.host, "imap.gmail.com");
        assert_eq!(config.imap.port, 993);
        assert_eq!(config.reminder.offsets, vec![7, 2]);
        assert_eq!(config.reminder.signature, "Your M.I.E.R.A. Bot");
        assert_eq!(config.bounce.sender, "mailer-daemon@googlemail.com");
        assert_eq!(config.bounce.phrase, DEFAULT_BOUNCE_PHRASE);
        assert_eq!(config.bounce.scan_limit, 10);
        assert_eq!(config.bounce.settle(), Duration::from_secs(60));
    }

    #[test]
    fn test_missing_credentials() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("EMAIL_ADDRESS")));

        let err =
            Config::from_lookup(lookup(&[("EMAIL_ADDRESS", "bot@example.com")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("EMAIL_PASSWORD")));
    }

    #[test]
    fn test_env_overrides() {
        let mut vars = CREDS.to_vec();
        vars.extend([
            ("REMINDER_OFFSETS", " 1, 14 ,7,7"),
            ("BOUNCE_SETTLE_SECS", "5"),
            ("SMTP_PORT", "2465"),
            ("EVENTS_FILE", "/data/events.csv"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.reminder.offsets, vec![14, 7, 1]);
        assert_eq!(config.bounce.settle_secs, 5);
        assert_eq!(config.smtp.port, 2465);
        assert_eq!(config.events_file, PathBuf::from("/data/events.csv"));
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = CREDS.to_vec();
        vars.push(("IMAP_PORT", "imap"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "IMAP_PORT", .. }));

        let mut vars = CREDS.to_vec();
        vars.push(("REMINDER_OFFSETS", ",,"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_json_file_layer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"events_file": "from-json.csv", "bounce": {{"scan_limit": 3}}, "credentials": {{"address": "json@example.com", "password": "ignored"}}}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let vars = [
            ("REMINDER_CONFIG", path.as_str()),
            ("EMAIL_PASSWORD", "secret"),
            ("BOUNCE_SETTLE_SECS", "0"),
        ];
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.events_file, PathBuf::from("from-json.csv"));
        assert_eq!(config.credentials.address, "json@example.com");
        assert_eq!(config.credentials.password, "secret");
        assert_eq!(config.bounce.scan_limit, 3);
        assert_eq!(config.bounce.sender, "mailer-daemon@googlemail.com");
        assert_eq!(config.bounce.settle_secs, 0);
    }

    #[test]
    fn test_password_redacted() {
        let config = Config::from_lookup(lookup(&CREDS)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("app password"));
        assert!(debug.contains("<redacted>"));
    }
}
