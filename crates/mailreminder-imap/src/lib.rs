//! # mailreminder-imap
//!
//! A small async IMAP client implementing the read-only subset of RFC 9051
//! (`IMAP4rev2`) needed to scan a mailbox for delivery-failure notices.
//!
//! ## Features
//!
//! - **Type-state connection management**: Compile-time enforcement of valid
//!   IMAP state transitions (`NotAuthenticated` → `Authenticated` → `Selected`)
//! - **Read-only access**: LOGIN, EXAMINE, SEARCH, FETCH `BODY.PEEK[]`, LOGOUT;
//!   fetched messages keep their unseen flag
//! - **Literal-aware framing**: message bodies delivered as `{n}` literals are
//!   read in full
//! - **TLS via rustls**: Secure connections without OpenSSL dependency
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailreminder_imap::{Client, SearchCriteria};
//! use mailreminder_imap::connection::connect_tls;
//!
//! #[tokio::main]
//! async fn main() -> mailreminder_imap::Result<()> {
//!     let stream = connect_tls("imap.example.com", 993).await?;
//!     let client = Client::from_stream(stream).await?;
//!     let client = client.login("user@example.com", "password").await?;
//!
//!     let mut client = client.examine("INBOX").await?;
//!     let hits = client
//!         .search(&SearchCriteria::From("mailer-daemon@example.com".into()))
//!         .await?;
//!     for seq in hits.iter().rev().take(10) {
//!         let raw = client.fetch_body(*seq).await?;
//!         println!("{seq}: {} bytes", raw.len());
//!     }
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌─────────────────────┐
//! │   NotAuthenticated  │ ─── login() ───→ Authenticated
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    Authenticated    │ ─── examine() ───→ Selected
//! └─────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, SearchCriteria, TagGenerator};
pub use connection::{Authenticated, Client, ImapStream, NotAuthenticated, Selected};
pub use error::{Error, Result};
pub use parser::{Response, ResponseParser, UntaggedResponse};
pub use types::Status;
