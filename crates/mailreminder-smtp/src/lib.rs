//! # mailreminder-smtp
//!
//! Async SMTP submission client implementing the subset of RFC 5321 a
//! reminder mailer needs.
//!
//! ## Features
//!
//! - **Type-state connection management**: `Connected` → `Authenticated`
//!   enforced at compile time
//! - **Implicit TLS** via rustls (port 465), plain TCP for local relays
//! - **Authentication**: PLAIN, with LOGIN as a fallback when PLAIN is not
//!   advertised
//! - **Session reuse**: several transactions over one authenticated
//!   connection, with `RSET` after a rejected transaction
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailreminder_smtp::{Address, Client, Envelope};
//! use mailreminder_smtp::connection::connect_tls;
//!
//! #[tokio::main]
//! async fn main() -> mailreminder_smtp::Result<()> {
//!     let stream = connect_tls("smtp.example.com", 465).await?;
//!     let client = Client::from_stream(stream).await?;
//!     let client = client.ehlo("localhost").await?;
//!     let mut client = client.authenticate("user@example.com", "password").await?;
//!
//!     let envelope = Envelope::new(
//!         Address::new("user@example.com")?,
//!         Address::new("friend@example.com")?,
//!     );
//!     client
//!         .send_mail(&envelope, b"Subject: Hi\r\n\r\nHello!\r\n")
//!         .await?;
//!
//!     client.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌──────────────┐                                 ┌───────────────┐
//! │  Connected   │ ─── ehlo() ─── authenticate() ─→ │ Authenticated │ ─┐
//! └──────────────┘                                 └───────────────┘  │
//!                                                        ▲  send_mail()│
//!                                                        └────────────┘
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

pub use connection::{Authenticated, Client, Connected, Envelope, ServerInfo, SmtpStream};
pub use error::{Error, Result};
pub use types::{Address, Reply, ReplyCode};
