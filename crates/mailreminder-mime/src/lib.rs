//! # mailreminder-mime
//!
//! MIME handling for the reminder mailer.
//!
//! ## Features
//!
//! - **Message parsing**: Split raw RFC 5322 bytes into headers and a
//!   (possibly nested) multipart body
//! - **Plain-text extraction**: Locate the first `text/plain` part depth-first
//!   and decode its transfer encoding
//! - **Message generation**: Build the single-part plain-text reminder that is
//!   handed to the SMTP client
//! - **Encoding/Decoding**: Base64, Quoted-Printable, RFC 2047 header encoding
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailreminder_mime::{Message, PlainTextMessage};
//!
//! let raw = b"From: mailer-daemon@example.com\r\n\
//!             Content-Type: text/plain\r\n\
//!             \r\n\
//!             Your message wasn't delivered to bob@example.com\r\n";
//! let message = Message::parse(raw)?;
//! assert!(message.plain_text().is_some());
//!
//! let outgoing = PlainTextMessage::new("me@example.com", "you@example.com", "Hi", "Body");
//! let bytes = outgoing.to_rfc5322();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod builder;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use builder::PlainTextMessage;
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Body, Message, TransferEncoding};
