//! IMAP connection management.
//!
//! - TLS/plaintext stream abstraction
//! - Framed I/O with literal support
//! - Type-state client wrapper

mod client;
mod framed;
mod stream;

pub use client::{Authenticated, Client, NotAuthenticated, Selected};
pub use framed::{FramedStream, ResponseAccumulator};
pub use stream::{ImapStream, connect_plain, connect_tls};
