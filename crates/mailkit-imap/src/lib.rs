//! # mailkit-imap
//!
//! IMAP client on top of the `mailkit-core` session.
//!
//! ```ignore
//! use mailkit_imap::{ImapClient, MailProperty, SearchOption, Settings, TlsMode};
//! use mailkit_core::transport::curl::CurlBackend;
//!
//! let mut client = ImapClient::new(CurlBackend::new(), mailkit_imap::Logger::tracing());
//! client.init_session("imap.example.com", "user", "password", Settings::ALL, TlsMode::StartTls)?;
//!
//! let mut unseen = String::new();
//! client.search(&mut unseen, SearchOption::New)?;
//! client.set_mail_property("42", MailProperty::Seen)?;
//! client.cleanup_session()?;
//! ```
//!
//! Keywords read from user input go through `FromStr`:
//!
//! ```ignore
//! let property: MailProperty = "flagged".parse()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
pub mod operation;
pub mod types;

pub use client::ImapClient;
pub use mailkit_core::{Error, Logger, Progress, Result, Settings, TlsMode};
pub use operation::{ImapCommand, ImapOperation, INBOX};
pub use types::{MailProperty, SearchOption};

use mailkit_core::Protocol;

/// The IMAP protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Imap;

impl Protocol for Imap {
    const NAME: &'static str = "IMAP";
    const SCHEME: &'static str = "imap";
    const SECURE_SCHEME: &'static str = "imaps";
    const TRAILING_SEPARATOR: bool = true;
}
