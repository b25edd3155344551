//! # mailkit-smtp
//!
//! SMTP client on top of the `mailkit-core` session.
//!
//! ```ignore
//! use mailkit_smtp::{SmtpClient, Settings, TlsMode};
//! use mailkit_core::transport::curl::CurlBackend;
//!
//! let mut client = SmtpClient::new(CurlBackend::new(), mailkit_smtp::Logger::tracing());
//! client.init_session("smtp.example.com:587", "user", "password", Settings::ALL, TlsMode::StartTls)?;
//! client.send_string(
//!     "<user@example.com>",
//!     "<friend@example.com>",
//!     "",
//!     "Subject: hello\n\nSent with mailkit.\n",
//! )?;
//! client.cleanup_session()?;
//! ```
//!
//! Addresses become `smtp://host` (or `smtps://host`), without a trailing
//! separator.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
mod client;
pub mod operation;

pub use client::SmtpClient;
pub use mailkit_core::{Error, Logger, Progress, Result, Settings, TlsMode};
pub use operation::{SmtpCommand, SmtpOperation};

use mailkit_core::Protocol;

/// The SMTP protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Smtp;

impl Protocol for Smtp {
    const NAME: &'static str = "SMTP";
    const SCHEME: &'static str = "smtp";
    const SECURE_SCHEME: &'static str = "smtps";
    const TRAILING_SEPARATOR: bool = false;
}
