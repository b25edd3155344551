//! # mailkit-pop3
//!
//! POP3 client on top of the `mailkit-core` session.
//!
//! ```ignore
//! use mailkit_pop3::{Pop3Client, Settings, TlsMode};
//! use mailkit_core::transport::curl::CurlBackend;
//!
//! let mut client = Pop3Client::new(CurlBackend::new(), |line: &str| eprintln!("{line}"));
//! client.init_session("pop.example.com", "user", "password", Settings::ALL, TlsMode::Implicit)?;
//!
//! let mut status = String::new();
//! client.stat(&mut status)?;
//! client.get_file("1", "/tmp/1.eml")?;
//! client.delete("1")?;
//! client.cleanup_session()?;
//! ```
//!
//! Addresses become `pop3://host/` (or `pop3s://host/` with
//! [`TlsMode::Implicit`]); message numbers are appended to that URL.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
pub mod operation;

pub use client::Pop3Client;
pub use mailkit_core::{Error, Logger, Progress, Result, Settings, TlsMode};
pub use operation::{Pop3Command, Pop3Operation};

use mailkit_core::Protocol;

/// The POP3 protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pop3;

impl Protocol for Pop3 {
    const NAME: &'static str = "POP3";
    const SCHEME: &'static str = "pop3";
    const SECURE_SCHEME: &'static str = "pop3s";
    const TRAILING_SEPARATOR: bool = true;
}
