//! # mailkit-core
//!
//! Session core shared by the `mailkit` POP3, IMAP and SMTP clients.
//!
//! The network side (connection, TLS, authentication, the wire protocol
//! itself) lives behind the [`Backend`] and [`Transport`] traits. This crate
//! turns high-level mail operations into transport requests: it stores the
//! server configuration, resets the transport between calls, adds the
//! cross-cutting options (credentials, TLS, proxy, timeout, progress, trace)
//! and streams payloads in and out of caller buffers and local files.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailkit_core::{Logger, Settings, TlsMode};
//! use mailkit_core::transport::curl::CurlBackend;
//! use mailkit_pop3::Pop3Client;
//!
//! let mut client = Pop3Client::new(CurlBackend::new(), Logger::tracing());
//! client.init_session("pop.example.com", "user", "password", Settings::ALL, TlsMode::Implicit)?;
//!
//! let mut listing = String::new();
//! client.list(&mut listing)?;
//! client.cleanup_session()?;
//! ```
//!
//! ## Modules
//!
//! - [`session`]: the [`Session`] cycle and the [`Protocol`]/[`Operation`] traits
//! - [`transport`]: transport contract, library lifetime and backends
//! - [`stream`]: buffer and file sinks, CRLF line source
//! - [`config`]: settings, TLS mode and session configuration
//! - [`trace`]: hourly transport trace logs

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_code)]

pub mod config;
mod error;
pub mod log;
pub mod session;
pub mod stream;
pub mod trace;
pub mod transport;

pub use config::{SessionConfig, SessionConfigBuilder, Settings, TlsMode, USER_AGENT};
pub use error::{Error, Result};
pub use log::Logger;
pub use session::{Operation, Protocol, Session};
pub use stream::{BufferSink, Destination, Download, FileSink, LineSource, Source, Upload};
pub use transport::{
    Backend, Channels, FollowUp, Progress, Request, Transport, TransportError, TransportLibrary,
};
