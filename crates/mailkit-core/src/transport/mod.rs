//! Transport contract.
//!
//! The network side of a mail session (connection, TLS, authentication and
//! the protocol exchange itself) is provided by a [`Backend`]. A session
//! opens one [`Transport`] handle per `init_session`, resets it before every
//! operation, and executes one [`Request`] per operation with the data
//! [`Channels`] lent by the protocol adapter.
//!
//! ## Backends
//!
//! - `mock` feature: [`mock::MockBackend`] records requests and replays
//!   scripted replies.
//! - `curl` feature: [`curl::CurlBackend`] drives a libcurl easy handle.

use std::fmt;
use std::io;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::TlsMode;
use crate::log::Logger;

#[cfg(feature = "curl")]
pub mod curl;
mod library;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use library::{LibraryGuard, TransportLibrary};

/// Failure reported by a transport: a numeric code and its description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error {code}: {description}")]
pub struct TransportError {
    /// Backend-specific numeric code.
    pub code: i32,
    /// Human-readable description of the code.
    pub description: String,
}

impl TransportError {
    /// Code used when the progress callback cancelled the transfer.
    pub const ABORTED_BY_CALLBACK: i32 = 42;

    /// Creates a transport error.
    #[must_use]
    pub fn new(code: i32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    /// The transfer was cancelled by the progress callback.
    #[must_use]
    pub fn aborted_by_callback() -> Self {
        Self::new(Self::ABORTED_BY_CALLBACK, "Operation was aborted by an application callback")
    }
}

/// Login credentials handed to the transport.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// TLS options of one request.
#[derive(Clone, PartialEq, Eq)]
pub struct TlsOptions {
    /// Security mode; `StartTls` requires the in-band upgrade.
    pub mode: TlsMode,
    /// Certificate authority bundle.
    pub ca_file: Option<PathBuf>,
    /// Client certificate.
    pub client_cert: Option<PathBuf>,
    /// Client private key.
    pub client_key: Option<PathBuf>,
    /// Passphrase of the client private key.
    pub key_password: Option<String>,
    /// Verify the server certificate chain.
    pub verify_peer: bool,
    /// Verify that the certificate matches the host name.
    pub verify_host: bool,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            mode: TlsMode::None,
            ca_file: None,
            client_cert: None,
            client_key: None,
            key_password: None,
            verify_peer: true,
            verify_host: true,
        }
    }
}

impl fmt::Debug for TlsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsOptions")
            .field("mode", &self.mode)
            .field("ca_file", &self.ca_file)
            .field("client_cert", &self.client_cert)
            .field("client_key", &self.client_key)
            .field("key_password", &self.key_password.as_ref().map(|_| "<redacted>"))
            .field("verify_peer", &self.verify_peer)
            .field("verify_host", &self.verify_host)
            .finish()
    }
}

/// One request for the transport.
///
/// A fresh request is built for every operation: the protocol adapter fills
/// the target (`url`, `command`, direction, envelope) and the session adds
/// the cross-cutting options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Target URL: the session base URL plus the adapter's suffix.
    pub url: String,
    /// Protocol command replacing the one implied by the URL.
    pub command: Option<String>,
    /// The server answers with a status line only; no body is transferred.
    pub no_body: bool,
    /// Data flows from the upload channel to the server.
    pub upload: bool,
    /// SMTP envelope sender.
    pub mail_from: Option<String>,
    /// SMTP envelope recipients (also the VRFY/EXPN argument).
    pub recipients: Vec<String>,
    /// Login credentials.
    pub credentials: Credentials,
    /// TLS options.
    pub tls: TlsOptions,
    /// User agent string.
    pub user_agent: String,
    /// Hard ceiling for the whole request.
    pub timeout: Option<Duration>,
    /// Keep the transport from using signals.
    pub no_signal: bool,
    /// HTTP proxy address.
    pub proxy: Option<String>,
    /// Tunnel the protocol through the proxy with CONNECT.
    pub proxy_tunnel: bool,
    /// Report progress through [`Channels::progress`].
    pub progress: bool,
    /// Report protocol traffic through [`Channels::trace`].
    pub verbose: bool,
}

impl Request {
    /// Creates a request aimed at `url` with default options.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the protocol command.
    pub fn set_command(&mut self, command: impl Into<String>) {
        self.command = Some(command.into());
    }
}

/// Transfer counters passed to the progress callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Bytes expected to be downloaded (0 when unknown).
    pub download_total: u64,
    /// Bytes downloaded so far.
    pub download_now: u64,
    /// Bytes expected to be uploaded (0 when unknown).
    pub upload_total: u64,
    /// Bytes uploaded so far.
    pub upload_now: u64,
}

/// Progress callback. Returning `Break` cancels the transfer in flight.
pub type ProgressFn = dyn FnMut(Progress) -> ControlFlow<()> + Send;

/// Kind of a transport trace record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    /// Informational text from the transport.
    Text,
    /// Protocol line received.
    HeaderIn,
    /// Protocol line sent.
    HeaderOut,
    /// Payload received.
    DataIn,
    /// Payload sent.
    DataOut,
    /// Encrypted bytes received.
    SslDataIn,
    /// Encrypted bytes sent.
    SslDataOut,
}

impl TraceKind {
    /// Prefix written in front of the record in trace logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "# Information : ",
            Self::HeaderOut => "-> Sending header : ",
            Self::DataOut => "-> Sending data : ",
            Self::SslDataOut => "-> Sending SSL data : ",
            Self::HeaderIn => "<- Receiving header : ",
            Self::DataIn => "<- Receiving unencrypted data : ",
            Self::SslDataIn => "<- Receiving SSL data : ",
        }
    }
}

/// Data sinks, sources and hooks lent to one transport execution.
#[derive(Default)]
pub struct Channels<'a> {
    /// Receives downloaded data (and the status line of no-body requests).
    /// Data without a sink is discarded.
    pub download: Option<&'a mut dyn io::Write>,
    /// Supplies upload data; a read of 0 bytes ends the upload.
    pub upload: Option<&'a mut dyn io::Read>,
    /// Progress callback.
    pub progress: Option<&'a mut dyn FnMut(Progress) -> ControlFlow<()>>,
    /// Protocol trace callback.
    pub trace: Option<&'a mut dyn FnMut(TraceKind, &[u8])>,
}

impl Channels<'_> {
    /// Forwards counters to the progress callback, if any.
    pub fn report_progress(&mut self, progress: Progress) -> ControlFlow<()> {
        match self.progress.as_deref_mut() {
            Some(callback) => callback(progress),
            None => ControlFlow::Continue(()),
        }
    }

    /// Forwards a trace record to the trace callback, if any.
    pub fn report_trace(&mut self, kind: TraceKind, data: &[u8]) {
        if let Some(callback) = self.trace.as_deref_mut() {
            callback(kind, data);
        }
    }
}

impl fmt::Debug for Channels<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channels")
            .field("download", &self.download.is_some())
            .field("upload", &self.upload.is_some())
            .field("progress", &self.progress.is_some())
            .field("trace", &self.trace.is_some())
            .finish()
    }
}

/// An open connection context able to execute requests.
///
/// Closing the handle is dropping it.
pub trait Transport: Send {
    /// Forgets every option left by the previous request.
    fn reset(&mut self);

    /// Executes `request`, blocking until the exchange completes, fails or
    /// times out.
    ///
    /// # Errors
    ///
    /// Returns the transport's code and description on any failure,
    /// including a cancellation by the progress callback.
    fn execute(&mut self, request: &Request, channels: Channels<'_>) -> Result<(), TransportError>;
}

/// Factory for transport handles.
pub trait Backend: Send {
    /// Handle type produced by this backend.
    type Transport: Transport + 'static;

    /// Process-wide library state shared by every session of this backend.
    fn library(&self) -> &'static TransportLibrary;

    /// Allocates a new transport handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle cannot be allocated.
    fn open(&mut self) -> Result<Self::Transport, TransportError>;
}

/// Access to the transport after the main request, for adapters that need
/// a second exchange during post-processing.
pub struct FollowUp<'a> {
    transport: &'a mut dyn Transport,
    request: &'a mut Request,
    logger: Option<&'a Logger>,
}

impl<'a> FollowUp<'a> {
    pub(crate) fn new(
        transport: &'a mut dyn Transport,
        request: &'a mut Request,
        logger: Option<&'a Logger>,
    ) -> Self {
        Self {
            transport,
            request,
            logger,
        }
    }

    /// The request that was just executed.
    #[must_use]
    pub fn request(&self) -> &Request {
        self.request
    }

    /// Re-executes the last request with `command` and no data transfer.
    ///
    /// Every other option (URL, credentials, TLS, proxy) is kept.
    ///
    /// # Errors
    ///
    /// Returns the transport failure of the follow-up exchange.
    pub fn execute_command(&mut self, command: &str) -> Result<(), TransportError> {
        self.request.set_command(command);
        self.request.upload = false;
        self.request.progress = false;
        self.request.verbose = false;
        self.transport.execute(self.request, Channels::default())
    }

    /// Writes `message` to the session's logger, when logging is enabled.
    pub fn log(&self, message: &str) {
        if let Some(logger) = self.logger {
            logger.log(message);
        }
    }
}

impl fmt::Debug for FollowUp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FollowUp")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_new() {
        let mut request = Request::new("pop3://mail.example.com/");
        assert_eq!(request.url, "pop3://mail.example.com/");
        assert!(request.command.is_none());
        assert!(request.tls.verify_peer);

        request.set_command("NOOP");
        assert_eq!(request.command.as_deref(), Some("NOOP"));
    }

    #[test]
    fn test_credentials_debug_redacted() {
        let credentials = Credentials {
            username: "amine".into(),
            password: "my_password".into(),
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("amine"));
        assert!(!debug.contains("my_password"));
    }

    #[test]
    fn test_channels_without_callbacks() {
        let mut channels = Channels::default();
        assert_eq!(
            channels.report_progress(Progress::default()),
            ControlFlow::Continue(())
        );
        channels.report_trace(TraceKind::Text, b"ignored");
    }

    #[test]
    fn test_channels_progress_break() {
        let mut calls = 0;
        let mut callback = |progress: Progress| {
            calls += 1;
            if progress.download_now > 10 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let mut channels = Channels {
            progress: Some(&mut callback),
            ..Channels::default()
        };
        assert!(channels
            .report_progress(Progress {
                download_now: 5,
                ..Progress::default()
            })
            .is_continue());
        assert!(channels
            .report_progress(Progress {
                download_now: 50,
                ..Progress::default()
            })
            .is_break());
        drop(channels);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_trace_labels() {
        assert_eq!(TraceKind::Text.label(), "# Information : ");
        assert_eq!(TraceKind::HeaderOut.label(), "-> Sending header : ");
        assert_eq!(TraceKind::DataIn.label(), "<- Receiving unencrypted data : ");
    }
}
