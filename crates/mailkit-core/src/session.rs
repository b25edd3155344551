//! Session core shared by the protocol clients.
//!
//! A [`Session`] owns the configuration of one mailbox or server, at most one
//! transport handle and the last executed request. Each client operation is a
//! short-lived [`Operation`] that the session runs through the same cycle:
//!
//! 1. reset the transport and start a fresh request at the base URL
//! 2. let the operation configure its target and channels
//! 3. add credentials, TLS, proxy, timeout, progress and trace options
//! 4. execute the request
//! 5. let the operation finish its sinks, even when the transfer failed

use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::path::Path;
use std::time::Duration;

use crate::config::{normalize_proxy, SessionConfig, SessionConfigBuilder, Settings, TlsMode, USER_AGENT};
use crate::error::{Error, Result};
use crate::log::Logger;
use crate::trace::TraceLog;
use crate::transport::{
    Backend, Channels, Credentials, FollowUp, LibraryGuard, Progress, ProgressFn, Request, TlsOptions,
    TraceKind, Transport, TransportError,
};

/// Static description of a mail protocol.
pub trait Protocol {
    /// Short name used in diagnostics (e.g. `POP3`).
    const NAME: &'static str;
    /// URL scheme of plain and STARTTLS connections.
    const SCHEME: &'static str;
    /// URL scheme of implicit TLS connections.
    const SECURE_SCHEME: &'static str;
    /// Whether the base URL ends with `/`.
    const TRAILING_SEPARATOR: bool;

    /// Turns a host (optionally with port or scheme) into the session base URL.
    ///
    /// A scheme already present in `host` wins over `tls`: the secure scheme
    /// selects [`TlsMode::Implicit`], any other scheme cannot carry implicit
    /// TLS and downgrades it to [`TlsMode::None`].
    fn normalize_address(host: &str, tls: TlsMode) -> (String, TlsMode) {
        let secure_prefix = format!("{}://", Self::SECURE_SCHEME);
        let (mut url, tls) = if starts_with_ignore_case(host, &secure_prefix) {
            (host.to_string(), TlsMode::Implicit)
        } else if host.contains("://") {
            let tls = if tls == TlsMode::Implicit { TlsMode::None } else { tls };
            (host.to_string(), tls)
        } else if tls == TlsMode::Implicit {
            (format!("{secure_prefix}{host}"), tls)
        } else {
            (format!("{}://{host}", Self::SCHEME), tls)
        };

        if Self::TRAILING_SEPARATOR && !url.ends_with('/') {
            url.push('/');
        }
        (url, tls)
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// One client operation: configures a request, lends the data channels and
/// finishes the transfer.
pub trait Operation {
    /// Sets the target (URL suffix, command, direction, envelope) of the
    /// request and opens local resources.
    ///
    /// # Errors
    ///
    /// Returns an error when a parameter is missing or a local file cannot be
    /// opened. The request is then not executed.
    fn pre_configure(&mut self, request: &mut Request) -> Result<()>;

    /// Data channels for the transfer.
    fn channels(&mut self) -> Channels<'_>;

    /// Closes local resources and delivers buffered output. Always called
    /// after an executed request, whatever its outcome.
    ///
    /// # Errors
    ///
    /// Returns an error when the output cannot be delivered.
    fn post_configure(
        &mut self,
        outcome: &std::result::Result<(), TransportError>,
        follow_up: FollowUp<'_>,
    ) -> Result<()>;
}

/// A configured connection context for one server.
///
/// Sessions are independent of each other; the only shared state is the
/// backend's [`TransportLibrary`](crate::transport::TransportLibrary), which
/// stays initialized while at least one session exists.
pub struct Session<P: Protocol, B: Backend> {
    backend: B,
    config: SessionConfig,
    transport: Option<B::Transport>,
    request: Request,
    progress: Option<Box<ProgressFn>>,
    logger: Logger,
    protocol: PhantomData<fn() -> P>,
    // Released last: the library outlives the transport handle.
    _library: LibraryGuard,
}

impl<P: Protocol, B: Backend> Session<P, B> {
    /// Creates an uninitialized session.
    pub fn new(backend: B, logger: impl Into<Logger>) -> Self {
        let library = backend.library().acquire();
        Self {
            backend,
            config: SessionConfig::default(),
            transport: None,
            request: Request::default(),
            progress: None,
            logger: logger.into(),
            protocol: PhantomData,
            _library: library,
        }
    }

    /// Stores the server address, credentials and flags and opens a
    /// transport handle.
    ///
    /// # Errors
    ///
    /// Fails when `host` is empty, when the session is already initialized
    /// (the current configuration is kept) or when the backend cannot open a
    /// handle.
    pub fn init_session(
        &mut self,
        host: &str,
        username: &str,
        password: &str,
        settings: Settings,
        tls: TlsMode,
    ) -> Result<()> {
        if host.is_empty() {
            return Err(self.fail(Error::EmptyHost));
        }
        if self.transport.is_some() {
            return Err(self.fail(Error::AlreadyInitialized));
        }

        let transport = match self.backend.open() {
            Ok(transport) => transport,
            Err(e) => return Err(self.fail(Error::Open(e))),
        };

        let (url, tls) = P::normalize_address(host, tls);
        self.config.url = url;
        self.config.username = username.to_string();
        self.config.password = password.to_string();
        self.config.settings = settings;
        self.config.tls = tls;
        self.transport = Some(transport);

        tracing::debug!(protocol = P::NAME, url = %self.config.url, tls = ?tls, "Session initialized");
        Ok(())
    }

    /// Closes the transport handle and frees the last request.
    ///
    /// # Errors
    ///
    /// Fails when the session is not initialized.
    pub fn cleanup_session(&mut self) -> Result<()> {
        if self.transport.take().is_none() {
            return Err(self.fail(Error::NotInitialized));
        }
        self.request = Request::default();
        tracing::debug!(protocol = P::NAME, url = %self.config.url, "Session cleaned up");
        Ok(())
    }

    /// Runs `operation` on the session's transport.
    ///
    /// # Errors
    ///
    /// Fails without transport activity when the session is not initialized
    /// or the operation refuses its configuration. Otherwise fails when the
    /// transfer or the operation's post-processing fails.
    pub fn perform(&mut self, operation: &mut impl Operation) -> Result<()> {
        let Self {
            config,
            transport,
            request,
            progress,
            logger,
            ..
        } = self;
        let settings = config.settings;
        let Some(transport) = transport.as_mut() else {
            return Err(report::<P>(logger, settings, Error::NotInitialized));
        };

        transport.reset();
        *request = Request::new(config.url.clone());

        if let Err(e) = operation.pre_configure(request) {
            return Err(report::<P>(logger, settings, Error::PreConfigure(Box::new(e))));
        }
        apply_session_options(config, progress.is_some(), request);

        tracing::debug!(
            protocol = P::NAME,
            url = %request.url,
            command = request.command.as_deref().unwrap_or_default(),
            upload = request.upload,
            "Performing request"
        );

        let mut trace_log = config.trace_directory.as_deref().and_then(TraceLog::open);
        let mut record = |kind: TraceKind, data: &[u8]| match trace_log.as_mut() {
            Some(log) => log.record(kind, data),
            None => tracing::trace!(kind = ?kind, data = %String::from_utf8_lossy(data)),
        };

        let outcome = {
            let mut channels = operation.channels();
            if let Some(callback) = progress.as_deref_mut() {
                channels.progress = Some(callback as &mut dyn FnMut(Progress) -> ControlFlow<()>);
            }
            if request.verbose {
                channels.trace = Some(&mut record as &mut dyn FnMut(TraceKind, &[u8]));
            }
            transport.execute(request, channels)
        };
        if let Some(log) = trace_log {
            log.finish();
        }

        let follow_up = FollowUp::new(transport, request, settings.log.then_some(&*logger));
        let finished = operation.post_configure(&outcome, follow_up);
        if let Err(e) = finished {
            return Err(report::<P>(logger, settings, Error::PostConfigure(Box::new(e))));
        }
        outcome.map_err(|e| report::<P>(logger, settings, Error::Transport(e)))
    }

    /// Applies options prepared with [`SessionConfig::builder`].
    pub fn apply_config(&mut self, builder: SessionConfigBuilder) {
        builder.apply(&mut self.config);
    }

    /// Sets the HTTP proxy. `http://` is prepended unless the value already
    /// starts with `http`; an empty value is ignored.
    pub fn set_proxy(&mut self, proxy: &str) {
        if let Some(proxy) = normalize_proxy(proxy) {
            self.config.proxy = Some(proxy);
        }
    }

    /// Sets the hard ceiling for each request.
    pub const fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = Some(timeout);
    }

    /// Keeps the transport from using signals.
    pub const fn set_no_signal(&mut self, no_signal: bool) {
        self.config.no_signal = no_signal;
    }

    /// Sets the certificate authority bundle.
    pub fn set_ca_file(&mut self, path: impl AsRef<Path>) {
        self.config.ca_file = Some(path.as_ref().to_path_buf());
    }

    /// Sets the client certificate.
    pub fn set_ssl_cert_file(&mut self, path: impl AsRef<Path>) {
        self.config.ssl_cert_file = Some(path.as_ref().to_path_buf());
    }

    /// Sets the client private key.
    pub fn set_ssl_key_file(&mut self, path: impl AsRef<Path>) {
        self.config.ssl_key_file = Some(path.as_ref().to_path_buf());
    }

    /// Sets the passphrase of the client private key.
    pub fn set_ssl_key_password(&mut self, password: impl Into<String>) {
        self.config.ssl_key_password = Some(password.into());
    }

    /// Registers the progress callback. Returning `Break` from it aborts the
    /// transfer in flight.
    pub fn set_progress_callback(
        &mut self,
        callback: impl FnMut(Progress) -> ControlFlow<()> + Send + 'static,
    ) {
        self.progress = Some(Box::new(callback));
    }

    /// Removes the progress callback.
    pub fn clear_progress_callback(&mut self) {
        self.progress = None;
    }

    /// Enables transport trace logs in `directory`.
    pub fn set_trace_directory(&mut self, directory: impl AsRef<Path>) {
        self.config.trace_directory = Some(directory.as_ref().to_path_buf());
    }

    /// Normalized server URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.config.username
    }

    /// Login password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.config.password
    }

    /// Session switches.
    #[must_use]
    pub const fn settings(&self) -> Settings {
        self.config.settings
    }

    /// Connection security mode.
    #[must_use]
    pub const fn tls_mode(&self) -> TlsMode {
        self.config.tls
    }

    /// HTTP proxy.
    #[must_use]
    pub fn proxy(&self) -> Option<&str> {
        self.config.proxy.as_deref()
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.config.timeout
    }

    /// Whether the transport is kept from using signals.
    #[must_use]
    pub const fn no_signal(&self) -> bool {
        self.config.no_signal
    }

    /// Certificate authority bundle.
    #[must_use]
    pub fn ca_file(&self) -> Option<&Path> {
        self.config.ca_file.as_deref()
    }

    /// Client certificate.
    #[must_use]
    pub fn ssl_cert_file(&self) -> Option<&Path> {
        self.config.ssl_cert_file.as_deref()
    }

    /// Client private key.
    #[must_use]
    pub fn ssl_key_file(&self) -> Option<&Path> {
        self.config.ssl_key_file.as_deref()
    }

    /// Passphrase of the client private key.
    #[must_use]
    pub fn ssl_key_password(&self) -> Option<&str> {
        self.config.ssl_key_password.as_deref()
    }

    /// Trace log directory.
    #[must_use]
    pub fn trace_directory(&self) -> Option<&Path> {
        self.config.trace_directory.as_deref()
    }

    /// Whether a progress callback is registered.
    #[must_use]
    pub const fn has_progress_callback(&self) -> bool {
        self.progress.is_some()
    }

    /// Whether a transport handle is open.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.transport.is_some()
    }

    /// Full configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The request executed last, until the next operation or cleanup.
    #[must_use]
    pub const fn last_request(&self) -> &Request {
        &self.request
    }

    /// Writes `message` to the caller's logger when logging is enabled.
    pub fn log(&self, message: &str) {
        if self.config.settings.log {
            self.logger.log(message);
        }
    }

    fn fail(&self, error: Error) -> Error {
        report::<P>(&self.logger, self.config.settings, error)
    }
}

impl<P: Protocol, B: Backend> std::fmt::Debug for Session<P, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("protocol", &P::NAME)
            .field("config", &self.config)
            .field("initialized", &self.transport.is_some())
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl<P: Protocol, B: Backend> Drop for Session<P, B> {
    fn drop(&mut self) {
        if self.transport.is_some() {
            let message = format!(
                "[{}][Warning] Session dropped before calling cleanup_session(), the session was cleaned though",
                P::NAME
            );
            tracing::warn!(protocol = P::NAME, "{message}");
            self.log(&message);
            self.transport = None;
        }
    }
}

/// Logs `error` and hands it back.
fn report<P: Protocol>(logger: &Logger, settings: Settings, error: Error) -> Error {
    tracing::error!(protocol = P::NAME, error = %error, "Mail operation failed");
    if settings.log {
        logger.log(&format!("[{}][Error] {error}", P::NAME));
    }
    error
}

fn apply_session_options(config: &SessionConfig, with_progress: bool, request: &mut Request) {
    request.credentials = Credentials {
        username: config.username.clone(),
        password: config.password.clone(),
    };
    request.tls = TlsOptions {
        mode: config.tls,
        ca_file: config.ca_file.clone(),
        client_cert: config.ssl_cert_file.clone(),
        client_key: config.ssl_key_file.clone(),
        key_password: config.ssl_key_password.clone(),
        verify_peer: config.settings.verify_peer,
        verify_host: config.settings.verify_host,
    };
    request.user_agent = USER_AGENT.to_string();
    request.timeout = config.timeout;
    request.no_signal = config.no_signal || config.timeout.is_some();
    if let Some(proxy) = &config.proxy {
        request.proxy = Some(proxy.clone());
        request.proxy_tunnel = true;
    }
    request.progress = with_progress;
    request.verbose = config.trace_directory.is_some();
}
