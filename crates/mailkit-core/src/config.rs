//! Session configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// User agent announced to servers that care.
pub const USER_AGENT: &str = concat!("mailkit/", env!("CARGO_PKG_VERSION"));

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// No encryption. **Not recommended for production.**
    #[default]
    None,
    /// Start with plaintext, upgrade with STARTTLS (SMTP, IMAP) or STLS (POP3).
    /// The upgrade is mandatory: the transfer fails if the server refuses it.
    StartTls,
    /// TLS from the start, selected through the `pop3s`/`imaps`/`smtps` scheme.
    Implicit,
}

/// Independent session switches.
///
/// Disabling peer or host verification reduces the security of the
/// connection and must be an explicit choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Forward diagnostics to the caller's logger.
    pub log: bool,
    /// Verify the server certificate chain.
    pub verify_peer: bool,
    /// Verify that the certificate matches the host name.
    pub verify_host: bool,
}

impl Settings {
    /// All switches on.
    pub const ALL: Self = Self {
        log: true,
        verify_peer: true,
        verify_host: true,
    };

    /// All switches off.
    pub const NONE: Self = Self {
        log: false,
        verify_peer: false,
        verify_host: false,
    };

    /// Returns these settings with logging switched on or off.
    #[must_use]
    pub const fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    /// Returns these settings with peer verification switched on or off.
    #[must_use]
    pub const fn with_verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        self
    }

    /// Returns these settings with host verification switched on or off.
    #[must_use]
    pub const fn with_verify_host(mut self, verify: bool) -> Self {
        self.verify_host = verify;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::ALL
    }
}

/// Everything a session knows about its server besides the transport handle.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Normalized server URL (scheme, host, optional port and separator).
    pub url: String,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Session switches.
    pub settings: Settings,
    /// Connection security mode.
    pub tls: TlsMode,
    /// HTTP proxy the connection is tunnelled through.
    pub proxy: Option<String>,
    /// Hard ceiling for one request.
    pub timeout: Option<Duration>,
    /// Keep the transport from using signals (e.g. for DNS timeouts).
    pub no_signal: bool,
    /// Certificate authority bundle.
    pub ca_file: Option<PathBuf>,
    /// Client certificate.
    pub ssl_cert_file: Option<PathBuf>,
    /// Client private key.
    pub ssl_key_file: Option<PathBuf>,
    /// Passphrase of the client private key.
    pub ssl_key_password: Option<String>,
    /// Directory receiving the transport trace logs.
    pub trace_directory: Option<PathBuf>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("settings", &self.settings)
            .field("tls", &self.tls)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .field("no_signal", &self.no_signal)
            .field("ca_file", &self.ca_file)
            .field("ssl_cert_file", &self.ssl_cert_file)
            .field("ssl_key_file", &self.ssl_key_file)
            .field("trace_directory", &self.trace_directory)
            .finish_non_exhaustive()
    }
}

impl SessionConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for the optional parts of a [`SessionConfig`].
///
/// Host, credentials and flags are given to `init_session`; everything else
/// can be prepared here and applied with `Session::apply_config`.
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    proxy: Option<String>,
    timeout: Option<Duration>,
    no_signal: bool,
    ca_file: Option<PathBuf>,
    ssl_cert_file: Option<PathBuf>,
    ssl_key_file: Option<PathBuf>,
    ssl_key_password: Option<String>,
    trace_directory: Option<PathBuf>,
}

impl SessionConfigBuilder {
    /// Sets the HTTP proxy (see [`normalize_proxy`]).
    #[must_use]
    pub fn proxy(mut self, proxy: &str) -> Self {
        self.proxy = normalize_proxy(proxy).or(self.proxy);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keeps the transport from installing signal handlers.
    #[must_use]
    pub const fn no_signal(mut self, no_signal: bool) -> Self {
        self.no_signal = no_signal;
        self
    }

    /// Sets the certificate authority bundle.
    #[must_use]
    pub fn ca_file(mut self, path: impl AsRef<Path>) -> Self {
        self.ca_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the client certificate and private key.
    #[must_use]
    pub fn client_identity(mut self, cert: impl AsRef<Path>, key: impl AsRef<Path>) -> Self {
        self.ssl_cert_file = Some(cert.as_ref().to_path_buf());
        self.ssl_key_file = Some(key.as_ref().to_path_buf());
        self
    }

    /// Sets the passphrase of the client private key.
    #[must_use]
    pub fn key_password(mut self, password: impl Into<String>) -> Self {
        self.ssl_key_password = Some(password.into());
        self
    }

    /// Sets the directory receiving transport trace logs.
    #[must_use]
    pub fn trace_directory(mut self, path: impl AsRef<Path>) -> Self {
        self.trace_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Copies the prepared options onto `config`, leaving the URL,
    /// credentials and flags untouched.
    pub fn apply(self, config: &mut SessionConfig) {
        config.proxy = self.proxy;
        config.timeout = self.timeout;
        config.no_signal = self.no_signal;
        config.ca_file = self.ca_file;
        config.ssl_cert_file = self.ssl_cert_file;
        config.ssl_key_file = self.ssl_key_file;
        config.ssl_key_password = self.ssl_key_password;
        config.trace_directory = self.trace_directory;
    }
}

/// Normalizes a proxy address: `http://` is prepended unless the value
/// already starts with `http` (any case). Empty input yields `None`.
#[must_use]
pub fn normalize_proxy(proxy: &str) -> Option<String> {
    if proxy.is_empty() {
        return None;
    }
    let has_scheme = proxy
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http"));
    if has_scheme {
        Some(proxy.to_string())
    } else {
        Some(format!("http://{proxy}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_enables_everything() {
        let settings = Settings::default();
        assert!(settings.log);
        assert!(settings.verify_peer);
        assert!(settings.verify_host);
        assert_eq!(settings, Settings::ALL);
    }

    #[test]
    fn test_settings_toggles() {
        let settings = Settings::ALL.with_verify_peer(false).with_verify_host(false);
        assert!(settings.log);
        assert!(!settings.verify_peer);
        assert!(!settings.verify_host);
        assert!(Settings::NONE.with_log(true).log);
    }

    #[test]
    fn test_proxy_without_scheme() {
        assert_eq!(
            normalize_proxy("myproxy:8080").as_deref(),
            Some("http://myproxy:8080")
        );
    }

    #[test]
    fn test_proxy_with_scheme() {
        assert_eq!(
            normalize_proxy("http://myproxy:8080").as_deref(),
            Some("http://myproxy:8080")
        );
        assert_eq!(
            normalize_proxy("HTTPS://myproxy:8080").as_deref(),
            Some("HTTPS://myproxy:8080")
        );
    }

    #[test]
    fn test_proxy_empty() {
        assert!(normalize_proxy("").is_none());
    }

    #[test]
    fn test_builder_applies_options() {
        let mut config = SessionConfig {
            url: "imap://mail.example.com/".into(),
            ..SessionConfig::default()
        };
        SessionConfig::builder()
            .proxy("proxy.local:3128")
            .timeout(Duration::from_secs(15))
            .ca_file("/etc/ssl/ca.pem")
            .client_identity("/etc/ssl/client.pem", "/etc/ssl/client.key")
            .key_password("secret")
            .apply(&mut config);

        assert_eq!(config.url, "imap://mail.example.com/");
        assert_eq!(config.proxy.as_deref(), Some("http://proxy.local:3128"));
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.ca_file, Some(PathBuf::from("/etc/ssl/ca.pem")));
        assert_eq!(config.ssl_key_password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = SessionConfig {
            password: "hunter2".into(),
            ..SessionConfig::default()
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
