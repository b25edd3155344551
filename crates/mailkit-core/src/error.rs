//! Error types shared by the mailkit protocol clients.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur while configuring or performing a mail operation.
#[derive(Debug, Error)]
pub enum Error {
    /// `init_session` was called with an empty host.
    #[error("Empty hostname")]
    EmptyHost,

    /// `init_session` was called while a transport handle is still open.
    #[error("Session is already initialized, use cleanup_session() to clean the present one")]
    AlreadyInitialized,

    /// An operation or `cleanup_session` was called without a transport handle.
    #[error("Session is not initialized, use init_session() before")]
    NotInitialized,

    /// The backend could not allocate a transport handle.
    #[error("Unable to open a transport handle: {0}")]
    Open(#[source] TransportError),

    /// A required operation parameter was empty.
    #[error("Missing {0}")]
    MissingParameter(&'static str),

    /// A local file could not be opened for upload or download.
    #[error("Unable to open local file {}: {source}", path.display())]
    LocalFile {
        /// Path the caller named.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A keyword did not name any known value.
    #[error("Unknown {kind}: {value}")]
    InvalidValue {
        /// What was being parsed (e.g. "mail property").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// The protocol adapter refused to configure the request.
    #[error("Pre-configuration failed: {0}")]
    PreConfigure(#[source] Box<Error>),

    /// The transport reported a failure.
    #[error("Unable to perform a request (Error={} | {})", .0.code, .0.description)]
    Transport(#[from] TransportError),

    /// The protocol adapter failed to finish the operation.
    #[error("Post-processing failed: {0}")]
    PostConfigure(#[source] Box<Error>),

    /// Local I/O failed while finishing a transfer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Creates a [`Error::LocalFile`] for `path`.
    #[must_use]
    pub fn local_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::LocalFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a [`Error::InvalidValue`].
    #[must_use]
    pub fn invalid_value(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            kind,
            value: value.into(),
        }
    }

    /// Returns true if the error was detected before any transport activity.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        !matches!(
            self,
            Self::Transport(_) | Self::PostConfigure(_) | Self::Io(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_message() {
        let err = Error::from(TransportError::new(7, "Couldn't connect to server"));
        assert_eq!(
            err.to_string(),
            "Unable to perform a request (Error=7 | Couldn't connect to server)"
        );
        assert!(!err.is_local());
    }

    #[test]
    fn test_local_file_message() {
        let err = Error::local_file(
            "/nowhere/mail.eml",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(
            err.to_string(),
            "Unable to open local file /nowhere/mail.eml: No such file or directory"
        );
        assert!(err.is_local());
    }

    #[test]
    fn test_pre_configure_wraps_cause() {
        let err = Error::PreConfigure(Box::new(Error::MissingParameter("message number")));
        assert_eq!(err.to_string(), "Pre-configuration failed: Missing message number");
    }
}
