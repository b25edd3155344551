//! libcurl backend wired into a session, without network access.

#![cfg(feature = "curl")]
#![allow(clippy::unwrap_used)]

use mailkit_core::transport::curl::CurlBackend;
use mailkit_core::{Error, Logger, Protocol, Session, Settings, TlsMode};

struct Smtp;

impl Protocol for Smtp {
    const NAME: &'static str = "SMTP";
    const SCHEME: &'static str = "smtp";
    const SECURE_SCHEME: &'static str = "smtps";
    const TRAILING_SEPARATOR: bool = false;
}

#[test]
fn test_curl_session_lifecycle() {
    let mut session: Session<Smtp, CurlBackend> = Session::new(CurlBackend::new(), Logger::silent());
    session
        .init_session("smtp.example.com:587", "user", "secret", Settings::ALL, TlsMode::StartTls)
        .unwrap();
    assert!(session.is_initialized());
    assert_eq!(session.url(), "smtp://smtp.example.com:587");
    assert_eq!(session.tls_mode(), TlsMode::StartTls);

    session.cleanup_session().unwrap();
    assert!(matches!(session.cleanup_session(), Err(Error::NotInitialized)));
}
