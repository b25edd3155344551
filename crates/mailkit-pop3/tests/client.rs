//! POP3 client tests against the mock transport.

use std::sync::{Arc, Mutex};

use mailkit_core::transport::mock::{MockBackend, MockHandle, Reply};
use mailkit_pop3::{Error, Pop3Client, Settings, TlsMode};
use proptest::prelude::*;

type Lines = Arc<Mutex<Vec<String>>>;

fn client() -> (Pop3Client<MockBackend>, MockHandle, Lines) {
    let backend = MockBackend::new();
    let handle = backend.handle();
    let lines: Lines = Arc::default();
    let captured = Arc::clone(&lines);
    let client = Pop3Client::new(backend, move |line: &str| {
        captured.lock().unwrap().push(line.to_string());
    });
    (client, handle, lines)
}

fn initialized() -> (Pop3Client<MockBackend>, MockHandle, Lines) {
    let (mut client, handle, lines) = client();
    client
        .init_session("mail.example.com", "amine", "secret", Settings::ALL, TlsMode::None)
        .unwrap();
    (client, handle, lines)
}

#[test]
fn test_operations_before_init_fail_without_transport() {
    let (mut client, handle, _) = client();
    let mut out = String::new();

    assert!(matches!(client.list(&mut out), Err(Error::NotInitialized)));
    assert!(matches!(client.stat(&mut out), Err(Error::NotInitialized)));
    assert!(matches!(client.noop(), Err(Error::NotInitialized)));
    assert!(matches!(client.delete("1"), Err(Error::NotInitialized)));
    assert!(handle.exchanges().is_empty());
    assert!(out.is_empty());
}

#[test]
fn test_address_normalization() {
    let (mut client, _, _) = client();
    client
        .init_session("mail.example.com", "u", "p", Settings::ALL, TlsMode::Implicit)
        .unwrap();
    assert_eq!(client.url(), "pop3s://mail.example.com/");
    client.cleanup_session().unwrap();

    client
        .init_session("mail.example.com", "u", "p", Settings::ALL, TlsMode::None)
        .unwrap();
    assert_eq!(client.url(), "pop3://mail.example.com/");
    client.cleanup_session().unwrap();

    client
        .init_session("pop3s://mail.example.com:995", "u", "p", Settings::ALL, TlsMode::None)
        .unwrap();
    assert_eq!(client.url(), "pop3s://mail.example.com:995/");
    assert_eq!(client.tls_mode(), TlsMode::Implicit);
}

#[test]
fn test_list_appends_to_buffer() {
    let (mut client, handle, _) = initialized();
    handle.push_reply(Reply::ok("1 1024\r\n2 2048\r\n"));

    let mut out = String::from("previous\r\n");
    client.list(&mut out).unwrap();
    assert_eq!(out, "previous\r\n1 1024\r\n2 2048\r\n");

    let request = handle.last_request().unwrap();
    assert_eq!(request.url, "pop3://mail.example.com/");
    assert!(request.command.is_none());
    assert_eq!(request.credentials.username, "amine");
    assert_eq!(request.credentials.password, "secret");
}

#[test]
fn test_list_uidl_and_headers() {
    let (mut client, handle, _) = initialized();
    handle.push_reply(Reply::ok("1 abc\r\n"));
    handle.push_reply(Reply::ok("Subject: hello\r\n"));

    let mut uids = String::new();
    client.list_uidl(&mut uids).unwrap();
    let mut headers = String::new();
    client.get_headers("1", &mut headers).unwrap();

    assert_eq!(uids, "1 abc\r\n");
    assert_eq!(headers, "Subject: hello\r\n");
    let exchanges = handle.exchanges();
    assert_eq!(exchanges[0].request.command.as_deref(), Some("UIDL"));
    assert_eq!(exchanges[1].request.command.as_deref(), Some("TOP 1 0"));
    assert_eq!(handle.resets(), 2);
}

#[test]
fn test_get_string() {
    let (mut client, handle, _) = initialized();
    handle.push_reply(Reply::ok("From: a@example.com\r\n\r\nhi\r\n"));

    let mut mail = String::new();
    client.get_string("4", &mut mail).unwrap();
    assert_eq!(mail, "From: a@example.com\r\n\r\nhi\r\n");
    assert_eq!(handle.last_request().unwrap().url, "pop3://mail.example.com/4");
}

#[test]
fn test_missing_message_number_issues_no_command() {
    let (mut client, handle, lines) = initialized();
    let mut out = String::new();

    assert!(matches!(client.get_string("", &mut out), Err(Error::PreConfigure(_))));
    assert!(matches!(client.delete(""), Err(Error::PreConfigure(_))));
    assert!(handle.exchanges().is_empty());
    assert_eq!(lines.lock().unwrap().len(), 2);
}

#[test]
fn test_get_file_writes_and_truncates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("1.eml");
    std::fs::write(&path, "an older and much longer message").unwrap();

    let (mut client, handle, _) = initialized();
    handle.push_reply(Reply::ok("fresh\r\n"));
    client.get_file("1", &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\r\n");
}

#[test]
fn test_get_file_unwritable_destination() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("1.eml");

    let (mut client, handle, _) = initialized();
    let err = client.get_file("1", &path).unwrap_err();

    match err {
        Error::PreConfigure(cause) => assert!(matches!(*cause, Error::LocalFile { .. })),
        other => panic!("unexpected error: {other}"),
    }
    assert!(handle.exchanges().is_empty());
    assert!(!path.exists());
}

#[test]
fn test_no_body_commands() {
    let (mut client, handle, _) = initialized();
    client.delete("3").unwrap();
    client.noop().unwrap();

    let exchanges = handle.exchanges();
    assert_eq!(exchanges[0].request.command.as_deref(), Some("DELE 3"));
    assert!(exchanges[0].request.no_body);
    assert_eq!(exchanges[1].request.command.as_deref(), Some("NOOP"));
    assert!(exchanges[1].request.no_body);
}

#[test]
fn test_stat_captures_status_line() {
    let (mut client, handle, _) = initialized();
    handle.push_reply(Reply::ok("+OK 2 3072\r\n"));

    let mut status = String::new();
    client.stat(&mut status).unwrap();
    assert_eq!(status, "+OK 2 3072\r\n");
    assert_eq!(handle.last_request().unwrap().command.as_deref(), Some("STAT"));
}

#[test]
fn test_transport_failure_is_reported() {
    let (mut client, handle, lines) = initialized();
    handle.push_reply(Reply::fail(67, "Login denied"));

    let err = client.noop().unwrap_err();
    assert!(matches!(&err, Error::Transport(e) if e.code == 67));
    assert_eq!(
        lines.lock().unwrap().as_slice(),
        ["[POP3][Error] Unable to perform a request (Error=67 | Login denied)"]
    );
}

#[test]
fn test_progress_abort_fails_download() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("2.eml");
    let (mut client, handle, _) = initialized();
    handle.push_reply(Reply::ok("large message"));

    client.set_progress_callback(|progress| {
        if progress.download_now > 4 {
            std::ops::ControlFlow::Break(())
        } else {
            std::ops::ControlFlow::Continue(())
        }
    });
    assert!(client.get_file("2", &path).is_err());
}

#[test]
fn test_session_options_reach_the_request() {
    let (mut client, handle, _) = initialized();
    client.set_proxy("myproxy:8080");
    client.set_no_signal(true);
    client.set_ssl_cert_file("/etc/ssl/client.pem");
    client.set_ssl_key_file("/etc/ssl/client.key");
    client.set_ssl_key_password("passphrase");
    client.noop().unwrap();

    let request = handle.last_request().unwrap();
    assert_eq!(request.proxy.as_deref(), Some("http://myproxy:8080"));
    assert!(request.no_signal);
    assert_eq!(request.tls.key_password.as_deref(), Some("passphrase"));
    assert!(request.tls.client_cert.is_some());
    assert!(request.tls.verify_peer);
    assert_eq!(client.proxy(), Some("http://myproxy:8080"));
}

#[test]
fn test_timeout_disables_signals() {
    let (mut client, handle, _) = initialized();
    client.noop().unwrap();
    assert!(!handle.last_request().unwrap().no_signal);

    client.set_timeout(std::time::Duration::from_secs(5));
    client.noop().unwrap();

    let request = handle.last_request().unwrap();
    assert_eq!(request.timeout, Some(std::time::Duration::from_secs(5)));
    assert!(request.no_signal);
    assert!(!client.no_signal());
}

proptest! {
    #[test]
    fn prop_base_url_shape(host in "[a-z]{1,12}(\\.[a-z]{2,6}){1,2}", implicit in any::<bool>()) {
        let (mut client, _, _) = client();
        let tls = if implicit { TlsMode::Implicit } else { TlsMode::None };
        client.init_session(&host, "u", "p", Settings::NONE, tls).unwrap();

        let scheme = if implicit { "pop3s://" } else { "pop3://" };
        prop_assert!(client.url().starts_with(scheme));
        prop_assert!(client.url().ends_with('/'));
        prop_assert_eq!(client.url().len(), scheme.len() + host.len() + 1);
    }
}
