//! SMTP client tests against the mock transport.

use std::sync::{Arc, Mutex};

use mailkit_core::transport::mock::{MockBackend, MockHandle, Reply};
use mailkit_smtp::{Error, Settings, SmtpClient, TlsMode};

type Lines = Arc<Mutex<Vec<String>>>;

fn client() -> (SmtpClient<MockBackend>, MockHandle, Lines) {
    let backend = MockBackend::new();
    let handle = backend.handle();
    let lines: Lines = Arc::default();
    let captured = Arc::clone(&lines);
    let client = SmtpClient::new(backend, move |line: &str| {
        captured.lock().unwrap().push(line.to_string());
    });
    (client, handle, lines)
}

fn initialized() -> (SmtpClient<MockBackend>, MockHandle, Lines) {
    let (mut client, handle, lines) = client();
    client
        .init_session("smtp.example.com:587", "amine", "secret", Settings::ALL, TlsMode::StartTls)
        .unwrap();
    (client, handle, lines)
}

const MAIL: &str = "Date: Mon, 29 Nov 2010 21:54:29 +1100\nTo: <b@example.com>\nSubject: SMTP test\n\nHello\n";

#[test]
fn test_operations_before_init_fail() {
    let (mut client, handle, _) = client();
    assert!(matches!(
        client.send_string("a@example.com", "b@example.com", "", MAIL),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(client.verify_address("a@example.com"), Err(Error::NotInitialized)));
    assert!(handle.exchanges().is_empty());
}

#[test]
fn test_address_normalization() {
    let (mut client, _, _) = client();
    client
        .init_session("smtp.example.com", "u", "p", Settings::ALL, TlsMode::Implicit)
        .unwrap();
    assert_eq!(client.url(), "smtps://smtp.example.com");
    client.cleanup_session().unwrap();

    client
        .init_session("smtp.example.com", "u", "p", Settings::ALL, TlsMode::None)
        .unwrap();
    assert_eq!(client.url(), "smtp://smtp.example.com");
}

#[test]
fn test_send_string() {
    let (mut client, handle, _) = initialized();
    client
        .send_string("<a@example.com>", "<b@example.com>", "<c@example.com>", MAIL)
        .unwrap();

    let exchange = &handle.exchanges()[0];
    assert_eq!(exchange.request.url, "smtp://smtp.example.com:587");
    assert_eq!(exchange.request.mail_from.as_deref(), Some("<a@example.com>"));
    assert_eq!(exchange.request.recipients, ["<b@example.com>", "<c@example.com>"]);
    assert!(exchange.request.upload);
    assert_eq!(exchange.request.tls.mode, TlsMode::StartTls);
    assert_eq!(
        String::from_utf8(exchange.uploaded.clone()).unwrap(),
        MAIL.replace('\n', "\r\n")
    );
}

#[test]
fn test_recipients_do_not_accumulate() {
    let (mut client, handle, _) = initialized();
    client
        .send_string("a@example.com", "b@example.com", "c@example.com", MAIL)
        .unwrap();
    client.send_string("a@example.com", "d@example.com", "", MAIL).unwrap();
    client.verify_address("e@example.com").unwrap();

    let exchanges = handle.exchanges();
    assert_eq!(exchanges[1].request.recipients, ["d@example.com"]);
    assert_eq!(exchanges[2].request.recipients, ["<e@example.com>"]);
    assert!(exchanges[2].request.mail_from.is_none());
}

#[test]
fn test_send_requires_envelope() {
    let (mut client, handle, lines) = initialized();
    assert!(client.send_string("", "b@example.com", "", MAIL).is_err());
    assert!(client.send_string("a@example.com", "", "", MAIL).is_err());
    assert!(client.send_file("a@example.com", "b@example.com", "", "").is_err());
    assert!(client.verify_address("").is_err());
    assert!(handle.exchanges().is_empty());
    assert_eq!(lines.lock().unwrap().len(), 4);
}

#[test]
fn test_send_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mail.eml");
    std::fs::write(&path, MAIL).unwrap();

    let (mut client, handle, _) = initialized();
    client
        .send_file("a@example.com", "b@example.com", "", &path)
        .unwrap();
    assert_eq!(handle.exchanges()[0].uploaded, MAIL.replace('\n', "\r\n").into_bytes());

    let err = client
        .send_file("a@example.com", "b@example.com", "", dir.path().join("missing.eml"))
        .unwrap_err();
    match err {
        Error::PreConfigure(cause) => assert!(matches!(*cause, Error::LocalFile { .. })),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(handle.exchanges().len(), 1);
}

#[test]
fn test_expand_mail_list() {
    let (mut client, handle, _) = initialized();
    client.expand_mail_list("Friends").unwrap();

    let request = handle.last_request().unwrap();
    assert_eq!(request.command.as_deref(), Some("EXPN"));
    assert_eq!(request.recipients, ["Friends"]);
    assert!(!request.upload);
}

#[test]
fn test_rejected_recipient() {
    let (mut client, handle, lines) = initialized();
    handle.push_reply(Reply::fail(55, "Failed sending data to the peer"));

    let err = client
        .send_string("a@example.com", "nobody@example.com", "", MAIL)
        .unwrap_err();
    assert!(matches!(&err, Error::Transport(e) if e.code == 55));
    assert!(lines.lock().unwrap()[0].starts_with("[SMTP][Error] Unable to perform a request"));
}

#[test]
fn test_cleanup_frees_last_request() {
    let (mut client, _, _) = initialized();
    client.verify_address("e@example.com").unwrap();
    assert_eq!(client.last_request().recipients.len(), 1);

    client.cleanup_session().unwrap();
    assert!(client.last_request().recipients.is_empty());
    assert!(client.cleanup_session().is_err());
}
