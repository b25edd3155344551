//! libcurl transport.
//!
//! Each [`CurlTransport`] owns one easy handle. The POP3, IMAP and SMTP
//! exchanges are libcurl's own; requests only select the URL, the custom
//! command and the transfer direction.

use std::io::{Read, Write};

use curl::easy::{Easy, InfoType, ReadError};

use super::{
    Backend, Channels, Progress, Request, TraceKind, Transport, TransportError, TransportLibrary,
};
use crate::config::TlsMode;

use self::raw::Recipients;

static CURL_LIBRARY: TransportLibrary = TransportLibrary::new("libcurl", init, teardown);

fn init() {
    curl::init();
}

// The curl crate keeps the global state until the process exits.
const fn teardown() {}

/// Backend opening libcurl easy handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlBackend;

impl CurlBackend {
    /// Creates the backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Backend for CurlBackend {
    type Transport = CurlTransport;

    fn library(&self) -> &'static TransportLibrary {
        &CURL_LIBRARY
    }

    fn open(&mut self) -> Result<CurlTransport, TransportError> {
        Ok(CurlTransport {
            easy: Easy::new(),
            recipients: None,
        })
    }
}

/// One libcurl easy handle.
pub struct CurlTransport {
    easy: Easy,
    // Referenced by the handle until the next configure.
    recipients: Option<Recipients>,
}

impl std::fmt::Debug for CurlTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurlTransport").finish_non_exhaustive()
    }
}

fn transport_error(e: &curl::Error) -> TransportError {
    let description = e
        .extra_description()
        .map_or_else(|| e.description().to_string(), |extra| format!("{} ({extra})", e.description()));
    TransportError::new(i32::try_from(e.code()).unwrap_or(i32::MAX), description)
}

const fn trace_kind(info: InfoType) -> TraceKind {
    match info {
        InfoType::HeaderIn => TraceKind::HeaderIn,
        InfoType::HeaderOut => TraceKind::HeaderOut,
        InfoType::DataIn => TraceKind::DataIn,
        InfoType::DataOut => TraceKind::DataOut,
        InfoType::SslDataIn => TraceKind::SslDataIn,
        InfoType::SslDataOut => TraceKind::SslDataOut,
        _ => TraceKind::Text,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bytes(value: f64) -> u64 {
    value as u64
}

impl CurlTransport {
    fn configure(&mut self, request: &Request) -> Result<(), curl::Error> {
        let Self { easy, recipients: kept } = self;
        easy.url(&request.url)?;
        if let Some(command) = &request.command {
            easy.custom_request(command)?;
        }
        easy.nobody(request.no_body)?;
        easy.upload(request.upload)?;

        if let Some(from) = &request.mail_from {
            raw::set_mail_from(easy, from)?;
        }
        let recipients = if request.recipients.is_empty() {
            None
        } else {
            Some(Recipients::new(&request.recipients)?)
        };
        raw::set_mail_rcpt(easy, recipients.as_ref())?;
        *kept = recipients;

        easy.username(&request.credentials.username)?;
        easy.password(&request.credentials.password)?;

        let tls = &request.tls;
        match tls.mode {
            TlsMode::StartTls => raw::require_tls(easy)?,
            // Implicit TLS comes from the secure URL scheme.
            TlsMode::None | TlsMode::Implicit => {}
        }
        if let Some(ca_file) = &tls.ca_file {
            easy.cainfo(ca_file)?;
        }
        if let Some(cert) = &tls.client_cert {
            easy.ssl_cert(cert)?;
        }
        if let Some(key) = &tls.client_key {
            easy.ssl_key(key)?;
        }
        if let Some(password) = &tls.key_password {
            easy.key_password(password)?;
        }
        easy.ssl_verify_peer(tls.verify_peer)?;
        easy.ssl_verify_host(tls.verify_host)?;

        easy.useragent(&request.user_agent)?;
        if let Some(timeout) = request.timeout {
            easy.timeout(timeout)?;
        }
        easy.signal(!request.no_signal)?;
        if let Some(proxy) = &request.proxy {
            easy.proxy(proxy)?;
            easy.http_proxy_tunnel(request.proxy_tunnel)?;
        }
        easy.progress(request.progress)?;
        easy.verbose(request.verbose)?;
        Ok(())
    }

    fn run(&mut self, request: &Request, channels: Channels<'_>) -> Result<(), curl::Error> {
        let Channels {
            mut download,
            upload,
            progress,
            trace,
        } = channels;
        let no_body = request.no_body;

        let mut transfer = self.easy.transfer();
        if no_body {
            // The status line is the only answer.
            transfer.write_function(|data| Ok(data.len()))?;
            if let Some(sink) = download {
                transfer.header_function(move |line| sink.write_all(line).is_ok())?;
            }
        } else {
            transfer.write_function(move |data| match download.as_deref_mut() {
                Some(sink) => Ok(sink.write_all(data).map_or(0, |()| data.len())),
                None => Ok(data.len()),
            })?;
        }
        if let Some(source) = upload {
            transfer.read_function(move |buf| source.read(buf).map_err(|_| ReadError::Abort))?;
        }
        if let Some(callback) = progress {
            transfer.progress_function(move |download_total, download_now, upload_total, upload_now| {
                callback(Progress {
                    download_total: bytes(download_total),
                    download_now: bytes(download_now),
                    upload_total: bytes(upload_total),
                    upload_now: bytes(upload_now),
                })
                .is_continue()
            })?;
        }
        if let Some(record) = trace {
            transfer.debug_function(move |info, data| record(trace_kind(info), data))?;
        }
        transfer.perform()
    }
}

impl Transport for CurlTransport {
    fn reset(&mut self) {
        self.easy.reset();
        self.recipients = None;
    }

    fn execute(&mut self, request: &Request, channels: Channels<'_>) -> Result<(), TransportError> {
        self.configure(request).map_err(|e| transport_error(&e))?;
        self.run(request, channels).map_err(|e| transport_error(&e))
    }
}

/// Mail options the `curl` crate does not wrap.
#[allow(unsafe_code)]
mod raw {
    use std::ffi::{CString, c_long};
    use std::ptr;

    use curl::easy::Easy;
    use curl_sys::{CURLOPTTYPE_LONG, CURLOPTTYPE_OBJECTPOINT, CURLcode, CURLoption, curl_slist};

    const CURLOPT_MAIL_FROM: CURLoption = CURLOPTTYPE_OBJECTPOINT + 186;
    const CURLOPT_MAIL_RCPT: CURLoption = CURLOPTTYPE_OBJECTPOINT + 187;
    const CURLOPT_USE_SSL: CURLoption = CURLOPTTYPE_LONG + 119;
    /// `CURLUSESSL_ALL`: the transfer fails unless TLS is negotiated.
    const CURLUSESSL_ALL: c_long = 3;

    fn check(code: CURLcode) -> Result<(), curl::Error> {
        if code == curl_sys::CURLE_OK {
            Ok(())
        } else {
            Err(curl::Error::new(code))
        }
    }

    fn c_string(value: &str) -> Result<CString, curl::Error> {
        CString::new(value).map_err(|_| curl::Error::new(curl_sys::CURLE_BAD_FUNCTION_ARGUMENT))
    }

    /// Owned `curl_slist` of envelope recipients.
    #[derive(Debug)]
    pub struct Recipients {
        head: *mut curl_slist,
        len: usize,
    }

    // The list is only touched through the transport that owns it.
    unsafe impl Send for Recipients {}

    impl Recipients {
        pub fn new(addresses: &[String]) -> Result<Self, curl::Error> {
            let mut list = Self {
                head: ptr::null_mut(),
                len: 0,
            };
            for address in addresses {
                let address = c_string(address)?;
                // libcurl copies the string.
                let head = unsafe { curl_sys::curl_slist_append(list.head, address.as_ptr()) };
                if head.is_null() {
                    return Err(curl::Error::new(curl_sys::CURLE_OUT_OF_MEMORY));
                }
                list.head = head;
                list.len += 1;
            }
            Ok(list)
        }

        pub const fn count(&self) -> usize {
            self.len
        }
    }

    impl Drop for Recipients {
        fn drop(&mut self) {
            if !self.head.is_null() {
                unsafe { curl_sys::curl_slist_free_all(self.head) };
            }
        }
    }

    pub fn set_mail_from(easy: &Easy, from: &str) -> Result<(), curl::Error> {
        let from = c_string(from)?;
        // String options are copied by libcurl.
        check(unsafe { curl_sys::curl_easy_setopt(easy.raw(), CURLOPT_MAIL_FROM, from.as_ptr()) })
    }

    /// The list must stay alive until the handle is reconfigured or reset.
    pub fn set_mail_rcpt(easy: &Easy, recipients: Option<&Recipients>) -> Result<(), curl::Error> {
        let head = recipients.map_or(ptr::null_mut(), |list| list.head);
        check(unsafe { curl_sys::curl_easy_setopt(easy.raw(), CURLOPT_MAIL_RCPT, head) })
    }

    pub fn require_tls(easy: &Easy) -> Result<(), curl::Error> {
        check(unsafe { curl_sys::curl_easy_setopt(easy.raw(), CURLOPT_USE_SSL, CURLUSESSL_ALL) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_kind_mapping() {
        assert_eq!(trace_kind(InfoType::Text), TraceKind::Text);
        assert_eq!(trace_kind(InfoType::HeaderOut), TraceKind::HeaderOut);
        assert_eq!(trace_kind(InfoType::SslDataIn), TraceKind::SslDataIn);
    }

    #[test]
    fn test_progress_bytes() {
        assert_eq!(bytes(1024.0), 1024);
        assert_eq!(bytes(-1.0), 0);
    }

    fn smtp_request() -> Request {
        let mut request = Request::new("smtp://mail.example.com:587");
        request.mail_from = Some("<a@example.com>".into());
        request.recipients = vec!["<b@example.com>".into(), "<c@example.com>".into()];
        request.upload = true;
        request.tls.mode = TlsMode::StartTls;
        request
    }

    #[test]
    fn test_configure_mail_envelope() {
        let mut transport = CurlBackend::new().open().unwrap();
        transport.configure(&smtp_request()).unwrap();
        assert_eq!(transport.recipients.as_ref().map(Recipients::count), Some(2));

        transport.reset();
        assert!(transport.recipients.is_none());
        transport.configure(&Request::new("pop3://mail.example.com/")).unwrap();
        assert!(transport.recipients.is_none());
    }

    #[test]
    fn test_configure_rejects_nul_in_address() {
        let mut transport = CurlBackend::new().open().unwrap();
        let mut request = smtp_request();
        request.mail_from = Some("a\0b@example.com".into());
        let err = transport.configure(&request).unwrap_err();
        assert_eq!(transport_error(&err).code, 43);
    }
}
