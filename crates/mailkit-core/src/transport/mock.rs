//! In-memory transport that records requests and replays scripted replies.
//!
//! ```ignore
//! let backend = MockBackend::new();
//! let handle = backend.handle();
//! handle.push_reply(Reply::ok("1 120\r\n2 340\r\n"));
//! // ... run a client on `backend` ...
//! assert_eq!(handle.exchanges().len(), 1);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    Backend, Channels, Progress, Request, TraceKind, Transport, TransportError, TransportLibrary,
};

/// Size of the buffer offered to the upload channel on each read.
pub const UPLOAD_CHUNK: usize = 16;

const READ_ERROR: i32 = 26;
const WRITE_ERROR: i32 = 23;

static MOCK_LIBRARY: TransportLibrary = TransportLibrary::new("mock", nothing, nothing);

const fn nothing() {}

/// Scripted answer to the next executed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Bytes written to the download channel.
    pub body: Vec<u8>,
    /// Result of the exchange.
    pub outcome: Result<(), TransportError>,
}

impl Reply {
    /// Successful exchange returning `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            outcome: Ok(()),
        }
    }

    /// Failed exchange.
    pub fn fail(code: i32, description: impl Into<String>) -> Self {
        Self {
            body: Vec::new(),
            outcome: Err(TransportError::new(code, description)),
        }
    }
}

impl Default for Reply {
    fn default() -> Self {
        Self::ok(Vec::new())
    }
}

/// One executed request as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// The request, with every option the session set.
    pub request: Request,
    /// Everything read from the upload channel.
    pub uploaded: Vec<u8>,
    /// Number of reads issued on the upload channel, the final empty one
    /// included.
    pub upload_reads: usize,
}

#[derive(Debug, Default)]
struct MockState {
    opened: usize,
    live: usize,
    resets: usize,
    exchanges: Vec<Exchange>,
    replies: VecDeque<Reply>,
    open_failure: Option<TransportError>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Backend producing [`MockTransport`] handles that share one recorder.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    library: &'static TransportLibrary,
}

impl MockBackend {
    /// Creates a backend using the mock library.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            library: &MOCK_LIBRARY,
        }
    }

    /// Uses `library` as the process-wide library.
    #[must_use]
    pub const fn with_library(mut self, library: &'static TransportLibrary) -> Self {
        self.library = library;
        self
    }

    /// Makes every `open` fail with `error`.
    #[must_use]
    pub fn failing_open(self, error: TransportError) -> Self {
        lock(&self.state).open_failure = Some(error);
        self
    }

    /// Returns a handle for scripting replies and inspecting exchanges.
    #[must_use]
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBackend")
            .field("library", &self.library.name())
            .finish_non_exhaustive()
    }
}

impl Backend for MockBackend {
    type Transport = MockTransport;

    fn library(&self) -> &'static TransportLibrary {
        self.library
    }

    fn open(&mut self) -> Result<MockTransport, TransportError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.open_failure.clone() {
            return Err(error);
        }
        state.opened += 1;
        state.live += 1;
        drop(state);
        Ok(MockTransport {
            state: Arc::clone(&self.state),
        })
    }
}

/// Inspection side of a [`MockBackend`].
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// Queues the reply for the next executed request. Requests without a
    /// queued reply succeed with an empty body.
    pub fn push_reply(&self, reply: Reply) {
        lock(&self.state).replies.push_back(reply);
    }

    /// Every exchange executed so far, oldest first.
    #[must_use]
    pub fn exchanges(&self) -> Vec<Exchange> {
        lock(&self.state).exchanges.clone()
    }

    /// The most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<Request> {
        lock(&self.state)
            .exchanges
            .last()
            .map(|exchange| exchange.request.clone())
    }

    /// Number of handles opened.
    #[must_use]
    pub fn opened(&self) -> usize {
        lock(&self.state).opened
    }

    /// Number of handles currently alive.
    #[must_use]
    pub fn live(&self) -> usize {
        lock(&self.state).live
    }

    /// Number of `reset` calls.
    #[must_use]
    pub fn resets(&self) -> usize {
        lock(&self.state).resets
    }
}

/// Transport handle of a [`MockBackend`].
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    fn transfer(
        reply: &Reply,
        request: &Request,
        channels: &mut Channels<'_>,
        exchange: &mut Exchange,
    ) -> Result<(), TransportError> {
        if let Some(command) = &request.command {
            channels.report_trace(TraceKind::HeaderOut, command.as_bytes());
        }

        if request.upload
            && let Some(source) = channels.upload.as_deref_mut()
        {
            let mut chunk = [0u8; UPLOAD_CHUNK];
            loop {
                let n = source.read(&mut chunk).map_err(|e| {
                    TransportError::new(READ_ERROR, format!("Failed to read upload data: {e}"))
                })?;
                exchange.upload_reads += 1;
                if n == 0 {
                    break;
                }
                exchange.uploaded.extend_from_slice(&chunk[..n]);
            }
            channels.report_trace(TraceKind::DataOut, &exchange.uploaded);
        }

        reply.outcome.clone()?;

        if !reply.body.is_empty() {
            if let Some(sink) = channels.download.as_deref_mut() {
                sink.write_all(&reply.body).map_err(|e| {
                    TransportError::new(WRITE_ERROR, format!("Failure writing output to destination: {e}"))
                })?;
            }
            channels.report_trace(TraceKind::DataIn, &reply.body);
        }

        if request.progress {
            let downloaded = u64::try_from(reply.body.len()).unwrap_or(u64::MAX);
            let uploaded = u64::try_from(exchange.uploaded.len()).unwrap_or(u64::MAX);
            let progress = Progress {
                download_total: downloaded,
                download_now: downloaded,
                upload_total: uploaded,
                upload_now: uploaded,
            };
            if channels.report_progress(progress).is_break() {
                return Err(TransportError::aborted_by_callback());
            }
        }
        Ok(())
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport").finish_non_exhaustive()
    }
}

impl Transport for MockTransport {
    fn reset(&mut self) {
        lock(&self.state).resets += 1;
    }

    fn execute(&mut self, request: &Request, mut channels: Channels<'_>) -> Result<(), TransportError> {
        let reply = lock(&self.state).replies.pop_front().unwrap_or_default();
        let mut exchange = Exchange {
            request: request.clone(),
            uploaded: Vec::new(),
            upload_reads: 0,
        };
        let outcome = Self::transfer(&reply, request, &mut channels, &mut exchange);
        lock(&self.state).exchanges.push(exchange);
        outcome
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.live = state.live.saturating_sub(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_replays_replies_in_order() {
        let mut backend = MockBackend::new();
        let handle = backend.handle();
        handle.push_reply(Reply::ok("first"));
        handle.push_reply(Reply::fail(7, "Couldn't connect to server"));

        let mut transport = backend.open().unwrap();
        let mut out = Vec::new();
        transport
            .execute(
                &Request::new("pop3://a/"),
                Channels {
                    download: Some(&mut out),
                    ..Channels::default()
                },
            )
            .unwrap();
        assert_eq!(out, b"first");

        let err = transport
            .execute(&Request::new("pop3://a/"), Channels::default())
            .unwrap_err();
        assert_eq!(err.code, 7);

        // queue exhausted: empty success
        transport
            .execute(&Request::new("pop3://a/"), Channels::default())
            .unwrap();
        assert_eq!(handle.exchanges().len(), 3);
    }

    #[test]
    fn test_upload_is_read_in_chunks() {
        let mut backend = MockBackend::new();
        let handle = backend.handle();
        let mut transport = backend.open().unwrap();

        let mut request = Request::new("smtp://a");
        request.upload = true;
        let mut source = Cursor::new(vec![b'x'; UPLOAD_CHUNK + 1]);
        transport
            .execute(
                &request,
                Channels {
                    upload: Some(&mut source),
                    ..Channels::default()
                },
            )
            .unwrap();

        let exchange = &handle.exchanges()[0];
        assert_eq!(exchange.uploaded.len(), UPLOAD_CHUNK + 1);
        assert_eq!(exchange.upload_reads, 3);
    }

    #[test]
    fn test_progress_break_aborts() {
        let mut backend = MockBackend::new();
        backend.handle().push_reply(Reply::ok("data"));
        let mut transport = backend.open().unwrap();

        let mut request = Request::new("imap://a/");
        request.progress = true;
        let mut cancel = |_: Progress| -> std::ops::ControlFlow<()> { std::ops::ControlFlow::Break(()) };
        let err = transport
            .execute(
                &request,
                Channels {
                    progress: Some(&mut cancel),
                    ..Channels::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, TransportError::aborted_by_callback());
    }

    #[test]
    fn test_open_failure_and_live_count() {
        let mut backend = MockBackend::new();
        let handle = backend.handle();
        let transport = backend.open().unwrap();
        assert_eq!(handle.live(), 1);
        drop(transport);
        assert_eq!(handle.live(), 0);
        assert_eq!(handle.opened(), 1);

        let mut failing = MockBackend::new().failing_open(TransportError::new(2, "Failed initialization"));
        assert!(failing.open().is_err());
    }
}
