//! Streaming adapters between the transport and the caller's data.
//!
//! Downloads land in a [`BufferSink`] (caller string) or a [`FileSink`]
//! (local file). Uploads are produced by a [`LineSource`], which rewrites
//! every line terminator to CRLF as mail protocols require.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Appends downloaded bytes to a caller string.
///
/// Accepts every byte offered. UTF-8 sequences split across writes are
/// reassembled; invalid sequences are replaced with U+FFFD.
#[derive(Debug)]
pub struct BufferSink<'a> {
    target: &'a mut String,
    pending: Vec<u8>,
}

impl<'a> BufferSink<'a> {
    /// Creates a sink appending to `target`.
    pub fn new(target: &'a mut String) -> Self {
        Self {
            target,
            pending: Vec::new(),
        }
    }

    /// Flushes an incomplete trailing sequence, if any, lossily.
    pub fn finish(mut self) {
        self.drain_lossy();
    }

    fn drain_lossy(&mut self) {
        if !self.pending.is_empty() {
            self.target.push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
    }
}

impl Write for BufferSink<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(data);
        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                self.target.push_str(text);
                self.pending.clear();
            }
            // Incomplete sequence at the end: keep it for the next write.
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                let tail = self.pending.split_off(valid);
                self.drain_lossy();
                self.pending = tail;
            }
            Err(_) => self.drain_lossy(),
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes downloaded bytes to a local file.
///
/// Without an open file the bytes go to a diagnostic trace and are reported
/// as written.
#[derive(Debug, Default)]
pub struct FileSink {
    file: Option<File>,
}

impl FileSink {
    /// Creates (or truncates) the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocalFile`] if the file cannot be opened for writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::local_file(path, e))?;
        Ok(Self { file: Some(file) })
    }

    /// Returns true if a file is attached.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Flushes and closes the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Write for FileSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.write_all(data).map(|()| data.len()),
            None => {
                tracing::trace!(
                    len = data.len(),
                    data = %String::from_utf8_lossy(data),
                    "Discarding data without a local file"
                );
                Ok(data.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.as_mut().map_or(Ok(()), Write::flush)
    }
}

/// Produces upload data one line at a time, terminated by CRLF.
///
/// Each read is bounded by the buffer it is given; the rest of a long line
/// is returned by the following reads. A read of 0 bytes means the source is
/// exhausted.
#[derive(Debug)]
pub struct LineSource<R> {
    reader: R,
    line: Vec<u8>,
    offset: usize,
}

impl<R: BufRead> LineSource<R> {
    /// Wraps a buffered reader.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            offset: 0,
        }
    }

    /// Loads the next line into `self.line`. Returns false at end of data.
    fn next_line(&mut self) -> io::Result<bool> {
        self.line.clear();
        self.offset = 0;
        if self.reader.read_until(b'\n', &mut self.line)? == 0 {
            return Ok(false);
        }
        if self.line.last() == Some(&b'\n') {
            self.line.pop();
            if self.line.last() == Some(&b'\r') {
                self.line.pop();
            }
        }
        self.line.extend_from_slice(b"\r\n");
        Ok(true)
    }
}

impl LineSource<Cursor<Vec<u8>>> {
    /// Source reading from an in-memory text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(Cursor::new(text.into().into_bytes()))
    }
}

impl LineSource<BufReader<File>> {
    /// Source reading from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocalFile`] if the file cannot be opened for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::local_file(path, e))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Read for LineSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.offset >= self.line.len() && !self.next_line()? {
            return Ok(0);
        }
        let remaining = &self.line[self.offset..];
        let len = remaining.len().min(buf.len());
        buf[..len].copy_from_slice(&remaining[..len]);
        self.offset += len;
        Ok(len)
    }
}

/// Destination of a download operation.
#[derive(Debug)]
pub enum Download<'a> {
    /// Caller string.
    Buffer(BufferSink<'a>),
    /// Local file.
    File(FileSink),
}

impl<'a> Download<'a> {
    /// Download into `target`.
    pub fn buffer(target: &'a mut String) -> Self {
        Self::Buffer(BufferSink::new(target))
    }

    /// Download into the file at `path`, created or truncated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocalFile`] if the file cannot be opened.
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        FileSink::create(path).map(Self::File)
    }

    /// Completes the download: flushes the buffer or closes the file.
    ///
    /// # Errors
    ///
    /// Returns an error if closing the file fails.
    pub fn finish(self) -> io::Result<()> {
        match self {
            Self::Buffer(sink) => {
                sink.finish();
                Ok(())
            }
            Self::File(mut sink) => sink.close(),
        }
    }
}

impl Write for Download<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self {
            Self::Buffer(sink) => sink.write(data),
            Self::File(sink) => sink.write(data),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Buffer(sink) => sink.flush(),
            Self::File(sink) => sink.flush(),
        }
    }
}

/// Payload of an upload operation.
#[derive(Debug)]
pub enum Upload {
    /// In-memory text.
    Text(LineSource<Cursor<Vec<u8>>>),
    /// Local file.
    File(LineSource<BufReader<File>>),
}

impl Upload {
    /// Upload `text`.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(LineSource::from_text(text))
    }

    /// Upload the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocalFile`] if the file cannot be opened.
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        LineSource::open(path).map(Self::File)
    }
}

impl Read for Upload {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Text(source) => source.read(buf),
            Self::File(source) => source.read(buf),
        }
    }
}

/// Where an operation delivers downloaded data, before it is opened.
#[derive(Debug)]
pub enum Destination<'a> {
    /// Caller string, appended to.
    Buffer(&'a mut String),
    /// Local file, created or truncated when the operation starts.
    File(PathBuf),
}

impl<'a> Destination<'a> {
    /// Opens the destination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocalFile`] if the file cannot be opened.
    pub fn open(self) -> Result<Download<'a>> {
        match self {
            Self::Buffer(target) => Ok(Download::buffer(target)),
            Self::File(path) => Download::file(path),
        }
    }
}

/// Payload of an operation, before it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// In-memory text.
    Text(String),
    /// Local file.
    File(PathBuf),
}

impl Source {
    /// Opens the payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocalFile`] if the file cannot be opened.
    pub fn open(self) -> Result<Upload> {
        match self {
            Self::Text(text) => Ok(Upload::text(text)),
            Self::File(path) => Upload::file(path),
        }
    }
}
