//! POP3 client.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use mailkit_core::{Backend, Destination, Logger, Result, Session};

use crate::Pop3;
use crate::operation::{Pop3Command, Pop3Operation};

/// POP3 client over a transport backend.
///
/// Session management (`init_session`, `cleanup_session`, proxy, timeout,
/// TLS files, progress callback) is reached through `Deref` to the
/// underlying [`Session`].
#[derive(Debug)]
pub struct Pop3Client<B: Backend> {
    session: Session<Pop3, B>,
}

impl<B: Backend> Pop3Client<B> {
    /// Creates an uninitialized client.
    pub fn new(backend: B, logger: impl Into<Logger>) -> Self {
        Self {
            session: Session::new(backend, logger),
        }
    }

    /// Appends the message listing (`<number> <size>` lines) to `out`.
    ///
    /// # Errors
    ///
    /// Fails when the session is not initialized or the transfer fails.
    pub fn list(&mut self, out: &mut String) -> Result<()> {
        self.run(Pop3Operation::new(Pop3Command::List, "").with_destination(Destination::Buffer(out)))
    }

    /// Appends the unique-id listing (`<number> <uid>` lines) to `out`.
    ///
    /// # Errors
    ///
    /// Fails when the session is not initialized or the transfer fails.
    pub fn list_uidl(&mut self, out: &mut String) -> Result<()> {
        self.run(Pop3Operation::new(Pop3Command::Uidl, "").with_destination(Destination::Buffer(out)))
    }

    /// Appends message `message` to `out`.
    ///
    /// # Errors
    ///
    /// Fails when `message` is empty, the session is not initialized or the
    /// transfer fails.
    pub fn get_string(&mut self, message: &str, out: &mut String) -> Result<()> {
        self.run(
            Pop3Operation::new(Pop3Command::Retrieve, message).with_destination(Destination::Buffer(out)),
        )
    }

    /// Saves message `message` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Fails when `message` is empty, `path` cannot be created, the session
    /// is not initialized or the transfer fails.
    pub fn get_file(&mut self, message: &str, path: impl AsRef<Path>) -> Result<()> {
        self.run(
            Pop3Operation::new(Pop3Command::Retrieve, message)
                .with_destination(Destination::File(path.as_ref().to_path_buf())),
        )
    }

    /// Appends the headers of message `message` to `out`.
    ///
    /// # Errors
    ///
    /// Fails when `message` is empty, the session is not initialized or the
    /// transfer fails.
    pub fn get_headers(&mut self, message: &str, out: &mut String) -> Result<()> {
        self.run(Pop3Operation::new(Pop3Command::Top, message).with_destination(Destination::Buffer(out)))
    }

    /// Marks message `message` as deleted.
    ///
    /// # Errors
    ///
    /// Fails when `message` is empty, the session is not initialized or the
    /// server refuses.
    pub fn delete(&mut self, message: &str) -> Result<()> {
        self.run(Pop3Operation::new(Pop3Command::Delete, message))
    }

    /// Keeps the connection alive.
    ///
    /// # Errors
    ///
    /// Fails when the session is not initialized or the server refuses.
    pub fn noop(&mut self) -> Result<()> {
        self.run(Pop3Operation::new(Pop3Command::Noop, ""))
    }

    /// Appends the STAT status line (message count and size) to `out`.
    ///
    /// # Errors
    ///
    /// Fails when the session is not initialized or the server refuses.
    pub fn stat(&mut self, out: &mut String) -> Result<()> {
        self.run(Pop3Operation::new(Pop3Command::Stat, "").with_destination(Destination::Buffer(out)))
    }

    fn run(&mut self, mut operation: Pop3Operation<'_>) -> Result<()> {
        self.session.perform(&mut operation)
    }
}

impl<B: Backend> Deref for Pop3Client<B> {
    type Target = Session<Pop3, B>;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<B: Backend> DerefMut for Pop3Client<B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}
