//! SMTP client.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use mailkit_core::{Backend, Logger, Result, Session, Source};

use crate::Smtp;
use crate::operation::{SmtpCommand, SmtpOperation};

/// SMTP client over a transport backend.
///
/// The envelope recipients are rebuilt for every call. Session management
/// is reached through `Deref` to the underlying [`Session`].
#[derive(Debug)]
pub struct SmtpClient<B: Backend> {
    session: Session<Smtp, B>,
}

impl<B: Backend> SmtpClient<B> {
    /// Creates an uninitialized client.
    pub fn new(backend: B, logger: impl Into<Logger>) -> Self {
        Self {
            session: Session::new(backend, logger),
        }
    }

    /// Sends `body` (headers and content) from `from` to `to` and, when not
    /// empty, `cc`. Lines are sent with CRLF terminators.
    ///
    /// # Errors
    ///
    /// Fails when `from` or `to` is empty, the session is not initialized or
    /// the server refuses the message.
    pub fn send_string(&mut self, from: &str, to: &str, cc: &str, body: &str) -> Result<()> {
        self.run(SmtpOperation::new(send(from, to, cc)).with_source(Source::Text(body.to_string())))
    }

    /// Sends the message stored at `path`.
    ///
    /// # Errors
    ///
    /// Fails when `path`, `from` or `to` is empty, the file cannot be opened,
    /// the session is not initialized or the server refuses the message.
    pub fn send_file(&mut self, from: &str, to: &str, cc: &str, path: impl AsRef<Path>) -> Result<()> {
        self.run(
            SmtpOperation::new(send(from, to, cc)).with_source(Source::File(path.as_ref().to_path_buf())),
        )
    }

    /// Asks the server to verify `address` (VRFY).
    ///
    /// # Errors
    ///
    /// Fails when `address` is empty, the session is not initialized or the
    /// server rejects the address.
    pub fn verify_address(&mut self, address: &str) -> Result<()> {
        self.run(SmtpOperation::new(SmtpCommand::Verify {
            address: address.to_string(),
        }))
    }

    /// Asks the server to expand the mailing list `list` (EXPN).
    ///
    /// # Errors
    ///
    /// Fails when the session is not initialized or the server refuses.
    pub fn expand_mail_list(&mut self, list: &str) -> Result<()> {
        self.run(SmtpOperation::new(SmtpCommand::Expand {
            list: list.to_string(),
        }))
    }

    fn run(&mut self, mut operation: SmtpOperation) -> Result<()> {
        self.session.perform(&mut operation)
    }
}

fn send(from: &str, to: &str, cc: &str) -> SmtpCommand {
    SmtpCommand::Send {
        from: from.to_string(),
        to: to.to_string(),
        cc: cc.to_string(),
    }
}

impl<B: Backend> Deref for SmtpClient<B> {
    type Target = Session<Smtp, B>;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<B: Backend> DerefMut for SmtpClient<B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}
