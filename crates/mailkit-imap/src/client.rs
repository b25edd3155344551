//! IMAP client.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use mailkit_core::{Backend, Destination, Logger, Result, Session, Source};

use crate::Imap;
use crate::operation::{ImapCommand, ImapOperation};
use crate::types::{MailProperty, SearchOption};

/// IMAP client over a transport backend.
///
/// Message-level commands (fetch, copy, store, search) act on the `INBOX`.
/// Session management is reached through `Deref` to the underlying
/// [`Session`].
#[derive(Debug)]
pub struct ImapClient<B: Backend> {
    session: Session<Imap, B>,
}

impl<B: Backend> ImapClient<B> {
    /// Creates an uninitialized client.
    pub fn new(backend: B, logger: impl Into<Logger>) -> Self {
        Self {
            session: Session::new(backend, logger),
        }
    }

    /// Appends the folder listing of the root, or of `folder` when not
    /// empty, to `out`.
    ///
    /// # Errors
    ///
    /// Fails when the session is not initialized or the transfer fails.
    pub fn list(&mut self, out: &mut String, folder: &str) -> Result<()> {
        self.run(
            ImapOperation::new(ImapCommand::List {
                folder: folder.to_string(),
            })
            .with_destination(Destination::Buffer(out)),
        )
    }

    /// Appends the subscribed folders to `out`.
    ///
    /// # Errors
    ///
    /// Fails when the session is not initialized or the transfer fails.
    pub fn list_sub_folders(&mut self, out: &mut String) -> Result<()> {
        self.run(ImapOperation::new(ImapCommand::ListSubscribed).with_destination(Destination::Buffer(out)))
    }

    /// Appends `mail` to the mailbox `target` (e.g. `Sent`). Lines are sent
    /// with CRLF terminators.
    ///
    /// # Errors
    ///
    /// Fails when `target` is empty, the session is not initialized or the
    /// transfer fails.
    pub fn send_string(&mut self, target: &str, mail: &str) -> Result<()> {
        self.run(
            ImapOperation::new(ImapCommand::Append {
                target: target.to_string(),
            })
            .with_source(Source::Text(mail.to_string())),
        )
    }

    /// Appends the message stored at `path` to the mailbox `target`.
    ///
    /// # Errors
    ///
    /// Fails when `target` is empty, `path` cannot be opened, the session is
    /// not initialized or the transfer fails.
    pub fn send_file(&mut self, target: &str, path: impl AsRef<Path>) -> Result<()> {
        self.run(
            ImapOperation::new(ImapCommand::Append {
                target: target.to_string(),
            })
            .with_source(Source::File(path.as_ref().to_path_buf())),
        )
    }

    /// Appends the INBOX message `uid` to `out`.
    ///
    /// # Errors
    ///
    /// Fails when `uid` is empty, the session is not initialized or the
    /// transfer fails.
    pub fn get_string(&mut self, uid: &str, out: &mut String) -> Result<()> {
        self.run(
            ImapOperation::new(ImapCommand::Fetch { uid: uid.to_string() })
                .with_destination(Destination::Buffer(out)),
        )
    }

    /// Saves the INBOX message `uid` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Fails when `uid` is empty, `path` cannot be created, the session is
    /// not initialized or the transfer fails.
    pub fn get_file(&mut self, uid: &str, path: impl AsRef<Path>) -> Result<()> {
        self.run(
            ImapOperation::new(ImapCommand::Fetch { uid: uid.to_string() })
                .with_destination(Destination::File(path.as_ref().to_path_buf())),
        )
    }

    /// Deletes `folder`.
    ///
    /// # Errors
    ///
    /// Fails when `folder` is empty, the session is not initialized or the
    /// server refuses.
    pub fn delete_folder(&mut self, folder: &str) -> Result<()> {
        self.run(ImapOperation::new(ImapCommand::DeleteFolder {
            folder: folder.to_string(),
        }))
    }

    /// Keeps the connection alive.
    ///
    /// # Errors
    ///
    /// Fails when the session is not initialized or the server refuses.
    pub fn noop(&mut self) -> Result<()> {
        self.run(ImapOperation::new(ImapCommand::Noop))
    }

    /// Copies the INBOX message `uid` into `folder`.
    ///
    /// # Errors
    ///
    /// Fails when an argument is empty, the session is not initialized or
    /// the server refuses.
    pub fn copy_mail(&mut self, uid: &str, folder: &str) -> Result<()> {
        self.run(ImapOperation::new(ImapCommand::Copy {
            uid: uid.to_string(),
            folder: folder.to_string(),
        }))
    }

    /// Creates `folder`.
    ///
    /// # Errors
    ///
    /// Fails when `folder` is empty, the session is not initialized or the
    /// server refuses.
    pub fn create_folder(&mut self, folder: &str) -> Result<()> {
        self.run(ImapOperation::new(ImapCommand::Create {
            folder: folder.to_string(),
        }))
    }

    /// Adds `property` to the flags of the INBOX message `uid`.
    ///
    /// When the STORE fails, an EXPUNGE is attempted on the same connection;
    /// its own failure is only logged.
    ///
    /// # Errors
    ///
    /// Fails when `uid` is empty, the session is not initialized or the
    /// STORE fails.
    pub fn set_mail_property(&mut self, uid: &str, property: MailProperty) -> Result<()> {
        self.run(ImapOperation::new(ImapCommand::Store {
            uid: uid.to_string(),
            property,
        }))
    }

    /// Appends the UIDs of the INBOX messages matching `option` to `out`.
    ///
    /// # Errors
    ///
    /// Fails when the session is not initialized or the transfer fails.
    pub fn search(&mut self, out: &mut String, option: SearchOption) -> Result<()> {
        self.run(ImapOperation::new(ImapCommand::Search(option)).with_destination(Destination::Buffer(out)))
    }

    /// Appends the EXAMINE answer for `folder` (counts, flags, UID validity)
    /// to `out`.
    ///
    /// # Errors
    ///
    /// Fails when `folder` is empty, the session is not initialized or the
    /// transfer fails.
    pub fn info_folder(&mut self, folder: &str, out: &mut String) -> Result<()> {
        self.run(
            ImapOperation::new(ImapCommand::Examine {
                folder: folder.to_string(),
            })
            .with_destination(Destination::Buffer(out)),
        )
    }

    fn run(&mut self, mut operation: ImapOperation<'_>) -> Result<()> {
        self.session.perform(&mut operation)
    }
}

impl<B: Backend> Deref for ImapClient<B> {
    type Target = Session<Imap, B>;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<B: Backend> DerefMut for ImapClient<B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}
