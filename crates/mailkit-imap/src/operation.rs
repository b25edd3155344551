//! IMAP operation descriptors.

use std::io;

use mailkit_core::transport::FollowUp;
use mailkit_core::{
    Channels, Destination, Download, Error, Operation, Protocol, Request, Result, Source,
    TransportError, Upload,
};

use crate::Imap;
use crate::types::{MailProperty, SearchOption};

/// Mailbox targeted by message-level commands.
pub const INBOX: &str = "INBOX";

/// IMAP operations with their arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImapCommand {
    /// LIST of the root, or of `folder` when not empty.
    List {
        /// Folder suffix.
        folder: String,
    },
    /// LSUB of every subscribed folder.
    ListSubscribed,
    /// APPEND of a message to `target`.
    Append {
        /// Mailbox (and optional URL parameters) receiving the message.
        target: String,
    },
    /// FETCH of the INBOX message `uid`.
    Fetch {
        /// Message UID.
        uid: String,
    },
    /// DELETE of a folder.
    DeleteFolder {
        /// Folder name.
        folder: String,
    },
    /// NOOP.
    Noop,
    /// COPY of an INBOX message into `folder`.
    Copy {
        /// Message UID.
        uid: String,
        /// Destination folder.
        folder: String,
    },
    /// CREATE of a folder.
    Create {
        /// Folder name.
        folder: String,
    },
    /// STORE of a flag on an INBOX message.
    Store {
        /// Message UID.
        uid: String,
        /// Flag to add.
        property: MailProperty,
    },
    /// SEARCH of the INBOX.
    Search(SearchOption),
    /// EXAMINE of a folder.
    Examine {
        /// Folder name.
        folder: String,
    },
}

fn require(value: &str, name: &'static str) -> Result<()> {
    if value.is_empty() {
        Err(Error::MissingParameter(name))
    } else {
        Ok(())
    }
}

impl ImapCommand {
    const fn needs_output(&self) -> bool {
        matches!(
            self,
            Self::List { .. }
                | Self::ListSubscribed
                | Self::Fetch { .. }
                | Self::Search(_)
                | Self::Examine { .. }
        )
    }

    /// Checks the arguments and writes the target and command into `request`.
    fn configure(&self, request: &mut Request) -> Result<()> {
        match self {
            Self::List { folder } => request.url.push_str(folder),
            Self::ListSubscribed => request.set_command("LSUB \"\" *"),
            Self::Append { target } => {
                require(target, "target mailbox")?;
                request.url.push_str(target);
                request.upload = true;
            }
            Self::Fetch { uid } => {
                require(uid, "message UID")?;
                request.url.push_str(&format!("{INBOX}/;UID={uid}"));
            }
            Self::DeleteFolder { folder } => {
                require(folder, "folder name")?;
                request.set_command(format!("DELETE {folder}"));
                request.no_body = true;
            }
            Self::Noop => {
                request.set_command("NOOP");
                request.no_body = true;
            }
            Self::Copy { uid, folder } => {
                require(uid, "message UID")?;
                require(folder, "folder name")?;
                request.url.push_str(INBOX);
                request.set_command(format!("COPY {uid} {folder}"));
                request.no_body = true;
            }
            Self::Create { folder } => {
                require(folder, "folder name")?;
                request.set_command(format!("CREATE {folder}"));
                request.no_body = true;
            }
            Self::Store { uid, property } => {
                require(uid, "message UID")?;
                request.url.push_str(INBOX);
                request.set_command(format!("STORE {uid} +Flags {property}"));
                request.no_body = true;
            }
            Self::Search(option) => {
                request.url.push_str(INBOX);
                request.set_command(format!("SEARCH {option}"));
            }
            Self::Examine { folder } => {
                require(folder, "folder name")?;
                request.set_command(format!("EXAMINE {folder}"));
            }
        }
        Ok(())
    }
}

/// One IMAP operation: command, output and payload.
#[derive(Debug)]
pub struct ImapOperation<'a> {
    command: ImapCommand,
    destination: Option<Destination<'a>>,
    source: Option<Source>,
    download: Option<Download<'a>>,
    upload: Option<Upload>,
}

impl<'a> ImapOperation<'a> {
    /// Creates an operation without output or payload.
    #[must_use]
    pub const fn new(command: ImapCommand) -> Self {
        Self {
            command,
            destination: None,
            source: None,
            download: None,
            upload: None,
        }
    }

    /// Delivers the server's answer to `destination`.
    #[must_use]
    pub fn with_destination(mut self, destination: Destination<'a>) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Uploads `source` as the message.
    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// The operation's command.
    #[must_use]
    pub const fn command(&self) -> &ImapCommand {
        &self.command
    }

    /// A failed STORE may leave the mailbox in need of an EXPUNGE; the
    /// follow-up is best effort and only logged.
    fn expunge_after_store(follow_up: &mut FollowUp<'_>) {
        if let Err(e) = follow_up.execute_command("EXPUNGE") {
            let error = Error::Transport(e);
            tracing::warn!(protocol = Imap::NAME, error = %error, "EXPUNGE after STORE failed");
            follow_up.log(&format!("[{}][Error] {error}", Imap::NAME));
        }
    }
}

impl Operation for ImapOperation<'_> {
    fn pre_configure(&mut self, request: &mut Request) -> Result<()> {
        self.command.configure(request)?;
        if self.command.needs_output() && self.destination.is_none() {
            return Err(Error::MissingParameter("output"));
        }
        if let Some(destination) = self.destination.take() {
            self.download = Some(destination.open()?);
        }
        if let Some(source) = self.source.take() {
            self.upload = Some(source.open()?);
        }
        Ok(())
    }

    fn channels(&mut self) -> Channels<'_> {
        Channels {
            download: self.download.as_mut().map(|sink| sink as &mut dyn io::Write),
            upload: self.upload.as_mut().map(|source| source as &mut dyn io::Read),
            ..Channels::default()
        }
    }

    fn post_configure(
        &mut self,
        outcome: &std::result::Result<(), TransportError>,
        mut follow_up: FollowUp<'_>,
    ) -> Result<()> {
        self.upload = None;
        if matches!(self.command, ImapCommand::Store { .. }) && outcome.is_err() {
            Self::expunge_after_store(&mut follow_up);
        }
        if let Some(download) = self.download.take() {
            download.finish()?;
        }
        Ok(())
    }
}
