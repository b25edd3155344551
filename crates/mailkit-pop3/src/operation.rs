//! POP3 operation descriptors.

use std::io;

use mailkit_core::transport::FollowUp;
use mailkit_core::{Channels, Destination, Download, Error, Operation, Request, Result, TransportError};

/// POP3 operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pop3Command {
    /// LIST: message numbers and sizes.
    List,
    /// UIDL: message numbers and unique ids.
    Uidl,
    /// RETR of one message.
    Retrieve,
    /// TOP with zero body lines: headers of one message.
    Top,
    /// DELE of one message.
    Delete,
    /// NOOP.
    Noop,
    /// STAT: message count and mailbox size.
    Stat,
}

impl Pop3Command {
    const fn needs_message(self) -> bool {
        matches!(self, Self::Retrieve | Self::Top | Self::Delete)
    }

    const fn needs_output(self) -> bool {
        !matches!(self, Self::Delete | Self::Noop)
    }
}

/// One POP3 operation: command, message number and output.
#[derive(Debug)]
pub struct Pop3Operation<'a> {
    command: Pop3Command,
    message: String,
    destination: Option<Destination<'a>>,
    download: Option<Download<'a>>,
}

impl<'a> Pop3Operation<'a> {
    /// Creates an operation without output.
    #[must_use]
    pub fn new(command: Pop3Command, message: impl Into<String>) -> Self {
        Self {
            command,
            message: message.into(),
            destination: None,
            download: None,
        }
    }

    /// Delivers the server's answer to `destination`.
    #[must_use]
    pub fn with_destination(mut self, destination: Destination<'a>) -> Self {
        self.destination = Some(destination);
        self
    }

    /// The operation's command.
    #[must_use]
    pub const fn command(&self) -> Pop3Command {
        self.command
    }
}

impl Operation for Pop3Operation<'_> {
    fn pre_configure(&mut self, request: &mut Request) -> Result<()> {
        if self.command.needs_message() && self.message.is_empty() {
            return Err(Error::MissingParameter("message number"));
        }
        if self.command.needs_output() && self.destination.is_none() {
            return Err(Error::MissingParameter("output"));
        }

        match self.command {
            Pop3Command::List => {}
            Pop3Command::Uidl => request.set_command("UIDL"),
            Pop3Command::Retrieve => request.url.push_str(&self.message),
            Pop3Command::Top => request.set_command(format!("TOP {} 0", self.message)),
            Pop3Command::Delete => {
                request.set_command(format!("DELE {}", self.message));
                request.no_body = true;
            }
            Pop3Command::Noop => {
                request.set_command("NOOP");
                request.no_body = true;
            }
            Pop3Command::Stat => {
                request.set_command("STAT");
                request.no_body = true;
            }
        }

        if let Some(destination) = self.destination.take() {
            self.download = Some(destination.open()?);
        }
        Ok(())
    }

    fn channels(&mut self) -> Channels<'_> {
        Channels {
            download: self.download.as_mut().map(|sink| sink as &mut dyn io::Write),
            ..Channels::default()
        }
    }

    fn post_configure(
        &mut self,
        _outcome: &std::result::Result<(), TransportError>,
        _follow_up: FollowUp<'_>,
    ) -> Result<()> {
        if let Some(download) = self.download.take() {
            download.finish()?;
        }
        Ok(())
    }
}
