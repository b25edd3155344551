//! SMTP operation descriptors.

use std::io;

use mailkit_core::transport::FollowUp;
use mailkit_core::{Channels, Error, Operation, Request, Result, Source, TransportError, Upload};

use crate::address::{bracketed, recipients};

/// SMTP operations with their arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpCommand {
    /// Sends the payload from `from` to `to` (and `cc` when not empty).
    Send {
        /// Envelope sender.
        from: String,
        /// Main recipient.
        to: String,
        /// Carbon-copy recipient, may be empty.
        cc: String,
    },
    /// VRFY of an address.
    Verify {
        /// Address to verify.
        address: String,
    },
    /// EXPN of a mailing list.
    Expand {
        /// List name.
        list: String,
    },
}

/// One SMTP operation: command and payload.
#[derive(Debug)]
pub struct SmtpOperation {
    command: SmtpCommand,
    source: Option<Source>,
    upload: Option<Upload>,
}

impl SmtpOperation {
    /// Creates an operation without payload.
    #[must_use]
    pub const fn new(command: SmtpCommand) -> Self {
        Self {
            command,
            source: None,
            upload: None,
        }
    }

    /// Sends `source` as the message.
    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// The operation's command.
    #[must_use]
    pub const fn command(&self) -> &SmtpCommand {
        &self.command
    }
}

impl Operation for SmtpOperation {
    fn pre_configure(&mut self, request: &mut Request) -> Result<()> {
        match &self.command {
            SmtpCommand::Send { from, to, cc } => {
                match &self.source {
                    Some(Source::File(path)) if path.as_os_str().is_empty() => {
                        return Err(Error::MissingParameter("local file path"));
                    }
                    Some(_) => {}
                    None => return Err(Error::MissingParameter("message")),
                }
                if from.is_empty() {
                    return Err(Error::MissingParameter("sender"));
                }
                if to.is_empty() {
                    return Err(Error::MissingParameter("recipient"));
                }
                request.mail_from = Some(from.clone());
                request.recipients = recipients(to, cc);
                request.upload = true;
            }
            SmtpCommand::Verify { address } => {
                if address.is_empty() {
                    return Err(Error::MissingParameter("address"));
                }
                request.recipients = vec![bracketed(address)];
            }
            SmtpCommand::Expand { list } => {
                request.recipients = vec![list.clone()];
                request.set_command("EXPN");
            }
        }

        if let Some(source) = self.source.take() {
            self.upload = Some(source.open()?);
        }
        Ok(())
    }

    fn channels(&mut self) -> Channels<'_> {
        Channels {
            upload: self.upload.as_mut().map(|source| source as &mut dyn io::Read),
            ..Channels::default()
        }
    }

    fn post_configure(
        &mut self,
        _outcome: &std::result::Result<(), TransportError>,
        _follow_up: FollowUp<'_>,
    ) -> Result<()> {
        self.upload = None;
        Ok(())
    }
}
