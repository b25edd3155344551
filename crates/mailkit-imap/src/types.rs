//! IMAP flag and search keywords.

use std::fmt;
use std::str::FromStr;

use mailkit_core::Error;

/// System flag set on a message by `set_mail_property`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailProperty {
    /// `\Deleted`
    Deleted,
    /// `\Seen`
    Seen,
    /// `\Answered`
    Answered,
    /// `\Flagged`
    Flagged,
    /// `\Draft`
    Draft,
    /// `\Recent`
    Recent,
}

impl MailProperty {
    /// Every property.
    pub const ALL: [Self; 6] = [
        Self::Deleted,
        Self::Seen,
        Self::Answered,
        Self::Flagged,
        Self::Draft,
        Self::Recent,
    ];

    /// Flag name without the backslash.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deleted => "Deleted",
            Self::Seen => "Seen",
            Self::Answered => "Answered",
            Self::Flagged => "Flagged",
            Self::Draft => "Draft",
            Self::Recent => "Recent",
        }
    }
}

impl fmt::Display for MailProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\{}", self.as_str())
    }
}

impl FromStr for MailProperty {
    type Err = Error;

    /// Parses a flag name, with or without its backslash, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix('\\').unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|property| property.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::invalid_value("mail property", s))
    }
}

/// Criterion of `search`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOption {
    /// Messages with `\Answered`.
    Answered,
    /// Messages with `\Deleted`.
    Deleted,
    /// Messages with `\Draft`.
    Draft,
    /// Messages with `\Flagged`.
    Flagged,
    /// Recent and unseen messages.
    New,
    /// Messages with `\Recent`.
    Recent,
    /// Messages with `\Seen`.
    Seen,
}

impl SearchOption {
    /// Every option.
    pub const ALL: [Self; 7] = [
        Self::Answered,
        Self::Deleted,
        Self::Draft,
        Self::Flagged,
        Self::New,
        Self::Recent,
        Self::Seen,
    ];

    /// SEARCH keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Answered => "ANSWERED",
            Self::Deleted => "DELETED",
            Self::Draft => "DRAFT",
            Self::Flagged => "FLAGGED",
            Self::New => "NEW",
            Self::Recent => "RECENT",
            Self::Seen => "SEEN",
        }
    }
}

impl fmt::Display for SearchOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|option| option.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_value("search option", s))
    }
}
