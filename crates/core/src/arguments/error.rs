use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The kind of argument access error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The call was aborted before the access could complete.
    Aborted,
    /// The path does not fit the shape of the argument value.
    InvalidPath,
    /// The argument value is final and holds nothing at the path.
    Unresolved,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Aborted => write!(f, "Aborted"),
            ErrorKind::InvalidPath => write!(f, "Invalid path"),
            ErrorKind::Unresolved => write!(f, "Unresolved path"),
        }
    }
}

/// Describes an argument access error.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    /// Creates a new error with the `Aborted` kind.
    #[inline]
    pub fn aborted() -> Self {
        Self {
            kind: ErrorKind::Aborted,
            reason: None,
        }
    }

    /// Creates a new error with the `InvalidPath` kind.
    #[inline]
    pub fn invalid_path() -> Self {
        Self {
            kind: ErrorKind::InvalidPath,
            reason: None,
        }
    }

    /// Creates a new error with the `Unresolved` kind.
    #[inline]
    pub fn unresolved() -> Self {
        Self {
            kind: ErrorKind::Unresolved,
            reason: None,
        }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}

impl StdError for Error {}
