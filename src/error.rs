use std::fmt;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Raw control-connection reply carried by transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

impl Reply {
    pub fn new<T: Into<String>>(code: u16, text: T) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.text)
    }
}

/// What a single [`Transport`](crate::Transport) call fails with.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server refused the command.
    #[error("{0}")]
    Rejected(Reply),
    /// The control or data stream failed.
    #[error("I/O: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    pub fn rejected<T: Into<String>>(code: u16, text: T) -> Self {
        Self::Rejected(Reply::new(code, text))
    }

    /// The reply the server rejected the command with, if any.
    #[must_use]
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Self::Rejected(reply) => Some(reply),
            Self::Io(_) => None,
        }
    }
}

/// Enum for session errors
#[derive(Debug, Error)]
pub enum Error {
    /// The server's working-directory state could not be re-established.
    /// The cached directory is unset when this is returned.
    #[error("remote state unknown: {0}")]
    RemoteState(#[source] TransportError),
    /// A single remote mutation was rejected by the server.
    #[error("remote operation failed: {0}")]
    RemoteOperation(#[source] TransportError),
    /// A data-connection transfer failed mid-stream. Partially written
    /// destination files are not rolled back.
    #[error("transfer failed: {0}")]
    Transfer(#[source] TransportError),
    /// Malformed path input. Pure and local, no network round trip.
    #[error("invalid path: {0}")]
    Path(String),
    /// Local filesystem failure.
    #[error("local I/O: {0}")]
    Local(#[from] io::Error),
}

impl Error {
    /// Maps a transfer-phase failure: a refused command is a remote
    /// operation error, a broken stream is a transfer error.
    pub(crate) fn from_transfer(err: TransportError) -> Self {
        match err {
            TransportError::Rejected(_) => Self::RemoteOperation(err),
            TransportError::Io(_) => Self::Transfer(err),
        }
    }
}
