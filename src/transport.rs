//! The control-connection seam.
//!
//! Everything protocol-shaped lives behind [`Transport`]: command
//! encoding, reply parsing and the data-connection plumbing are the
//! implementor's business. The session layer only sequences these
//! primitives and interprets their failures.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::TransportError;

pub type TransportResult<T> = Result<T, TransportError>;

/// Remote kind of one listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a directory listing, in server order.
///
/// The kind comes from the same listing reply as the name, so a whole
/// directory costs a single round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl ListEntry {
    pub fn new<T: Into<String>>(name: T, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Blocking request/response primitives of one FTP control connection.
///
/// Each call suspends the single logical flow of the owning session
/// until the server replies. A failed call reports the raw reply (or
/// the stream failure) through [`TransportError`].
#[async_trait]
pub trait Transport: Send {
    /// Authenticates the connection.
    async fn login(&mut self, user: &str, password: &str) -> TransportResult<()>;

    /// `CWD`: changes the server-side working directory.
    async fn cwd(&mut self, path: &str) -> TransportResult<()>;

    /// `PWD`: the server's literal spelling of the working directory.
    async fn pwd(&mut self) -> TransportResult<String>;

    /// `MKD`: creates a single directory level.
    async fn mkd(&mut self, path: &str) -> TransportResult<()>;

    /// `RMD`: removes an empty directory.
    async fn rmd(&mut self, path: &str) -> TransportResult<()>;

    /// `DELE`: removes a file.
    async fn dele(&mut self, path: &str) -> TransportResult<()>;

    /// `RNFR`/`RNTO`: renames `from` to `to`.
    async fn rename(&mut self, from: &str, to: &str) -> TransportResult<()>;

    /// `LIST`: the entries of one directory, in server order.
    async fn list_names(&mut self, path: &str) -> TransportResult<Vec<ListEntry>>;

    /// `RETR`: streams the file at `path` into `sink`.
    async fn retrieve(
        &mut self,
        path: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> TransportResult<()>;

    /// `STOR`: streams `source` into the file at `path`, replacing it.
    async fn store(
        &mut self,
        path: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> TransportResult<()>;
}
