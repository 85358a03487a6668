//! Remote file handles.

use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::localfs::{LocalFs, NativeFs};
use crate::path::RemotePath;
use crate::transport::Transport;

/// A handle identifying one file on the remote host.
///
/// A proxy is an identity, not a lease: several proxies may point at the
/// same remote path, and nothing pins the file down between operations.
/// [`rename`](Self::rename) returns a fresh proxy for the new path and
/// leaves the original untouched. The stale original points at a path
/// that no longer exists, and further operations on it fail remotely.
pub struct FileProxy<T, L = NativeFs> {
    transport: Arc<Mutex<T>>,
    local: Arc<L>,
    path: RemotePath,
}

impl<T: Transport, L: LocalFs> FileProxy<T, L> {
    pub(crate) fn new(transport: Arc<Mutex<T>>, local: Arc<L>, path: RemotePath) -> Self {
        Self {
            transport,
            local,
            path,
        }
    }

    /// The resolved remote path this proxy points at.
    #[must_use]
    pub fn path(&self) -> &RemotePath {
        &self.path
    }

    /// Streams the remote file into `sink`.
    pub async fn download(&self, sink: &mut (dyn AsyncWrite + Send + Unpin)) -> Result<()> {
        trace!("retr {}", self.path);
        self.transport
            .lock()
            .await
            .retrieve(&self.path.to_string(), sink)
            .await
            .map_err(Error::from_transfer)
    }

    /// Streams `source` into the remote file, replacing any previous
    /// contents.
    pub async fn upload(&self, source: &mut (dyn AsyncRead + Send + Unpin)) -> Result<()> {
        trace!("stor {}", self.path);
        self.transport
            .lock()
            .await
            .store(&self.path.to_string(), source)
            .await
            .map_err(Error::from_transfer)
    }

    /// Downloads the whole file into memory.
    pub async fn download_to_vec(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.download(&mut buffer).await?;
        Ok(buffer)
    }

    /// Uploads an in-memory buffer.
    pub async fn upload_from_slice(&self, data: &[u8]) -> Result<()> {
        let mut source = data;
        self.upload(&mut source).await
    }

    /// Downloads into a local file, creating or replacing it.
    pub async fn download_to_file<P: AsRef<Path>>(&self, local_path: P) -> Result<()> {
        let data = self.download_to_vec().await?;
        self.local.write(local_path.as_ref(), &data).await?;
        Ok(())
    }

    /// Uploads the contents of a local file.
    pub async fn upload_from_file<P: AsRef<Path>>(&self, local_path: P) -> Result<()> {
        let data = self.local.read(local_path.as_ref()).await?;
        self.upload_from_slice(&data).await
    }

    /// Renames the remote file and returns a proxy for the new path.
    ///
    /// A relative `new_name` resolves against the proxy's parent
    /// directory. `self` keeps its old path and is logically dead after
    /// a successful rename.
    pub async fn rename<P: Into<String>>(&self, new_name: P) -> Result<Self> {
        let target = self.path.parent().join(&RemotePath::parse(new_name)?);
        debug!("rename {} -> {}", self.path, target);
        self.transport
            .lock()
            .await
            .rename(&self.path.to_string(), &target.to_string())
            .await
            .map_err(Error::RemoteOperation)?;
        Ok(Self {
            transport: self.transport.clone(),
            local: self.local.clone(),
            path: target,
        })
    }

    /// Deletes the remote file.
    pub async fn delete(&self) -> Result<()> {
        debug!("dele {}", self.path);
        self.transport
            .lock()
            .await
            .dele(&self.path.to_string())
            .await
            .map_err(Error::RemoteOperation)
    }
}
