//! The stateful session over one control connection.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::localfs::{LocalFs, NativeFs};
use crate::mirror;
use crate::path::RemotePath;
use crate::proxy::FileProxy;
use crate::transport::{EntryKind, Transport};
use crate::walk::Walk;

/// An authenticated control-connection handle plus cached
/// working-directory state.
///
/// A session is one logical flow: every operation is a synchronous
/// request/response exchange and the cached working directory is owned
/// exclusively by the session. Concurrent use of one connection is not
/// supported; open one session per connection.
pub struct Session<T, L = NativeFs> {
    transport: Arc<Mutex<T>>,
    local: Arc<L>,
    cached_cwd: Option<RemotePath>,
}

impl<T: Transport> Session<T> {
    /// Logs in over an already-dialed transport and returns the
    /// session. Dialing the control connection is the transport's
    /// concern.
    pub async fn connect(transport: T, user: &str, password: &str) -> Result<Self> {
        Self::connect_with_fs(transport, NativeFs, user, password).await
    }
}

impl<T: Transport, L: LocalFs> Session<T, L> {
    /// Like [`connect`](Session::connect), with an explicit local
    /// filesystem for transfers and mirroring.
    pub async fn connect_with_fs(
        mut transport: T,
        local: L,
        user: &str,
        password: &str,
    ) -> Result<Self> {
        transport
            .login(user, password)
            .await
            .map_err(Error::RemoteOperation)?;
        debug!("logged in as {}", user);
        Ok(Self {
            transport: Arc::new(Mutex::new(transport)),
            local: Arc::new(local),
            cached_cwd: None,
        })
    }

    pub(crate) fn transport_handle(&self) -> Arc<Mutex<T>> {
        Arc::clone(&self.transport)
    }

    pub(crate) fn local_handle(&self) -> Arc<L> {
        Arc::clone(&self.local)
    }

    /// The server-side working directory.
    ///
    /// Lazily fetched: the first read after connect or after a failed
    /// change issues one `PWD`; subsequent reads are answered from the
    /// cache without a round trip, until the next directory change.
    pub async fn current_directory(&mut self) -> Result<RemotePath> {
        if let Some(cwd) = &self.cached_cwd {
            return Ok(cwd.clone());
        }
        let reply = self
            .transport
            .lock()
            .await
            .pwd()
            .await
            .map_err(Error::RemoteState)?;
        let cwd = RemotePath::parse(reply)?;
        self.cached_cwd = Some(cwd.clone());
        Ok(cwd)
    }

    /// Changes the server-side working directory.
    ///
    /// Issues `CWD` and then always re-issues `PWD`, caching the
    /// server's own spelling of the result. The protocol does not
    /// standardize what a `CWD` reply looks like, and the server may
    /// normalize `..` or resolve links its own way. If either command
    /// fails the cache is left unset, so the next read asks the server
    /// again.
    pub async fn set_current_directory<P: Into<String>>(&mut self, target: P) -> Result<()> {
        let input = RemotePath::parse(target)?;
        let request = match (&self.cached_cwd, input.is_absolute()) {
            (Some(cwd), false) => cwd.join(&input),
            // Unknown base: hand the relative target to the server as-is.
            _ => input,
        };

        self.cached_cwd = None;
        let mut transport = self.transport.lock().await;
        transport
            .cwd(&request.to_string())
            .await
            .map_err(Error::RemoteState)?;
        let reply = transport.pwd().await.map_err(Error::RemoteState)?;
        drop(transport);

        let cwd = RemotePath::parse(reply)?;
        debug!("cwd -> {}", cwd);
        self.cached_cwd = Some(cwd);
        Ok(())
    }

    /// Resolves `input` against the working directory. Absolute inputs
    /// skip the lookup entirely.
    async fn resolve<P: Into<String>>(&mut self, input: P) -> Result<RemotePath> {
        let input = RemotePath::parse(input)?;
        if input.is_absolute() {
            return Ok(input);
        }
        Ok(self.current_directory().await?.join(&input))
    }

    /// Lists one directory into `(subdirs, files)`, both in server
    /// listing order. One round trip.
    pub async fn listdir<P: Into<String>>(&mut self, path: P) -> Result<(Vec<String>, Vec<String>)> {
        let path = self.resolve(path).await?;
        self.listdir_at(&path).await
    }

    pub(crate) async fn listdir_at(
        &mut self,
        path: &RemotePath,
    ) -> Result<(Vec<String>, Vec<String>)> {
        let entries = self
            .transport
            .lock()
            .await
            .list_names(&path.to_string())
            .await
            .map_err(Error::from_transfer)?;

        let mut subdirs = Vec::new();
        let mut files = Vec::new();
        for entry in entries {
            if entry.name == "." || entry.name == ".." {
                continue;
            }
            match entry.kind {
                EntryKind::Dir => subdirs.push(entry.name),
                EntryKind::File => files.push(entry.name),
            }
        }
        Ok((subdirs, files))
    }

    /// Creates a single directory level.
    pub async fn mkdir<P: Into<String>>(&mut self, path: P) -> Result<()> {
        let path = self.resolve(path).await?;
        debug!("mkd {}", path);
        self.transport
            .lock()
            .await
            .mkd(&path.to_string())
            .await
            .map_err(Error::RemoteOperation)
    }

    /// Removes an empty directory.
    pub async fn rmdir<P: Into<String>>(&mut self, path: P) -> Result<()> {
        let path = self.resolve(path).await?;
        debug!("rmd {}", path);
        self.transport
            .lock()
            .await
            .rmd(&path.to_string())
            .await
            .map_err(Error::RemoteOperation)
    }

    /// Ascertains that `path` and all its ancestors exist, creating the
    /// missing pieces.
    ///
    /// Existence is probed by changing into the directory and changing
    /// back, the cheapest check the protocol offers. A probe rejection
    /// is the signal to create, not an error. Idempotent: when the whole
    /// path already exists nothing is created.
    pub async fn makedirs<P: Into<String>>(&mut self, path: P) -> Result<()> {
        let target = self.resolve(path).await?;
        if self.probe_dir(&target).await? {
            return Ok(());
        }

        let mut prefix = RemotePath::root();
        for segment in target.segments() {
            prefix = prefix.child(segment);
            if self.probe_dir(&prefix).await? {
                continue;
            }
            debug!("mkd {}", prefix);
            self.transport
                .lock()
                .await
                .mkd(&prefix.to_string())
                .await
                .map_err(Error::RemoteOperation)?;
        }
        Ok(())
    }

    /// Changes into `path` and back to tell whether it exists as a
    /// directory. The original working directory is restored on every
    /// outcome; only a failed restore surfaces, as the working
    /// directory is then genuinely unknown.
    async fn probe_dir(&mut self, path: &RemotePath) -> Result<bool> {
        let original = self.current_directory().await?;
        let mut transport = self.transport.lock().await;
        let probed = transport.cwd(&path.to_string()).await;
        let restored = transport.cwd(&original.to_string()).await;
        drop(transport);

        if let Err(err) = restored {
            self.cached_cwd = None;
            return Err(Error::RemoteState(err));
        }
        Ok(probed.is_ok())
    }

    /// A [`FileProxy`] for `path`, resolved against the working
    /// directory.
    pub async fn file_proxy<P: Into<String>>(&mut self, path: P) -> Result<FileProxy<T, L>> {
        let path = self.resolve(path).await?;
        Ok(FileProxy::new(
            self.transport_handle(),
            self.local_handle(),
            path,
        ))
    }

    /// Starts a fresh depth-first, pre-order traversal rooted at
    /// `path`. See [`Walk`].
    pub async fn walk<P: Into<String>>(&mut self, path: P) -> Result<Walk<'_, T, L>> {
        let root = self.resolve(path).await?;
        Ok(Walk::new(self, root))
    }

    /// Downloads the remote tree at `remote_root` into `local_root`.
    ///
    /// One-way and additive: missing local directories are created,
    /// files are overwritten, nothing is deleted. The first failure
    /// aborts the remaining walk, leaving the already-mirrored prefix
    /// in place.
    pub async fn mirror_to_local<P, Q>(&mut self, remote_root: P, local_root: Q) -> Result<()>
    where
        P: Into<String>,
        Q: AsRef<Path>,
    {
        let remote_root = self.resolve(remote_root).await?;
        mirror::to_local(self, &remote_root, local_root.as_ref()).await
    }

    /// Uploads the local tree at `local_root` into `remote_root`.
    /// Mirror image of [`mirror_to_local`](Session::mirror_to_local).
    pub async fn mirror_to_remote<P, Q>(&mut self, local_root: P, remote_root: Q) -> Result<()>
    where
        P: AsRef<Path>,
        Q: Into<String>,
    {
        let remote_root = self.resolve(remote_root).await?;
        mirror::to_remote(self, local_root.as_ref(), &remote_root).await
    }
}
