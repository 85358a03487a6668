//! One-way tree synchronization between the remote host and the local
//! filesystem.
//!
//! Both directions share the same shape: visit a directory, make sure
//! its counterpart exists, transfer every file in it, then descend.
//! The pre-order means an interrupted mirror leaves a valid prefix of
//! the tree behind, resumable by simply running the mirror again.
//! Mirrors are additive (nothing is deleted on the destination) and
//! every pass overwrites destination files unconditionally.

use std::path::Path;

use crate::error::Result;
use crate::localfs::LocalFs;
use crate::path::RemotePath;
use crate::proxy::FileProxy;
use crate::session::Session;
use crate::transport::{EntryKind, Transport};
use crate::walk::Walk;

/// Downloads the remote tree at `remote_root` into `local_root`.
pub(crate) async fn to_local<T: Transport, L: LocalFs>(
    session: &mut Session<T, L>,
    remote_root: &RemotePath,
    local_root: &Path,
) -> Result<()> {
    debug!("mirror {} -> {}", remote_root, local_root.display());
    let transport = session.transport_handle();
    let local = session.local_handle();

    let mut walk = Walk::new(session, remote_root.clone());
    while let Some(frame) = walk.advance().await? {
        let mut dest_dir = local_root.to_path_buf();
        if let Some(suffix) = frame.path.strip_prefix(remote_root) {
            dest_dir.extend(suffix);
        }
        if !local.exists(&dest_dir).await? {
            local.mkdir(&dest_dir).await?;
        }

        for name in &frame.files {
            let proxy =
                FileProxy::new(transport.clone(), local.clone(), frame.path.child(name));
            proxy.download_to_file(dest_dir.join(name)).await?;
        }
    }
    Ok(())
}

/// Uploads the local tree at `local_root` into `remote_root`. Walks the
/// local tree depth-first, pre-order, like the remote walker.
pub(crate) async fn to_remote<T: Transport, L: LocalFs>(
    session: &mut Session<T, L>,
    local_root: &Path,
    remote_root: &RemotePath,
) -> Result<()> {
    debug!("mirror {} -> {}", local_root.display(), remote_root);
    let transport = session.transport_handle();
    let local = session.local_handle();

    let mut stack = vec![(local_root.to_path_buf(), remote_root.clone())];
    while let Some((src_dir, dest_dir)) = stack.pop() {
        session.makedirs(dest_dir.to_string()).await?;

        let entries = local.list_dir(&src_dir).await?;
        let mut subdirs = Vec::new();
        for entry in entries {
            match entry.kind {
                EntryKind::File => {
                    let proxy = FileProxy::new(
                        transport.clone(),
                        local.clone(),
                        dest_dir.child(&entry.name),
                    );
                    proxy.upload_from_file(src_dir.join(&entry.name)).await?;
                }
                EntryKind::Dir => subdirs.push(entry.name),
            }
        }
        for name in subdirs.iter().rev() {
            stack.push((src_dir.join(name), dest_dir.child(name)));
        }
    }
    Ok(())
}
