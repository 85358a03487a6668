//! The local side of a mirror.
//!
//! Mirroring needs only a handful of filesystem primitives, kept behind
//! a trait so the engine can run against a fake tree in tests.

use std::io;
use std::path::Path;

use crate::transport::{EntryKind, ListEntry};

/// Local filesystem primitives used by transfers and mirroring.
#[async_trait]
pub trait LocalFs: Send + Sync {
    /// Reads a whole file.
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Creates or replaces a whole file.
    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Creates a single directory level. The parent must exist.
    async fn mkdir(&self, path: &Path) -> io::Result<()>;

    /// The entries of one directory, sorted by name.
    async fn list_dir(&self, path: &Path) -> io::Result<Vec<ListEntry>>;

    async fn exists(&self, path: &Path) -> io::Result<bool>;
}

/// [`LocalFs`] over the real filesystem via [`tokio::fs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFs;

#[async_trait]
impl LocalFs for NativeFs {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, data).await
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir(path).await
    }

    async fn list_dir(&self, path: &Path) -> io::Result<Vec<ListEntry>> {
        let mut reader = tokio::fs::read_dir(path).await?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let kind = if entry.file_type().await?.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(ListEntry::new(
                entry.file_name().to_string_lossy().into_owned(),
                kind,
            ));
        }
        // read_dir order is platform-defined; pin it down.
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        tokio::fs::try_exists(path).await
    }
}
