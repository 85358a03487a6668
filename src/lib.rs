//! High-level client layer for FTP servers.
//!
//! The raw control connection lives behind the [`Transport`] trait;
//! this crate adds the stateful part: a [`Session`] that tracks the
//! working directory, resolves relative and absolute remote paths,
//! walks directory trees lazily with pruning ([`Session::walk`]),
//! hands out [`FileProxy`] handles for transfers, and mirrors whole
//! subtrees between the local filesystem and the remote host
//! ([`Session::mirror_to_local`], [`Session::mirror_to_remote`]).

#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;

mod error;
mod localfs;
mod mirror;
mod path;
mod proxy;
mod session;
#[cfg(test)]
mod testing;
mod transport;
mod walk;

pub use error::{Error, Reply, Result, TransportError};
pub use localfs::{LocalFs, NativeFs};
pub use path::RemotePath;
pub use proxy::FileProxy;
pub use session::Session;
pub use transport::{EntryKind, ListEntry, Transport, TransportResult};
pub use walk::{Walk, WalkFrame};
