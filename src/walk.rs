//! Lazy remote directory traversal.

use crate::error::Result;
use crate::localfs::{LocalFs, NativeFs};
use crate::path::RemotePath;
use crate::session::Session;
use crate::transport::Transport;

/// One directory's traversal snapshot.
///
/// The walker yields the frame before descending. Removing names from
/// `subdirs` while holding the frame prunes the traversal: only the
/// surviving names are descended into, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkFrame {
    /// Resolved path of the directory this frame describes.
    pub path: RemotePath,
    /// Subdirectory names, in server listing order. Mutable on purpose.
    pub subdirs: Vec<String>,
    /// File names, in server listing order.
    pub files: Vec<String>,
}

/// Depth-first, pre-order traversal of a remote tree.
///
/// Each directory costs one listing round trip, issued lazily when the
/// walk reaches it. A listing failure propagates and the traversal
/// should be abandoned; there is no partial-skip policy. Cycles
/// (e.g. server-side symlink loops) are not detected; walking such a
/// tree does not terminate.
pub struct Walk<'s, T, L = NativeFs> {
    session: &'s mut Session<T, L>,
    stack: Vec<RemotePath>,
    current: Option<WalkFrame>,
}

impl<'s, T: Transport, L: LocalFs> Walk<'s, T, L> {
    pub(crate) fn new(session: &'s mut Session<T, L>, root: RemotePath) -> Self {
        Self {
            session,
            stack: vec![root],
            current: None,
        }
    }

    /// Advances to the next directory and yields its frame, or `None`
    /// once the tree is exhausted.
    ///
    /// Descent honors any pruning applied to the previously yielded
    /// frame's `subdirs`.
    pub async fn advance(&mut self) -> Result<Option<&mut WalkFrame>> {
        if let Some(finished) = self.current.take() {
            // Leftmost surviving subdirectory is visited next.
            for name in finished.subdirs.iter().rev() {
                self.stack.push(finished.path.child(name));
            }
        }

        let Some(dir) = self.stack.pop() else {
            return Ok(None);
        };
        let (subdirs, files) = self.session.listdir_at(&dir).await?;
        trace!("walk {}: {} dir(s), {} file(s)", dir, subdirs.len(), files.len());

        self.current = Some(WalkFrame {
            path: dir,
            subdirs,
            files,
        });
        Ok(self.current.as_mut())
    }
}
