//! In-memory fakes for the collaborator seams, used across the test
//! modules. The mock transport counts round trips so tests can pin the
//! caching and idempotence properties down, and can break a transfer
//! mid-stream on demand.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;
use crate::localfs::LocalFs;
use crate::path::RemotePath;
use crate::transport::{EntryKind, ListEntry, Transport, TransportResult};

fn rejected<T: Into<String>>(code: u16, text: T) -> TransportError {
    TransportError::rejected(code, text)
}

fn broken_pipe() -> TransportError {
    TransportError::Io(io::Error::new(
        io::ErrorKind::BrokenPipe,
        "data connection lost",
    ))
}

fn canon(path: &str) -> String {
    RemotePath::parse(path).expect("valid path").to_string()
}

fn split(path: &str) -> (String, String) {
    let parsed = RemotePath::parse(path).expect("valid path");
    let name = parsed.segments().last().cloned().expect("non-root path");
    (parsed.parent().to_string(), name)
}

/// A fake FTP server behind the [`Transport`] seam.
pub(crate) struct MockTransport {
    cwd: String,
    dirs: HashMap<String, Vec<ListEntry>>,
    files: HashMap<String, Vec<u8>>,
    pub cwd_calls: usize,
    pub pwd_calls: usize,
    pub mkd_calls: usize,
    pub list_calls: usize,
    /// Directory whose listing is rejected.
    pub fail_list: Option<String>,
    /// File whose retrieval breaks mid-stream.
    pub fail_retrieve: Option<String>,
    /// File whose storage breaks mid-stream.
    pub fail_store: Option<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        let mut dirs = HashMap::new();
        let _ = dirs.insert("/".to_owned(), Vec::new());
        Self {
            cwd: "/".to_owned(),
            dirs,
            files: HashMap::new(),
            cwd_calls: 0,
            pwd_calls: 0,
            mkd_calls: 0,
            list_calls: 0,
            fail_list: None,
            fail_retrieve: None,
            fail_store: None,
        }
    }

    /// Registers a directory. The parent must already be registered.
    pub fn add_dir(&mut self, path: &str) {
        let path = canon(path);
        if self.dirs.contains_key(&path) {
            return;
        }
        let (parent, name) = split(&path);
        self.dirs
            .get_mut(&parent)
            .expect("parent directory not registered")
            .push(ListEntry::new(name, EntryKind::Dir));
        let _ = self.dirs.insert(path, Vec::new());
    }

    /// Registers a file with contents. The parent must be registered.
    pub fn add_file(&mut self, path: &str, data: &[u8]) {
        let path = canon(path);
        if !self.files.contains_key(&path) {
            let (parent, name) = split(&path);
            self.dirs
                .get_mut(&parent)
                .expect("parent directory not registered")
                .push(ListEntry::new(name, EntryKind::File));
        }
        let _ = self.files.insert(path, data.to_vec());
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.contains_key(&canon(path))
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.get(&canon(path)).cloned()
    }

    /// The server-side working directory, as the fake server sees it.
    pub fn cwd_now(&self) -> &str {
        &self.cwd
    }

    fn abs(&self, path: &str) -> String {
        let base = RemotePath::parse(self.cwd.as_str()).expect("valid cwd");
        RemotePath::resolve(&base, path).expect("valid path").to_string()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn login(&mut self, _user: &str, _password: &str) -> TransportResult<()> {
        Ok(())
    }

    async fn cwd(&mut self, path: &str) -> TransportResult<()> {
        self.cwd_calls += 1;
        let target = self.abs(path);
        if self.dirs.contains_key(&target) {
            self.cwd = target;
            Ok(())
        } else {
            Err(rejected(550, format!("{}: no such directory", path)))
        }
    }

    async fn pwd(&mut self) -> TransportResult<String> {
        self.pwd_calls += 1;
        Ok(self.cwd.clone())
    }

    async fn mkd(&mut self, path: &str) -> TransportResult<()> {
        self.mkd_calls += 1;
        let target = self.abs(path);
        if self.dirs.contains_key(&target) || self.files.contains_key(&target) {
            return Err(rejected(550, format!("{}: already exists", path)));
        }
        let (parent, name) = split(&target);
        let Some(entries) = self.dirs.get_mut(&parent) else {
            return Err(rejected(550, format!("{}: parent does not exist", path)));
        };
        entries.push(ListEntry::new(name, EntryKind::Dir));
        let _ = self.dirs.insert(target, Vec::new());
        Ok(())
    }

    async fn rmd(&mut self, path: &str) -> TransportResult<()> {
        let target = self.abs(path);
        match self.dirs.get(&target) {
            None => Err(rejected(550, format!("{}: no such directory", path))),
            Some(entries) if !entries.is_empty() => {
                Err(rejected(550, format!("{}: directory not empty", path)))
            }
            Some(_) => {
                let _ = self.dirs.remove(&target);
                let (parent, name) = split(&target);
                if let Some(entries) = self.dirs.get_mut(&parent) {
                    entries.retain(|e| e.name != name);
                }
                Ok(())
            }
        }
    }

    async fn dele(&mut self, path: &str) -> TransportResult<()> {
        let target = self.abs(path);
        if self.files.remove(&target).is_none() {
            return Err(rejected(550, format!("{}: no such file", path)));
        }
        let (parent, name) = split(&target);
        if let Some(entries) = self.dirs.get_mut(&parent) {
            entries.retain(|e| e.name != name);
        }
        Ok(())
    }

    async fn rename(&mut self, from: &str, to: &str) -> TransportResult<()> {
        let from_abs = self.abs(from);
        let to_abs = self.abs(to);
        let (new_parent, new_name) = split(&to_abs);
        if !self.dirs.contains_key(&new_parent) {
            return Err(rejected(553, format!("{}: parent does not exist", to)));
        }
        let Some(data) = self.files.remove(&from_abs) else {
            return Err(rejected(550, format!("{}: no such file", from)));
        };
        let (old_parent, old_name) = split(&from_abs);
        if let Some(entries) = self.dirs.get_mut(&old_parent) {
            entries.retain(|e| e.name != old_name);
        }
        self.dirs
            .get_mut(&new_parent)
            .expect("checked above")
            .push(ListEntry::new(new_name, EntryKind::File));
        let _ = self.files.insert(to_abs, data);
        Ok(())
    }

    async fn list_names(&mut self, path: &str) -> TransportResult<Vec<ListEntry>> {
        self.list_calls += 1;
        let target = self.abs(path);
        if self.fail_list.as_deref() == Some(target.as_str()) {
            return Err(rejected(450, format!("{}: listing failed", path)));
        }
        self.dirs
            .get(&target)
            .cloned()
            .ok_or_else(|| rejected(550, format!("{}: no such directory", path)))
    }

    async fn retrieve(
        &mut self,
        path: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> TransportResult<()> {
        let target = self.abs(path);
        let Some(data) = self.files.get(&target) else {
            return Err(rejected(550, format!("{}: no such file", path)));
        };
        if self.fail_retrieve.as_deref() == Some(target.as_str()) {
            sink.write_all(&data[..data.len() / 2]).await?;
            return Err(broken_pipe());
        }
        sink.write_all(data).await?;
        Ok(())
    }

    async fn store(
        &mut self,
        path: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> TransportResult<()> {
        let target = self.abs(path);
        let (parent, name) = split(&target);
        if !self.dirs.contains_key(&parent) {
            return Err(rejected(553, format!("{}: parent does not exist", path)));
        }
        if self.fail_store.as_deref() == Some(target.as_str()) {
            let mut scratch = [0_u8; 4];
            let _ = source.read(&mut scratch).await?;
            return Err(broken_pipe());
        }
        let mut data = Vec::new();
        let _ = source.read_to_end(&mut data).await?;
        if !self.files.contains_key(&target) {
            self.dirs
                .get_mut(&parent)
                .expect("checked above")
                .push(ListEntry::new(name, EntryKind::File));
        }
        let _ = self.files.insert(target, data);
        Ok(())
    }
}

#[derive(Default)]
struct MemoryFsInner {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

/// A fake local tree behind the [`LocalFs`] seam.
pub(crate) struct MemoryFs {
    inner: Mutex<MemoryFsInner>,
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut inner = MemoryFsInner::default();
        let _ = inner.dirs.insert(PathBuf::from("/"));
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Registers a directory and its ancestors.
    pub fn add_dir(&self, path: &str) {
        let mut inner = self.inner.lock().unwrap();
        for ancestor in Path::new(path).ancestors() {
            let _ = inner.dirs.insert(ancestor.to_path_buf());
        }
    }

    /// Registers a file, creating ancestor directories.
    pub fn add_file(&self, path: &str, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(parent) = Path::new(path).parent() {
            for ancestor in parent.ancestors() {
                let _ = inner.dirs.insert(ancestor.to_path_buf());
            }
        }
        let _ = inner.files.insert(PathBuf::from(path), data.to_vec());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().files.get(Path::new(path)).cloned()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.inner.lock().unwrap().dirs.contains(Path::new(path))
    }
}

#[async_trait]
impl LocalFs for MemoryFs {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.lock().unwrap().files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: not found", path.display()),
            )
        })
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match path.parent() {
            Some(parent) if inner.dirs.contains(parent) => {
                let _ = inner.files.insert(path.to_path_buf(), data.to_vec());
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: parent not found", path.display()),
            )),
        }
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: already exists", path.display()),
            ));
        }
        match path.parent() {
            Some(parent) if inner.dirs.contains(parent) => {
                let _ = inner.dirs.insert(path.to_path_buf());
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: parent not found", path.display()),
            )),
        }
    }

    async fn list_dir(&self, path: &Path) -> io::Result<Vec<ListEntry>> {
        let inner = self.inner.lock().unwrap();
        if !inner.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: not found", path.display()),
            ));
        }
        let mut entries = Vec::new();
        for dir in &inner.dirs {
            if dir.parent() == Some(path) {
                if let Some(name) = dir.file_name() {
                    entries.push(ListEntry::new(
                        name.to_string_lossy().into_owned(),
                        EntryKind::Dir,
                    ));
                }
            }
        }
        for file in inner.files.keys() {
            if file.parent() == Some(path) {
                if let Some(name) = file.file_name() {
                    entries.push(ListEntry::new(
                        name.to_string_lossy().into_owned(),
                        EntryKind::File,
                    ));
                }
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.dirs.contains(path) || inner.files.contains_key(path))
    }
}
