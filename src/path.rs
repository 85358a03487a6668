//! Pure path algebra for the remote side of a session.
//!
//! FTP servers speak POSIX-style slash-separated paths. [`RemotePath`]
//! keeps them as an ordered list of segments plus an absolute flag, so
//! joining and normalizing never touch the network.

use std::fmt;

use crate::error::{Error, Result};

pub const SEPARATOR: char = '/';

/// A normalized remote path.
///
/// The normalized form contains no empty or `.` segments. `..` pops the
/// previously accumulated segment where one exists; at the absolute root
/// it is a no-op, and in a relative path leading `..` segments are
/// retained so they can later pop into a base.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    absolute: bool,
    segments: Vec<String>,
}

impl RemotePath {
    /// The absolute root, `/`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            absolute: true,
            segments: Vec::new(),
        }
    }

    /// Parses and normalizes `input`.
    ///
    /// Duplicate and trailing separators collapse and `.` segments are
    /// dropped. Fails with [`Error::Path`] if `input` contains bytes
    /// that cannot travel on a control connection (NUL, CR, LF).
    pub fn parse<T: Into<String>>(input: T) -> Result<Self> {
        let input = input.into();
        if input.contains(['\0', '\r', '\n']) {
            return Err(Error::Path(format!(
                "control bytes in path: {:?}",
                input
            )));
        }

        let mut path = Self {
            absolute: input.starts_with(SEPARATOR),
            segments: Vec::new(),
        };
        for segment in input.split(SEPARATOR) {
            path.apply(segment);
        }
        Ok(path)
    }

    /// Joins `other` onto `self`. An absolute `other` replaces the base
    /// entirely; a relative one appends and re-normalizes, with `..`
    /// popping into the base.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        if other.absolute {
            return other.clone();
        }
        let mut joined = self.clone();
        for segment in &other.segments {
            joined.apply(segment);
        }
        joined
    }

    /// Resolves raw `input` against `base`: parse, then join. Absolute
    /// inputs ignore the base.
    pub fn resolve<T: Into<String>>(base: &Self, input: T) -> Result<Self> {
        Ok(base.join(&Self::parse(input)?))
    }

    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The path with the last segment removed. The absolute root is its
    /// own parent.
    #[must_use]
    pub fn parent(&self) -> Self {
        let mut parent = self.clone();
        parent.apply("..");
        parent
    }

    /// The path extended by one listing name.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut child = self.clone();
        child.apply(name);
        child
    }

    /// The segments of `self` below `base`, if `base` is a prefix.
    #[must_use]
    pub fn strip_prefix(&self, base: &Self) -> Option<&[String]> {
        if self.absolute == base.absolute && self.segments.starts_with(&base.segments) {
            Some(&self.segments[base.segments.len()..])
        } else {
            None
        }
    }

    fn apply(&mut self, segment: &str) {
        match segment {
            "" | "." => {}
            ".." => match self.segments.last() {
                Some(last) if last != ".." => {
                    let _ = self.segments.pop();
                }
                // At the absolute root `..` stays put; a relative path
                // keeps it to pop into a future base.
                _ if self.absolute => {}
                _ => self.segments.push("..".to_owned()),
            },
            name => self.segments.push(name.to_owned()),
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.absolute, self.segments.is_empty()) {
            (true, true) => f.write_str("/"),
            (true, false) => write!(f, "/{}", self.segments.join("/")),
            (false, true) => f.write_str("."),
            (false, false) => f.write_str(&self.segments.join("/")),
        }
    }
}
