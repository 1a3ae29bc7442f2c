//! Archive-relative paths.
//!
//! Archive listings and destination walks are compared as sets of
//! [`ArchivePath`]s: relative, `/`-separated, with no leading slash, no
//! `.` segments and no trailing slash. Both sides normalize through this
//! type so the sets are directly comparable.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// A normalized path relative to the archive (and destination) root.
///
/// # Examples
///
/// ```
/// use dircopy::ArchivePath;
///
/// let path = ArchivePath::parse("/./site/css/").unwrap();
/// assert_eq!(path.as_str(), "site/css");
/// assert_eq!(path.depth(), 2);
/// assert!(ArchivePath::parse("../etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Normalizes a raw entry name.
    ///
    /// Returns `Ok(None)` for names that denote the root itself (`""`, `/`,
    /// `./`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if the name contains a `..` segment.
    pub fn normalize(raw: &str) -> Result<Option<Self>> {
        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(Error::InvalidPath {
                        path: PathBuf::from(raw),
                        reason: "entry escapes the archive root".to_string(),
                    })
                }
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Self(segments.join("/"))))
        }
    }

    /// Normalizes a raw entry name that must not denote the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for `..` segments or an empty result.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::normalize(raw)?.ok_or_else(|| Error::InvalidPath {
            path: PathBuf::from(raw),
            reason: "path names the archive root".to_string(),
        })
    }

    /// Builds an archive path from a path relative to a walked root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for absolute paths, `..` segments or
    /// names that are not valid UTF-8.
    pub fn from_relative(path: &Path) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(s) => match s.to_str() {
                    Some(segment) => segments.push(segment),
                    None => {
                        return Err(Error::InvalidPath {
                            path: path.to_path_buf(),
                            reason: "name is not valid UTF-8".to_string(),
                        })
                    }
                },
                Component::CurDir => {}
                _ => {
                    return Err(Error::InvalidPath {
                        path: path.to_path_buf(),
                        reason: "not a relative path below the root".to_string(),
                    })
                }
            }
        }
        Self::parse(&segments.join("/"))
    }

    /// The normalized text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of path segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }

    /// All proper ancestors, nearest first (`a/b/c` yields `a/b`, `a`).
    pub fn ancestors(&self) -> impl Iterator<Item = Self> + '_ {
        self.0
            .char_indices()
            .rev()
            .filter(|(_, c)| *c == '/')
            .map(|(i, _)| Self(self.0[..i].to_string()))
    }

    /// The absolute location of this entry below `root`.
    #[must_use]
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
