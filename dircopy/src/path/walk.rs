//! Destination tree walking.
//!
//! The engine never caches the destination: every step that needs the
//! tree (content comparison, pruning, permission checks) walks it again so
//! it always acts on what is currently on disk.

use std::collections::BTreeSet;
use std::fs::{self, FileType, Metadata};
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::Result;
use crate::mode::format_mode;
use crate::path::ArchivePath;

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link (never followed).
    Symlink,
    /// Fifo, socket or device node.
    Other,
}

impl EntryKind {
    /// Classifies a file type without following symlinks.
    #[must_use]
    pub fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }

    /// Whether the entry counts as a directory for set comparisons.
    #[must_use]
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// A live snapshot of one entry beneath the destination root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationEntry {
    /// Absolute path.
    pub path: PathBuf,
    /// Entry kind.
    pub kind: EntryKind,
    /// Owner.
    pub uid: u32,
    /// Group.
    pub gid: u32,
    /// Permission bits (`st_mode & 0o7777`).
    #[serde(serialize_with = "serialize_mode")]
    pub mode: u32,
    /// Size in bytes.
    pub size: u64,
    /// Modification time, seconds since the epoch.
    pub mtime: i64,
}

fn serialize_mode<S: serde::Serializer>(mode: &u32, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format_mode(*mode))
}

impl DestinationEntry {
    /// Builds a snapshot from already-read metadata.
    #[must_use]
    pub fn from_metadata(path: impl Into<PathBuf>, metadata: &Metadata) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::from_file_type(metadata.file_type()),
            uid: metadata.uid(),
            gid: metadata.gid(),
            mode: metadata.mode() & 0o7777,
            size: metadata.size(),
            mtime: metadata.mtime(),
        }
    }

    /// Reads a snapshot of `path` without following symlinks.
    ///
    /// Returns `Ok(None)` if nothing exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than "not found".
    pub fn stat(path: &Path) -> io::Result<Option<Self>> {
        match fs::symlink_metadata(path) {
            Ok(metadata) => Ok(Some(Self::from_metadata(path, &metadata))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The mode rendered as four octal digits.
    #[must_use]
    pub fn mode_string(&self) -> String {
        format_mode(self.mode)
    }
}

/// Walks `root` and returns a snapshot of every entry beneath it.
///
/// Entries are returned in walk order (parents before children, siblings by
/// name). With `include_root` the root itself comes first. Entries that
/// vanish while the walk is in progress are skipped.
///
/// # Errors
///
/// Returns an error if the root cannot be read or an entry fails with
/// anything but "not found".
pub fn walk_tree(root: &Path, include_root: bool) -> Result<Vec<DestinationEntry>> {
    let min_depth = usize::from(!include_root);
    let mut entries = Vec::new();

    for item in WalkDir::new(root)
        .follow_links(false)
        .min_depth(min_depth)
        .sort_by_file_name()
    {
        let item = match item {
            Ok(item) => item,
            Err(e) if e.depth() > 0 && is_vanished(&e) => {
                log::debug!("skipping vanished entry: {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let metadata = match item.metadata() {
            Ok(metadata) => metadata,
            Err(e) if is_vanished(&e) => {
                log::debug!("skipping vanished entry: {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        entries.push(DestinationEntry::from_metadata(item.path(), &metadata));
    }

    Ok(entries)
}

fn is_vanished(e: &walkdir::Error) -> bool {
    e.io_error()
        .is_some_and(|io| io.kind() == io::ErrorKind::NotFound)
}

/// The destination tree as archive-relative path sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSets {
    /// Everything that is not a directory (files, symlinks, special files).
    pub files: BTreeSet<ArchivePath>,
    /// Directories, the root excluded.
    pub dirs: BTreeSet<ArchivePath>,
}

impl TreeSets {
    /// Walks `root` and splits its entries into file and directory sets.
    /// Entries whose names cannot be expressed as archive paths (not valid
    /// UTF-8) are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the walk fails.
    pub fn read(root: &Path) -> Result<Self> {
        let mut sets = Self::default();
        for entry in walk_tree(root, false)? {
            let Ok(relative) = entry.path.strip_prefix(root) else {
                continue;
            };
            let path = match ArchivePath::from_relative(relative) {
                Ok(path) => path,
                Err(e) => {
                    log::warn!("skipping {}: {e}", entry.path.display());
                    continue;
                }
            };
            if entry.kind.is_dir() {
                sets.dirs.insert(path);
            } else {
                sets.files.insert(path);
            }
        }
        Ok(sets)
    }
}
