//! Archive listing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;

use crate::archive::{for_each_entry, ArchiveEntryKind};
use crate::error::{Error, Result};
use crate::path::ArchivePath;

/// Header metadata of one listed archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    /// Normalized path.
    pub path: ArchivePath,
    /// Entry type.
    pub kind: ArchiveEntryKind,
    /// Size of the entry data in bytes.
    pub size: u64,
    /// Permission bits recorded in the header.
    pub mode: u32,
    /// Modification time, seconds since the epoch.
    pub mtime: i64,
    /// Link target for symlinks and hard links.
    pub link_target: Option<String>,
}

/// The file and directory sets of an archive.
///
/// Every intermediate segment of every listed path is added to `dirs`,
/// whether or not the archive lists it, and `files` holds the listed paths
/// that are not directories.
///
/// # Examples
///
/// ```
/// use dircopy::archive::{ArchiveEntry, ArchiveEntryKind, ArchiveIndex};
/// use dircopy::ArchivePath;
///
/// let file = ArchiveEntry {
///     path: ArchivePath::parse("site/css/main.css").unwrap(),
///     kind: ArchiveEntryKind::File,
///     size: 0,
///     mode: 0o644,
///     mtime: 0,
///     link_target: None,
/// };
/// let index = ArchiveIndex::from_entries(vec![file]);
/// assert_eq!(index.files.len(), 1);
/// assert_eq!(index.dirs.len(), 2);
/// assert!(index.is_implicit(&ArchivePath::parse("site").unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveIndex {
    /// Paths that are not directories.
    pub files: BTreeSet<ArchivePath>,
    /// Listed and implied directories.
    pub dirs: BTreeSet<ArchivePath>,
    #[serde(skip)]
    entries: BTreeMap<ArchivePath, ArchiveEntry>,
}

impl ArchiveIndex {
    /// Reads the listing of the archive at `archive`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Archive`] if the archive cannot be opened, a header
    /// cannot be read, or an entry escapes the archive root. Unparseable
    /// mode or mtime fields are read as zero.
    pub fn list(archive: &Path) -> Result<Self> {
        let mut listed = Vec::new();

        for_each_entry(archive, |path, entry| {
            // Mode and mtime only feed reports; an unparseable field must
            // not fail a listing that extraction would accept.
            let header = entry.header();
            let kind = ArchiveEntryKind::from_entry_type(header.entry_type());
            let mode = header.mode().map_or(0, |m| m & 0o7777);
            let mtime = header.mtime().unwrap_or(0);
            let size = entry.size();
            let link_target = entry
                .link_name()
                .map_err(|e| Error::archive(archive, e))?
                .map(|l| l.to_string_lossy().into_owned());

            listed.push(ArchiveEntry {
                path,
                kind,
                size,
                mode,
                mtime: i64::try_from(mtime).unwrap_or(i64::MAX),
                link_target,
            });
            Ok(())
        })?;

        let index = Self::from_entries(listed);
        log::debug!(
            "{}: {} file(s), {} dir(s)",
            archive.display(),
            index.files.len(),
            index.dirs.len()
        );
        Ok(index)
    }

    /// Builds the index from already-read entries. Later duplicates replace
    /// earlier ones, as they do on extraction.
    #[must_use]
    pub fn from_entries(listed: impl IntoIterator<Item = ArchiveEntry>) -> Self {
        let mut entries = BTreeMap::new();
        let mut dirs = BTreeSet::new();

        for entry in listed {
            dirs.extend(entry.path.ancestors());
            if entry.kind == ArchiveEntryKind::Directory {
                dirs.insert(entry.path.clone());
            }
            entries.insert(entry.path.clone(), entry);
        }

        let files = entries
            .keys()
            .filter(|path| !dirs.contains(*path))
            .cloned()
            .collect();

        Self {
            files,
            dirs,
            entries,
        }
    }

    /// Header metadata of a listed entry.
    #[must_use]
    pub fn entry(&self, path: &ArchivePath) -> Option<&ArchiveEntry> {
        self.entries.get(path)
    }

    /// All listed entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.values()
    }

    /// Whether `dir` is a directory only implied by a nested path.
    #[must_use]
    pub fn is_implicit(&self, dir: &ArchivePath) -> bool {
        self.dirs.contains(dir) && !self.entries.contains_key(dir)
    }

    /// Every listed path, directories included.
    #[must_use]
    pub fn listed(&self) -> BTreeSet<ArchivePath> {
        self.entries.keys().cloned().collect()
    }

    /// Whether the archive lists nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
