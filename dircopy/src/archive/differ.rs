//! Archive-to-destination content comparison.
//!
//! [`ContentDiffer::compare`] decides which archive entries must be
//! (re)extracted. Only content is compared: entry kind, size, modification
//! time, bytes and link targets. Ownership and permission bits belong to
//! the permission reconciler and are left out here, otherwise a tree whose
//! permissions were adjusted after extraction would never compare clean.
//!
//! When a path occurs more than once (appended archives), only its last
//! occurrence is judged, since that is the one extraction leaves behind.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use serde::Serialize;

use crate::archive::{for_each_entry, ArchiveEntryKind};
use crate::error::{Error, Result};
use crate::path::{ArchivePath, EntryKind};

const CHUNK: usize = 64 * 1024;

/// Why an entry is considered changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    /// Nothing exists at the destination path.
    Missing,
    /// The destination has another entry type.
    KindDiffers,
    /// Sizes differ.
    SizeDiffers,
    /// Modification times differ.
    MtimeDiffers,
    /// Same size and time, different bytes.
    ContentsDiffer,
    /// Symlink points elsewhere.
    LinkDiffers,
    /// The destination is a special file that cannot be compared.
    NotComparable,
}

impl fmt::Display for DifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Missing => "cannot stat: no such file or directory",
            Self::KindDiffers => "file type differs",
            Self::SizeDiffers => "size differs",
            Self::MtimeDiffers => "mod time differs",
            Self::ContentsDiffer => "contents differ",
            Self::LinkDiffers => "symlink differs",
            Self::NotComparable => "not comparable",
        };
        f.write_str(text)
    }
}

/// One changed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    /// Archive path of the entry.
    pub path: ArchivePath,
    /// Reason.
    pub kind: DifferenceKind,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Outcome of a comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentDiff {
    /// Entries that must be extracted.
    pub changed: BTreeSet<ArchivePath>,
    /// Reasons, in archive order.
    pub differences: Vec<Difference>,
}

impl ContentDiff {
    /// Whether the destination matches the archive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    fn record(&mut self, path: ArchivePath, kind: DifferenceKind) {
        log::debug!("{path}: {kind}");
        self.changed.insert(path.clone());
        self.differences.push(Difference { path, kind });
    }
}

/// Compares archive entries against a destination tree.
pub struct ContentDiffer;

impl ContentDiffer {
    /// Compares every listed archive entry with its counterpart below
    /// `destination`.
    ///
    /// A destination that is a byte-identical copy yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Archive`] if the archive cannot be read. Problems on
    /// the destination side never fail the comparison; the entry is marked
    /// changed instead.
    pub fn compare(archive: &Path, destination: &Path) -> Result<ContentDiff> {
        let last = last_occurrences(archive)?;
        let mut diff = ContentDiff::default();
        let mut ordinal = 0usize;

        for_each_entry(archive, |path, entry| {
            ordinal += 1;
            if last.get(&path) != Some(&ordinal) {
                log::debug!("{path}: replaced by a later entry");
                return Ok(());
            }
            let kind = ArchiveEntryKind::from_entry_type(entry.header().entry_type());
            let target = path.under(destination);

            let found = match fs::symlink_metadata(&target) {
                Ok(meta) => meta,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    diff.record(path, DifferenceKind::Missing);
                    return Ok(());
                }
                Err(e) => {
                    log::warn!("{}: cannot stat: {e}", target.display());
                    diff.record(path, DifferenceKind::NotComparable);
                    return Ok(());
                }
            };
            let found_kind = EntryKind::from_file_type(found.file_type());

            let verdict = match kind {
                ArchiveEntryKind::Directory => {
                    (found_kind != EntryKind::Directory).then_some(DifferenceKind::KindDiffers)
                }
                ArchiveEntryKind::File => match found_kind {
                    EntryKind::File => {
                        let mtime = entry
                            .header()
                            .mtime()
                            .ok()
                            .and_then(|m| i64::try_from(m).ok());
                        if entry.size() != found.size() {
                            Some(DifferenceKind::SizeDiffers)
                        } else if mtime != Some(found.mtime()) {
                            Some(DifferenceKind::MtimeDiffers)
                        } else {
                            match same_contents(entry, &target) {
                                Ok(true) => None,
                                Ok(false) => Some(DifferenceKind::ContentsDiffer),
                                Err(e) => {
                                    log::warn!("{}: cannot compare: {e}", target.display());
                                    Some(DifferenceKind::NotComparable)
                                }
                            }
                        }
                    }
                    EntryKind::Other => {
                        log::warn!("{}: special file, not comparable", target.display());
                        Some(DifferenceKind::NotComparable)
                    }
                    EntryKind::Directory | EntryKind::Symlink => Some(DifferenceKind::KindDiffers),
                },
                ArchiveEntryKind::Symlink => {
                    if found_kind == EntryKind::Symlink {
                        let wanted = entry.link_name().map_err(|e| Error::archive(archive, e))?;
                        let actual = fs::read_link(&target).ok();
                        (wanted.as_deref() != actual.as_deref())
                            .then_some(DifferenceKind::LinkDiffers)
                    } else {
                        Some(DifferenceKind::KindDiffers)
                    }
                }
                ArchiveEntryKind::HardLink | ArchiveEntryKind::Other => None,
            };

            if let Some(reason) = verdict {
                diff.record(path, reason);
            }
            Ok(())
        })?;

        Ok(diff)
    }
}

/// Position of the last occurrence of every path, counted over the
/// non-root entries.
fn last_occurrences(archive: &Path) -> Result<BTreeMap<ArchivePath, usize>> {
    let mut last = BTreeMap::new();
    let mut ordinal = 0usize;
    for_each_entry(archive, |path, _| {
        ordinal += 1;
        last.insert(path, ordinal);
        Ok(())
    })?;
    Ok(last)
}

/// Compares a reader's bytes with a file of the same size.
fn same_contents(entry: &mut impl Read, path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut left = vec![0u8; CHUNK];
    let mut right = vec![0u8; CHUNK];

    loop {
        let n = fill(entry, &mut left)?;
        let m = fill(&mut file, &mut right)?;
        if n != m || left[..n] != right[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
