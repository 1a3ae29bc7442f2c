//! Tar archive access.
//!
//! Archives are POSIX/GNU tar files, optionally gzip-compressed. The
//! compression is detected from the gzip magic bytes, not the file name.
//!
//! - [`index`]: list the archive as normalized file and directory sets.
//! - [`differ`]: compare the archive against a destination tree.
//! - [`extract`]: extract a chosen subset of entries.

pub mod differ;
pub mod extract;
pub mod index;

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::Serialize;
use tar::{Archive, EntryType};

use crate::error::{Error, Result};
use crate::path::{ArchivePath, EntryKind};

pub use differ::{ContentDiff, ContentDiffer, Difference, DifferenceKind};
pub use extract::{ExtractResult, SelectiveExtractor};
pub use index::{ArchiveEntry, ArchiveIndex};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Type of an archive entry as recorded in its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveEntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Hard link to an earlier entry.
    HardLink,
    /// Device node, fifo or anything else.
    Other,
}

impl ArchiveEntryKind {
    /// Classifies a tar header type.
    #[must_use]
    pub fn from_entry_type(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Regular | EntryType::Continuous => Self::File,
            EntryType::Directory => Self::Directory,
            EntryType::Symlink => Self::Symlink,
            EntryType::Link => Self::HardLink,
            _ => Self::Other,
        }
    }

    /// The kind the entry has once it is extracted.
    #[must_use]
    pub const fn extracted_kind(self) -> EntryKind {
        match self {
            Self::File | Self::HardLink => EntryKind::File,
            Self::Directory => EntryKind::Directory,
            Self::Symlink => EntryKind::Symlink,
            Self::Other => EntryKind::Other,
        }
    }
}

/// Opens an archive for streaming, decompressing gzip transparently.
///
/// # Errors
///
/// Returns [`Error::Archive`] if the file cannot be opened or read.
pub fn open(path: &Path) -> Result<Archive<Box<dyn Read>>> {
    let file = File::open(path).map_err(|e| Error::archive(path, e))?;
    let mut reader = BufReader::new(file);
    let magic = reader.fill_buf().map_err(|e| Error::archive(path, e))?;

    let reader: Box<dyn Read> = if magic.starts_with(&GZIP_MAGIC) {
        log::debug!("{} is gzip-compressed", path.display());
        Box::new(flate2::read::GzDecoder::new(reader))
    } else {
        Box::new(reader)
    };
    Ok(Archive::new(reader))
}

/// Streams every non-root entry of an archive with its normalized path.
///
/// Header or read errors abort with [`Error::Archive`]; an entry whose name
/// escapes the archive root is rejected the same way. `visit` may read the
/// entry's data and may fail with any error, which is passed through.
pub(crate) fn for_each_entry<F>(path: &Path, mut visit: F) -> Result<()>
where
    F: FnMut(ArchivePath, &mut tar::Entry<'_, Box<dyn Read>>) -> Result<()>,
{
    let mut archive = open(path)?;
    let entries = archive.entries().map_err(|e| Error::archive(path, e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| Error::archive(path, e))?;
        let Some(name) = entry_path(path, &entry)? else {
            continue;
        };
        visit(name, &mut entry)?;
    }
    Ok(())
}

/// The normalized path of an entry, `None` for the archive root.
///
/// Entry names must be valid UTF-8; anything else could not be matched
/// against the extracted file.
pub(crate) fn entry_path<R: Read>(
    archive: &Path,
    entry: &tar::Entry<'_, R>,
) -> Result<Option<ArchivePath>> {
    let raw = entry.path().map_err(|e| Error::archive(archive, e))?;
    let Some(name) = raw.to_str() else {
        return Err(Error::archive(
            archive,
            format!("entry name '{}' is not valid UTF-8", raw.display()),
        ));
    };
    ArchivePath::normalize(name)
        .map_err(|_| Error::archive(archive, format!("entry '{name}' escapes the archive root")))
}
