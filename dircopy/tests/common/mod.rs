//! Common test utilities for integration tests.
//!
//! This module provides an archive fixture builder and helpers for
//! snapshotting destination trees.

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::ffi::OsStringExt;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use dircopy::{ModeString, SyncOptions};
use tar::{Builder, EntryType, Header};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Modification time stamped on every fixture entry.
pub const FIXTURE_MTIME: u64 = 1_600_000_000;

/// Builder for test archives with sensible defaults.
///
/// Entries are written in the order they are added. Files default to mode
/// `0644`, directories to `0755`.
///
/// # Examples
///
/// ```no_run
/// # use common::ArchiveFixture;
/// let archive = ArchiveFixture::new()
///     .dir("dir")
///     .file("dir/file.txt", "hello")
///     .write_to(std::path::Path::new("/tmp/a.tar"));
/// ```
#[allow(dead_code)]
pub struct ArchiveFixture {
    entries: Vec<FixtureEntry>,
    gzip: bool,
}

enum FixtureEntry {
    File { path: String, contents: Vec<u8>, mode: u32 },
    Dir { path: String, mode: u32 },
    Symlink { path: String, target: String },
}

#[allow(dead_code)]
impl ArchiveFixture {
    /// Creates an empty fixture.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            gzip: false,
        }
    }

    /// Adds a regular file with mode `0644`.
    pub fn file(self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.file_with_mode(path, contents, 0o644)
    }

    /// Adds a regular file with an explicit mode.
    pub fn file_with_mode(mut self, path: &str, contents: impl AsRef<[u8]>, mode: u32) -> Self {
        self.entries.push(FixtureEntry::File {
            path: path.to_string(),
            contents: contents.as_ref().to_vec(),
            mode,
        });
        self
    }

    /// Adds a directory with mode `0755`.
    pub fn dir(mut self, path: &str) -> Self {
        self.entries.push(FixtureEntry::Dir {
            path: path.to_string(),
            mode: 0o755,
        });
        self
    }

    /// Adds a symbolic link.
    pub fn symlink(mut self, path: &str, target: &str) -> Self {
        self.entries.push(FixtureEntry::Symlink {
            path: path.to_string(),
            target: target.to_string(),
        });
        self
    }

    /// Compresses the archive with gzip.
    pub fn gzip(mut self) -> Self {
        self.gzip = true;
        self
    }

    /// Writes the archive to `path`.
    pub fn write_to(self, path: &Path) -> PathBuf {
        let file = fs::File::create(path).unwrap();
        if self.gzip {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            let mut builder = Builder::new(encoder);
            append_all(&mut builder, &self.entries);
            builder.into_inner().unwrap().finish().unwrap();
        } else {
            let mut builder = Builder::new(file);
            append_all(&mut builder, &self.entries);
            builder.finish().unwrap();
        }
        path.to_path_buf()
    }
}

impl Default for ArchiveFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn append_all<W: std::io::Write>(builder: &mut Builder<W>, entries: &[FixtureEntry]) {
    for entry in entries {
        let mut header = Header::new_gnu();
        header.set_mtime(FIXTURE_MTIME);
        header.set_uid(u64::from(dircopy::principal::current_uid()));
        header.set_gid(u64::from(dircopy::principal::current_gid()));
        match entry {
            FixtureEntry::File {
                path,
                contents,
                mode,
            } => {
                header.set_entry_type(EntryType::Regular);
                header.set_mode(*mode);
                header.set_size(contents.len() as u64);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, contents.as_slice())
                    .unwrap();
            }
            FixtureEntry::Dir { path, mode } => {
                header.set_entry_type(EntryType::Directory);
                header.set_mode(*mode);
                header.set_size(0);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .unwrap();
            }
            FixtureEntry::Symlink { path, target } => {
                header.set_entry_type(EntryType::Symlink);
                header.set_mode(0o777);
                header.set_size(0);
                builder.append_link(&mut header, path, target).unwrap();
            }
        }
    }
}

/// A staged archive and destination inside one temporary directory.
#[allow(dead_code)]
pub struct Workspace {
    /// Keeps the directory alive.
    pub temp: TempDir,
    /// Path of the archive.
    pub archive: PathBuf,
    /// Destination root (not created).
    pub dest: PathBuf,
}

#[allow(dead_code)]
impl Workspace {
    /// Writes `fixture` and reserves a destination path next to it.
    pub fn new(fixture: ArchiveFixture) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let archive = fixture.write_to(&temp.path().join("payload.tar"));
        let dest = temp.path().join("dest");
        Self {
            temp,
            archive,
            dest,
        }
    }

    /// Creates a file below the destination with mode `0644`, parents
    /// included.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dest.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        path
    }

    /// Creates a directory below the destination, parents included.
    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.dest.join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }
}

/// Options targeting the invoking user with the given mode.
///
/// Directory traversal is granted so that trees stay readable for
/// unprivileged test runs.
#[allow(dead_code)]
pub fn options(mode: &str) -> SyncOptions {
    SyncOptions {
        owner: Some(nix::unistd::geteuid().as_raw().to_string()),
        group: Some(nix::unistd::getegid().as_raw().to_string()),
        mode: Some(mode.parse::<ModeString>().unwrap()),
        specialx: true,
        ..SyncOptions::default()
    }
}

/// Observable state of one tree entry.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// `d`, `f`, `l` or `?`.
    pub kind: char,
    /// Permission bits.
    pub mode: u32,
    /// Owner and group.
    pub owner: (u32, u32),
    /// Modification time.
    pub mtime: i64,
    /// File contents or link target.
    pub data: Vec<u8>,
}

/// Snapshots every entry of a tree, the root included, keyed by relative
/// path. A missing root yields an empty map.
#[allow(dead_code)]
pub fn snapshot(root: &Path) -> BTreeMap<String, Snapshot> {
    let mut tree = BTreeMap::new();
    if !root.exists() {
        return tree;
    }
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.unwrap();
        let meta = entry.path().symlink_metadata().unwrap();
        let file_type = meta.file_type();
        let (kind, data) = if file_type.is_dir() {
            ('d', Vec::new())
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path()).unwrap();
            ('l', target.into_os_string().into_vec())
        } else if file_type.is_file() {
            ('f', fs::read(entry.path()).unwrap())
        } else {
            ('?', Vec::new())
        };
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .into_owned();
        tree.insert(
            relative,
            Snapshot {
                kind,
                mode: meta.mode() & 0o7777,
                owner: (meta.uid(), meta.gid()),
                mtime: meta.mtime(),
                data,
            },
        );
    }
    tree
}

/// Permission bits of `path`, without following symlinks.
#[allow(dead_code)]
pub fn mode_of(path: &Path) -> u32 {
    fs::symlink_metadata(path).unwrap().mode() & 0o7777
}
