//! Filesystem mutation executor.
//!
//! Every change a reconciliation makes to disk goes through [`FsExecutor`].
//! In dry-run mode each primitive returns `Ok(())` without touching the
//! filesystem, so the components that decide *what* to change run the same
//! code path whether or not the change is applied.

use std::fs;
use std::io::{self, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Applies (or, in dry-run mode, skips) filesystem mutations.
///
/// # Examples
///
/// ```
/// use dircopy::operations::FsExecutor;
///
/// let dir = tempfile::tempdir().unwrap();
/// let target = dir.path().join("new");
///
/// FsExecutor::new(true).create_dir_all(&target).unwrap();
/// assert!(!target.exists());
///
/// FsExecutor::new(false).create_dir_all(&target).unwrap();
/// assert!(target.is_dir());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsExecutor {
    dry_run: bool,
}

impl FsExecutor {
    /// Creates an executor.
    #[must_use]
    pub const fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Whether mutations are skipped.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Creates a directory and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        log::debug!("mkdir -p {}", path.display());
        fs::create_dir_all(path)
    }

    /// Removes a file or symlink.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn remove_file(&self, path: &Path) -> io::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        log::debug!("rm {}", path.display());
        fs::remove_file(path)
    }

    /// Removes an empty directory.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, typically "directory not empty".
    pub fn remove_dir(&self, path: &Path) -> io::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        log::debug!("rmdir {}", path.display());
        fs::remove_dir(path)
    }

    /// Changes owner and group without following symlinks.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, typically "operation not permitted".
    pub fn chown(&self, path: &Path, uid: u32, gid: u32) -> io::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        log::debug!("chown {uid}:{gid} {}", path.display());
        std::os::unix::fs::lchown(path, Some(uid), Some(gid))
    }

    /// Sets the permission bits.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn chmod(&self, path: &Path, mode: u32) -> io::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        log::debug!("chmod {mode:04o} {}", path.display());
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }

    /// Unpacks one archive entry below `root`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, or an `InvalidInput` error if the
    /// entry would land outside `root`.
    pub fn unpack<R: Read>(&self, entry: &mut tar::Entry<'_, R>, root: &Path) -> io::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        if entry.unpack_in(root)? {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "entry path escapes the destination",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;
    use tempfile::TempDir;

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        let sub = dir.path().join("d");
        fs::write(&file, "x").unwrap();
        fs::create_dir(&sub).unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();

        let executor = FsExecutor::new(true);
        assert!(executor.is_dry_run());
        executor.remove_file(&file).unwrap();
        executor.remove_dir(&sub).unwrap();
        executor.chmod(&file, 0o600).unwrap();
        executor.chown(&file, 12345, 12345).unwrap();
        executor.create_dir_all(&dir.path().join("x/y")).unwrap();

        assert!(file.exists());
        assert!(sub.exists());
        assert!(!dir.path().join("x").exists());
        assert_eq!(fs::metadata(&file).unwrap().mode() & 0o7777, 0o644);
    }

    #[test]
    fn test_real_mutations() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        let sub = dir.path().join("d");
        fs::write(&file, "x").unwrap();
        fs::create_dir(&sub).unwrap();

        let executor = FsExecutor::new(false);
        executor.chmod(&file, 0o600).unwrap();
        assert_eq!(fs::metadata(&file).unwrap().mode() & 0o7777, 0o600);

        let meta = fs::metadata(&file).unwrap();
        executor.chown(&file, meta.uid(), meta.gid()).unwrap();

        executor.remove_file(&file).unwrap();
        executor.remove_dir(&sub).unwrap();
        assert!(!file.exists());
        assert!(!sub.exists());
    }

    #[test]
    fn test_remove_dir_refuses_non_empty() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("d");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("keep"), "x").unwrap();

        assert!(FsExecutor::new(false).remove_dir(&sub).is_err());
        assert!(sub.join("keep").exists());
    }
}
