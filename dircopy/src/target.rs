//! The ownership and permission target of a reconciliation.

use serde::Serialize;

use crate::config::SyncOptions;
use crate::error::Result;
use crate::mode::ModeString;
use crate::path::walk::EntryKind;
use crate::principal;

/// Desired ownership and modes for every entry of the destination tree.
///
/// # Examples
///
/// ```
/// use dircopy::{ModeString, TargetSpec};
///
/// let target = TargetSpec::new(1000, 1000, "750".parse().unwrap(), true);
/// assert_eq!(target.dir_mode.as_str(), "751");
/// assert_eq!(target.file_mode.as_str(), "750");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSpec {
    /// Desired owner.
    pub uid: u32,
    /// Desired group.
    pub gid: u32,
    /// Mode for files.
    pub file_mode: ModeString,
    /// Mode for directories.
    pub dir_mode: ModeString,
}

impl TargetSpec {
    /// Creates a target; `grant_traversal` derives the directory mode with
    /// every execute bit forced on.
    #[must_use]
    pub fn new(uid: u32, gid: u32, file_mode: ModeString, grant_traversal: bool) -> Self {
        let dir_mode = if grant_traversal {
            file_mode.with_traversal()
        } else {
            file_mode.clone()
        };
        Self {
            uid,
            gid,
            file_mode,
            dir_mode,
        }
    }

    /// Resolves owner, group and mode defaults from options.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the owner or group cannot be resolved.
    pub fn resolve(options: &SyncOptions) -> Result<Self> {
        let uid = principal::resolve_owner(options.owner.as_deref())?;
        let gid = principal::resolve_group(options.group.as_deref(), uid)?;
        let mode = options.mode.clone().unwrap_or_else(ModeString::from_umask);
        Ok(Self::new(uid, gid, mode, options.specialx))
    }

    /// The mode an entry of the given kind should carry.
    #[must_use]
    pub fn mode_for(&self, kind: EntryKind) -> &ModeString {
        match kind {
            EntryKind::Directory => &self.dir_mode,
            _ => &self.file_mode,
        }
    }
}
