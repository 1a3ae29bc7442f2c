//! Configuration schema definitions.
//!
//! Every recognized option is listed here with its default. Config files,
//! environment variables and programmatic overrides all produce a
//! [`Config`]; the merged result is turned into [`SyncOptions`] for a run.

use serde::{Deserialize, Serialize};

use crate::mode::ModeString;

/// Layered configuration structure.
///
/// All fields are optional so that sources of different precedence can be
/// merged field by field.
///
/// # Examples
///
/// ```
/// use dircopy::config::Config;
///
/// let config: Config = serde_yaml::from_str("owner: www-data\nmode: '640'\nx4dirs: true\n").unwrap();
/// assert_eq!(config.owner.as_deref(), Some("www-data"));
/// assert_eq!(config.specialx, Some(true));
///
/// let options = config.to_options();
/// assert_eq!(options.mode.unwrap().as_str(), "640");
/// assert!(!options.identical);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Owner of the destination tree (numeric uid or user name).
    pub owner: Option<String>,

    /// Group of the destination tree (numeric gid or group name).
    pub group: Option<String>,

    /// Octal mode for files (and directories unless `specialx` adjusts it).
    pub mode: Option<ModeString>,

    /// Remove destination entries that are not in the archive.
    #[serde(alias = "delete")]
    pub identical: Option<bool>,

    /// Force execute bits on directories.
    #[serde(alias = "x4dirs", alias = "chdir")]
    pub specialx: Option<bool>,

    /// Include per-path details in the result.
    pub verbose: Option<bool>,

    /// Include the before/after report in the result.
    pub diff: Option<bool>,

    /// Compute and report without touching the filesystem.
    pub dry_run: Option<bool>,
}

impl Config {
    /// Resolves the layered config into fully-defaulted run options.
    #[must_use]
    pub fn to_options(&self) -> SyncOptions {
        SyncOptions {
            owner: self.owner.clone(),
            group: self.group.clone(),
            mode: self.mode.clone(),
            identical: self.identical.unwrap_or(false),
            specialx: self.specialx.unwrap_or(false),
            verbose: self.verbose.unwrap_or(false),
            diff: self.diff.unwrap_or(false),
            dry_run: self.dry_run.unwrap_or(false),
        }
    }
}

/// Options for a single reconciliation run.
///
/// `None` for owner, group or mode means "derive from the invoking
/// process" (see [`crate::TargetSpec::resolve`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncOptions {
    /// Owner; `None` is the invoking user.
    pub owner: Option<String>,
    /// Group; `None` is the owner's primary group.
    pub group: Option<String>,
    /// Mode; `None` derives from the process umask.
    pub mode: Option<ModeString>,
    /// Prune spare entries.
    pub identical: bool,
    /// Directory traversal grant.
    pub specialx: bool,
    /// Per-path details in the result.
    pub verbose: bool,
    /// Before/after report in the result.
    pub diff: bool,
    /// Do not mutate anything.
    pub dry_run: bool,
}
