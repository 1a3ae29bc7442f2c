//! Normalization of user-supplied filesystem paths.
//!
//! Destination roots and archive locations arrive from configuration or the
//! command line. Before the engine touches them they are made absolute and
//! lexically cleaned (`~` expanded, `.` and `..` resolved) without following
//! symlinks, so a destination that does not exist yet can still be handled.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Expand a leading `~` or `~/` to the home directory.
///
/// `~user` syntax is rejected.
///
/// # Errors
///
/// Returns an error if the path is not UTF-8, the home directory is unknown,
/// or `~user` syntax is used.
///
/// # Examples
///
/// ```
/// use dircopy::path::normalize::expand_tilde;
/// use std::path::Path;
///
/// assert_eq!(expand_tilde(Path::new("/srv/www")).unwrap(), Path::new("/srv/www"));
/// assert!(expand_tilde(Path::new("~/site")).unwrap().is_absolute());
/// ```
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let Some(text) = path.to_str() else {
        return Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "Path contains invalid UTF-8".to_string(),
        });
    };

    let rest = match text.strip_prefix('~') {
        None => return Ok(path.to_path_buf()),
        Some("") => "",
        Some(rest) if rest.starts_with('/') => &rest[1..],
        Some(_) => {
            return Err(Error::InvalidPath {
                path: path.to_path_buf(),
                reason: "~user syntax is not supported; use ~ or ~/path".to_string(),
            })
        }
    };

    let home = home::home_dir().ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: "Cannot determine home directory".to_string(),
    })?;
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

/// Lexically resolve `.` and `..` in an absolute path.
///
/// # Errors
///
/// Returns an error if `..` would climb above the root.
///
/// # Examples
///
/// ```
/// use dircopy::path::normalize::resolve_components;
/// use std::path::PathBuf;
///
/// let resolved = resolve_components("/srv/./www/../data".as_ref()).unwrap();
/// assert_eq!(resolved, PathBuf::from("/srv/data"));
/// ```
pub fn resolve_components(path: &Path) -> Result<PathBuf> {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::RootDir | Component::Prefix(_) | Component::Normal(_) => {
                result.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = result.parent().is_none();
                if at_root || !result.pop() {
                    return Err(Error::InvalidPath {
                        path: path.to_path_buf(),
                        reason: "Path contains too many '..' components (escapes root)"
                            .to_string(),
                    });
                }
            }
        }
    }

    Ok(result)
}

/// Normalize a path to absolute form, relative paths being taken against
/// the current directory.
///
/// # Errors
///
/// Returns an error if tilde expansion fails, the current directory cannot
/// be determined, or the path escapes the root.
pub fn normalize(path: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path)?;
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = env::current_dir().map_err(|e| Error::InvalidPath {
            path: path.to_path_buf(),
            reason: format!("Cannot get current directory: {e}"),
        })?;
        cwd.join(expanded)
    };
    resolve_components(&absolute)
}

/// Check that a destination root is syntactically usable.
///
/// The destination must be absolute, must not be the filesystem root and
/// must not contain `.` or `..` components.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] describing the first violated rule.
pub fn validate_destination(path: &Path) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if path.as_os_str().is_empty() {
        return Err(invalid("destination is empty"));
    }
    if !path.is_absolute() {
        return Err(invalid("destination must be an absolute path"));
    }
    if path
        .components()
        .any(|c| matches!(c, Component::CurDir | Component::ParentDir))
    {
        return Err(invalid("destination must not contain '.' or '..'"));
    }
    if path.parent().is_none() {
        return Err(invalid("refusing to use the filesystem root as destination"));
    }
    Ok(())
}
