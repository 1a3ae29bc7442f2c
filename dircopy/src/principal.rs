//! Owner and group resolution.
//!
//! Owners and groups are given either numerically or by name. Names are
//! looked up in the system user and group databases.

use nix::unistd::{getegid, geteuid, Gid, Group, Uid, User};

use crate::error::{Error, Result};

/// The effective uid of the invoking process.
#[must_use]
pub fn current_uid() -> u32 {
    geteuid().as_raw()
}

/// The effective gid of the invoking process.
#[must_use]
pub fn current_gid() -> u32 {
    getegid().as_raw()
}

/// Whether the invoking process runs as root.
#[must_use]
pub fn is_root() -> bool {
    geteuid().is_root()
}

/// Resolves an owner name or numeric uid to a uid.
///
/// `None` means the invoking principal.
///
/// # Errors
///
/// Returns a validation error if a user name does not exist.
///
/// # Examples
///
/// ```
/// use dircopy::principal::resolve_owner;
///
/// assert_eq!(resolve_owner(Some("1234")).unwrap(), 1234);
/// assert!(resolve_owner(Some("no-such-user-hopefully")).is_err());
/// ```
pub fn resolve_owner(owner: Option<&str>) -> Result<u32> {
    let Some(owner) = owner.map(str::trim).filter(|o| !o.is_empty()) else {
        return Ok(current_uid());
    };

    if let Ok(uid) = owner.parse::<u32>() {
        return Ok(uid);
    }

    match User::from_name(owner) {
        Ok(Some(user)) => Ok(user.uid.as_raw()),
        Ok(None) => Err(Error::validation("owner", format!("No such user: {owner}"))),
        Err(e) => Err(Error::validation(
            "owner",
            format!("cannot look up user {owner}: {e}"),
        )),
    }
}

/// Resolves a group name or numeric gid to a gid.
///
/// `None` means the primary group of `uid`. When `uid` has no user entry
/// and is the invoking uid, the invoking effective gid is used instead.
///
/// # Errors
///
/// Returns a validation error if a group name does not exist or the
/// primary group of `uid` cannot be determined.
pub fn resolve_group(group: Option<&str>, uid: u32) -> Result<u32> {
    if let Some(group) = group.map(str::trim).filter(|g| !g.is_empty()) {
        if let Ok(gid) = group.parse::<u32>() {
            return Ok(gid);
        }
        return match Group::from_name(group) {
            Ok(Some(entry)) => Ok(entry.gid.as_raw()),
            Ok(None) => Err(Error::validation("group", format!("No such group: {group}"))),
            Err(e) => Err(Error::validation(
                "group",
                format!("cannot look up group {group}: {e}"),
            )),
        };
    }

    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => Ok(user.gid.as_raw()),
        _ if uid == current_uid() => Ok(current_gid()),
        _ => Err(Error::validation(
            "group",
            format!("cannot determine the primary group of uid {uid}"),
        )),
    }
}

/// Looks up the name of a gid, for display.
#[must_use]
pub fn group_name(gid: u32) -> Option<String> {
    Group::from_gid(Gid::from_raw(gid)).ok().flatten().map(|g| g.name)
}

/// Looks up the name of a uid, for display.
#[must_use]
pub fn user_name(uid: u32) -> Option<String> {
    User::from_uid(Uid::from_raw(uid)).ok().flatten().map(|u| u.name)
}
