//! Path handling.
//!
//! Two kinds of paths meet during a reconciliation:
//!
//! - **Archive paths** ([`ArchivePath`]): entry names relative to the
//!   archive root. Destination walks are converted to the same form so the
//!   two sides can be compared as plain sets.
//! - **Destination paths**: absolute filesystem paths beneath the
//!   destination root, normalized from user input by [`normalize`] and
//!   snapshotted from disk by [`walk`].
//!
//! # Examples
//!
//! ```
//! use dircopy::path::ArchivePath;
//! use std::path::Path;
//!
//! let entry = ArchivePath::parse("./b/c").unwrap();
//! assert_eq!(entry.under(Path::new("/srv/www")), Path::new("/srv/www/b/c"));
//! ```

pub mod archive_path;
pub mod normalize;
pub mod walk;

pub use archive_path::ArchivePath;
pub use normalize::{normalize, validate_destination};
pub use walk::{walk_tree, DestinationEntry, EntryKind, TreeSets};

#[cfg(test)]
mod proptests;
