#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # dircopy
//!
//! A library for reconciling a destination directory tree against a tar
//! archive.
//!
//! Given an already-staged archive and a destination root, a run extracts
//! only the entries that differ, optionally removes destination entries the
//! archive does not contain, and brings ownership and modes in line with a
//! single [`TargetSpec`]. Every run can be performed as a dry run that
//! reports the same plan without touching the disk.
//!
//! ## Core Types
//!
//! - [`Reconciler`] and [`ReconcileRequest`]: one reconciliation run
//! - [`ReconcileResult`]: what changed (or would change)
//! - [`ArchivePath`]: normalized archive-relative paths
//! - [`ModeString`] and [`TargetSpec`]: desired ownership and modes
//! - [`Error`] and [`Result`]: error handling types
//! - [`Logger`] and [`LogLevel`]: logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use dircopy::{ArchivePath, SyncOptions};
//!
//! // Archive entry names are normalized before comparison
//! let entry = ArchivePath::parse("./site/index.html").unwrap();
//! assert_eq!(entry.as_str(), "site/index.html");
//! assert_eq!(entry.depth(), 2);
//!
//! // Options default to a non-pruning, mutating run
//! let options = SyncOptions::default();
//! assert!(!options.identical);
//! assert!(!options.dry_run);
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod logging;
pub mod mode;
pub mod operations;
pub mod path;
pub mod principal;
pub mod target;

// Re-export key types at crate root for convenience
pub use archive::{ArchiveIndex, ContentDiff, ContentDiffer};
pub use config::{Config, ConfigBuilder, SyncOptions};
pub use error::{Error, Failure, FailureKind, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use mode::ModeString;
pub use operations::{ReconcileRequest, ReconcileResult, Reconciler};
pub use path::ArchivePath;
pub use target::TargetSpec;
