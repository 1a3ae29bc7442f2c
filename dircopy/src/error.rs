//! Error types for the dircopy library.
//!
//! This module provides the error hierarchy for fatal conditions, using
//! `thiserror` for ergonomic error handling. Conditions that must not stop a
//! reconciliation run (a single entry that cannot be extracted, removed or
//! re-permissioned) are not errors at this level; they are collected as
//! [`Failure`] records and reported in the run result.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for operations that may fail with a dircopy error.
///
/// # Examples
///
/// ```
/// use dircopy::{Error, Result};
///
/// fn example_operation() -> Result<u32> {
///     Ok(0o644)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the dircopy library.
///
/// Every variant is fatal: the run stops before (or without further)
/// mutation of the destination tree.
#[derive(Debug, Error)]
pub enum Error {
    /// A validation error occurred (bad mode string, unknown owner, ...).
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// An invalid filesystem path was provided.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
        /// The reason the path is invalid.
        reason: String,
    },

    /// The archive could not be opened or read.
    #[error("archive error for {}: {reason}", path.display())]
    Archive {
        /// Path of the archive.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// A configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// The destination tree could not be walked.
    #[error("tree walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if the error is a validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use dircopy::Error;
    ///
    /// let err = Error::Validation { field: "mode".into(), message: "bad".into() };
    /// assert!(err.is_validation());
    /// ```
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidPath { .. })
    }

    /// Check if the error concerns the archive.
    #[must_use]
    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Archive { .. })
    }

    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::Archive {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Category of a non-fatal, per-entry failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// An entry slated for update could not be extracted.
    Extraction,
    /// A spare entry could not be removed (typically a directory that is
    /// unexpectedly non-empty).
    PruneRace,
    /// An ownership or mode change was denied.
    Permission,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction => write!(f, "extraction"),
            Self::PruneRace => write!(f, "prune"),
            Self::Permission => write!(f, "permission"),
        }
    }
}

/// A non-fatal failure recorded during a run.
///
/// Failures never abort the remaining independent work; they are reported
/// and mark the overall result as failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// What kind of step failed.
    pub kind: FailureKind,
    /// The path the step was operating on.
    pub path: PathBuf,
    /// Human-readable cause.
    pub message: String,
}

impl Failure {
    /// Creates a new failure record.
    #[must_use]
    pub fn new(kind: FailureKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for {}: {}",
            self.kind,
            self.path.display(),
            self.message
        )
    }
}
