//! Reconciliation operations.
//!
//! A run moves through a small state machine ([`Reconciler`]). Every
//! filesystem mutation goes through an [`FsExecutor`], which turns each
//! primitive into a no-op in dry-run mode, so a dry run follows exactly the
//! same path as a real one.
//!
//! # Examples
//!
//! ```no_run
//! use dircopy::operations::{ReconcileRequest, Reconciler};
//! use dircopy::SyncOptions;
//!
//! let options = SyncOptions { dry_run: true, ..Default::default() };
//! let request = ReconcileRequest::new("/tmp/app.tar", "/opt/app", options);
//!
//! let mut reconciler = Reconciler::new(request);
//! let result = reconciler.run().unwrap();
//! assert!(result.dry_run);
//! println!("{} action(s) planned", result.plan.len());
//! ```

pub mod executor;
pub mod permissions;
pub mod plan;
pub mod prune;
pub mod reconcile;
pub mod report;

pub use executor::FsExecutor;
pub use permissions::{PermissionOutcome, PermissionReconciler};
pub use plan::ReconciliationPlan;
pub use prune::{PruneEngine, PruneResult, Spares};
pub use reconcile::{ReconcileRequest, ReconcileState, Reconciler};
pub use report::{
    DiffRecorder, DiffReport, PathState, ReconcileResult, ResultBuilder, VerboseDetails, NO_UPDATE,
};
