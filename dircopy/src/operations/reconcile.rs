//! The reconciliation state machine.
//!
//! ```text
//! Start ─┬─> DestinationMissing ───────────────────────────> Reconciling ─> Done
//!        └─> DestinationExists ─┬─> Pruning (identical) ──> Reconciling ─> Done
//!                               └──────────────────────────> Reconciling
//! any state ─> Failed (fatal error)
//! ```
//!
//! Validation happens entirely in `Start`, before anything is touched.
//! Per-entry problems after that point are collected into the result and
//! never move the machine to `Failed`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::archive::{ArchiveEntryKind, ArchiveIndex, ContentDiffer, SelectiveExtractor};
use crate::config::SyncOptions;
use crate::error::{Error, Result};
use crate::operations::executor::FsExecutor;
use crate::operations::permissions::{PermissionOutcome, PermissionReconciler};
use crate::operations::plan::ReconciliationPlan;
use crate::operations::prune::{PruneEngine, PruneResult};
use crate::operations::report::{DiffRecorder, PathState, ReconcileResult, ResultBuilder};
use crate::path::{validate_destination, ArchivePath, EntryKind};
use crate::principal;
use crate::target::TargetSpec;

/// Inputs of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    /// Local path of the staged archive.
    pub archive: PathBuf,
    /// Absolute destination root.
    pub destination: PathBuf,
    /// Run options.
    pub options: SyncOptions,
}

impl ReconcileRequest {
    /// Creates a request.
    pub fn new(
        archive: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        options: SyncOptions,
    ) -> Self {
        Self {
            archive: archive.into(),
            destination: destination.into(),
            options,
        }
    }
}

/// States of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileState {
    /// Validating inputs.
    Start,
    /// The destination does not exist yet.
    DestinationMissing,
    /// The destination exists; comparing and extracting.
    DestinationExists,
    /// Removing spare entries.
    Pruning,
    /// Repairing ownership and modes.
    Reconciling,
    /// Finished; the result is available.
    Done,
    /// Stopped by a fatal error.
    Failed,
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::DestinationMissing => "destination-missing",
            Self::DestinationExists => "destination-exists",
            Self::Pruning => "pruning",
            Self::Reconciling => "reconciling",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs one reconciliation of a destination tree against an archive.
///
/// # Examples
///
/// ```no_run
/// use dircopy::{ReconcileRequest, Reconciler, SyncOptions};
///
/// let options = SyncOptions { identical: true, mode: Some("640".parse().unwrap()), ..Default::default() };
/// let request = ReconcileRequest::new("/tmp/site.tar.gz", "/srv/www/site", options);
///
/// let result = Reconciler::new(request).run().unwrap();
/// for line in &result.msg {
///     println!("{line}");
/// }
/// ```
#[derive(Debug)]
pub struct Reconciler {
    request: ReconcileRequest,
    state: ReconcileState,
    executor: FsExecutor,
}

/// Everything `Start` establishes.
struct Validated {
    target: TargetSpec,
    index: ArchiveIndex,
    exists: bool,
}

impl Reconciler {
    /// Creates a reconciler in the `Start` state.
    #[must_use]
    pub fn new(request: ReconcileRequest) -> Self {
        let executor = FsExecutor::new(request.options.dry_run);
        Self {
            request,
            state: ReconcileState::Start,
            executor,
        }
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> ReconcileState {
        self.state
    }

    /// Runs the machine to `Done` or `Failed`.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that moved the run to `Failed`: invalid
    /// input, an unreadable archive, a destination that is not a directory,
    /// or a filesystem error that prevents the run from continuing.
    pub fn run(&mut self) -> Result<ReconcileResult> {
        match self.execute() {
            Ok(result) => {
                self.transition(ReconcileState::Done);
                Ok(result)
            }
            Err(e) => {
                log::debug!("run failed: {e}");
                self.transition(ReconcileState::Failed);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: ReconcileState) {
        log::debug!("{} -> {next}", self.state);
        self.state = next;
    }

    fn execute(&mut self) -> Result<ReconcileResult> {
        let validated = self.validate()?;
        let options = &self.request.options;
        let mut recorder = DiffRecorder::new(options.verbose || options.diff);
        let mut builder = ResultBuilder::new(options.dry_run, options.verbose);

        let plan = if validated.exists {
            self.transition(ReconcileState::DestinationExists);
            self.update_existing(&validated, &mut recorder, &mut builder)?
        } else {
            self.transition(ReconcileState::DestinationMissing);
            self.create_missing(&validated, &mut recorder, &mut builder)?
        };

        Ok(builder.build(plan, recorder.finish(self.executor.is_dry_run())))
    }

    /// `Start`: checks every input before anything is touched.
    fn validate(&self) -> Result<Validated> {
        let request = &self.request;
        validate_destination(&request.destination)?;
        let target = TargetSpec::resolve(&request.options)?;
        let index = ArchiveIndex::list(&request.archive)?;

        let exists = match fs::metadata(&request.destination) {
            Ok(meta) if meta.is_dir() => true,
            Ok(_) => {
                return Err(Error::validation(
                    "destination",
                    format!(
                        "Destination ({}) is not a directory",
                        request.destination.display()
                    ),
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        log::debug!(
            "target {}:{} file mode {} dir mode {}",
            target.uid,
            target.gid,
            target.file_mode,
            target.dir_mode
        );
        Ok(Validated {
            target,
            index,
            exists,
        })
    }

    fn create_missing(
        &mut self,
        validated: &Validated,
        recorder: &mut DiffRecorder,
        builder: &mut ResultBuilder,
    ) -> Result<ReconciliationPlan> {
        let archive = self.request.archive.clone();
        let dest = self.request.destination.clone();
        let mut plan = ReconciliationPlan {
            files_to_update: validated.index.listed(),
            ..ReconciliationPlan::default()
        };

        recorder.touch(&dest);
        self.executor.create_dir_all(&dest)?;
        builder.created(&archive, &dest, plan.files_to_update.len());

        if self.executor.is_dry_run() {
            // Nothing exists to walk; report what extraction would produce.
            builder.extracted(&dest, &plan.files_to_update);
            self.transition(ReconcileState::Reconciling);
            recorder.predict(
                &dest,
                Some(PathState::new(
                    EntryKind::Directory,
                    0,
                    validated.target.uid,
                    validated.target.gid,
                    validated.target.dir_mode.bits(),
                    Utc::now().timestamp(),
                )),
            );
            self.predict_extracted(validated, &plan.files_to_update, recorder);
            return Ok(plan);
        }

        for path in &plan.files_to_update {
            recorder.touch(&path.under(&dest));
        }
        let extract =
            SelectiveExtractor::apply(&archive, &dest, &plan.files_to_update, &self.executor)?;
        builder.extracted(&dest, &extract.extracted);
        builder.failures(extract.failures);

        let counted = absolute(&dest, &extract.extracted);
        self.transition(ReconcileState::Reconciling);
        let outcome = self.reconcile_permissions(validated, &BTreeSet::new(), recorder)?;
        builder.permissions(&outcome, &counted);
        plan.ownership_mismatches = outcome.ownership_mismatches;
        plan.mode_mismatches = outcome.mode_mismatches;
        Ok(plan)
    }

    fn update_existing(
        &mut self,
        validated: &Validated,
        recorder: &mut DiffRecorder,
        builder: &mut ResultBuilder,
    ) -> Result<ReconciliationPlan> {
        let archive = self.request.archive.clone();
        let dest = self.request.destination.clone();
        let mut plan = ReconciliationPlan::default();

        let diff = ContentDiffer::compare(&archive, &dest)?;
        plan.files_to_update = diff.changed;
        for path in &plan.files_to_update {
            recorder.touch(&path.under(&dest));
        }

        let extract =
            SelectiveExtractor::apply(&archive, &dest, &plan.files_to_update, &self.executor)?;
        builder.extracted(&dest, &extract.extracted);
        builder.failures(extract.failures);
        self.predict_extracted(validated, &extract.extracted, recorder);

        let mut removed = BTreeSet::new();
        if self.request.options.identical {
            self.transition(ReconcileState::Pruning);
            let spares =
                PruneEngine::compute_spares(&validated.index.files, &validated.index.dirs, &dest)?;
            for path in spares.files.iter().chain(&spares.dirs) {
                recorder.touch(&path.under(&dest));
            }
            let pruned = PruneEngine::remove_spares(&spares, &dest, &self.executor);
            builder.pruned(&dest, &pruned);
            removed = removed_paths(&dest, &pruned);
            for path in &removed {
                recorder.predict(path, None);
            }
            plan.spare_files = spares.files;
            plan.spare_dirs = spares.dirs;
        }

        self.transition(ReconcileState::Reconciling);
        let counted = absolute(&dest, &extract.extracted);
        let outcome = self.reconcile_permissions(validated, &removed, recorder)?;
        builder.permissions(&outcome, &counted);
        plan.ownership_mismatches = outcome.ownership_mismatches;
        plan.mode_mismatches = outcome.mode_mismatches;
        Ok(plan)
    }

    /// `Reconciling`: repairs the final tree. Entries the run removed (or
    /// would remove) are left out of the outcome.
    fn reconcile_permissions(
        &self,
        validated: &Validated,
        removed: &BTreeSet<PathBuf>,
        recorder: &mut DiffRecorder,
    ) -> Result<PermissionOutcome> {
        let target = &validated.target;
        let mut outcome =
            PermissionReconciler::reconcile(&self.request.destination, target, &self.executor)?;
        outcome
            .ownership_mismatches
            .retain(|e| !removed.contains(&e.path));
        outcome.mode_mismatches.retain(|e| !removed.contains(&e.path));

        for entry in outcome
            .ownership_mismatches
            .iter()
            .chain(&outcome.mode_mismatches)
        {
            recorder.touch_entry(entry);
            if self.executor.is_dry_run() && !recorder.is_predicted(&entry.path) {
                let state = PathState::new(
                    entry.kind,
                    entry.size,
                    target.uid,
                    target.gid,
                    target.mode_for(entry.kind).bits(),
                    entry.mtime,
                );
                recorder.predict(&entry.path, Some(state));
            }
        }
        Ok(outcome)
    }

    /// Predicted end states of extracted entries (dry-run mode only).
    fn predict_extracted(
        &self,
        validated: &Validated,
        extracted: &BTreeSet<ArchivePath>,
        recorder: &mut DiffRecorder,
    ) {
        if !self.executor.is_dry_run() || !recorder.is_enabled() {
            return;
        }
        let target = &validated.target;
        for path in extracted {
            let Some(entry) = validated.index.entry(path) else {
                continue;
            };
            let kind = entry.kind.extracted_kind();
            let state = if entry.kind == ArchiveEntryKind::Symlink {
                PathState::new(
                    kind,
                    0,
                    principal::current_uid(),
                    principal::current_gid(),
                    0o777,
                    entry.mtime,
                )
            } else {
                PathState::new(
                    kind,
                    entry.size,
                    target.uid,
                    target.gid,
                    target.mode_for(kind).bits(),
                    entry.mtime,
                )
            };
            recorder.predict(&path.under(&self.request.destination), Some(state));
        }
    }
}

fn absolute(root: &Path, paths: &BTreeSet<ArchivePath>) -> BTreeSet<PathBuf> {
    paths.iter().map(|p| p.under(root)).collect()
}

fn removed_paths(root: &Path, pruned: &PruneResult) -> BTreeSet<PathBuf> {
    pruned
        .removed_files
        .iter()
        .chain(&pruned.removed_dirs)
        .map(|p| p.under(root))
        .collect()
}
