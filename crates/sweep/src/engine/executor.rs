use crate::config::Settings;
use crate::engine::archiver::{archiver_from_settings, Archiver};
use crate::engine::paths::{ensure_dir, expand_tilde, move_to_free_path};
use crate::engine::rollback;
use crate::engine::trash::{discover_trash_dir, ensure_trash_dir};
use crate::error::{FailureKind, Result, SweepError};
use crate::model::{ActionId, ActionKind, CleanupAction, FileRecord, ScanReport, UndoEntry};
use crate::progress::{emit, ProgressEvent, ProgressSender};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Trash folder for delete actions. `None` makes deletes fail with
    /// `TrashUnavailable`.
    pub trash_dir: Option<PathBuf>,
    /// Refuse to act on files whose size or modification time changed since
    /// the scan.
    pub verify_unchanged: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            trash_dir: discover_trash_dir().ok(),
            verify_unchanged: true,
        }
    }
}

impl ExecutorOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let trash_dir = match &settings.trash_dir {
            Some(dir) => Some(expand_tilde(&dir.to_string_lossy())),
            None => match discover_trash_dir() {
                Ok(dir) => Some(dir),
                Err(e) => {
                    log::warn!("No trash folder available: {}", e);
                    None
                }
            },
        };
        Self {
            trash_dir,
            verify_unchanged: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ActionOutcome {
    Completed { location: PathBuf },
    Failed { kind: FailureKind, message: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub id: ActionId,
    pub kind: ActionKind,
    pub file: PathBuf,
    pub outcome: ActionOutcome,
}

impl ActionReport {
    fn new(action: &CleanupAction, outcome: ActionOutcome) -> Self {
        Self {
            id: action.id,
            kind: action.kind,
            file: action.file.path.clone(),
            outcome,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, ActionOutcome::Completed { .. })
    }
}

/// Per-action results of one batch, in submission order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionSummary {
    pub results: Vec<ActionReport>,
}

impl ExecutionSummary {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.succeeded())
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, ActionOutcome::Failed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, ActionOutcome::Skipped { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ActionReport, FailureKind)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            ActionOutcome::Failed { kind, .. } => Some((r, *kind)),
            _ => None,
        })
    }
}

/// State shared with the blocking task that performs one action.
#[derive(Clone)]
struct ActionContext {
    archiver: Arc<dyn Archiver>,
    trash_dir: Option<PathBuf>,
    verify_unchanged: bool,
}

/// Applies cleanup actions one at a time and keeps the undo stack for them.
///
/// One batch at a time: `execute` and the undo methods take `&mut self`.
pub struct Executor {
    archiver: Arc<dyn Archiver>,
    options: ExecutorOptions,
    undo_stack: Vec<UndoEntry>,
    progress: Option<ProgressSender>,
    cancel: CancellationToken,
}

impl Executor {
    pub fn new(archiver: Arc<dyn Archiver>, options: ExecutorOptions) -> Self {
        Self {
            archiver,
            options,
            undo_stack: Vec::new(),
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            archiver_from_settings(settings),
            ExecutorOptions::from_settings(settings),
        )
    }

    pub fn with_progress(mut self, sender: ProgressSender) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Drops the progress sender so the receiving end sees the channel close.
    pub fn clear_progress(&mut self) {
        self.progress = None;
    }

    fn context(&self) -> ActionContext {
        ActionContext {
            archiver: Arc::clone(&self.archiver),
            trash_dir: self.options.trash_dir.clone(),
            verify_unchanged: self.options.verify_unchanged,
        }
    }

    /// Runs `actions` in order. A failing action does not stop the batch,
    /// except when the trash is unavailable or the batch is cancelled; the
    /// remaining actions are then reported as skipped.
    pub async fn execute(&mut self, actions: &[CleanupAction]) -> ExecutionSummary {
        let total = actions.len();
        let mut summary = ExecutionSummary::default();
        let mut halted: Option<String> = None;

        for (index, action) in actions.iter().enumerate() {
            if halted.is_none() && self.cancel.is_cancelled() {
                halted = Some("cancelled".to_string());
            }
            if let Some(reason) = &halted {
                summary.results.push(ActionReport::new(
                    action,
                    ActionOutcome::Skipped { reason: reason.clone() },
                ));
                continue;
            }

            emit(
                self.progress.as_ref(),
                ProgressEvent::Executing {
                    operation: format!("Processing: {}", action.file.name),
                    fraction: index as f64 / total as f64,
                },
            );

            let ctx = self.context();
            let owned = action.clone();
            let result = match tokio::task::spawn_blocking(move || perform(&ctx, &owned)).await {
                Ok(result) => result,
                Err(e) => Err(e.into()),
            };

            match result {
                Ok(entry) => {
                    log::info!(
                        "{} {} {} -> {}",
                        action.id,
                        action.kind,
                        action.file.path.display(),
                        entry.current_location.display()
                    );
                    summary.results.push(ActionReport::new(
                        action,
                        ActionOutcome::Completed {
                            location: entry.current_location.clone(),
                        },
                    ));
                    self.undo_stack.push(entry);
                }
                Err(e) => {
                    log::error!(
                        "{} {} {} failed: {}",
                        action.id,
                        action.kind,
                        action.file.path.display(),
                        e
                    );
                    if let SweepError::TrashUnavailable(msg) = &e {
                        halted = Some(format!("trash unavailable: {}", msg));
                    }
                    summary.results.push(ActionReport::new(
                        action,
                        ActionOutcome::Failed {
                            kind: e.kind(),
                            message: e.to_string(),
                        },
                    ));
                }
            }
        }

        emit(
            self.progress.as_ref(),
            ProgressEvent::Executing {
                operation: String::new(),
                fraction: 1.0,
            },
        );
        emit(
            self.progress.as_ref(),
            ProgressEvent::ExecutionFinished {
                succeeded: summary.success_count(),
                failed: summary.failure_count(),
            },
        );

        summary
    }

    /// Runs the report's suggested actions whose ids are in `ids`.
    pub async fn execute_selected(&mut self, report: &ScanReport, ids: &[ActionId]) -> ExecutionSummary {
        let actions = report.select(ids);
        self.execute(&actions).await
    }

    /// Reverts the most recent action. The entry is popped only after the
    /// reversal succeeds, so a failed undo can be retried or discarded.
    pub async fn try_undo_last(&mut self) -> Result<UndoEntry> {
        let entry = self.undo_stack.last().cloned().ok_or(SweepError::NothingToUndo)?;

        let archiver = Arc::clone(&self.archiver);
        let target = entry.clone();
        tokio::task::spawn_blocking(move || rollback::revert(&target, archiver.as_ref())).await??;

        self.undo_stack.pop();
        Ok(entry)
    }

    pub async fn undo_last(&mut self) -> bool {
        match self.try_undo_last().await {
            Ok(_) => true,
            Err(SweepError::NothingToUndo) => false,
            Err(e) => {
                log::error!("Undo failed: {}", e);
                false
            }
        }
    }

    /// Drops the most recent entry without reverting it.
    pub fn discard_last(&mut self) -> Option<UndoEntry> {
        self.undo_stack.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn undo_stack(&self) -> &[UndoEntry] {
        &self.undo_stack
    }
}

fn perform(ctx: &ActionContext, action: &CleanupAction) -> Result<UndoEntry> {
    check_target(&action.file, ctx.verify_unchanged)?;

    let current_location = match action.kind {
        ActionKind::Move => move_into_category(action)?,
        ActionKind::Archive => archive_file(ctx, action)?,
        ActionKind::Delete => trash_file(ctx, &action.file)?,
        ActionKind::Compress => compress_file(ctx, action)?,
    };

    Ok(UndoEntry {
        current_location,
        original_location: action.file.path.clone(),
        kind: action.kind,
        timestamp: Utc::now(),
    })
}

fn check_target(file: &FileRecord, verify_unchanged: bool) -> Result<()> {
    let metadata = match fs::metadata(&file.path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SweepError::TargetMissing(file.path.clone()));
        }
        Err(source) => {
            return Err(SweepError::Read {
                path: file.path.clone(),
                source,
            })
        }
    };

    if !metadata.is_file() {
        return Err(SweepError::TargetChanged {
            path: file.path.clone(),
        });
    }

    if verify_unchanged {
        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        if metadata.len() != file.size || modified != Some(file.modified_at) {
            return Err(SweepError::TargetChanged {
                path: file.path.clone(),
            });
        }
    }
    Ok(())
}

fn move_into_category(action: &CleanupAction) -> Result<PathBuf> {
    let folder = expand_tilde(&action.destination).join(action.file.category.display_name());
    ensure_dir(&folder)?;

    move_to_free_path(&action.file.path, &folder.join(&action.file.name))
}

fn archive_file(ctx: &ActionContext, action: &CleanupAction) -> Result<PathBuf> {
    let file = &action.file;
    let archive_dir = expand_tilde(&action.destination);
    ensure_dir(&archive_dir)?;

    let archive_name = format!(
        "{}_{}.{}",
        file.name,
        file.modified_at.format("%Y%m%d"),
        ctx.archiver.extension()
    );

    // The archiver only sees a staged copy; `staging` is removed on drop.
    let staging = tempfile::Builder::new().prefix("sweep-stage-").tempdir()?;
    let staged = staging.path().join(&file.name);
    fs::copy(&file.path, &staged)?;
    let built = staging.path().join(&archive_name);
    ctx.archiver.compress(&staged, &built)?;

    let dest = move_to_free_path(&built, &archive_dir.join(&archive_name))?;
    remove_original(&file.path, &dest)?;
    Ok(dest)
}

fn compress_file(ctx: &ActionContext, action: &CleanupAction) -> Result<PathBuf> {
    let file = &action.file;
    let compress_dir = expand_tilde(&action.destination);
    ensure_dir(&compress_dir)?;

    let archive_name = format!("{}.{}", file.name, ctx.archiver.extension());

    // Built in a private staging dir, then claimed under a free name.
    let staging = tempfile::Builder::new().prefix("sweep-stage-").tempdir()?;
    let built = staging.path().join(&archive_name);
    ctx.archiver.compress(&file.path, &built)?;

    let dest = move_to_free_path(&built, &compress_dir.join(&archive_name))?;
    remove_original(&file.path, &dest)?;
    Ok(dest)
}

/// Deletes the source after a successful compression. If that fails the new
/// archive is removed so only the original remains.
fn remove_original(original: &Path, archive: &Path) -> Result<()> {
    if let Err(e) = fs::remove_file(original) {
        let _ = fs::remove_file(archive);
        return Err(e.into());
    }
    Ok(())
}

fn trash_file(ctx: &ActionContext, file: &FileRecord) -> Result<PathBuf> {
    let trash_dir = ctx
        .trash_dir
        .as_ref()
        .ok_or_else(|| SweepError::TrashUnavailable("no trash folder configured".to_string()))?;
    let trash_dir = ensure_trash_dir(trash_dir)?;

    move_to_free_path(&file.path, &trash_dir.join(&file.name))
}
