use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File no longer exists: {0}")]
    TargetMissing(PathBuf),

    #[error("File changed since it was scanned: {path}")]
    TargetChanged { path: PathBuf },

    #[error("Destination is occupied: {path}")]
    Conflict { path: PathBuf },

    #[error("External tool error: {tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("Archive {archive} holds {entries} entries, expected exactly one file")]
    UndoMismatch { archive: PathBuf, entries: usize },

    #[error("Trash unavailable: {0}")]
    TrashUnavailable(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Background task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for SweepError {
    fn from(err: tokio::task::JoinError) -> Self {
        SweepError::Join(err.to_string())
    }
}

/// Coarse classification of a failure, reported to callers in place of the
/// underlying I/O error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FailureKind {
    ReadError,
    TargetMissing,
    Conflict,
    ExternalTool,
    UndoMismatch,
    TrashUnavailable,
    Cancelled,
    Io,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ReadError => "read_error",
            FailureKind::TargetMissing => "target_missing",
            FailureKind::Conflict => "conflict",
            FailureKind::ExternalTool => "external_tool",
            FailureKind::UndoMismatch => "undo_mismatch",
            FailureKind::TrashUnavailable => "trash_unavailable",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Io => "io",
        }
    }
}

impl SweepError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SweepError::Read { .. } => FailureKind::ReadError,
            SweepError::TargetMissing(_) => FailureKind::TargetMissing,
            SweepError::TargetChanged { .. } | SweepError::Conflict { .. } => FailureKind::Conflict,
            SweepError::ExternalTool { .. } => FailureKind::ExternalTool,
            SweepError::UndoMismatch { .. } => FailureKind::UndoMismatch,
            SweepError::TrashUnavailable(_) => FailureKind::TrashUnavailable,
            SweepError::Cancelled => FailureKind::Cancelled,
            SweepError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                FailureKind::TargetMissing
            }
            SweepError::Io(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                FailureKind::Conflict
            }
            SweepError::Io(_)
            | SweepError::Json(_)
            | SweepError::Config(_)
            | SweepError::NothingToUndo
            | SweepError::Join(_) => FailureKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_not_found_maps_to_target_missing() {
        let err = SweepError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.kind(), FailureKind::TargetMissing);
    }

    #[test]
    fn test_changed_and_conflict_share_kind() {
        let changed = SweepError::TargetChanged { path: PathBuf::from("/a") };
        let conflict = SweepError::Conflict { path: PathBuf::from("/a") };
        assert_eq!(changed.kind(), FailureKind::Conflict);
        assert_eq!(conflict.kind(), FailureKind::Conflict);
    }

    #[test]
    fn test_external_tool_message() {
        let err = SweepError::ExternalTool {
            tool: "zip".to_string(),
            message: "exit code 12".to_string(),
        };
        assert_eq!(err.to_string(), "External tool error: zip failed: exit code 12");
        assert_eq!(err.kind().as_str(), "external_tool");
    }
}
