pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod model;
pub mod progress;
pub mod util;

pub use config::{Config, Settings};
pub use engine::{
    ActionOutcome, ActionReport, Archiver, ArchiverKind, ExecutionSummary, Executor,
    ExecutorOptions, Planner, PlannerOptions, TarGzArchiver, ZipCommandArchiver,
};
pub use error::{FailureKind, Result, SweepError};
pub use index::{Classifier, Fingerprint, ScanOptions, Scanner};
pub use model::{ActionId, ActionKind, Category, CleanupAction, FileRecord, ScanReport, UndoEntry};
pub use progress::{progress_channel, ProgressEvent, ProgressReceiver, ProgressSender};
