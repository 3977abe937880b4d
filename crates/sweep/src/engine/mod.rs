pub mod archiver;
pub mod executor;
pub mod paths;
pub mod planner;
pub mod rollback;
pub mod trash;

pub use archiver::{archiver_from_settings, Archiver, ArchiverKind, TarGzArchiver, ZipCommandArchiver};
pub use executor::{ActionOutcome, ActionReport, ExecutionSummary, Executor, ExecutorOptions};
pub use planner::{Planner, PlannerOptions};
