use serde::Serialize;
use tokio::sync::mpsc;

/// Progress notifications emitted by long-running scan and execute calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProgressEvent {
    ScanStarted { roots: usize },
    /// `fraction` covers the walk phase only.
    Scanning { location: String, fraction: f64 },
    Hashing { done: usize, total: usize },
    ScanFinished { total_files: usize },
    Executing { operation: String, fraction: f64 },
    ExecutionFinished { succeeded: usize, failed: usize },
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

pub(crate) fn emit(sender: Option<&ProgressSender>, event: ProgressEvent) {
    if let Some(tx) = sender {
        // A dropped receiver just means nobody is watching.
        let _ = tx.send(event);
    }
}
