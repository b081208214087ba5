//! Progress reporting and cancellation for long-running batch loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::LabelOpsError;

/// Receives advisory progress updates from entry loops.
pub trait ProgressReporter {
    /// Called once before the first entry.
    fn start(&mut self, label: &str, total: usize);
    /// Called after each entry with the number of entries handled so far.
    fn advance(&mut self, done: usize);
    /// Called once after the loop completes.
    fn finish(&mut self, done: usize);
}

/// Prints `<label>: <done>/<total>` to stderr every `every` entries, keeping
/// stdout for the report.
#[derive(Clone, Debug)]
pub struct StderrProgress {
    every: usize,
    label: String,
    total: usize,
}

impl StderrProgress {
    /// `every == 0` disables output.
    pub fn new(every: usize) -> Self {
        Self {
            every,
            label: String::new(),
            total: 0,
        }
    }
}

impl ProgressReporter for StderrProgress {
    fn start(&mut self, label: &str, total: usize) {
        self.label = label.to_string();
        self.total = total;
    }

    fn advance(&mut self, done: usize) {
        if self.every > 0 && done % self.every == 0 {
            eprintln!("{}: {}/{}", self.label, done, self.total);
        }
    }

    fn finish(&mut self, done: usize) {
        if self.every > 0 && done % self.every != 0 {
            eprintln!("{}: {}/{}", self.label, done, self.total);
        }
    }
}

/// Discards all progress updates.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn start(&mut self, _label: &str, _total: usize) {}
    fn advance(&mut self, _done: usize) {}
    fn finish(&mut self, _done: usize) {}
}

/// Shared flag set from a signal handler and polled at entry boundaries.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-run collaborators threaded through the batch operations.
pub struct RunContext {
    pub progress: Box<dyn ProgressReporter>,
    pub cancel: CancelFlag,
}

impl RunContext {
    pub fn new(progress: Box<dyn ProgressReporter>, cancel: CancelFlag) -> Self {
        Self { progress, cancel }
    }

    /// A context with no progress output and a flag nobody sets.
    pub fn silent() -> Self {
        Self::new(Box::new(SilentProgress), CancelFlag::new())
    }

    /// Fail with [`LabelOpsError::Interrupted`] once cancellation was requested.
    pub fn checkpoint(&self) -> Result<(), LabelOpsError> {
        if self.cancel.is_cancelled() {
            Err(LabelOpsError::Interrupted)
        } else {
            Ok(())
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::silent()
    }
}
