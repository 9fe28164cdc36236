//! Where absorbed read failures go.

use parking_lot::Mutex;

use kh_domain::trace::TraceEvent;

/// A record read that failed and was turned into `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFailure {
    pub session_id: String,
    /// Logical (pre-normalization) record id.
    pub record_id: String,
    pub reason: String,
}

/// Receives read failures the store absorbed.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, failure: &ReadFailure);
}

/// Default reporter: a `kh_event` trace line plus a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, failure: &ReadFailure) {
        tracing::warn!(
            session_id = %failure.session_id,
            record_id = %failure.record_id,
            reason = %failure.reason,
            "session record unreadable, treating as absent"
        );
        TraceEvent::ReadAbsorbed {
            session_id: failure.session_id.clone(),
            record_id: failure.record_id.clone(),
            reason: failure.reason.clone(),
        }
        .emit();
    }
}

/// Keeps every reported failure in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    failures: Mutex<Vec<ReadFailure>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<ReadFailure> {
        self.failures.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.failures.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.lock().is_empty()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, failure: &ReadFailure) {
        self.failures.lock().push(failure.clone());
    }
}
