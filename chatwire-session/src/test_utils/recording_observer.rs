//! RecordingObserver: captures transcript changes in write order.

use crate::transcript::{TranscriptChange, TranscriptObserver};
use std::sync::Mutex;

/// An observer that records every [`TranscriptChange`].
#[derive(Debug, Default)]
pub struct RecordingObserver {
    changes: Mutex<Vec<TranscriptChange>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a snapshot of all recorded changes.
    pub fn changes(&self) -> Vec<TranscriptChange> {
        self.changes.lock().unwrap().clone()
    }
}

impl TranscriptObserver for RecordingObserver {
    fn on_change(&self, change: &TranscriptChange) {
        self.changes.lock().unwrap().push(change.clone());
    }
}
