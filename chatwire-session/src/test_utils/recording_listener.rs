//! RecordingListener: captures every session notification in order.

use crate::reconcile::SessionListener;
use crate::session::{SessionReport, SessionState};
use chatwire_types::ConversationId;
use std::sync::Mutex;

/// A recorded session notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    /// `conversation_created` with the new id.
    ConversationCreated(String),
    /// `content_updated` with the full content.
    ContentUpdated(String),
    /// `finished` with the terminal state.
    Finished(SessionState),
}

/// A listener that records every notification.
/// Use `.events()` and `.reports()` to inspect what was recorded.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
    reports: Mutex<Vec<SessionReport>>,
}

impl RecordingListener {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a snapshot of all recorded events.
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Return every report passed to `finished`.
    pub fn reports(&self) -> Vec<SessionReport> {
        self.reports.lock().unwrap().clone()
    }

    /// Number of `conversation_created` notifications.
    pub fn conversations_created(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, ListenerEvent::ConversationCreated(_)))
            .count()
    }
}

impl SessionListener for RecordingListener {
    fn conversation_created(&self, conversation_id: &ConversationId) {
        self.events
            .lock()
            .unwrap()
            .push(ListenerEvent::ConversationCreated(conversation_id.to_string()));
    }

    fn content_updated(&self, content: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ListenerEvent::ContentUpdated(content.to_string()));
    }

    fn finished(&self, report: &SessionReport) {
        self.events
            .lock()
            .unwrap()
            .push(ListenerEvent::Finished(report.state));
        self.reports.lock().unwrap().push(report.clone());
    }
}
