//! The shared, observable chat transcript.
//!
//! All writes go through one `RwLock`, so concurrent sessions and UI actions
//! touching the same transcript are serialized. Observers are notified while
//! the write lock is held, which keeps notifications in write order; they
//! must not block.

use std::sync::Arc;

use chatwire_types::{EntryId, TranscriptEntry};
use tokio::sync::RwLock;

/// A change applied to a [`Transcript`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptChange {
    /// A user/assistant pair was appended.
    ExchangeAppended {
        /// Id of the user entry.
        user: EntryId,
        /// Id of the assistant entry.
        assistant: EntryId,
    },
    /// Both entries of an exchange swapped to durable ids in one write.
    IdentifiersReconciled {
        /// `(old, new)` id of the user entry.
        user: (EntryId, EntryId),
        /// `(old, new)` id of the assistant entry.
        assistant: (EntryId, EntryId),
    },
    /// An entry's content was replaced with the full new text.
    ContentReplaced {
        /// Entry that changed.
        id: EntryId,
        /// Its complete content after the change.
        content: String,
    },
}

/// Observes transcript writes, e.g. to re-render a view.
pub trait TranscriptObserver: Send + Sync {
    /// Called once per applied change, in write order.
    fn on_change(&self, change: &TranscriptChange);
}

/// Ordered list of [`TranscriptEntry`] values with observer notification.
pub struct Transcript {
    entries: RwLock<Vec<TranscriptEntry>>,
    observers: Vec<Arc<dyn TranscriptObserver>>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            observers: Vec::new(),
        }
    }

    /// Create a transcript seeded with earlier history.
    pub fn with_history(entries: Vec<TranscriptEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
            observers: Vec::new(),
        }
    }

    /// Register an observer.
    pub fn with_observer(mut self, observer: Arc<dyn TranscriptObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Register an observer (mutable).
    pub fn add_observer(&mut self, observer: Arc<dyn TranscriptObserver>) {
        self.observers.push(observer);
    }

    /// Snapshot of all entries.
    pub async fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries.read().await.clone()
    }

    /// Look up one entry by id.
    pub async fn get(&self, id: &EntryId) -> Option<TranscriptEntry> {
        self.entries.read().await.iter().find(|e| &e.id == id).cloned()
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the transcript has no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Append a user/assistant pair.
    pub async fn append_exchange(&self, user: TranscriptEntry, assistant: TranscriptEntry) {
        let mut entries = self.entries.write().await;
        let change = TranscriptChange::ExchangeAppended {
            user: user.id.clone(),
            assistant: assistant.id.clone(),
        };
        entries.push(user);
        entries.push(assistant);
        self.notify(&change);
    }

    /// Swap both entries of an exchange to durable ids in a single write.
    ///
    /// Either both ids change or neither does: returns `false` without
    /// touching anything if either entry is missing or already durable.
    pub async fn reconcile(
        &self,
        user: &EntryId,
        assistant: &EntryId,
        durable_user: EntryId,
        durable_assistant: EntryId,
    ) -> bool {
        let mut entries = self.entries.write().await;
        let user_idx = entries.iter().position(|e| &e.id == user);
        let assistant_idx = entries.iter().position(|e| &e.id == assistant);

        let (Some(u), Some(a)) = (user_idx, assistant_idx) else {
            return false;
        };
        if entries[u].id.is_durable() || entries[a].id.is_durable() {
            return false;
        }

        entries[u].id = durable_user.clone();
        entries[a].id = durable_assistant.clone();
        self.notify(&TranscriptChange::IdentifiersReconciled {
            user: (user.clone(), durable_user),
            assistant: (assistant.clone(), durable_assistant),
        });
        true
    }

    /// Replace an entry's content. Returns `false` if the entry is missing.
    pub async fn replace_content(&self, id: &EntryId, content: &str) -> bool {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.iter_mut().find(|e| &e.id == id) else {
            return false;
        };
        entry.content.clear();
        entry.content.push_str(content);
        self.notify(&TranscriptChange::ContentReplaced {
            id: id.clone(),
            content: content.to_string(),
        });
        true
    }

    fn notify(&self, change: &TranscriptChange) {
        for observer in &self.observers {
            observer.on_change(change);
        }
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcript")
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingObserver;
    use chatwire_types::{MessageId, Role};

    fn exchange() -> (TranscriptEntry, TranscriptEntry) {
        (
            TranscriptEntry::optimistic(Role::User, "Hi"),
            TranscriptEntry::optimistic(Role::Assistant, ""),
        )
    }

    #[tokio::test]
    async fn append_exchange_adds_pair_in_order() {
        let transcript = Transcript::new();
        let (user, assistant) = exchange();
        transcript.append_exchange(user.clone(), assistant.clone()).await;

        let entries = transcript.entries().await;
        assert_eq!(entries, vec![user, assistant]);
    }

    #[tokio::test]
    async fn reconcile_swaps_both_ids_once() {
        let observer = Arc::new(RecordingObserver::new());
        let transcript = Transcript::new().with_observer(observer.clone());
        let (user, assistant) = exchange();
        transcript.append_exchange(user.clone(), assistant.clone()).await;

        let m1 = MessageId::new("m1");
        let swapped = transcript
            .reconcile(
                &user.id,
                &assistant.id,
                EntryId::durable(&m1, "-question"),
                EntryId::durable(&m1, "-answer"),
            )
            .await;
        assert!(swapped);

        let ids: Vec<String> = transcript
            .entries()
            .await
            .iter()
            .map(|e| e.id.to_string())
            .collect();
        assert_eq!(ids, vec!["m1-question", "m1-answer"]);

        // Old ids are gone, so a second attempt changes nothing.
        let again = transcript
            .reconcile(
                &user.id,
                &assistant.id,
                EntryId::durable(&m1, "-q"),
                EntryId::durable(&m1, "-a"),
            )
            .await;
        assert!(!again);

        let reconciled = observer
            .changes()
            .iter()
            .filter(|c| matches!(c, TranscriptChange::IdentifiersReconciled { .. }))
            .count();
        assert_eq!(reconciled, 1);
    }

    #[tokio::test]
    async fn reconcile_with_one_missing_entry_changes_nothing() {
        let transcript = Transcript::new();
        let (user, assistant) = exchange();
        transcript.append_exchange(user.clone(), assistant.clone()).await;

        let stranger = EntryId::temporary();
        let m1 = MessageId::new("m1");
        let swapped = transcript
            .reconcile(
                &user.id,
                &stranger,
                EntryId::durable(&m1, "-question"),
                EntryId::durable(&m1, "-answer"),
            )
            .await;
        assert!(!swapped);
        assert!(transcript.entries().await.iter().all(|e| !e.id.is_durable()));
    }

    #[tokio::test]
    async fn replace_content_overwrites_and_notifies() {
        let observer = Arc::new(RecordingObserver::new());
        let transcript = Transcript::new().with_observer(observer.clone());
        let (user, assistant) = exchange();
        transcript.append_exchange(user, assistant.clone()).await;

        assert!(transcript.replace_content(&assistant.id, "Hello").await);
        assert!(transcript.replace_content(&assistant.id, "HelloWorld").await);
        assert_eq!(
            transcript.get(&assistant.id).await.unwrap().content,
            "HelloWorld"
        );
        assert!(!transcript.replace_content(&EntryId::temporary(), "x").await);

        let changes = observer.changes();
        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes[2],
            TranscriptChange::ContentReplaced {
                id: assistant.id,
                content: "HelloWorld".into()
            }
        );
    }

    #[tokio::test]
    async fn history_is_preserved() {
        let (user, assistant) = exchange();
        let transcript = Transcript::with_history(vec![user, assistant]);
        assert_eq!(transcript.len().await, 2);
        assert!(!transcript.is_empty().await);
    }
}
