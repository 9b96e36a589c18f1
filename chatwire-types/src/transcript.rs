//! Transcript entry types.

use crate::id::EntryId;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The person typing prompts.
    User,
    /// The model answering them.
    Assistant,
}

/// One rendered turn of a conversation.
///
/// Entries are created once and then mutated in place: only `id` and
/// `content` ever change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Temporary until the server confirms the exchange.
    pub id: EntryId,
    /// Author of the entry.
    pub role: Role,
    /// Text shown for the entry.
    pub content: String,
    /// When the entry was created, for display.
    pub created_at: SystemTime,
}

impl TranscriptEntry {
    /// Create an entry with a fresh temporary id, stamped now.
    pub fn optimistic(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: EntryId::temporary(),
            role,
            content: content.into(),
            created_at: SystemTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimistic_entry_has_temporary_id() {
        let entry = TranscriptEntry::optimistic(Role::User, "Hello");
        assert!(!entry.id.is_durable());
        assert_eq!(entry.role, Role::User);
        assert_eq!(entry.content, "Hello");
    }
}
