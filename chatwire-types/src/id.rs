//! Typed ID wrappers for apps, models, conversations, and messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up conversation IDs, message IDs, etc.
/// These are plain strings underneath. The server decides what they look like.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(AppId, "Identifier of a chat application on the platform.");
typed_id!(ModelId, "Identifier of the model that answers a prompt.");
typed_id!(ConversationId, "Server-issued identifier of a conversation.");
typed_id!(MessageId, "Server-issued identifier of one question/answer exchange.");
typed_id!(LocalId, "Client-generated identifier for an entry the server has not confirmed yet.");

impl LocalId {
    /// Generate a fresh temporary identifier.
    pub fn generate() -> Self {
        Self(format!("tmp-{}", uuid::Uuid::new_v4()))
    }
}

/// Identifier of a transcript entry.
///
/// Entries start out [`Temporary`](EntryId::Temporary) when they are created
/// optimistically and are swapped to [`Durable`](EntryId::Durable) once the
/// server has issued a message id. The swap happens at most once.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntryId {
    /// Client-generated, not yet confirmed by the server.
    Temporary(LocalId),
    /// Derived from a server-issued message id.
    Durable(String),
}

impl EntryId {
    /// A fresh temporary identifier.
    pub fn temporary() -> Self {
        EntryId::Temporary(LocalId::generate())
    }

    /// Derive a durable identifier from a message id and a role suffix,
    /// e.g. `"m1"` + `"-answer"` gives `"m1-answer"`.
    pub fn durable(message_id: &MessageId, suffix: &str) -> Self {
        EntryId::Durable(format!("{message_id}{suffix}"))
    }

    /// Whether the server has confirmed this identifier.
    pub fn is_durable(&self) -> bool {
        matches!(self, EntryId::Durable(_))
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        match self {
            EntryId::Temporary(local) => local.as_str(),
            EntryId::Durable(id) => id,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_local_ids_are_unique() {
        let a = LocalId::generate();
        let b = LocalId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("tmp-"));
    }

    #[test]
    fn durable_id_appends_suffix() {
        let id = EntryId::durable(&MessageId::new("m1"), "-answer");
        assert_eq!(id, EntryId::Durable("m1-answer".into()));
        assert!(id.is_durable());
        assert_eq!(id.to_string(), "m1-answer");
    }

    #[test]
    fn temporary_id_is_not_durable() {
        let id = EntryId::temporary();
        assert!(!id.is_durable());
        assert!(id.as_str().starts_with("tmp-"));
    }

    #[test]
    fn typed_ids_serialize_as_plain_strings() {
        let id = ConversationId::new("c1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c1\"");
    }
}
