//! Dialogue record types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A persisted dialogue row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogue {
    /// Store-assigned identifier; never changes once assigned.
    pub id: i64,
    /// Owning user. Not checked against any users table.
    pub user_id: i64,
    /// Grouping key for one conversation.
    pub conversation_id: String,
    pub speaker: String,
    pub content: String,
}

/// Client-supplied fields of a dialogue that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDialogue {
    pub user_id: i64,
    pub conversation_id: String,
    pub speaker: String,
    pub content: String,
}

impl NewDialogue {
    /// Attach the store-assigned id.
    pub fn with_id(self, id: i64) -> Dialogue {
        Dialogue {
            id,
            user_id: self.user_id,
            conversation_id: self.conversation_id,
            speaker: self.speaker,
            content: self.content,
        }
    }
}

/// Which rows a collection lookup scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueFilter {
    All,
    User(i64),
    Conversation(String),
}

impl std::fmt::Display for DialogueFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogueFilter::All => write!(f, "all dialogues"),
            DialogueFilter::User(id) => write!(f, "user_id = {}", id),
            DialogueFilter::Conversation(id) => write!(f, "conversation_id = {}", id),
        }
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Single-row lookup matched nothing.
    #[error("dialogue {id} not found")]
    NotFound { id: i64 },

    /// Collection lookup matched nothing.
    #[error("no rows for {filter}")]
    EmptyResult { filter: DialogueFilter },

    /// Connection or statement failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The driver did not report the id of an inserted row.
    #[error("insert did not return a row id")]
    MissingInsertId,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_id_echoes_fields() {
        let new = NewDialogue {
            user_id: 7,
            conversation_id: "c1".into(),
            speaker: "bot".into(),
            content: "hi".into(),
        };
        let stored = new.clone().with_id(3);
        assert_eq!(stored.id, 3);
        assert_eq!(stored.user_id, new.user_id);
        assert_eq!(stored.conversation_id, new.conversation_id);
        assert_eq!(stored.speaker, new.speaker);
        assert_eq!(stored.content, new.content);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(StoreError::NotFound { id: 9 }.to_string(), "dialogue 9 not found");
        let empty = StoreError::EmptyResult {
            filter: DialogueFilter::Conversation("c9".into()),
        };
        assert_eq!(empty.to_string(), "no rows for conversation_id = c9");
    }
}
