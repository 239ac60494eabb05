//! Conversation domain model.
//!
//! A conversation is an append-only message log bound to the provider,
//! model, and persona that were active the last time a message was
//! appended. Conversations live in a collection ordered by most recent
//! activity first; ordering is maintained by the application layer.

use super::message::{ConversationMessage, MessageRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to a conversation before its first user message.
pub const DEFAULT_TITLE: &str = "New chat";

/// Maximum number of characters kept when deriving a title from the first
/// user message.
pub const TITLE_LIMIT: usize = 35;

/// A single conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier (UUID format)
    pub id: String,
    /// Human-readable label, auto-derived from the first user message
    pub title: String,
    /// Ordered message log, append-only within a session
    pub messages: Vec<ConversationMessage>,
    /// Provider id active the last time a message was appended
    pub provider: String,
    /// Model id active the last time a message was appended
    pub model: String,
    /// Weak reference to the persona active at last append; the referent
    /// may have been deleted, so it is resolved by lookup at read time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
    /// Timestamp when the conversation was created (ISO 8601 format)
    pub created_at: String,
}

impl Conversation {
    /// Creates an empty conversation bound to the given selections.
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        persona_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            provider: provider.into(),
            model: model.into(),
            persona_id,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whether the title is still the default placeholder.
    pub fn is_untitled(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    /// Appends a message, deriving the title from the first user message
    /// while the placeholder is still in place.
    pub fn push_message(&mut self, message: ConversationMessage) {
        if self.is_untitled() && message.role == MessageRole::User {
            self.title = derive_title(&message.content);
        }
        self.messages.push(message);
    }
}

/// Derives a conversation title from the first user message: the first
/// [`TITLE_LIMIT`] characters, with an ellipsis marker when truncated.
pub fn derive_title(text: &str) -> String {
    let mut title: String = text.chars().take(TITLE_LIMIT).collect();
    if text.chars().count() > TITLE_LIMIT {
        title.push_str("...");
    }
    title
}
