//! Conversation repository trait.
//!
//! Defines the interface for conversation persistence operations.

use super::model::Conversation;
use crate::error::Result;

/// An abstract repository for managing conversation persistence.
///
/// The stored sequence preserves the collection's ordering
/// (most-recent-activity-first); implementations persist and return it
/// verbatim. Like [`crate::persona::PersonaRepository`], loads fail open:
/// a missing or unreadable record yields the empty collection.
#[async_trait::async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Retrieves all conversations in stored order.
    async fn load_all(&self) -> Result<Vec<Conversation>>;

    /// Saves all conversations, replacing the stored sequence.
    async fn save_all(&self, conversations: &[Conversation]) -> Result<()>;
}
