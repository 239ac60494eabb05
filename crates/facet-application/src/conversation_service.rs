//! Conversation store operations.
//!
//! Maintains the ordered conversation collection
//! (most-recent-activity-first) in memory and re-persists it after every
//! mutation. Any append moves the touched conversation to the front.

use crate::context::SessionContext;
use facet_core::conversation::{Conversation, ConversationMessage, ConversationRepository};
use facet_core::{FacetError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Manages the conversation collection on top of a repository backend.
pub struct ConversationService {
    repository: Arc<dyn ConversationRepository>,
    conversations: RwLock<Vec<Conversation>>,
}

impl ConversationService {
    /// Creates the service, loading the persisted collection.
    pub async fn load(repository: Arc<dyn ConversationRepository>) -> Result<Self> {
        let conversations = repository.load_all().await?;
        Ok(Self {
            repository,
            conversations: RwLock::new(conversations),
        })
    }

    /// Returns the collection in order, most recent activity first.
    pub async fn list(&self) -> Vec<Conversation> {
        self.conversations.read().await.clone()
    }

    /// Looks up a conversation by id.
    pub async fn get(&self, id: &str) -> Option<Conversation> {
        self.conversations
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// The most recently active conversation, if any exists.
    pub async fn front(&self) -> Option<Conversation> {
        self.conversations.read().await.first().cloned()
    }

    /// Number of conversations in the collection.
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// Allocates a new empty conversation bound to the context's
    /// selections, prepends it, and persists.
    pub async fn create(&self, context: &SessionContext) -> Result<Conversation> {
        let conversation = Conversation::new(
            context.provider_id.clone(),
            context.model_id.clone(),
            context.persona_id.clone(),
        );

        let mut conversations = self.conversations.write().await;
        conversations.insert(0, conversation.clone());
        self.repository.save_all(&conversations).await?;
        tracing::debug!("Created conversation {}", conversation.id);

        Ok(conversation)
    }

    /// Appends a message to the conversation named by the context.
    ///
    /// Returns `false` without failing when the id matches nothing; the
    /// active id should always be valid, but a stale one must not bring
    /// the session down. On success the conversation's bindings are
    /// refreshed from the context, the title is derived from the first
    /// user message while still default, the conversation moves to the
    /// front, and the collection is persisted.
    pub async fn append_message(
        &self,
        context: &SessionContext,
        message: ConversationMessage,
    ) -> Result<bool> {
        let mut conversations = self.conversations.write().await;
        let Some(position) = conversations
            .iter()
            .position(|c| c.id == context.conversation_id)
        else {
            tracing::warn!(
                "Dropping message for unknown conversation {}",
                context.conversation_id
            );
            return Ok(false);
        };

        let mut conversation = conversations.remove(position);
        conversation.provider = context.provider_id.clone();
        conversation.model = context.model_id.clone();
        conversation.persona_id = context.persona_id.clone();
        conversation.push_message(message);
        conversations.insert(0, conversation);

        self.repository.save_all(&conversations).await?;
        Ok(true)
    }

    /// Removes the conversation with the given id and persists.
    ///
    /// Returns `false` (no-op) when the id matches nothing. Activating a
    /// successor is the session controller's concern.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut conversations = self.conversations.write().await;
        let before = conversations.len();
        conversations.retain(|c| c.id != id);
        if conversations.len() == before {
            return Ok(false);
        }

        self.repository.save_all(&conversations).await?;
        tracing::debug!("Deleted conversation {id}");
        Ok(true)
    }

    /// Sets a new title on the conversation, in place.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id matches nothing.
    pub async fn rename(&self, id: &str, title: impl Into<String>) -> Result<()> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| FacetError::not_found("conversation", id))?;
        conversation.title = title.into();

        self.repository.save_all(&conversations).await?;
        Ok(())
    }
}
