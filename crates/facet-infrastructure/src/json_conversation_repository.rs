//! JSON-file-backed ConversationRepository implementation.

use crate::json_store::JsonStore;
use crate::paths::FacetPaths;
use facet_core::Result;
use facet_core::conversation::{Conversation, ConversationRepository};
use std::path::PathBuf;

/// Stores the ordered conversation collection in
/// `~/.config/facet/conversations.json`.
///
/// The stored sequence is the collection's ordering
/// (most-recent-activity-first); it is persisted and returned verbatim.
pub struct JsonConversationRepository {
    store: JsonStore,
}

impl JsonConversationRepository {
    /// Creates a repository at the default record path.
    pub fn new() -> Result<Self> {
        let paths = FacetPaths::new(None)?;
        Ok(Self {
            store: JsonStore::new(paths.conversations_file()),
        })
    }

    /// Creates a repository at a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for JsonConversationRepository {
    async fn load_all(&self) -> Result<Vec<Conversation>> {
        Ok(self.store.load_or_default().await)
    }

    async fn save_all(&self, conversations: &[Conversation]) -> Result<()> {
        self.store.save(conversations).await
    }
}
