//! In-memory repository fakes.
//!
//! Used by application-layer tests in place of the file-backed
//! repositories. Behavior matches the JSON implementations: whole-record
//! replace on save, empty on first load.

use facet_core::Result;
use facet_core::conversation::{Conversation, ConversationRepository};
use facet_core::persona::{Persona, PersonaRepository};
use std::sync::Mutex;

/// PersonaRepository fake holding the set in memory.
#[derive(Default)]
pub struct InMemoryPersonaRepository {
    personas: Mutex<Vec<Persona>>,
}

impl InMemoryPersonaRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PersonaRepository for InMemoryPersonaRepository {
    async fn load_all(&self) -> Result<Vec<Persona>> {
        Ok(self.personas.lock().unwrap().clone())
    }

    async fn save_all(&self, personas: &[Persona]) -> Result<()> {
        *self.personas.lock().unwrap() = personas.to_vec();
        Ok(())
    }
}

/// ConversationRepository fake holding the ordered collection in memory.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: Mutex<Vec<Conversation>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn load_all(&self) -> Result<Vec<Conversation>> {
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn save_all(&self, conversations: &[Conversation]) -> Result<()> {
        *self.conversations.lock().unwrap() = conversations.to_vec();
        Ok(())
    }
}
