//! Persona store operations.
//!
//! Keeps the persona set in memory and re-persists the entire set on
//! every mutation.

use facet_core::Result;
use facet_core::persona::{Persona, PersonaDraft, PersonaRepository};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Manages the persona set on top of a repository backend.
pub struct PersonaService {
    repository: Arc<dyn PersonaRepository>,
    personas: RwLock<Vec<Persona>>,
}

impl PersonaService {
    /// Creates the service, loading the persisted set.
    pub async fn load(repository: Arc<dyn PersonaRepository>) -> Result<Self> {
        let personas = repository.load_all().await?;
        Ok(Self {
            repository,
            personas: RwLock::new(personas),
        })
    }

    /// Returns all personas in insertion order.
    pub async fn list(&self) -> Vec<Persona> {
        self.personas.read().await.clone()
    }

    /// Looks up a persona by id.
    pub async fn find(&self, id: &str) -> Option<Persona> {
        self.personas.read().await.iter().find(|p| p.id == id).cloned()
    }

    /// Validates the draft, then inserts (fresh id) or replaces
    /// (matching id) and persists the whole set.
    ///
    /// # Errors
    ///
    /// Returns `FacetError::Validation` for a blank name or prompt; the
    /// stored set is left untouched in that case.
    pub async fn upsert(&self, draft: PersonaDraft) -> Result<Persona> {
        let persona = draft.into_persona()?;

        let mut personas = self.personas.write().await;
        match personas.iter_mut().find(|p| p.id == persona.id) {
            Some(existing) => *existing = persona.clone(),
            None => personas.push(persona.clone()),
        }
        self.repository.save_all(&personas).await?;
        tracing::debug!("Saved persona '{}' ({})", persona.name, persona.id);

        Ok(persona)
    }

    /// Removes the persona with the given id and persists.
    ///
    /// Returns `false` (no-op) when the id matches nothing. Clearing an
    /// active-persona reference is the session controller's concern.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut personas = self.personas.write().await;
        let before = personas.len();
        personas.retain(|p| p.id != id);
        if personas.len() == before {
            return Ok(false);
        }

        self.repository.save_all(&personas).await?;
        tracing::debug!("Deleted persona {id}");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_infrastructure::InMemoryPersonaRepository;

    fn draft(name: &str, prompt: &str) -> PersonaDraft {
        PersonaDraft {
            id: None,
            name: name.to_string(),
            emoji: String::new(),
            prompt: prompt.to_string(),
            context: String::new(),
        }
    }

    async fn service() -> PersonaService {
        PersonaService::load(Arc::new(InMemoryPersonaRepository::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_with_blank_name_changes_nothing() {
        let service = service().await;
        service.upsert(draft("Tutor", "Be helpful")).await.unwrap();

        let err = service.upsert(draft("", "Be terse")).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(service.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_with_blank_prompt_changes_nothing() {
        let service = service().await;
        let err = service.upsert(draft("Tutor", "  ")).await.unwrap_err();
        assert!(err.is_validation());
        assert!(service.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_with_matching_id_replaces_in_place() {
        let service = service().await;
        let original = service.upsert(draft("Tutor", "Be helpful")).await.unwrap();

        let mut edit = draft("Mentor", "Be thorough");
        edit.id = Some(original.id.clone());
        let updated = service.upsert(edit).await.unwrap();

        assert_eq!(updated.id, original.id);
        let personas = service.list().await;
        assert_eq!(personas.len(), 1);
        assert_eq!(personas[0].name, "Mentor");
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_a_noop() {
        let service = service().await;
        service.upsert(draft("Tutor", "Be helpful")).await.unwrap();

        let removed = service.delete("no-such-id").await.unwrap();
        assert!(!removed);
        assert_eq!(service.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_and_persists() {
        let repository = Arc::new(InMemoryPersonaRepository::new());
        let service = PersonaService::load(repository.clone()).await.unwrap();
        let persona = service.upsert(draft("Tutor", "Be helpful")).await.unwrap();

        assert!(service.delete(&persona.id).await.unwrap());
        assert!(service.list().await.is_empty());
        assert!(repository.load_all().await.unwrap().is_empty());
    }
}
