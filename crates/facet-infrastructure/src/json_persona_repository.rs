//! JSON-file-backed PersonaRepository implementation.

use crate::json_store::JsonStore;
use crate::paths::FacetPaths;
use facet_core::Result;
use facet_core::persona::{Persona, PersonaRepository};
use std::path::PathBuf;

/// Stores the full persona set in `~/.config/facet/personas.json`.
///
/// The whole set is rewritten on every save; loads fail open via
/// [`JsonStore`].
pub struct JsonPersonaRepository {
    store: JsonStore,
}

impl JsonPersonaRepository {
    /// Creates a repository at the default record path.
    pub fn new() -> Result<Self> {
        let paths = FacetPaths::new(None)?;
        Ok(Self {
            store: JsonStore::new(paths.personas_file()),
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
impl PersonaRepository for JsonPersonaRepository {
    async fn load_all(&self) -> Result<Vec<Persona>> {
        Ok(self.store.load_or_default().await)
    }

    async fn save_all(&self, personas: &[Persona]) -> Result<()> {
        self.store.save(personas).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_core::persona::PersonaDraft;
    use tempfile::TempDir;

    fn persona(name: &str) -> Persona {
        PersonaDraft {
            id: None,
            name: name.to_string(),
            emoji: "🔧".to_string(),
            prompt: format!("You are {name}."),
            context: String::new(),
        }
        .into_persona()
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_from_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonPersonaRepository::with_path(temp_dir.path().join("personas.json"));

        let personas = repo.load_all().await.unwrap();
        assert!(personas.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonPersonaRepository::with_path(temp_dir.path().join("personas.json"));

        let saved = vec![persona("Alice"), persona("Bob")];
        repo.save_all(&saved).await.unwrap();

        let loaded = repo.load_all().await.unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn test_corrupt_record_loads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("personas.json");
        std::fs::write(&path, "][").unwrap();

        let repo = JsonPersonaRepository::with_path(path);
        let personas = repo.load_all().await.unwrap();
        assert!(personas.is_empty());
    }
}
