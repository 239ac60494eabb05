//! Persona repository trait.
//!
//! Defines the interface for persona persistence operations.

use super::model::Persona;
use crate::error::Result;

/// An abstract repository for managing persona persistence.
///
/// This trait defines the contract for persisting and retrieving personas,
/// decoupling the application's core logic from the specific storage
/// mechanism (e.g., JSON file, in-memory fake).
///
/// Implementations must fail open on load: a missing or unreadable record
/// yields the empty set, never an error the caller has to recover from.
#[async_trait::async_trait]
pub trait PersonaRepository: Send + Sync {
    /// Retrieves all personas from storage, in stored order.
    async fn load_all(&self) -> Result<Vec<Persona>>;

    /// Saves all personas to storage, replacing existing ones.
    async fn save_all(&self, personas: &[Persona]) -> Result<()>;
}
