//! Storage layer of the facet workspace: JSON file persistence for the
//! conversation and persona records, endpoint configuration, and
//! in-memory repository fakes for tests.

pub mod config_service;
pub mod json_conversation_repository;
pub mod json_persona_repository;
pub mod json_store;
pub mod memory;
pub mod paths;

pub use config_service::{AppConfig, ConfigService, DEFAULT_ENDPOINT, ENDPOINT_ENV_VAR};
pub use json_conversation_repository::JsonConversationRepository;
pub use json_persona_repository::JsonPersonaRepository;
pub use json_store::JsonStore;
pub use memory::{InMemoryConversationRepository, InMemoryPersonaRepository};
pub use paths::FacetPaths;
