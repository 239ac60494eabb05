//! Explicit session context.
//!
//! The context replaces ambient "current conversation/provider/persona"
//! globals: it is owned by the [`crate::session::ChatSession`] controller
//! and passed into service calls that need the active bindings.

use facet_core::registry::Provider;

/// The active selections of a conversation session.
///
/// `persona_id` is a weak reference: the persona may be deleted while
/// referenced, so it is resolved by lookup at read time and never cached
/// as a live object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Id of the active conversation
    pub conversation_id: String,
    /// Id of the selected provider
    pub provider_id: String,
    /// Id of the selected model
    pub model_id: String,
    /// Id of the active persona, if any
    pub persona_id: Option<String>,
}

impl SessionContext {
    /// Creates a context bound to a provider and its default (first)
    /// model, with no conversation or persona selected yet.
    pub fn for_provider(provider: &Provider) -> Self {
        Self {
            conversation_id: String::new(),
            provider_id: provider.id.to_string(),
            model_id: provider.first_model().id.to_string(),
            persona_id: None,
        }
    }
}
