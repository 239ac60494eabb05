//! Outbound chat exchange contract.
//!
//! The dispatcher performs exactly one exchange per user turn: no
//! batching, no retries, no streaming. Assembly of the outbound message
//! list lives here so that every implementation sends the same shape.

use facet_core::Result;
use facet_core::conversation::{ConversationMessage, MessageRole};
use facet_core::persona::Persona;
use serde::{Deserialize, Serialize};

/// Fallback error text when the endpoint reports failure without detail.
pub const GENERIC_FAILURE: &str = "The service returned no response.";

/// One entry of the outbound message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub role: String,
    pub content: String,
}

/// The body of a single outbound exchange.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub provider: String,
    pub model: String,
    pub messages: Vec<OutboundMessage>,
}

/// Performs the single outbound exchange per user turn.
#[async_trait::async_trait]
pub trait ChatDispatcher: Send + Sync {
    /// Sends the request and returns the assistant's reply text.
    ///
    /// # Errors
    ///
    /// Returns `FacetError::Transport` on network failure, a malformed
    /// response, or an application-level failure flag in the response
    /// body.
    async fn dispatch(&self, request: &ChatRequest) -> Result<String>;
}

/// Builds the outbound message list for a conversation.
///
/// When a persona is active its system instructions are prepended as one
/// system-role entry; the full in-memory history follows in chronological
/// order.
pub fn outbound_messages(
    persona: Option<&Persona>,
    history: &[ConversationMessage],
) -> Vec<OutboundMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);

    if let Some(persona) = persona {
        messages.push(OutboundMessage {
            role: MessageRole::System.as_str().to_string(),
            content: persona.system_instructions(),
        });
    }

    for message in history {
        messages.push(OutboundMessage {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        });
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_core::persona::PersonaDraft;

    fn persona_with_context(context: &str) -> Persona {
        PersonaDraft {
            id: None,
            name: "Tutor".to_string(),
            emoji: String::new(),
            prompt: "Teach patiently.".to_string(),
            context: context.to_string(),
        }
        .into_persona()
        .unwrap()
    }

    #[test]
    fn test_no_persona_sends_history_only() {
        let history = vec![
            ConversationMessage::user("Hello"),
            ConversationMessage::assistant("Hi!", "OpenAI", "GPT-4o"),
        ];

        let messages = outbound_messages(None, &history);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
    }

    #[test]
    fn test_active_persona_is_prepended_as_system_entry() {
        let persona = persona_with_context("");
        let history = vec![ConversationMessage::user("Hello")];

        let messages = outbound_messages(Some(&persona), &history);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "Teach patiently.");
        assert_eq!(messages[1].content, "Hello");
    }

    #[test]
    fn test_persona_context_rides_in_the_system_entry() {
        let persona = persona_with_context("Lesson 4 today.");
        let messages = outbound_messages(Some(&persona), &[]);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.ends_with("Lesson 4 today."));
        assert!(messages[0].content.starts_with("Teach patiently."));
    }
}
