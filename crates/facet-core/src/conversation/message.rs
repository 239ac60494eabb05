//! Conversation message types.

use serde::{Deserialize, Serialize};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System instructions (persona prompt).
    System,
}

impl MessageRole {
    /// Returns the wire-format role string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

/// A single message in a conversation history.
///
/// Assistant turns carry the provider and model display names that were
/// active at send time; user turns leave them unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Display name of the provider that produced this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    /// Display name of the model that produced this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
}

impl ConversationMessage {
    /// Creates a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            provider_name: None,
            model_name: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates an assistant message tagged with display metadata.
    pub fn assistant(
        content: impl Into<String>,
        provider_name: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            provider_name: Some(provider_name.into()),
            model_name: Some(model_name.into()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_user_message_has_no_display_metadata() {
        let message = ConversationMessage::user("Hello");
        assert_eq!(message.role, MessageRole::User);
        assert!(message.provider_name.is_none());
        assert!(message.model_name.is_none());
        assert!(!message.timestamp.is_empty());
    }

    #[test]
    fn test_assistant_message_carries_display_metadata() {
        let message = ConversationMessage::assistant("Hi!", "OpenAI", "GPT-4o");
        assert_eq!(message.provider_name.as_deref(), Some("OpenAI"));
        assert_eq!(message.model_name.as_deref(), Some("GPT-4o"));
    }
}
