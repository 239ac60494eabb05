//! Persona ("gem") domain model.
//!
//! A persona carries the system instructions injected ahead of the
//! conversation history when it is active. At most one persona is active
//! globally at a time.

use crate::error::{FacetError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder glyph used when a persona is saved without an emoji.
pub const DEFAULT_EMOJI: &str = "💎";

/// Separator between a persona's prompt and its optional context block.
pub const CONTEXT_SEPARATOR: &str = "\n\nAdditional context:\n";

/// A user-defined assistant persona.
///
/// Each persona has a unique UUID identifier, assigned on creation and
/// immutable afterwards. `context` is free text; an empty string means
/// no context was provided.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Unique identifier (UUID format)
    pub id: String,
    /// Display name of the persona
    pub name: String,
    /// Short glyph shown next to the name
    #[serde(default)]
    pub emoji: String,
    /// System instructions sent ahead of the conversation history
    pub prompt: String,
    /// Optional free text appended to the prompt
    #[serde(default)]
    pub context: String,
}

impl Persona {
    /// Builds the full system instruction for this persona.
    ///
    /// Returns `prompt` alone when no context is set, otherwise `prompt`
    /// followed by [`CONTEXT_SEPARATOR`] and the context text.
    pub fn system_instructions(&self) -> String {
        if self.context.trim().is_empty() {
            self.prompt.clone()
        } else {
            format!("{}{}{}", self.prompt, CONTEXT_SEPARATOR, self.context)
        }
    }
}

/// Input for creating or editing a persona.
///
/// A draft with `id: None` creates a new persona; a draft carrying an `id`
/// replaces the stored persona with that id.
#[derive(Debug, Clone, Default)]
pub struct PersonaDraft {
    pub id: Option<String>,
    pub name: String,
    pub emoji: String,
    pub prompt: String,
    pub context: String,
}

impl PersonaDraft {
    /// Validates the draft and turns it into a [`Persona`].
    ///
    /// # Errors
    ///
    /// Returns `FacetError::Validation` when `name` or `prompt` is blank.
    /// A rejected draft must not mutate any stored state.
    pub fn into_persona(self) -> Result<Persona> {
        if self.name.trim().is_empty() {
            return Err(FacetError::validation("name"));
        }
        if self.prompt.trim().is_empty() {
            return Err(FacetError::validation("prompt"));
        }

        let emoji = if self.emoji.trim().is_empty() {
            DEFAULT_EMOJI.to_string()
        } else {
            self.emoji
        };

        Ok(Persona {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: self.name,
            emoji,
            prompt: self.prompt,
            context: self.context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, prompt: &str) -> PersonaDraft {
        PersonaDraft {
            id: None,
            name: name.to_string(),
            emoji: String::new(),
            prompt: prompt.to_string(),
            context: String::new(),
        }
    }

    #[test]
    fn test_draft_rejects_blank_name() {
        let err = draft("  ", "Be helpful").into_persona().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_draft_rejects_blank_prompt() {
        let err = draft("Tutor", "").into_persona().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_draft_assigns_id_and_default_emoji() {
        let persona = draft("Tutor", "Be helpful").into_persona().unwrap();
        assert!(Uuid::parse_str(&persona.id).is_ok());
        assert_eq!(persona.emoji, DEFAULT_EMOJI);
    }

    #[test]
    fn test_draft_keeps_existing_id() {
        let mut d = draft("Tutor", "Be helpful");
        d.id = Some("fixed-id".to_string());
        let persona = d.into_persona().unwrap();
        assert_eq!(persona.id, "fixed-id");
    }

    #[test]
    fn test_system_instructions_without_context() {
        let persona = draft("Tutor", "Be helpful").into_persona().unwrap();
        assert_eq!(persona.system_instructions(), "Be helpful");
    }

    #[test]
    fn test_system_instructions_appends_context() {
        let mut d = draft("Tutor", "Be helpful");
        d.context = "The student is twelve.".to_string();
        let persona = d.into_persona().unwrap();
        assert_eq!(
            persona.system_instructions(),
            "Be helpful\n\nAdditional context:\nThe student is twelve."
        );
    }
}
