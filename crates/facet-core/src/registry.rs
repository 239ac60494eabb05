//! Static catalog of inference providers and the models each exposes.
//!
//! The catalog is purely descriptive: it is consumed by the session
//! controller (provider/model selection) and by the readline front end
//! (display names and color tokens). Model identifiers are not portable
//! across providers, which is why selecting a provider always resets the
//! selected model to that provider's first entry.

use crate::error::{FacetError, Result};

/// A single model exposed by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Model {
    /// Identifier sent on the wire
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
}

/// An inference provider and its ordered model list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provider {
    /// Identifier sent on the wire
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Color token consumed by the UI layer
    pub color: &'static str,
    /// Ordered model list; the first entry is the selection default
    pub models: &'static [Model],
}

impl Provider {
    /// The model selected whenever this provider is chosen.
    pub fn first_model(&self) -> &'static Model {
        &self.models[0]
    }

    /// Looks up a model of this provider by id.
    pub fn model(&self, id: &str) -> Option<&'static Model> {
        self.models.iter().find(|m| m.id == id)
    }
}

/// The static provider catalog, in display order.
pub const PROVIDERS: &[Provider] = &[
    Provider {
        id: "openai",
        name: "OpenAI",
        color: "green",
        models: &[
            Model {
                id: "gpt-4o",
                name: "GPT-4o",
            },
            Model {
                id: "gpt-4o-mini",
                name: "GPT-4o mini",
            },
            Model {
                id: "gpt-4.1",
                name: "GPT-4.1",
            },
        ],
    },
    Provider {
        id: "anthropic",
        name: "Anthropic",
        color: "yellow",
        models: &[
            Model {
                id: "claude-sonnet-4-0",
                name: "Claude Sonnet 4",
            },
            Model {
                id: "claude-opus-4-0",
                name: "Claude Opus 4",
            },
            Model {
                id: "claude-3-5-haiku-latest",
                name: "Claude 3.5 Haiku",
            },
        ],
    },
    Provider {
        id: "gemini",
        name: "Google Gemini",
        color: "blue",
        models: &[
            Model {
                id: "gemini-2.5-pro",
                name: "Gemini 2.5 Pro",
            },
            Model {
                id: "gemini-2.5-flash",
                name: "Gemini 2.5 Flash",
            },
        ],
    },
    Provider {
        id: "groq",
        name: "Groq",
        color: "magenta",
        models: &[
            Model {
                id: "llama-3.3-70b-versatile",
                name: "Llama 3.3 70B",
            },
            Model {
                id: "mixtral-8x7b-32768",
                name: "Mixtral 8x7B",
            },
        ],
    },
];

/// Returns the full provider catalog.
pub fn providers() -> &'static [Provider] {
    PROVIDERS
}

/// Looks up a provider by id.
///
/// # Errors
///
/// Returns `FacetError::UnknownProvider` when the id is not in the
/// catalog. Under correct UI wiring this should not occur; callers must
/// surface the error without crashing the session.
pub fn provider(id: &str) -> Result<&'static Provider> {
    PROVIDERS
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| FacetError::unknown_provider(id))
}

/// Lists the models of a provider, in catalog order.
///
/// # Errors
///
/// Returns `FacetError::UnknownProvider` when the id is not in the
/// catalog.
pub fn models(provider_id: &str) -> Result<&'static [Model]> {
    Ok(provider(provider_id)?.models)
}

/// The provider selected when nothing else is configured.
pub fn default_provider() -> &'static Provider {
    &PROVIDERS[0]
}

/// Resolves provider and model ids into display names.
///
/// Ids outside the catalog fall back to the raw id string so that stale
/// bindings (for example a conversation recorded against a retired model)
/// render without crashing.
pub fn display_names(provider_id: &str, model_id: &str) -> (String, String) {
    match provider(provider_id) {
        Ok(p) => {
            let model_name = p
                .model(model_id)
                .map(|m| m.name.to_string())
                .unwrap_or_else(|| model_id.to_string());
            (p.name.to_string(), model_name)
        }
        Err(_) => (provider_id.to_string(), model_id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_lookup() {
        let p = provider("openai").unwrap();
        assert_eq!(p.name, "OpenAI");
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let err = provider("nonexistent").unwrap_err();
        assert!(err.is_unknown_provider());
        assert!(models("nonexistent").unwrap_err().is_unknown_provider());
    }

    #[test]
    fn test_every_provider_has_models() {
        for p in providers() {
            assert!(!p.models.is_empty(), "provider {} has no models", p.id);
            assert_eq!(p.first_model().id, p.models[0].id);
        }
    }

    #[test]
    fn test_display_names_resolve_catalog_entries() {
        let (provider_name, model_name) = display_names("anthropic", "claude-opus-4-0");
        assert_eq!(provider_name, "Anthropic");
        assert_eq!(model_name, "Claude Opus 4");
    }

    #[test]
    fn test_display_names_fall_back_to_raw_ids() {
        let (provider_name, model_name) = display_names("retired", "old-model");
        assert_eq!(provider_name, "retired");
        assert_eq!(model_name, "old-model");
    }
}
