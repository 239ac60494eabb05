//! HTTP implementation of the chat dispatcher.
//!
//! Posts the exchange body to the configured chat endpoint. No client-side
//! deadline is applied; the exchange resolves or rejects according to the
//! transport's own behavior.

use crate::dispatcher::{ChatDispatcher, ChatRequest, GENERIC_FAILURE};
use facet_core::{FacetError, Result};
use facet_infrastructure::ConfigService;
use reqwest::Client;
use serde::Deserialize;

/// Dispatcher that talks to the chat endpoint over HTTP.
#[derive(Clone)]
pub struct HttpChatDispatcher {
    client: Client,
    endpoint: String,
}

impl HttpChatDispatcher {
    /// Creates a dispatcher posting to the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Creates a dispatcher using the configured endpoint
    /// (`~/.config/facet/config.json`, overridable via `FACET_ENDPOINT`).
    pub async fn try_from_config() -> Result<Self> {
        let config = ConfigService::new()?.get_config().await;
        Ok(Self::new(config.endpoint))
    }

    /// The endpoint this dispatcher posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ChatDispatcher for HttpChatDispatcher {
    async fn dispatch(&self, request: &ChatRequest) -> Result<String> {
        tracing::debug!(
            "Dispatching {} messages to {} ({}/{})",
            request.messages.len(),
            self.endpoint,
            request.provider,
            request.model
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| FacetError::transport(format!("Chat request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FacetError::transport(format!(
                "Chat endpoint error ({status}): {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| FacetError::transport(format!("Failed to parse chat response: {err}")))?;

        extract_reply(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Maps the endpoint's response envelope onto the dispatch result.
///
/// A missing success flag, `success: false`, or a missing payload all
/// count as failure, surfacing the provided error text or the generic
/// fallback.
fn extract_reply(response: ChatResponse) -> Result<String> {
    if !response.success {
        return Err(FacetError::transport(
            response.error.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        ));
    }

    match response.response {
        Some(text) => Ok(text),
        None => Err(FacetError::transport(
            response.error.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(success: bool, text: Option<&str>, error: Option<&str>) -> ChatResponse {
        ChatResponse {
            success,
            response: text.map(str::to_string),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_successful_response_yields_reply() {
        let reply = extract_reply(response(true, Some("Hi!"), None)).unwrap();
        assert_eq!(reply, "Hi!");
    }

    #[test]
    fn test_failure_flag_surfaces_server_error_text() {
        let err = extract_reply(response(false, None, Some("rate limited"))).unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_missing_payload_uses_generic_fallback() {
        let err = extract_reply(response(true, None, None)).unwrap_err();
        assert!(err.to_string().contains(GENERIC_FAILURE));
    }

    #[test]
    fn test_missing_success_flag_is_a_failure() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"response": "Hi!"}"#).unwrap();
        assert!(extract_reply(parsed).is_err());
    }
}
