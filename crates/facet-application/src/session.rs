//! Conversation session controller.
//!
//! `ChatSession` orchestrates the active conversation: it owns the
//! [`SessionContext`], binds the active persona and provider/model
//! selection, appends messages optimistically, triggers the outbound
//! exchange, and reconciles the result. Sends follow a two-phase state
//! machine: `Idle` with no request in flight, `Sending` with exactly one.
//! Submissions while `Sending` are dropped; there is no queueing and no
//! cancellation of the in-flight request.

use crate::context::SessionContext;
use crate::conversation_service::ConversationService;
use crate::persona_service::PersonaService;
use facet_core::conversation::{Conversation, ConversationMessage};
use facet_core::persona::{Persona, PersonaDraft};
use facet_core::registry;
use facet_core::{FacetError, Result};
use facet_interaction::{ChatDispatcher, ChatRequest, outbound_messages};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The send state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No request in flight
    Idle,
    /// One request in flight
    Sending,
}

/// Why a submission was dropped without starting an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The input was empty after trimming
    EmptyInput,
    /// A request is already in flight
    Busy,
}

/// Result of a [`ChatSession::send`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The assistant replied; the turn was appended and persisted.
    Reply(ConversationMessage),
    /// The submission was dropped before any exchange started.
    Skipped(SkipReason),
    /// The exchange failed; the user turn is kept, no assistant turn is
    /// recorded. The string is the error text to render in place of the
    /// pending response.
    Failed(String),
}

/// Long-lived controller over a single active conversation.
pub struct ChatSession {
    personas: Arc<PersonaService>,
    conversations: Arc<ConversationService>,
    dispatcher: Arc<dyn ChatDispatcher>,
    context: RwLock<SessionContext>,
    state: RwLock<SessionState>,
}

impl ChatSession {
    /// Creates the controller and activates the most recently active
    /// conversation, or a fresh one when the collection is empty.
    ///
    /// `initial_provider` overrides the registry default when it names a
    /// catalog entry.
    pub async fn start(
        personas: Arc<PersonaService>,
        conversations: Arc<ConversationService>,
        dispatcher: Arc<dyn ChatDispatcher>,
        initial_provider: Option<&str>,
    ) -> Result<Self> {
        let provider = match initial_provider {
            Some(id) => registry::provider(id)?,
            None => registry::default_provider(),
        };
        let mut context = SessionContext::for_provider(provider);

        match conversations.front().await {
            Some(conversation) => {
                Self::restore_bindings(&mut context, &conversation, &personas).await;
            }
            None => {
                let conversation = conversations.create(&context).await?;
                context.conversation_id = conversation.id;
            }
        }

        Ok(Self {
            personas,
            conversations,
            dispatcher,
            context: RwLock::new(context),
            state: RwLock::new(SessionState::Idle),
        })
    }

    /// A snapshot of the active selections.
    pub async fn context(&self) -> SessionContext {
        self.context.read().await.clone()
    }

    /// The active conversation, resolved from the store.
    pub async fn active_conversation(&self) -> Option<Conversation> {
        let id = self.context.read().await.conversation_id.clone();
        self.conversations.get(&id).await
    }

    /// The active persona, resolved by lookup: `None` when no persona is
    /// active or the referenced persona was deleted.
    pub async fn active_persona(&self) -> Option<Persona> {
        let persona_id = self.context.read().await.persona_id.clone()?;
        self.personas.find(&persona_id).await
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Submits a user turn.
    ///
    /// The user's message is appended to the store immediately; the
    /// assistant's turn is appended only on a successful exchange. The
    /// session returns to `Idle` regardless of outcome.
    ///
    /// # Errors
    ///
    /// Store failures are returned as errors; a failed exchange is the
    /// `SendOutcome::Failed` outcome, not an error, so callers can render
    /// it in place of the pending response and let the user retry.
    pub async fn send(&self, input: &str) -> Result<SendOutcome> {
        let text = input.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Skipped(SkipReason::EmptyInput));
        }

        // Busy guard: at most one exchange in flight per session.
        {
            let mut state = self.state.write().await;
            if *state == SessionState::Sending {
                return Ok(SendOutcome::Skipped(SkipReason::Busy));
            }
            *state = SessionState::Sending;
        }

        let outcome = self.exchange(text).await;

        *self.state.write().await = SessionState::Idle;
        outcome
    }

    async fn exchange(&self, text: &str) -> Result<SendOutcome> {
        // Snapshot the selections at send time; display tagging and the
        // wire request both use these even if the user switches provider
        // while the request is in flight.
        let context = self.context.read().await.clone();

        let appended = self
            .conversations
            .append_message(&context, ConversationMessage::user(text))
            .await?;
        if !appended {
            return Err(FacetError::not_found(
                "conversation",
                context.conversation_id,
            ));
        }

        let persona = match &context.persona_id {
            Some(id) => self.personas.find(id).await,
            None => None,
        };
        let history = self
            .conversations
            .get(&context.conversation_id)
            .await
            .map(|c| c.messages)
            .unwrap_or_default();

        let request = ChatRequest {
            provider: context.provider_id.clone(),
            model: context.model_id.clone(),
            messages: outbound_messages(persona.as_ref(), &history),
        };

        match self.dispatcher.dispatch(&request).await {
            Ok(reply) => {
                let (provider_name, model_name) =
                    registry::display_names(&context.provider_id, &context.model_id);
                let message = ConversationMessage::assistant(reply, provider_name, model_name);
                self.conversations
                    .append_message(&context, message.clone())
                    .await?;
                Ok(SendOutcome::Reply(message))
            }
            Err(FacetError::Transport(text)) => {
                tracing::warn!("Chat exchange failed: {text}");
                Ok(SendOutcome::Failed(text))
            }
            Err(other) => Err(other),
        }
    }

    // ------------------------------------------------------------------
    // Provider and model selection
    // ------------------------------------------------------------------

    /// Selects a provider, resetting the model to the provider's first
    /// catalog entry. Model identifiers are not portable across
    /// providers.
    pub async fn select_provider(&self, provider_id: &str) -> Result<()> {
        let provider = registry::provider(provider_id)?;
        let mut context = self.context.write().await;
        context.provider_id = provider.id.to_string();
        context.model_id = provider.first_model().id.to_string();
        Ok(())
    }

    /// Selects a model of the current provider.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the current provider does not list the
    /// model.
    pub async fn select_model(&self, model_id: &str) -> Result<()> {
        let mut context = self.context.write().await;
        let provider = registry::provider(&context.provider_id)?;
        let model = provider
            .model(model_id)
            .ok_or_else(|| FacetError::not_found("model", model_id))?;
        context.model_id = model.id.to_string();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Personas
    // ------------------------------------------------------------------

    /// Creates or updates a persona via the persona store.
    pub async fn save_persona(&self, draft: PersonaDraft) -> Result<Persona> {
        self.personas.upsert(draft).await
    }

    /// Activates the persona with the given id.
    pub async fn activate_persona(&self, persona_id: &str) -> Result<()> {
        let persona = self
            .personas
            .find(persona_id)
            .await
            .ok_or_else(|| FacetError::not_found("persona", persona_id))?;
        self.context.write().await.persona_id = Some(persona.id);
        Ok(())
    }

    /// Deactivates the active persona, if any.
    pub async fn deactivate_persona(&self) {
        self.context.write().await.persona_id = None;
    }

    /// Deletes a persona, clearing the active reference when it points at
    /// the deleted id. Conversations referencing the persona keep their
    /// (now dangling) reference; it resolves to none on load.
    pub async fn delete_persona(&self, persona_id: &str) -> Result<bool> {
        let removed = self.personas.delete(persona_id).await?;
        if removed {
            let mut context = self.context.write().await;
            if context.persona_id.as_deref() == Some(persona_id) {
                context.persona_id = None;
            }
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Conversation lifecycle
    // ------------------------------------------------------------------

    /// Creates a new conversation with the current selections and makes
    /// it active.
    pub async fn new_conversation(&self) -> Result<Conversation> {
        let mut context = self.context.write().await;
        let conversation = self.conversations.create(&context).await?;
        context.conversation_id = conversation.id.clone();
        Ok(conversation)
    }

    /// Loads a conversation and makes it active, restoring its stored
    /// provider/model/persona bindings.
    ///
    /// A dangling persona reference resolves to none. A stored provider
    /// no longer in the registry rebinds the session to the registry
    /// default; a stored model the provider no longer lists is kept
    /// verbatim.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` without changing any state when the id matches
    /// nothing.
    pub async fn load_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        let conversation = self
            .conversations
            .get(conversation_id)
            .await
            .ok_or_else(|| FacetError::not_found("conversation", conversation_id))?;

        let mut context = self.context.write().await;
        Self::restore_bindings(&mut context, &conversation, &self.personas).await;
        Ok(conversation)
    }

    /// Deletes a conversation. When the active one is deleted, the most
    /// recent remaining conversation becomes active, or a fresh one is
    /// created so the collection never ends up empty while a session
    /// exists.
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<bool> {
        let removed = self.conversations.delete(conversation_id).await?;
        if !removed {
            return Ok(false);
        }

        let mut context = self.context.write().await;
        if context.conversation_id == conversation_id {
            match self.conversations.front().await {
                Some(successor) => {
                    Self::restore_bindings(&mut context, &successor, &self.personas).await;
                }
                None => {
                    let conversation = self.conversations.create(&context).await?;
                    context.conversation_id = conversation.id;
                }
            }
        }
        Ok(true)
    }

    /// Renames a conversation.
    pub async fn rename_conversation(&self, conversation_id: &str, title: &str) -> Result<()> {
        self.conversations.rename(conversation_id, title).await
    }

    /// Lists all conversations, most recent activity first.
    pub async fn conversations(&self) -> Vec<Conversation> {
        self.conversations.list().await
    }

    /// Lists all personas.
    pub async fn personas(&self) -> Vec<Persona> {
        self.personas.list().await
    }

    async fn restore_bindings(
        context: &mut SessionContext,
        conversation: &Conversation,
        personas: &PersonaService,
    ) {
        context.conversation_id = conversation.id.clone();

        match registry::provider(&conversation.provider) {
            Ok(provider) => {
                context.provider_id = provider.id.to_string();
                // A stored model the provider no longer lists is kept
                // verbatim: display is undefined, nothing crashes.
                context.model_id = conversation.model.clone();
            }
            Err(_) => {
                let fallback = registry::default_provider();
                tracing::warn!(
                    "Conversation {} references unknown provider '{}', rebinding to '{}'",
                    conversation.id,
                    conversation.provider,
                    fallback.id
                );
                context.provider_id = fallback.id.to_string();
                context.model_id = fallback.first_model().id.to_string();
            }
        }

        context.persona_id = match &conversation.persona_id {
            Some(id) => personas.find(id).await.map(|p| p.id),
            None => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_core::conversation::MessageRole;
    use facet_infrastructure::{InMemoryConversationRepository, InMemoryPersonaRepository};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    // Dispatcher returning scripted outcomes in order.
    struct MockDispatcher {
        replies: Mutex<VecDeque<Result<String>>>,
        calls: AtomicUsize,
    }

    impl MockDispatcher {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ChatDispatcher for MockDispatcher {
        async fn dispatch(&self, _request: &ChatRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("ok".to_string()))
        }
    }

    // Dispatcher that blocks until released, to hold the session in the
    // Sending state.
    struct BlockingDispatcher {
        release: Notify,
        calls: AtomicUsize,
    }

    impl BlockingDispatcher {
        fn new() -> Self {
            Self {
                release: Notify::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatDispatcher for BlockingDispatcher {
        async fn dispatch(&self, _request: &ChatRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok("late reply".to_string())
        }
    }

    async fn session_with(dispatcher: Arc<dyn ChatDispatcher>) -> ChatSession {
        let personas = Arc::new(
            PersonaService::load(Arc::new(InMemoryPersonaRepository::new()))
                .await
                .unwrap(),
        );
        let conversations = Arc::new(
            ConversationService::load(Arc::new(InMemoryConversationRepository::new()))
                .await
                .unwrap(),
        );
        ChatSession::start(personas, conversations, dispatcher, None)
            .await
            .unwrap()
    }

    fn draft(name: &str, prompt: &str) -> PersonaDraft {
        PersonaDraft {
            id: None,
            name: name.to_string(),
            emoji: String::new(),
            prompt: prompt.to_string(),
            context: String::new(),
        }
    }

    #[tokio::test]
    async fn test_start_creates_a_conversation_when_none_exist() {
        let session = session_with(Arc::new(MockDispatcher::new(vec![]))).await;
        let conversation = session.active_conversation().await.unwrap();
        assert!(conversation.messages.is_empty());
        assert_eq!(session.conversations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_successful_send_appends_both_turns() {
        let session =
            session_with(Arc::new(MockDispatcher::new(vec![Ok("Hi!".to_string())]))).await;

        let outcome = session.send("Hello").await.unwrap();
        let SendOutcome::Reply(reply) = outcome else {
            panic!("expected a reply, got {outcome:?}");
        };
        assert_eq!(reply.content, "Hi!");
        assert_eq!(reply.provider_name.as_deref(), Some("OpenAI"));

        let conversation = session.active_conversation().await.unwrap();
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[0].role, MessageRole::User);
        assert_eq!(conversation.messages[0].content, "Hello");
        assert_eq!(conversation.messages[1].role, MessageRole::Assistant);
        assert_eq!(conversation.title, "Hello");
    }

    #[tokio::test]
    async fn test_failed_send_keeps_only_the_user_turn() {
        let session = session_with(Arc::new(MockDispatcher::new(vec![Err(
            FacetError::transport("rate limited"),
        )])))
        .await;

        let outcome = session.send("Hello").await.unwrap();
        let SendOutcome::Failed(text) = outcome else {
            panic!("expected a failure, got {outcome:?}");
        };
        assert!(text.contains("rate limited"));

        let conversation = session.active_conversation().await.unwrap();
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_session_is_usable_again_after_a_failure() {
        let dispatcher = Arc::new(MockDispatcher::new(vec![
            Err(FacetError::transport("boom")),
            Ok("recovered".to_string()),
        ]));
        let session = session_with(dispatcher).await;

        session.send("first").await.unwrap();
        let outcome = session.send("second").await.unwrap();
        assert!(matches!(outcome, SendOutcome::Reply(_)));

        // user, user, assistant: the failed bot turn was never persisted
        let conversation = session.active_conversation().await.unwrap();
        assert_eq!(conversation.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_input_is_skipped() {
        let dispatcher = Arc::new(MockDispatcher::new(vec![]));
        let session = session_with(dispatcher.clone()).await;

        let outcome = session.send("   ").await.unwrap();
        assert_eq!(outcome, SendOutcome::Skipped(SkipReason::EmptyInput));
        assert_eq!(dispatcher.calls(), 0);
        assert!(session.active_conversation().await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_second_send_while_sending_is_dropped() {
        let dispatcher = Arc::new(BlockingDispatcher::new());
        let session = Arc::new(session_with(dispatcher.clone()).await);

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.send("first").await })
        };

        // Wait until the first send is holding the Sending state.
        while dispatcher.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let outcome = session.send("second").await.unwrap();
        assert_eq!(outcome, SendOutcome::Skipped(SkipReason::Busy));

        dispatcher.release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert!(matches!(outcome, SendOutcome::Reply(_)));

        // Only the first exchange ran: one user turn, one assistant turn.
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
        let conversation = session.active_conversation().await.unwrap();
        assert_eq!(conversation.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_select_provider_resets_model_to_first() {
        let session = session_with(Arc::new(MockDispatcher::new(vec![]))).await;

        for provider in registry::providers() {
            session.select_provider(provider.id).await.unwrap();
            let context = session.context().await;
            assert_eq!(context.provider_id, provider.id);
            assert_eq!(context.model_id, provider.first_model().id);
        }
    }

    #[tokio::test]
    async fn test_select_unknown_provider_is_an_error() {
        let session = session_with(Arc::new(MockDispatcher::new(vec![]))).await;
        let err = session.select_provider("nonexistent").await.unwrap_err();
        assert!(err.is_unknown_provider());
    }

    #[tokio::test]
    async fn test_select_model_must_belong_to_current_provider() {
        let session = session_with(Arc::new(MockDispatcher::new(vec![]))).await;
        session.select_provider("anthropic").await.unwrap();

        session.select_model("claude-opus-4-0").await.unwrap();
        assert_eq!(session.context().await.model_id, "claude-opus-4-0");

        let err = session.select_model("gpt-4o").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_deleting_active_persona_clears_the_reference() {
        let session = session_with(Arc::new(MockDispatcher::new(vec![]))).await;
        let persona = session
            .save_persona(draft("Tutor", "Be helpful"))
            .await
            .unwrap();
        session.activate_persona(&persona.id).await.unwrap();

        session.delete_persona(&persona.id).await.unwrap();
        assert!(session.context().await.persona_id.is_none());
        assert!(session.active_persona().await.is_none());
    }

    #[tokio::test]
    async fn test_dangling_persona_resolves_to_none_on_load() {
        let session =
            session_with(Arc::new(MockDispatcher::new(vec![Ok("Hi!".to_string())]))).await;
        let persona = session
            .save_persona(draft("Tutor", "Be helpful"))
            .await
            .unwrap();
        session.activate_persona(&persona.id).await.unwrap();
        session.send("Hello").await.unwrap();

        let conversation_id = session.context().await.conversation_id;

        // Deleting the persona leaves the conversation in place with a
        // dangling reference.
        session.delete_persona(&persona.id).await.unwrap();
        let stored = session.load_conversation(&conversation_id).await.unwrap();
        assert_eq!(stored.persona_id.as_deref(), Some(persona.id.as_str()));
        assert!(session.context().await.persona_id.is_none());
        assert!(session.active_persona().await.is_none());
    }

    #[tokio::test]
    async fn test_load_restores_bindings() {
        let session =
            session_with(Arc::new(MockDispatcher::new(vec![Ok("Hi!".to_string())]))).await;
        session.select_provider("groq").await.unwrap();
        session.send("Hello").await.unwrap();
        let groq_conversation = session.context().await.conversation_id;

        session.new_conversation().await.unwrap();
        session.select_provider("openai").await.unwrap();

        session.load_conversation(&groq_conversation).await.unwrap();
        let context = session.context().await;
        assert_eq!(context.provider_id, "groq");
        assert_eq!(context.model_id, "llama-3.3-70b-versatile");
    }

    #[tokio::test]
    async fn test_load_unknown_conversation_changes_nothing() {
        let session = session_with(Arc::new(MockDispatcher::new(vec![]))).await;
        let before = session.context().await;

        let err = session.load_conversation("stale-id").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(session.context().await, before);
    }

    #[tokio::test]
    async fn test_deleting_last_conversation_leaves_exactly_one() {
        let session = session_with(Arc::new(MockDispatcher::new(vec![]))).await;
        let conversation_id = session.context().await.conversation_id;

        session.delete_conversation(&conversation_id).await.unwrap();

        let conversations = session.conversations().await;
        assert_eq!(conversations.len(), 1);
        assert_ne!(conversations[0].id, conversation_id);
        assert_eq!(session.context().await.conversation_id, conversations[0].id);
    }

    #[tokio::test]
    async fn test_deleting_active_conversation_activates_most_recent() {
        let session =
            session_with(Arc::new(MockDispatcher::new(vec![Ok("Hi!".to_string())]))).await;
        session.send("Hello").await.unwrap();
        let touched = session.context().await.conversation_id;

        let fresh = session.new_conversation().await.unwrap();
        session.delete_conversation(&fresh.id).await.unwrap();

        assert_eq!(session.context().await.conversation_id, touched);
    }
}
