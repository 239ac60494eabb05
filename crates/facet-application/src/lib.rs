//! Application layer of the facet workspace: persona and conversation
//! store services plus the `ChatSession` controller that orchestrates the
//! active conversation.

pub mod context;
pub mod conversation_service;
pub mod persona_service;
pub mod session;

pub use context::SessionContext;
pub use conversation_service::ConversationService;
pub use persona_service::PersonaService;
pub use session::{ChatSession, SendOutcome, SessionState, SkipReason};
