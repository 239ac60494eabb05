//! Conversation domain module.

pub mod message;
pub mod model;
pub mod repository;

pub use message::{ConversationMessage, MessageRole};
pub use model::{Conversation, DEFAULT_TITLE, TITLE_LIMIT, derive_title};
pub use repository::ConversationRepository;
