//! Outbound exchange layer of the facet workspace: the dispatcher
//! contract, outbound message assembly, and the HTTP implementation of
//! the chat endpoint.

pub mod dispatcher;
pub mod http_dispatcher;

pub use dispatcher::{
    ChatDispatcher, ChatRequest, GENERIC_FAILURE, OutboundMessage, outbound_messages,
};
pub use http_dispatcher::HttpChatDispatcher;
