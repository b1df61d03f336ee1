//! Multi-turn conversations over an async chat stream.
//!
//! - `hub` -- `MessageHub` routing inbound messages to suspended conversations
//! - `transport` -- `PromptSink` / `ChatTransport` traits and `HubTransport`
//! - `collector` -- `ConversationCollector` prompt/await/validate steps

pub mod collector;
pub mod hub;
pub mod transport;

pub use collector::{ConversationCollector, Reply, Step};
pub use hub::MessageHub;
pub use transport::{ChatTransport, HubTransport, PromptSink};
