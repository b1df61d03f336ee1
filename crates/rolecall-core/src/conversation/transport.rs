//! Chat transport traits.
//!
//! The core never talks to a chat platform directly. It needs exactly two
//! things: send text to a channel, and await the next message from a given
//! author in a given channel. `PromptSink` is the first half; `MessageHub`
//! provides the second; `HubTransport` glues them into a `ChatTransport`.
//! Uses RPITIT (native async fn in traits, Rust 2024 edition).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rolecall_types::error::CharacterError;
use rolecall_types::ids::{ChannelId, UserId};
use rolecall_types::message::IncomingMessage;

use super::hub::MessageHub;

/// Outbound half of a chat transport.
pub trait PromptSink: Send + Sync {
    /// Post `text` to `channel`.
    fn send(
        &self,
        channel: ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<(), CharacterError>> + Send;
}

/// Everything a conversation needs from the chat platform.
pub trait ChatTransport: Send + Sync {
    /// Post `text` to `channel`.
    fn send(
        &self,
        channel: ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<(), CharacterError>> + Send;

    /// Await the next message from `author` in `channel`.
    ///
    /// Fails with `CharacterError::Timeout` if none arrives within `timeout`.
    fn next_message(
        &self,
        channel: ChannelId,
        author: UserId,
        timeout: Duration,
    ) -> impl Future<Output = Result<IncomingMessage, CharacterError>> + Send;
}

/// `ChatTransport` backed by a shared `MessageHub` for inbound messages and
/// a `PromptSink` for outbound text.
pub struct HubTransport<S: PromptSink> {
    hub: Arc<MessageHub>,
    sink: S,
}

impl<S: PromptSink> HubTransport<S> {
    pub fn new(hub: Arc<MessageHub>, sink: S) -> Self {
        Self { hub, sink }
    }

    /// The hub inbound messages should be dispatched into.
    pub fn hub(&self) -> &Arc<MessageHub> {
        &self.hub
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: PromptSink> ChatTransport for HubTransport<S> {
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), CharacterError> {
        self.sink.send(channel, text).await
    }

    async fn next_message(
        &self,
        channel: ChannelId,
        author: UserId,
        timeout: Duration,
    ) -> Result<IncomingMessage, CharacterError> {
        self.hub
            .wait_for(channel, author, timeout)
            .await
            .ok_or(CharacterError::Timeout(timeout))
    }
}
