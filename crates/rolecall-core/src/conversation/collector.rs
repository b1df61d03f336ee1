//! Prompt/await/validate steps for a single user in a single channel.
//!
//! A `ConversationCollector` is created per invocation. Each step posts a
//! prompt, suspends until the invoking user replies in the invoking channel,
//! and hands the reply to a parser. Steps run strictly in sequence because
//! every method takes the collector by shared reference and is awaited by the
//! flow before the next one starts.

use std::time::Duration;

use rolecall_types::error::CharacterError;
use rolecall_types::message::{IncomingMessage, Invocation};
use tracing::{debug, info};
use uuid::Uuid;

use super::transport::ChatTransport;

/// Reply that aborts a cancellable step.
pub const CANCEL_KEYWORD: &str = "cancel";

/// Acknowledgement sent when a step is cancelled.
pub const CANCELLED_ACK: &str = "Cancelling!";

/// One prompt/await unit.
#[derive(Debug, Clone)]
pub struct Step {
    /// Short label used in logs (e.g. "description").
    pub label: &'static str,
    pub prompt: String,
    /// Applies to each wait separately; retries get a fresh window.
    pub timeout: Duration,
    /// Whether a `cancel` reply aborts the flow.
    pub cancellable: bool,
}

impl Step {
    /// A cancellable step.
    pub fn new(label: &'static str, prompt: impl Into<String>, timeout: Duration) -> Self {
        Self {
            label,
            prompt: prompt.into(),
            timeout,
            cancellable: true,
        }
    }

    /// Treat `cancel` as ordinary input for this step.
    pub fn not_cancellable(mut self) -> Self {
        self.cancellable = false;
        self
    }
}

/// Outcome of parsing one reply in a retrying step.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    /// The reply is valid; the step is done.
    Accept(T),
    /// The reply was rejected; send this message and wait again.
    Retry(String),
}

/// Drives the steps of one flow for one (channel, author) pair.
pub struct ConversationCollector<'t, T: ChatTransport> {
    transport: &'t T,
    invocation: Invocation,
    flow_id: Uuid,
}

impl<'t, T: ChatTransport> ConversationCollector<'t, T> {
    pub fn new(transport: &'t T, invocation: Invocation) -> Self {
        Self {
            transport,
            invocation,
            flow_id: Uuid::now_v7(),
        }
    }

    /// Identifier attached to every log line of this flow.
    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Post a message to the invoking channel without waiting for a reply.
    pub async fn say(&self, text: &str) -> Result<(), CharacterError> {
        self.transport.send(self.invocation.channel, text).await
    }

    /// Prompt and return the raw reply text.
    pub async fn ask(&self, step: &Step) -> Result<String, CharacterError> {
        self.say(&step.prompt).await?;
        let reply = self.await_reply(step).await?;
        Ok(reply.content)
    }

    /// Prompt once and validate the reply; a validation error ends the flow.
    pub async fn ask_with<V, F>(&self, step: &Step, validate: F) -> Result<V, CharacterError>
    where
        F: FnOnce(&str) -> Result<V, CharacterError>,
    {
        let raw = self.ask(step).await?;
        validate(&raw).inspect_err(|e| {
            debug!(flow_id = %self.flow_id, step = step.label, error = %e, "reply rejected");
        })
    }

    /// Prompt once, then keep waiting until `parse` accepts a reply.
    ///
    /// Each rejected reply sends the parser's retry message and waits again
    /// with a fresh timeout. Only cancel, timeout, or a transport failure end
    /// the loop early.
    pub async fn ask_until<V, F>(&self, step: &Step, mut parse: F) -> Result<V, CharacterError>
    where
        F: FnMut(&str) -> Reply<V>,
    {
        self.say(&step.prompt).await?;
        let mut attempt = 1u32;
        loop {
            let reply = self.await_reply(step).await?;
            match parse(&reply.content) {
                Reply::Accept(value) => return Ok(value),
                Reply::Retry(message) => {
                    debug!(flow_id = %self.flow_id, step = step.label, attempt, "reply rejected, retrying");
                    self.say(&message).await?;
                    attempt += 1;
                }
            }
        }
    }

    async fn await_reply(&self, step: &Step) -> Result<IncomingMessage, CharacterError> {
        let Invocation {
            channel, author, ..
        } = self.invocation;

        let reply = self
            .transport
            .next_message(channel, author, step.timeout)
            .await
            .inspect_err(|e| {
                debug!(flow_id = %self.flow_id, step = step.label, error = %e, "no reply");
            })?;

        if step.cancellable && reply.is_keyword(CANCEL_KEYWORD) {
            info!(flow_id = %self.flow_id, step = step.label, "flow cancelled by user");
            self.say(CANCELLED_ACK).await?;
            return Err(CharacterError::Cancelled);
        }
        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
