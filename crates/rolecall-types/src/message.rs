//! Inbound chat message envelope.
//!
//! The transport adapter converts whatever the platform delivers into an
//! `IncomingMessage`; the core only reads the routing ids and the text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{ChannelId, GuildId, UserId};

/// A chat message as seen by the conversation machinery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// UUIDv7 message ID.
    pub id: Uuid,
    pub guild: GuildId,
    pub channel: ChannelId,
    pub author: UserId,
    /// Raw message text, untrimmed.
    pub content: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    /// Build a message stamped with a fresh id and the current time.
    pub fn new(
        guild: GuildId,
        channel: ChannelId,
        author: UserId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            guild,
            channel,
            author,
            content: content.into(),
            received_at: Utc::now(),
        }
    }

    /// Whether the trimmed content equals `word`, ignoring case.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.content.trim().eq_ignore_ascii_case(word)
    }
}

/// Where an invocation came from: the guild, channel, and invoking user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Invocation {
    pub guild: GuildId,
    pub channel: ChannelId,
    pub author: UserId,
}

impl Invocation {
    pub fn new(guild: GuildId, channel: ChannelId, author: UserId) -> Self {
        Self {
            guild,
            channel,
            author,
        }
    }
}
