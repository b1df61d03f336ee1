//! Routing of inbound chat messages to suspended conversations.
//!
//! The `MessageHub` is the "await the next matching message" half of the
//! chat transport. A conversation registers a waiter keyed by
//! `(channel, author)` and suspends on a `oneshot` receiver; the transport's
//! inbound loop calls `dispatch` for every message it sees. Messages nobody
//! is waiting for are dropped -- they are never buffered for a later step.

use std::time::Duration;

use dashmap::DashMap;
use rolecall_types::ids::{ChannelId, UserId};
use rolecall_types::message::IncomingMessage;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

/// Conversations are matched on channel and author only.
type WaitKey = (ChannelId, UserId);

struct Waiter {
    id: Uuid,
    tx: oneshot::Sender<IncomingMessage>,
}

/// Dispatcher from inbound messages to waiting conversations.
#[derive(Default)]
pub struct MessageHub {
    /// Pending waiters per (channel, author), oldest first.
    waiters: DashMap<WaitKey, Vec<Waiter>>,
}

impl MessageHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an inbound message to every waiter registered for its
    /// channel and author.
    ///
    /// Returns the number of waiters that received it; `0` means the message
    /// matched no conversation and was dropped.
    pub fn dispatch(&self, msg: IncomingMessage) -> usize {
        let key = (msg.channel, msg.author);
        let Some((_, waiters)) = self.waiters.remove(&key) else {
            return 0;
        };

        let mut delivered = 0;
        for waiter in waiters {
            // A closed receiver means that wait was abandoned mid-dispatch.
            if waiter.tx.send(msg.clone()).is_ok() {
                delivered += 1;
            }
        }
        debug!(channel = %msg.channel, author = %msg.author, delivered, "dispatched message");
        delivered
    }

    /// Suspend until a message from `author` arrives in `channel`, or until
    /// `timeout` elapses.
    ///
    /// Returns `None` on timeout. The waiter is deregistered when this future
    /// completes or is dropped, so an abandoned wait never swallows a later
    /// message.
    pub async fn wait_for(
        &self,
        channel: ChannelId,
        author: UserId,
        timeout: Duration,
    ) -> Option<IncomingMessage> {
        let key = (channel, author);
        let (tx, rx) = oneshot::channel();
        let id = Uuid::now_v7();

        self.waiters.entry(key).or_default().push(Waiter { id, tx });
        let _guard = WaiterGuard { hub: self, key, id };
        debug!(%channel, %author, %id, ?timeout, "waiting for message");

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(msg)) => Some(msg),
            // Sender dropped without a message: nothing will ever arrive.
            Ok(Err(_)) => None,
            Err(_) => {
                debug!(%channel, %author, %id, "wait timed out");
                None
            }
        }
    }

    /// Whether some conversation is waiting on `author` in `channel`.
    pub fn is_waiting(&self, channel: ChannelId, author: UserId) -> bool {
        self.waiters
            .get(&(channel, author))
            .is_some_and(|waiters| !waiters.is_empty())
    }

    /// Number of conversations currently suspended.
    pub fn waiting_count(&self) -> usize {
        self.waiters.iter().map(|entry| entry.value().len()).sum()
    }

    fn remove_waiter(&self, key: &WaitKey, id: Uuid) {
        let now_empty = match self.waiters.get_mut(key) {
            Some(mut entry) => {
                entry.retain(|w| w.id != id);
                entry.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.waiters.remove_if(key, |_, waiters| waiters.is_empty());
        }
    }
}

impl std::fmt::Debug for MessageHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHub")
            .field("waiting", &self.waiting_count())
            .finish()
    }
}

/// Removes a waiter on drop (timeout, completion, or cancellation of the
/// awaiting task).
struct WaiterGuard<'a> {
    hub: &'a MessageHub,
    key: WaitKey,
    id: Uuid,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.hub.remove_waiter(&self.key, self.id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use rolecall_types::ids::GuildId;

    fn msg(channel: u64, author: u64, content: &str) -> IncomingMessage {
        IncomingMessage::new(GuildId(1), ChannelId(channel), UserId(author), content)
    }

    async fn until_waiting(hub: &MessageHub, n: usize) {
        while hub.waiting_count() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn dispatch_reaches_matching_waiter() {
        let hub = Arc::new(MessageHub::new());
        let waiter = {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                hub.wait_for(ChannelId(10), UserId(20), Duration::from_secs(5))
                    .await
            })
        };
        until_waiting(&hub, 1).await;

        assert_eq!(hub.dispatch(msg(10, 20, "hello")), 1);
        let got = waiter.await.unwrap().unwrap();
        assert_eq!(got.content, "hello");
        assert_eq!(hub.waiting_count(), 0);
    }

    #[tokio::test]
    async fn unmatched_messages_are_dropped_not_buffered() {
        let hub = Arc::new(MessageHub::new());

        // Nobody waiting yet: dropped.
        assert_eq!(hub.dispatch(msg(10, 20, "early")), 0);

        let waiter = {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                hub.wait_for(ChannelId(10), UserId(20), Duration::from_secs(5))
                    .await
            })
        };
        until_waiting(&hub, 1).await;

        // Wrong author, wrong channel: ignored, waiter stays registered.
        assert_eq!(hub.dispatch(msg(10, 99, "other user")), 0);
        assert_eq!(hub.dispatch(msg(11, 20, "other channel")), 0);
        assert_eq!(hub.waiting_count(), 1);

        hub.dispatch(msg(10, 20, "late"));
        assert_eq!(waiter.await.unwrap().unwrap().content, "late");
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_and_deregisters() {
        let hub = MessageHub::new();
        let got = hub
            .wait_for(ChannelId(1), UserId(2), Duration::from_secs(60))
            .await;
        assert!(got.is_none());
        assert_eq!(hub.waiting_count(), 0);

        // A message after the timeout finds nobody.
        assert_eq!(hub.dispatch(msg(1, 2, "too late")), 0);
    }

    #[tokio::test]
    async fn dropped_wait_is_deregistered() {
        let hub = Arc::new(MessageHub::new());
        let waiter = {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                hub.wait_for(ChannelId(1), UserId(2), Duration::from_secs(60))
                    .await
            })
        };
        until_waiting(&hub, 1).await;

        waiter.abort();
        let _ = waiter.await;
        assert_eq!(hub.waiting_count(), 0);
    }

    #[tokio::test]
    async fn independent_conversations_do_not_interfere() {
        let hub = Arc::new(MessageHub::new());
        let spawn_wait = |author: u64| {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                hub.wait_for(ChannelId(1), UserId(author), Duration::from_secs(5))
                    .await
            })
        };
        let alice = spawn_wait(100);
        let bob = spawn_wait(200);
        until_waiting(&hub, 2).await;

        hub.dispatch(msg(1, 200, "bob speaks"));
        assert_eq!(bob.await.unwrap().unwrap().content, "bob speaks");
        assert_eq!(hub.waiting_count(), 1);

        hub.dispatch(msg(1, 100, "alice speaks"));
        assert_eq!(alice.await.unwrap().unwrap().content, "alice speaks");
    }

    #[test]
    fn debug_impl() {
        let hub = MessageHub::new();
        let debug = format!("{hub:?}");
        assert!(debug.contains("MessageHub"));
        assert!(debug.contains("waiting"));
    }
}
