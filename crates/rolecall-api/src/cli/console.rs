//! Terminal stand-in for a chat channel.
//!
//! Prompts are printed to stdout and every stdin line becomes an inbound
//! message from the invoking user. Lines are handed to the `MessageHub` only
//! while a conversation step is listening, so piped answers line up with the
//! prompts that ask for them.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use rolecall_core::conversation::{MessageHub, PromptSink};
use rolecall_types::error::CharacterError;
use rolecall_types::ids::ChannelId;
use rolecall_types::message::{IncomingMessage, Invocation};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const LISTENER_POLL: Duration = Duration::from_millis(20);

/// Prints bot prompts to stdout.
pub struct ConsoleSink;

impl PromptSink for ConsoleSink {
    async fn send(&self, _channel: ChannelId, text: &str) -> Result<(), CharacterError> {
        for line in text.lines() {
            println!("  {} {}", style("›").cyan().bold(), line);
        }
        Ok(())
    }
}

/// Feeds stdin lines into `hub` as messages from `invocation.author` until
/// `cancel` fires or stdin closes.
pub fn spawn_stdin_pump(
    hub: Arc<MessageHub>,
    invocation: Invocation,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let lines = spawn_line_reader();
    tokio::spawn(pump(hub, invocation, lines, cancel))
}

/// Read stdin on a plain thread. A blocking read cannot be interrupted, and a
/// detached thread does not hold up process exit the way a runtime blocking
/// task would.
fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

async fn pump(
    hub: Arc<MessageHub>,
    invocation: Invocation,
    mut lines: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = until_listening(&hub, &invocation) => {}
        }

        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            debug!("stdin closed");
            break;
        };

        hub.dispatch(IncomingMessage::new(
            invocation.guild,
            invocation.channel,
            invocation.author,
            line,
        ));
    }
}

async fn until_listening(hub: &MessageHub, invocation: &Invocation) {
    while !hub.is_waiting(invocation.channel, invocation.author) {
        tokio::time::sleep(LISTENER_POLL).await;
    }
}
