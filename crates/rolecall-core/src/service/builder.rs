//! Interactive character creation.
//!
//! `CreateFlow` is the state machine:
//!
//! ```text
//! AwaitingDescription -> AwaitingLevel -> AwaitingMeta -> Done
//! ```
//!
//! `CharacterBuilder` drives it through a `ConversationCollector`, one step
//! per state, and hands the finished record to the `CharacterStore`.
//!
//! The terminal failure states are not phases; `create` returns them as
//! errors and the store is never touched:
//!
//! | state | error | entered |
//! |---|---|---|
//! | invalid name | `Parse` (blank) or `DuplicateName` (taken) | before the first prompt |
//! | cancelled | `Cancelled` | `cancel` at any step |
//! | timed out | `Timeout` | no reply within a step's window |
//!
//! A bad level also ends the flow with `Parse` unless
//! `FlowConfig::retry_invalid_level` is set.

use std::sync::Arc;

use rolecall_types::character::{parse_level, validate_name, Character, MetaMap};
use rolecall_types::config::FlowConfig;
use rolecall_types::error::CharacterError;
use rolecall_types::ids::UserId;
use rolecall_types::message::Invocation;
use tracing::{info, warn};

use crate::conversation::collector::{ConversationCollector, Reply, Step};
use crate::conversation::transport::ChatTransport;
use crate::meta::parse_meta;
use crate::repository::character::CharacterRepository;
use crate::service::store::CharacterStore;

pub const DESCRIPTION_PROMPT: &str = "Describe the character (Relevant character sheet)";
pub const EMPTY_DESCRIPTION_RETRY: &str = "The description can't be empty! Try again";
pub const LEVEL_PROMPT: &str = "What level is the character?";
pub const INVALID_LEVEL_RETRY: &str = "That isn't a valid level! Try again";
pub const META_PROMPT: &str = "Any additional info? (Add a character image using the image keyword. \
Formats use regular syntax i.e `image: http://image.com/image.jpg, hair_color: blond, nickname: Kevin` \
(Separate keys with commas or newlines). Reply `skip` to leave it empty or `cancel` to stop.";
pub const INVALID_META_RETRY: &str = "Invalid formatting! Try again";
pub const SKIP_KEYWORD: &str = "skip";
pub const SKIPPED_ACK: &str = "Skipping!";
pub const CREATED_ACK: &str = "Character created! Add party members to their team with the team commands.";

/// Where a create flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePhase {
    AwaitingDescription,
    AwaitingLevel,
    AwaitingMeta,
    Done,
}

/// An accepted answer for one phase.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Description(String),
    Level(u64),
    Meta(MetaMap),
}

/// Accumulates answers and tracks the current phase.
#[derive(Debug, Clone)]
pub struct CreateFlow {
    phase: CreatePhase,
    name: String,
    owner: UserId,
    description: String,
    level: u64,
    meta: MetaMap,
}

impl CreateFlow {
    pub fn new(name: impl Into<String>, owner: UserId) -> Self {
        Self {
            phase: CreatePhase::AwaitingDescription,
            name: name.into(),
            owner,
            description: String::new(),
            level: 0,
            meta: MetaMap::new(),
        }
    }

    pub fn phase(&self) -> CreatePhase {
        self.phase
    }

    /// Record the answer for the current phase and move to the next one.
    ///
    /// An answer for a different phase is ignored and the phase is unchanged.
    pub fn advance(&mut self, answer: Answer) -> CreatePhase {
        self.phase = match (self.phase, answer) {
            (CreatePhase::AwaitingDescription, Answer::Description(description)) => {
                self.description = description;
                CreatePhase::AwaitingLevel
            }
            (CreatePhase::AwaitingLevel, Answer::Level(level)) => {
                self.level = level;
                CreatePhase::AwaitingMeta
            }
            (CreatePhase::AwaitingMeta, Answer::Meta(meta)) => {
                self.meta = meta;
                CreatePhase::Done
            }
            (phase, answer) => {
                warn!(?phase, ?answer, "answer does not match phase, ignoring");
                phase
            }
        };
        self.phase
    }

    /// Assemble the record from the answers collected so far. Team starts empty.
    pub fn build(&self) -> Character {
        Character::new(
            self.name.clone(),
            self.owner,
            self.description.clone(),
            self.level,
            self.meta.clone(),
        )
    }
}

/// What the user typed at the meta step.
enum MetaAnswer {
    Skipped,
    Provided(MetaMap),
}

/// Orchestrates the create flow over a chat transport and a store.
pub struct CharacterBuilder<R: CharacterRepository, T: ChatTransport> {
    store: Arc<CharacterStore<R>>,
    transport: Arc<T>,
    config: FlowConfig,
}

impl<R: CharacterRepository, T: ChatTransport> CharacterBuilder<R, T> {
    pub fn new(store: Arc<CharacterStore<R>>, transport: Arc<T>, config: FlowConfig) -> Self {
        Self {
            store,
            transport,
            config,
        }
    }

    /// Run the full create flow for `name` on behalf of the invoking user.
    ///
    /// Fails with `Parse` for a blank name or `DuplicateName` for a taken
    /// one, before any prompt. On success the character is in the store and
    /// the user has been told.
    pub async fn create(
        &self,
        invocation: Invocation,
        name: &str,
    ) -> Result<Character, CharacterError> {
        validate_name(name)?;
        self.store.ensure_available(invocation.guild, name).await?;

        let collector = ConversationCollector::new(self.transport.as_ref(), invocation);
        let flow_id = collector.flow_id();
        info!(%flow_id, guild = %invocation.guild, %name, "character creation started");

        let mut flow = CreateFlow::new(name, invocation.author);
        let character = match self.collect(&collector, &mut flow).await {
            Ok(character) => character,
            Err(e) => {
                warn!(%flow_id, phase = ?flow.phase(), error = %e, "character creation aborted");
                return Err(e);
            }
        };

        let character = self.store.add(invocation.guild, character).await?;
        collector.say(CREATED_ACK).await?;
        info!(%flow_id, %name, "character creation finished");
        Ok(character)
    }

    async fn collect(
        &self,
        collector: &ConversationCollector<'_, T>,
        flow: &mut CreateFlow,
    ) -> Result<Character, CharacterError> {
        loop {
            let answer = match flow.phase() {
                CreatePhase::AwaitingDescription => {
                    let step = Step::new(
                        "description",
                        DESCRIPTION_PROMPT,
                        self.config.description_timeout(),
                    );
                    Answer::Description(collector.ask_until(&step, description_reply).await?)
                }
                CreatePhase::AwaitingLevel => Answer::Level(self.ask_level(collector).await?),
                CreatePhase::AwaitingMeta => Answer::Meta(self.ask_meta(collector).await?),
                CreatePhase::Done => return Ok(flow.build()),
            };
            flow.advance(answer);
        }
    }

    async fn ask_level(&self, collector: &ConversationCollector<'_, T>) -> Result<u64, CharacterError> {
        let step = Step::new("level", LEVEL_PROMPT, self.config.level_timeout());
        if self.config.retry_invalid_level {
            collector
                .ask_until(&step, |raw| match parse_level(raw) {
                    Ok(level) => Reply::Accept(level),
                    Err(_) => Reply::Retry(INVALID_LEVEL_RETRY.to_string()),
                })
                .await
        } else {
            collector.ask_with(&step, parse_level).await
        }
    }

    async fn ask_meta(
        &self,
        collector: &ConversationCollector<'_, T>,
    ) -> Result<MetaMap, CharacterError> {
        let step = Step::new("meta", META_PROMPT, self.config.meta_timeout());
        match collector.ask_until(&step, meta_reply).await? {
            MetaAnswer::Skipped => {
                collector.say(SKIPPED_ACK).await?;
                Ok(MetaMap::new())
            }
            MetaAnswer::Provided(meta) => Ok(meta),
        }
    }
}

fn description_reply(raw: &str) -> Reply<String> {
    if raw.trim().is_empty() {
        Reply::Retry(EMPTY_DESCRIPTION_RETRY.to_string())
    } else {
        Reply::Accept(raw.to_string())
    }
}

fn meta_reply(raw: &str) -> Reply<MetaAnswer> {
    if raw.trim().eq_ignore_ascii_case(SKIP_KEYWORD) {
        return Reply::Accept(MetaAnswer::Skipped);
    }
    match parse_meta(raw) {
        Ok(meta) => Reply::Accept(MetaAnswer::Provided(meta)),
        Err(_) => Reply::Retry(INVALID_META_RETRY.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::conversation::collector::CANCELLED_ACK;
    use crate::conversation::hub::MessageHub;
    use crate::conversation::transport::HubTransport;
    use crate::conversation::transport::testing::RecordingSink;
    use crate::repository::memory::InMemoryCharacterRepository;
    use rolecall_types::ids::{ChannelId, GuildId};
    use rolecall_types::message::IncomingMessage;
    use tokio::task::JoinHandle;

    const GUILD: GuildId = GuildId(1);
    const CHANNEL: ChannelId = ChannelId(10);
    const USER: UserId = UserId(100);

    type Store = CharacterStore<InMemoryCharacterRepository>;
    type Transport = HubTransport<RecordingSink>;

    struct Harness {
        store: Arc<Store>,
        transport: Arc<Transport>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                store: Arc::new(CharacterStore::new(InMemoryCharacterRepository::new())),
                transport: Arc::new(HubTransport::new(
                    Arc::new(MessageHub::new()),
                    RecordingSink::default(),
                )),
            }
        }

        fn start(&self, author: UserId, name: &str, config: FlowConfig) -> JoinHandle<Result<Character, CharacterError>> {
            let builder = CharacterBuilder::new(
                Arc::clone(&self.store),
                Arc::clone(&self.transport),
                config,
            );
            let name = name.to_string();
            tokio::spawn(async move {
                builder
                    .create(Invocation::new(GUILD, CHANNEL, author), &name)
                    .await
            })
        }

        /// Wait for `author`'s flow to suspend, then reply as them.
        async fn say(&self, author: UserId, content: &str) {
            let hub = self.transport.hub();
            while !hub.is_waiting(CHANNEL, author) {
                tokio::task::yield_now().await;
            }
            hub.dispatch(IncomingMessage::new(GUILD, CHANNEL, author, content));
        }

        fn sent(&self) -> Vec<String> {
            self.transport.sink().texts()
        }
    }

    #[tokio::test]
    async fn create_collects_all_answers() {
        let h = Harness::new();
        let flow = h.start(USER, "Aria", FlowConfig::default());

        h.say(USER, "A knight").await;
        h.say(USER, "5").await;
        h.say(USER, "image: http://x/y.png").await;

        let character = flow.await.unwrap().unwrap();
        assert_eq!(character.name, "Aria");
        assert_eq!(character.owner, USER);
        assert_eq!(character.description, "A knight");
        assert_eq!(character.level, 5);
        assert_eq!(character.meta.len(), 1);
        assert_eq!(character.meta["image"], "http://x/y.png");
        assert!(character.team.is_empty());

        assert_eq!(h.store.get(GUILD, "Aria").await.unwrap(), character);
        assert_eq!(
            h.sent(),
            vec![DESCRIPTION_PROMPT, LEVEL_PROMPT, META_PROMPT, CREATED_ACK]
        );
    }

    #[tokio::test]
    async fn cancel_at_description_adds_nothing() {
        let h = Harness::new();
        let flow = h.start(USER, "Aria", FlowConfig::default());

        h.say(USER, "cancel").await;

        assert!(matches!(flow.await.unwrap(), Err(CharacterError::Cancelled)));
        assert!(h.store.get_all(GUILD).await.unwrap().is_empty());
        assert_eq!(h.sent(), vec![DESCRIPTION_PROMPT, CANCELLED_ACK]);
    }

    #[tokio::test]
    async fn cancel_at_meta_adds_nothing() {
        let h = Harness::new();
        let flow = h.start(USER, "Aria", FlowConfig::default());

        h.say(USER, "A knight").await;
        h.say(USER, "5").await;
        h.say(USER, "a:1").await;
        h.say(USER, "Cancel").await;

        assert!(matches!(flow.await.unwrap(), Err(CharacterError::Cancelled)));
        assert!(h.store.get_all(GUILD).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_at_level_adds_nothing() {
        let h = Harness::new();
        let flow = h.start(USER, "Aria", FlowConfig::default());

        h.say(USER, "A knight").await;
        // Nobody answers the level prompt.

        let result = flow.await.unwrap();
        assert!(matches!(result, Err(CharacterError::Timeout(d)) if d == Duration::from_secs(60)));
        assert!(h.store.get_all(GUILD).await.unwrap().is_empty());
        assert_eq!(h.transport.hub().waiting_count(), 0);
    }

    #[tokio::test]
    async fn invalid_level_fails_flow_by_default() {
        let h = Harness::new();
        let flow = h.start(USER, "Aria", FlowConfig::default());

        h.say(USER, "A knight").await;
        h.say(USER, "five").await;

        assert!(matches!(flow.await.unwrap(), Err(CharacterError::Parse(_))));
        assert!(h.store.get_all(GUILD).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_level_retries_when_configured() {
        let h = Harness::new();
        let config = FlowConfig {
            retry_invalid_level: true,
            ..FlowConfig::default()
        };
        let flow = h.start(USER, "Aria", config);

        h.say(USER, "A knight").await;
        h.say(USER, "five").await;
        h.say(USER, "5").await;
        h.say(USER, "skip").await;

        let character = flow.await.unwrap().unwrap();
        assert_eq!(character.level, 5);
        assert!(h.sent().iter().any(|t| t == INVALID_LEVEL_RETRY));
    }

    #[tokio::test]
    async fn bad_meta_reprompts_until_valid() {
        let h = Harness::new();
        let flow = h.start(USER, "Aria", FlowConfig::default());

        h.say(USER, "A knight").await;
        h.say(USER, "5").await;
        h.say(USER, "hair_color:blond").await;
        h.say(USER, "oops, nickname: Kev").await;
        h.say(USER, "hair_color: blond\nnickname: Kev").await;

        let character = flow.await.unwrap().unwrap();
        let keys: Vec<&str> = character.meta.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["hair_color", "nickname"]);
        assert_eq!(
            h.sent().iter().filter(|t| *t == INVALID_META_RETRY).count(),
            2
        );
    }

    #[tokio::test]
    async fn skip_leaves_meta_empty() {
        let h = Harness::new();
        let flow = h.start(USER, "Aria", FlowConfig::default());

        h.say(USER, "A knight").await;
        h.say(USER, "5").await;
        h.say(USER, "SKIP").await;

        let character = flow.await.unwrap().unwrap();
        assert!(character.meta.is_empty());
        assert!(h.sent().iter().any(|t| t == SKIPPED_ACK));
    }

    #[tokio::test]
    async fn empty_description_reprompts() {
        let h = Harness::new();
        let flow = h.start(USER, "Aria", FlowConfig::default());

        h.say(USER, "   ").await;
        h.say(USER, "A knight").await;
        h.say(USER, "1").await;
        h.say(USER, "skip").await;

        assert_eq!(flow.await.unwrap().unwrap().description, "A knight");
        assert!(h.sent().iter().any(|t| t == EMPTY_DESCRIPTION_RETRY));
    }

    #[tokio::test]
    async fn existing_name_is_rejected_before_prompting() {
        let h = Harness::new();
        h.store
            .add(GUILD, Character::new("Aria", UserId(5), "taken", 1, MetaMap::new()))
            .await
            .unwrap();

        let result = h.start(USER, "Aria", FlowConfig::default()).await.unwrap();
        assert!(matches!(result, Err(CharacterError::DuplicateName(_))));
        assert!(h.sent().is_empty());
    }

    #[tokio::test]
    async fn blank_name_is_rejected_before_prompting() {
        let h = Harness::new();
        for name in ["", "   "] {
            let result = h.start(USER, name, FlowConfig::default()).await.unwrap();
            assert!(matches!(result, Err(CharacterError::Parse(_))));
        }
        assert!(h.sent().is_empty());
        assert!(h.store.get_all(GUILD).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unstorable_level_fails_flow_by_default() {
        let h = Harness::new();
        let flow = h.start(USER, "Aria", FlowConfig::default());

        h.say(USER, "A knight").await;
        h.say(USER, "9223372036854775808").await;

        assert!(matches!(flow.await.unwrap(), Err(CharacterError::Parse(_))));
        assert!(h.store.get_all(GUILD).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unstorable_level_reprompts_when_configured() {
        let h = Harness::new();
        let config = FlowConfig {
            retry_invalid_level: true,
            ..FlowConfig::default()
        };
        let flow = h.start(USER, "Aria", config);

        h.say(USER, "A knight").await;
        h.say(USER, "18446744073709551615").await;
        h.say(USER, "9223372036854775807").await;
        h.say(USER, "skip").await;

        let character = flow.await.unwrap().unwrap();
        assert_eq!(character.level, 9_223_372_036_854_775_807);
        assert_eq!(
            h.sent().iter().filter(|t| *t == INVALID_LEVEL_RETRY).count(),
            1
        );
    }

    #[tokio::test]
    async fn concurrent_flows_progress_independently() {
        let h = Harness::new();
        let alice = UserId(1);
        let bob = UserId(2);
        let alice_flow = h.start(alice, "Aria", FlowConfig::default());
        let bob_flow = h.start(bob, "Bran", FlowConfig::default());

        // Interleave the two conversations in one channel.
        h.say(bob, "A ranger").await;
        h.say(alice, "A knight").await;
        h.say(alice, "5").await;
        h.say(bob, "3").await;
        h.say(bob, "skip").await;
        h.say(alice, "image: a.png").await;

        let aria = alice_flow.await.unwrap().unwrap();
        let bran = bob_flow.await.unwrap().unwrap();
        assert_eq!((aria.owner, aria.description.as_str(), aria.level), (alice, "A knight", 5));
        assert_eq!((bran.owner, bran.description.as_str(), bran.level), (bob, "A ranger", 3));
        assert_eq!(h.store.get_all(GUILD).await.unwrap().len(), 2);
    }

    #[test]
    fn create_flow_transitions_in_order() {
        let mut flow = CreateFlow::new("Aria", USER);
        assert_eq!(flow.phase(), CreatePhase::AwaitingDescription);

        // Out-of-order answers are ignored.
        assert_eq!(flow.advance(Answer::Level(3)), CreatePhase::AwaitingDescription);

        assert_eq!(
            flow.advance(Answer::Description("A knight".to_string())),
            CreatePhase::AwaitingLevel
        );
        assert_eq!(flow.advance(Answer::Level(5)), CreatePhase::AwaitingMeta);
        assert_eq!(flow.advance(Answer::Meta(MetaMap::new())), CreatePhase::Done);

        let character = flow.build();
        assert_eq!(character.name, "Aria");
        assert_eq!(character.level, 5);
        assert_eq!(character.owner, USER);
    }

    #[test]
    fn meta_reply_tags() {
        assert!(matches!(meta_reply(" skip "), Reply::Accept(MetaAnswer::Skipped)));
        assert!(matches!(meta_reply("a: 1"), Reply::Accept(MetaAnswer::Provided(_))));
        assert!(matches!(meta_reply("a:1"), Reply::Retry(ref m) if m == INVALID_META_RETRY));
    }
}
