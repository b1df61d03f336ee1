//! Application state wiring the character services together.
//!
//! Services are generic over the repository and transport traits; AppState
//! pins them to the SQLite (or in-memory) repository and the console
//! transport.

use std::sync::Arc;

use anyhow::Context;
use rolecall_core::conversation::{HubTransport, MessageHub};
use rolecall_core::repository::character::CharacterRepository;
use rolecall_core::repository::memory::InMemoryCharacterRepository;
use rolecall_core::service::{CharacterBuilder, CharacterEditor, CharacterStore};
use rolecall_infra::config::{database_url, load_config};
use rolecall_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use rolecall_infra::sqlite::character::SqliteCharacterRepository;
use rolecall_infra::sqlite::pool::DatabasePool;
use rolecall_types::character::Character;
use rolecall_types::config::RolecallConfig;
use rolecall_types::error::RepositoryError;
use rolecall_types::ids::GuildId;

use crate::cli::console::ConsoleSink;

/// Repository selected at startup.
pub enum CharacterBackend {
    Sqlite(SqliteCharacterRepository),
    Memory(InMemoryCharacterRepository),
}

impl CharacterRepository for CharacterBackend {
    async fn list(&self, guild: GuildId) -> Result<Vec<Character>, RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.list(guild).await,
            Self::Memory(repo) => repo.list(guild).await,
        }
    }

    async fn get(&self, guild: GuildId, name: &str) -> Result<Option<Character>, RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.get(guild, name).await,
            Self::Memory(repo) => repo.get(guild, name).await,
        }
    }

    async fn insert(&self, guild: GuildId, character: &Character) -> Result<(), RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.insert(guild, character).await,
            Self::Memory(repo) => repo.insert(guild, character).await,
        }
    }

    async fn update(&self, guild: GuildId, character: &Character) -> Result<(), RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.update(guild, character).await,
            Self::Memory(repo) => repo.update(guild, character).await,
        }
    }

    async fn rename(
        &self,
        guild: GuildId,
        old_name: &str,
        character: &Character,
    ) -> Result<(), RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.rename(guild, old_name, character).await,
            Self::Memory(repo) => repo.rename(guild, old_name, character).await,
        }
    }

    async fn delete(&self, guild: GuildId, name: &str) -> Result<bool, RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.delete(guild, name).await,
            Self::Memory(repo) => repo.delete(guild, name).await,
        }
    }
}

/// Concrete type aliases for the service generics pinned to the CLI.
pub type ConcreteStore = CharacterStore<CharacterBackend>;
pub type ConsoleTransport = HubTransport<ConsoleSink>;
pub type ConcreteBuilder = CharacterBuilder<CharacterBackend, ConsoleTransport>;
pub type ConcreteEditor = CharacterEditor<CharacterBackend>;

/// Shared application state.
pub struct AppState {
    pub store: Arc<ConcreteStore>,
    pub transport: Arc<ConsoleTransport>,
    pub config: RolecallConfig,
}

impl AppState {
    /// Load config, open the database (unless `in_memory`), wire services.
    pub async fn init(in_memory: bool) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;

        let backend = if in_memory {
            tracing::debug!("using in-memory character store");
            CharacterBackend::Memory(InMemoryCharacterRepository::new())
        } else {
            let db_url = database_url(&config, &data_dir);
            tracing::debug!(%db_url, "opening character database");
            let db_pool = DatabasePool::new(&db_url)
                .await
                .with_context(|| format!("failed to open database {db_url}"))?;
            CharacterBackend::Sqlite(SqliteCharacterRepository::new(db_pool))
        };

        let hub = Arc::new(MessageHub::new());

        Ok(Self {
            store: Arc::new(CharacterStore::new(backend)),
            transport: Arc::new(HubTransport::new(hub, ConsoleSink)),
            config,
        })
    }

    pub fn hub(&self) -> &Arc<MessageHub> {
        self.transport.hub()
    }

    pub fn builder(&self) -> ConcreteBuilder {
        CharacterBuilder::new(
            Arc::clone(&self.store),
            Arc::clone(&self.transport),
            self.config.flow.clone(),
        )
    }

    pub fn editor(&self) -> ConcreteEditor {
        CharacterEditor::new(Arc::clone(&self.store))
    }
}
