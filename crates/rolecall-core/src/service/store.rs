//! Guild-scoped character store.
//!
//! `CharacterStore` wraps a `CharacterRepository` with the domain rules:
//! names are unique per guild, and only the owner may edit or delete a
//! character. Every mutation for a guild runs under that guild's async
//! mutex, so two concurrent creates cannot both pass the duplicate-name
//! check. The lock is only held for check-and-write, never while a flow is
//! waiting on the user.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use rolecall_types::character::{Character, CharacterEdit};
use rolecall_types::error::{CharacterError, RepositoryError};
use rolecall_types::ids::{GuildId, UserId};
use tokio::sync::Mutex;
use tracing::info;

use crate::repository::character::CharacterRepository;

/// Service enforcing uniqueness and ownership over a character repository.
///
/// Generic over the repository trait -- rolecall-core never depends on
/// rolecall-infra.
pub struct CharacterStore<R: CharacterRepository> {
    repo: R,
    guild_locks: DashMap<GuildId, Arc<Mutex<()>>>,
}

impl<R: CharacterRepository> CharacterStore<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            guild_locks: DashMap::new(),
        }
    }

    fn guild_lock(&self, guild: GuildId) -> Arc<Mutex<()>> {
        self.guild_locks.entry(guild).or_default().value().clone()
    }

    /// All characters in a guild, keyed and sorted by name.
    pub async fn get_all(
        &self,
        guild: GuildId,
    ) -> Result<BTreeMap<String, Character>, CharacterError> {
        let characters = self.repo.list(guild).await?;
        Ok(characters
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect())
    }

    /// Get one character by exact name.
    pub async fn get(&self, guild: GuildId, name: &str) -> Result<Character, CharacterError> {
        self.repo
            .get(guild, name)
            .await?
            .ok_or_else(|| CharacterError::NotFound(name.to_string()))
    }

    /// Fail with `DuplicateName` if `name` is already taken in the guild.
    pub async fn ensure_available(&self, guild: GuildId, name: &str) -> Result<(), CharacterError> {
        match self.repo.get(guild, name).await? {
            Some(_) => Err(CharacterError::DuplicateName(name.to_string())),
            None => Ok(()),
        }
    }

    /// Add a new character to the guild.
    pub async fn add(&self, guild: GuildId, character: Character) -> Result<Character, CharacterError> {
        let lock = self.guild_lock(guild);
        let _held = lock.lock().await;

        self.ensure_available(guild, &character.name).await?;
        self.repo
            .insert(guild, &character)
            .await
            .map_err(|e| conflict_as_duplicate(e, &character.name))?;

        info!(%guild, name = %character.name, owner = %character.owner, "character added");
        Ok(character)
    }

    /// Delete a character owned by `requester`. Returns the removed record.
    pub async fn remove(
        &self,
        guild: GuildId,
        name: &str,
        requester: UserId,
    ) -> Result<Character, CharacterError> {
        let lock = self.guild_lock(guild);
        let _held = lock.lock().await;

        let character = self.owned(guild, name, requester).await?;
        if !self.repo.delete(guild, name).await? {
            return Err(CharacterError::NotFound(name.to_string()));
        }

        info!(%guild, %name, %requester, "character removed");
        Ok(character)
    }

    /// Apply one field-level edit to a character owned by `requester`.
    ///
    /// A rename moves the record to the new key and keeps every other field,
    /// `created_at` and `team` included. Renaming onto a taken name fails with
    /// `DuplicateName` and changes nothing.
    pub async fn update(
        &self,
        guild: GuildId,
        name: &str,
        edit: CharacterEdit,
        requester: UserId,
    ) -> Result<Character, CharacterError> {
        let lock = self.guild_lock(guild);
        let _held = lock.lock().await;

        let current = self.owned(guild, name, requester).await?;
        let attribute = edit.attribute();
        let mut updated = current.clone();
        edit.apply(&mut updated);

        if updated.name != current.name {
            self.ensure_available(guild, &updated.name).await?;
            self.repo
                .rename(guild, &current.name, &updated)
                .await
                .map_err(|e| conflict_as_duplicate(e, &updated.name))?;
        } else {
            self.repo.update(guild, &updated).await?;
        }

        info!(%guild, %name, %attribute, %requester, "character updated");
        Ok(updated)
    }

    /// Look up `name` and check that `requester` owns it.
    async fn owned(
        &self,
        guild: GuildId,
        name: &str,
        requester: UserId,
    ) -> Result<Character, CharacterError> {
        let character = self.get(guild, name).await?;
        if !character.is_owned_by(requester) {
            return Err(CharacterError::NotOwner(name.to_string()));
        }
        Ok(character)
    }
}

fn conflict_as_duplicate(err: RepositoryError, name: &str) -> CharacterError {
    match err {
        RepositoryError::Conflict(_) => CharacterError::DuplicateName(name.to_string()),
        RepositoryError::NotFound => CharacterError::NotFound(name.to_string()),
        other => other.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
