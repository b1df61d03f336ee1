//! In-memory `CharacterRepository`.
//!
//! Backs ephemeral sessions (`rolecall --memory`) and the flow tests. Each
//! guild's records sit in one `BTreeMap` behind a `DashMap` shard lock, so a
//! rename is a single critical section.

use std::collections::BTreeMap;

use dashmap::DashMap;
use rolecall_types::character::Character;
use rolecall_types::error::RepositoryError;
use rolecall_types::ids::GuildId;

use super::character::CharacterRepository;

#[derive(Debug, Default)]
pub struct InMemoryCharacterRepository {
    guilds: DashMap<GuildId, BTreeMap<String, Character>>,
}

impl InMemoryCharacterRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CharacterRepository for InMemoryCharacterRepository {
    async fn list(&self, guild: GuildId) -> Result<Vec<Character>, RepositoryError> {
        Ok(self
            .guilds
            .get(&guild)
            .map(|chars| chars.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, guild: GuildId, name: &str) -> Result<Option<Character>, RepositoryError> {
        Ok(self
            .guilds
            .get(&guild)
            .and_then(|chars| chars.get(name).cloned()))
    }

    async fn insert(&self, guild: GuildId, character: &Character) -> Result<(), RepositoryError> {
        let mut chars = self.guilds.entry(guild).or_default();
        if chars.contains_key(&character.name) {
            return Err(RepositoryError::Conflict(format!(
                "character '{}' already exists",
                character.name
            )));
        }
        chars.insert(character.name.clone(), character.clone());
        Ok(())
    }

    async fn update(&self, guild: GuildId, character: &Character) -> Result<(), RepositoryError> {
        let mut chars = self.guilds.get_mut(&guild).ok_or(RepositoryError::NotFound)?;
        let slot = chars
            .get_mut(&character.name)
            .ok_or(RepositoryError::NotFound)?;
        *slot = character.clone();
        Ok(())
    }

    async fn rename(
        &self,
        guild: GuildId,
        old_name: &str,
        character: &Character,
    ) -> Result<(), RepositoryError> {
        let mut chars = self.guilds.get_mut(&guild).ok_or(RepositoryError::NotFound)?;
        if !chars.contains_key(old_name) {
            return Err(RepositoryError::NotFound);
        }
        if character.name != old_name && chars.contains_key(&character.name) {
            return Err(RepositoryError::Conflict(format!(
                "character '{}' already exists",
                character.name
            )));
        }
        chars.remove(old_name);
        chars.insert(character.name.clone(), character.clone());
        Ok(())
    }

    async fn delete(&self, guild: GuildId, name: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .guilds
            .get_mut(&guild)
            .map(|mut chars| chars.remove(name).is_some())
            .unwrap_or(false))
    }
}
