//! SQLite character repository implementation.
//!
//! Implements `CharacterRepository` from `rolecall-core` using sqlx with split read/write pools.
//! Snowflake ids are stored as decimal TEXT since they can exceed `i64::MAX`.

use rolecall_core::repository::character::CharacterRepository;
use rolecall_types::character::{Character, MetaMap, TeamMember};
use rolecall_types::error::RepositoryError;
use rolecall_types::ids::{GuildId, UserId};
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `CharacterRepository`.
pub struct SqliteCharacterRepository {
    pool: DatabasePool,
}

impl SqliteCharacterRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Character.
struct CharacterRow {
    name: String,
    owner_id: String,
    description: String,
    level: i64,
    meta: String,
    team: String,
    created_at: String,
    updated_at: String,
}

impl CharacterRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            name: row.try_get("name")?,
            owner_id: row.try_get("owner_id")?,
            description: row.try_get("description")?,
            level: row.try_get("level")?,
            meta: row.try_get("meta")?,
            team: row.try_get("team")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_character(self) -> Result<Character, RepositoryError> {
        let owner = self
            .owner_id
            .parse::<UserId>()
            .map_err(|e| RepositoryError::Query(format!("invalid owner id: {e}")))?;

        let level = u64::try_from(self.level)
            .map_err(|e| RepositoryError::Query(format!("invalid level: {e}")))?;

        let meta: MetaMap = serde_json::from_str(&self.meta)
            .map_err(|e| RepositoryError::Query(format!("invalid meta JSON: {e}")))?;

        let team: Vec<TeamMember> = serde_json::from_str(&self.team)
            .map_err(|e| RepositoryError::Query(format!("invalid team JSON: {e}")))?;

        Ok(Character {
            name: self.name,
            owner,
            description: self.description,
            level,
            meta,
            team,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Column values for a write, encoded once per statement.
struct Encoded {
    level: i64,
    meta: String,
    team: String,
}

impl Encoded {
    fn from_character(character: &Character) -> Result<Self, RepositoryError> {
        Ok(Self {
            level: i64::try_from(character.level).map_err(|_| {
                RepositoryError::Query(format!("level {} is out of range", character.level))
            })?,
            meta: serde_json::to_string(&character.meta)
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
            team: serde_json::to_string(&character.team)
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Map a write error, turning a primary-key violation into `Conflict`.
fn write_error(e: sqlx::Error, name: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.message().contains("UNIQUE") {
            return RepositoryError::Conflict(format!("character '{name}' already exists"));
        }
    }
    RepositoryError::Query(e.to_string())
}

const INSERT_SQL: &str = "INSERT INTO characters (guild_id, name, owner_id, description, level, meta, team, created_at, updated_at)
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

impl CharacterRepository for SqliteCharacterRepository {
    async fn list(&self, guild: GuildId) -> Result<Vec<Character>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM characters WHERE guild_id = ? ORDER BY name")
            .bind(guild.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                CharacterRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_character()
            })
            .collect()
    }

    async fn get(&self, guild: GuildId, name: &str) -> Result<Option<Character>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM characters WHERE guild_id = ? AND name = ?")
            .bind(guild.to_string())
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let character_row = CharacterRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(character_row.into_character()?))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, guild: GuildId, character: &Character) -> Result<(), RepositoryError> {
        let encoded = Encoded::from_character(character)?;

        sqlx::query(INSERT_SQL)
            .bind(guild.to_string())
            .bind(&character.name)
            .bind(character.owner.to_string())
            .bind(&character.description)
            .bind(encoded.level)
            .bind(&encoded.meta)
            .bind(&encoded.team)
            .bind(format_datetime(&character.created_at))
            .bind(format_datetime(&character.updated_at))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| write_error(e, &character.name))?;

        Ok(())
    }

    async fn update(&self, guild: GuildId, character: &Character) -> Result<(), RepositoryError> {
        let encoded = Encoded::from_character(character)?;

        let result = sqlx::query(
            "UPDATE characters SET owner_id = ?, description = ?, level = ?, meta = ?, team = ?, updated_at = ?
             WHERE guild_id = ? AND name = ?",
        )
        .bind(character.owner.to_string())
        .bind(&character.description)
        .bind(encoded.level)
        .bind(&encoded.meta)
        .bind(&encoded.team)
        .bind(format_datetime(&character.updated_at))
        .bind(guild.to_string())
        .bind(&character.name)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn rename(
        &self,
        guild: GuildId,
        old_name: &str,
        character: &Character,
    ) -> Result<(), RepositoryError> {
        let encoded = Encoded::from_character(character)?;

        // Delete + insert in one transaction; dropping `tx` on error rolls back.
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let removed = sqlx::query("DELETE FROM characters WHERE guild_id = ? AND name = ?")
            .bind(guild.to_string())
            .bind(old_name)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if removed.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(INSERT_SQL)
            .bind(guild.to_string())
            .bind(&character.name)
            .bind(character.owner.to_string())
            .bind(&character.description)
            .bind(encoded.level)
            .bind(&encoded.meta)
            .bind(&encoded.team)
            .bind(format_datetime(&character.created_at))
            .bind(format_datetime(&character.updated_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, &character.name))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, guild: GuildId, name: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM characters WHERE guild_id = ? AND name = ?")
            .bind(guild.to_string())
            .bind(name)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
