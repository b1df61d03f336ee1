//! Character repository trait definition.

use rolecall_types::character::Character;
use rolecall_types::error::RepositoryError;
use rolecall_types::ids::GuildId;

/// Repository trait for guild-scoped character persistence.
///
/// Records are keyed by `(guild, character.name)`. Ownership rules live in
/// `CharacterStore`; implementations only store and fetch.
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait CharacterRepository: Send + Sync {
    /// All characters in a guild, in no particular order.
    fn list(
        &self,
        guild: GuildId,
    ) -> impl std::future::Future<Output = Result<Vec<Character>, RepositoryError>> + Send;

    /// Get a character by its exact name.
    fn get(
        &self,
        guild: GuildId,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Character>, RepositoryError>> + Send;

    /// Insert a new character. Fails with `Conflict` if the name is taken.
    fn insert(
        &self,
        guild: GuildId,
        character: &Character,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite the stored record named `character.name`.
    /// Fails with `NotFound` if there is none.
    fn update(
        &self,
        guild: GuildId,
        character: &Character,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Atomically remove `old_name` and insert `character` under its new name.
    ///
    /// Fails with `NotFound` if `old_name` is absent or `Conflict` if the new
    /// name is taken; neither failure changes anything.
    fn rename(
        &self,
        guild: GuildId,
        old_name: &str,
        character: &Character,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a character. Returns whether a record was removed.
    fn delete(
        &self,
        guild: GuildId,
        name: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
