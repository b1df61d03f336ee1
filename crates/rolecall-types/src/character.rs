use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::error::CharacterError;
use crate::ids::UserId;

/// Arbitrary user-defined `key: value` attributes, in insertion order.
pub type MetaMap = IndexMap<String, String>;

/// Meta key rendered as the character's thumbnail.
pub const IMAGE_META_KEY: &str = "image";

/// A player-owned character sheet.
///
/// Characters are scoped to a guild; `name` is the identity key within that
/// guild. The guild itself is not stored on the record -- it is the key the
/// store files the record under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Unique (case-sensitive) within the guild.
    pub name: String,
    /// The user who created the character. Only the owner may edit or delete it.
    pub owner: UserId,
    /// Free-text character sheet.
    pub description: String,
    pub level: u64,
    /// Additional attributes such as `image` or `hair_color`.
    #[serde(default)]
    pub meta: MetaMap,
    /// Party members. Managed elsewhere; preserved untouched by edits here.
    #[serde(default)]
    pub team: Vec<TeamMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Character {
    /// Build a fresh character with an empty team.
    pub fn new(
        name: impl Into<String>,
        owner: UserId,
        description: impl Into<String>,
        level: u64,
        meta: MetaMap,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            owner,
            description: description.into(),
            level,
            meta,
            team: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user` owns this character.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }

    /// The `image` meta value, if one was set.
    pub fn image(&self) -> Option<&str> {
        self.meta
            .get(IMAGE_META_KEY)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }
}

/// A reference to a party member on a character's team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    /// Kind of entity, e.g. "pokemon" or "companion".
    pub kind: String,
}

impl fmt::Display for TeamMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// Attribute tokens accepted by the edit command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterAttribute {
    Name,
    Description,
    Level,
    Meta,
}

impl fmt::Display for CharacterAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterAttribute::Name => write!(f, "name"),
            CharacterAttribute::Description => write!(f, "description"),
            CharacterAttribute::Level => write!(f, "level"),
            CharacterAttribute::Meta => write!(f, "meta"),
        }
    }
}

impl FromStr for CharacterAttribute {
    type Err = CharacterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(CharacterAttribute::Name),
            "description" => Ok(CharacterAttribute::Description),
            "level" => Ok(CharacterAttribute::Level),
            "meta" => Ok(CharacterAttribute::Meta),
            _ => Err(CharacterError::UnknownAttribute(s.to_string())),
        }
    }
}

/// A single field-level mutation, already validated and parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum CharacterEdit {
    /// Move the record to a new name, keeping every other field.
    Rename(String),
    Description(String),
    Level(u64),
    /// Merge into existing meta; incoming keys overwrite.
    MergeMeta(MetaMap),
}

impl CharacterEdit {
    pub fn attribute(&self) -> CharacterAttribute {
        match self {
            CharacterEdit::Rename(_) => CharacterAttribute::Name,
            CharacterEdit::Description(_) => CharacterAttribute::Description,
            CharacterEdit::Level(_) => CharacterAttribute::Level,
            CharacterEdit::MergeMeta(_) => CharacterAttribute::Meta,
        }
    }

    /// Apply this edit to `character`, refreshing `updated_at`.
    ///
    /// Renaming only changes the field; re-keying the record is the store's job.
    pub fn apply(self, character: &mut Character) {
        match self {
            CharacterEdit::Rename(name) => character.name = name,
            CharacterEdit::Description(description) => character.description = description,
            CharacterEdit::Level(level) => character.level = level,
            CharacterEdit::MergeMeta(meta) => character.meta.extend(meta),
        }
        character.updated_at = Utc::now();
    }
}

/// Reject names that are empty or whitespace only.
pub fn validate_name(name: &str) -> Result<(), CharacterError> {
    if name.trim().is_empty() {
        return Err(CharacterError::Parse("name cannot be empty".to_string()));
    }
    Ok(())
}

/// Highest storable level; persistence uses signed 64-bit integers.
pub const MAX_LEVEL: u64 = i64::MAX as u64;

/// Parse a level as typed by a user: surrounding whitespace is ignored and
/// the remainder must be an integer in `0..=MAX_LEVEL`.
pub fn parse_level(raw: &str) -> Result<u64, CharacterError> {
    let trimmed = raw.trim();
    let level = trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .parse::<u64>()
        .map_err(|e| CharacterError::Parse(format!("'{trimmed}' is not a valid level: {e}")))?;
    if level > MAX_LEVEL {
        return Err(CharacterError::Parse(format!(
            "'{trimmed}' is not a valid level: above {MAX_LEVEL}"
        )));
    }
    Ok(level)
}
