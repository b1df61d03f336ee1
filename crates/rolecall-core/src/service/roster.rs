//! Read-only views over a guild's characters.
//!
//! These back the listing commands: a user's own characters, the whole guild
//! roster grouped by initial, and a display-ready sheet for one character.
//! Nothing here formats for a particular platform.

use std::collections::BTreeMap;

use rolecall_types::character::Character;
use rolecall_types::ids::UserId;
use serde::Serialize;

pub const NO_OWNED_CHARACTERS: &str = "User has no characters to display";
pub const NO_CHARACTERS: &str = "No characters to display";
pub const EMPTY_TEAM: &str = "Empty";

/// Names of the characters `user` owns, in name order.
pub fn owned_names(all: &BTreeMap<String, Character>, user: UserId) -> Vec<String> {
    all.values()
        .filter(|c| c.is_owned_by(user))
        .map(|c| c.name.clone())
        .collect()
}

/// One roster section: every name sharing a (case-folded) first character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterGroup {
    /// The shared initial, upper-cased.
    pub label: String,
    pub names: Vec<String>,
}

/// Group a guild's characters by the case-folded first character of their
/// names. Groups are ordered by initial; names within a group by name.
pub fn group_by_initial(all: &BTreeMap<String, Character>) -> Vec<RosterGroup> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in all.keys() {
        let Some(initial) = name.chars().next() else {
            continue;
        };
        let key: String = initial.to_lowercase().collect();
        groups.entry(key).or_default().push(name.clone());
    }

    groups
        .into_iter()
        .map(|(key, names)| RosterGroup {
            label: key.to_uppercase(),
            names,
        })
        .collect()
}

/// Display-ready view of one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterSheet {
    pub name: String,
    pub owner: UserId,
    pub description: String,
    pub level: u64,
    /// Thumbnail URL taken from the `image` meta key.
    pub thumbnail: Option<String>,
    /// `name (kind)` per party member, or `Empty`.
    pub team: Vec<String>,
    /// `(key, value)` pairs in insertion order.
    pub additional_info: Vec<(String, String)>,
}

impl From<&Character> for CharacterSheet {
    fn from(character: &Character) -> Self {
        let team = if character.team.is_empty() {
            vec![EMPTY_TEAM.to_string()]
        } else {
            character.team.iter().map(ToString::to_string).collect()
        };

        Self {
            name: character.name.clone(),
            owner: character.owner,
            description: character.description.clone(),
            level: character.level,
            thumbnail: character.image().map(str::to_string),
            team,
            additional_info: character
                .meta
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolecall_types::character::{MetaMap, TeamMember};

    fn roster(entries: &[(&str, u64)]) -> BTreeMap<String, Character> {
        entries
            .iter()
            .map(|(name, owner)| {
                (
                    name.to_string(),
                    Character::new(*name, UserId(*owner), "", 1, MetaMap::new()),
                )
            })
            .collect()
    }

    #[test]
    fn test_owned_names_filters_by_owner() {
        let all = roster(&[("Aria", 1), ("Bran", 2), ("Cato", 1)]);
        assert_eq!(owned_names(&all, UserId(1)), vec!["Aria", "Cato"]);
        assert!(owned_names(&all, UserId(3)).is_empty());
    }

    #[test]
    fn test_group_by_initial_folds_case() {
        let all = roster(&[("aria", 1), ("Aria", 1), ("Bran", 2), ("Élise", 3)]);
        let groups = group_by_initial(&all);
        assert_eq!(
            groups,
            vec![
                RosterGroup {
                    label: "A".to_string(),
                    names: vec!["Aria".to_string(), "aria".to_string()],
                },
                RosterGroup {
                    label: "B".to_string(),
                    names: vec!["Bran".to_string()],
                },
                RosterGroup {
                    label: "É".to_string(),
                    names: vec!["Élise".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_group_by_initial_empty() {
        assert!(group_by_initial(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_sheet_from_character() {
        let mut meta = MetaMap::new();
        meta.insert("image".to_string(), "http://x/y.png".to_string());
        meta.insert("hair_color".to_string(), "blond".to_string());
        let mut aria = Character::new("Aria", UserId(1), "A knight", 5, meta);

        let sheet = CharacterSheet::from(&aria);
        assert_eq!(sheet.thumbnail.as_deref(), Some("http://x/y.png"));
        assert_eq!(sheet.team, vec![EMPTY_TEAM]);
        assert_eq!(sheet.additional_info[1], ("hair_color".to_string(), "blond".to_string()));

        aria.team.push(TeamMember {
            name: "Pika".to_string(),
            kind: "pokemon".to_string(),
        });
        assert_eq!(CharacterSheet::from(&aria).team, vec!["Pika (pokemon)"]);
    }
}
