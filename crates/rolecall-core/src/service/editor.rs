//! Single-shot character edits.
//!
//! `edit <name> <attribute> <value>` changes exactly one field. The value is
//! parsed into a `CharacterEdit` before the store is touched, so a bad level,
//! malformed meta, or unknown attribute never leaves a half-applied change.

use std::sync::Arc;

use rolecall_types::character::{
    parse_level, validate_name, Character, CharacterAttribute, CharacterEdit,
};
use rolecall_types::error::CharacterError;
use rolecall_types::message::Invocation;
use tracing::debug;

use crate::meta::parse_meta;
use crate::repository::character::CharacterRepository;
use crate::service::store::CharacterStore;

/// Parse an attribute token and its raw value into a validated edit.
pub fn parse_edit(attribute: &str, value: &str) -> Result<CharacterEdit, CharacterError> {
    let edit = match attribute.parse::<CharacterAttribute>()? {
        CharacterAttribute::Name => {
            validate_name(value)?;
            CharacterEdit::Rename(value.to_string())
        }
        CharacterAttribute::Description => CharacterEdit::Description(value.to_string()),
        CharacterAttribute::Level => CharacterEdit::Level(parse_level(value)?),
        CharacterAttribute::Meta => CharacterEdit::MergeMeta(parse_meta(value)?),
    };
    Ok(edit)
}

/// Applies owner-gated single-attribute edits.
pub struct CharacterEditor<R: CharacterRepository> {
    store: Arc<CharacterStore<R>>,
}

impl<R: CharacterRepository> CharacterEditor<R> {
    pub fn new(store: Arc<CharacterStore<R>>) -> Self {
        Self { store }
    }

    /// Edit one attribute of `name` on behalf of the invoking user.
    ///
    /// Lookup and ownership are checked first (`NotFound`, `NotOwner`), then
    /// the attribute and value (`UnknownAttribute`, `Parse`, `Format`), and
    /// only then is the record written.
    pub async fn edit(
        &self,
        invocation: &Invocation,
        name: &str,
        attribute: &str,
        value: &str,
    ) -> Result<Character, CharacterError> {
        let current = self.store.get(invocation.guild, name).await?;
        if !current.is_owned_by(invocation.author) {
            return Err(CharacterError::NotOwner(name.to_string()));
        }

        let edit = parse_edit(attribute, value).inspect_err(|e| {
            debug!(guild = %invocation.guild, %name, %attribute, error = %e, "edit rejected");
        })?;

        self.store
            .update(invocation.guild, name, edit, invocation.author)
            .await
    }
}
