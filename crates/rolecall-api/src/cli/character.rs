//! Character CLI commands: listing, sheets, create, delete, edit.
//!
//! Domain rejections (missing character, wrong owner, bad input) are printed
//! as chat-style replies and are not process errors. Storage and transport
//! failures propagate.

use std::sync::Arc;

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use tokio_util::sync::CancellationToken;

use rolecall_core::service::roster::{
    group_by_initial, owned_names, CharacterSheet, NO_CHARACTERS, NO_OWNED_CHARACTERS,
};
use rolecall_types::error::CharacterError;
use rolecall_types::message::Invocation;

use super::console::spawn_stdin_pump;
use crate::state::AppState;

pub const NAME_TAKEN: &str = "A character with this name already exists!";
pub const SHOW_MISSING: &str = "Character does not exist!";
pub const MISSING: &str = "That character doesn't exist!";
pub const NOT_OWNER: &str = "You do not own this character!";
pub const EDIT_NOT_OWNER: &str = "This isn't your character!";
pub const INVALID_ITEM: &str = "That is not a valid item! Try again";
pub const INVALID_FORMAT: &str = "Invalid formatting try again!";
pub const TIMED_OUT: &str = "Took too long to answer, cancelling!";
pub const DELETED: &str = "Character deleted";

/// Which command a rejection came from; a few replies differ per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Show,
    Create,
    Delete,
    Edit,
}

/// The reply shown for a rejected command, or `None` when the error is not a
/// user-facing rejection.
fn rejection_message(err: &CharacterError, action: Action) -> Option<String> {
    let message = match err {
        CharacterError::DuplicateName(_) => NAME_TAKEN.to_string(),
        CharacterError::NotFound(_) if action == Action::Show => SHOW_MISSING.to_string(),
        CharacterError::NotFound(_) => MISSING.to_string(),
        CharacterError::NotOwner(_) if action == Action::Edit => EDIT_NOT_OWNER.to_string(),
        CharacterError::NotOwner(_) => NOT_OWNER.to_string(),
        CharacterError::UnknownAttribute(_) => INVALID_ITEM.to_string(),
        CharacterError::Format(_) => INVALID_FORMAT.to_string(),
        CharacterError::Parse(reason) => format!("Invalid value: {reason}"),
        CharacterError::Timeout(_) => TIMED_OUT.to_string(),
        // The flow already acknowledged the cancel.
        CharacterError::Cancelled => String::new(),
        CharacterError::Storage(_) | CharacterError::Transport(_) => return None,
    };
    Some(message)
}

fn report(err: CharacterError, action: Action, json: bool) -> Result<()> {
    let Some(message) = rejection_message(&err, action) else {
        return Err(err.into());
    };
    tracing::debug!(?action, error = %err, "command rejected");

    if json {
        let result = serde_json::json!({
            "ok": false,
            "cancelled": matches!(err, CharacterError::Cancelled),
            "error": err.to_string(),
            "message": message,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !message.is_empty() {
        println!();
        println!("  {} {}", style("!").red().bold(), message);
        println!();
    }
    Ok(())
}

/// List the invoking user's characters.
pub async fn list_characters(state: &AppState, invocation: Invocation, json: bool) -> Result<()> {
    let all = state.store.get_all(invocation.guild).await?;
    let names = owned_names(&all, invocation.author);

    if json {
        let result = serde_json::json!({
            "owner": invocation.author,
            "characters": names,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    if names.is_empty() {
        println!("  {} {}", style("i").blue().bold(), NO_OWNED_CHARACTERS);
    } else {
        println!(
            "  {}",
            style(format!("Characters of user {}", invocation.author)).cyan().bold()
        );
        for name in &names {
            println!("  {name}");
        }
    }
    println!();

    Ok(())
}

/// List every character in the guild grouped by initial.
pub async fn list_all(state: &AppState, invocation: Invocation, json: bool) -> Result<()> {
    let all = state.store.get_all(invocation.guild).await?;
    let groups = group_by_initial(&all);

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!();
        println!("  {} {}", style("i").blue().bold(), NO_CHARACTERS);
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("").fg(Color::White),
        Cell::new(format!("Guild {}", invocation.guild)).fg(Color::White),
    ]);

    for group in &groups {
        table.add_row(vec![
            Cell::new(&group.label).fg(Color::Cyan),
            Cell::new(group.names.join("\n")),
        ]);
    }

    println!();
    println!("{table}");
    println!(
        "  {} character{}",
        all.len(),
        if all.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show one character sheet.
pub async fn show_character(
    state: &AppState,
    invocation: Invocation,
    name: &str,
    json: bool,
) -> Result<()> {
    let character = match state.store.get(invocation.guild, name).await {
        Ok(character) => character,
        Err(e) => return report(e, Action::Show, json),
    };
    print_sheet(&CharacterSheet::from(&character), json)
}

fn print_sheet(sheet: &CharacterSheet, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(sheet)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&sheet.name).cyan().bold());
    println!("  {}", style(&sheet.description).dim());
    println!();

    println!("  {}", style("── Details ──").dim());
    println!("  {}  {}", style("Name:").bold(), sheet.name);
    println!("  {} {}", style("Owner:").bold(), sheet.owner);
    println!("  {} {}", style("Level:").bold(), sheet.level);
    if let Some(thumbnail) = &sheet.thumbnail {
        println!("  {} {}", style("Image:").bold(), style(thumbnail).underlined());
    }
    println!();

    println!("  {}", style("── Team ──").dim());
    for member in &sheet.team {
        println!("  {member}");
    }
    println!();

    println!("  {}", style("── Additional Info ──").dim());
    for (key, value) in &sheet.additional_info {
        println!("  {} {}", style(format!("{key}:")).bold(), value);
    }
    println!();

    Ok(())
}

/// Run the interactive create flow, reading answers from stdin.
pub async fn create_character(
    state: &AppState,
    invocation: Invocation,
    name: &str,
    json: bool,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let pump = spawn_stdin_pump(Arc::clone(state.hub()), invocation, cancel.clone());

    let result = state.builder().create(invocation, name).await;

    cancel.cancel();
    pump.await?;

    match result {
        Ok(character) => {
            if json {
                print_sheet(&CharacterSheet::from(&character), true)?;
            }
            Ok(())
        }
        Err(e) => report(e, Action::Create, json),
    }
}

/// Delete one of the invoking user's characters.
pub async fn delete_character(
    state: &AppState,
    invocation: Invocation,
    name: &str,
    json: bool,
) -> Result<()> {
    match state
        .store
        .remove(invocation.guild, name, invocation.author)
        .await
    {
        Ok(character) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({"deleted": true, "name": character.name})
                );
            } else {
                println!("  {} {}", style("✓").red().bold(), DELETED);
            }
            Ok(())
        }
        Err(e) => report(e, Action::Delete, json),
    }
}

/// Edit a single attribute of one of the invoking user's characters.
pub async fn edit_character(
    state: &AppState,
    invocation: Invocation,
    name: &str,
    attribute: &str,
    value: &str,
    json: bool,
) -> Result<()> {
    match state.editor().edit(&invocation, name, attribute, value).await {
        Ok(character) => {
            if json {
                print_sheet(&CharacterSheet::from(&character), true)?;
            } else {
                println!(
                    "  {} Updated {} of '{}'",
                    style("✓").green().bold(),
                    style(attribute.to_lowercase()).cyan(),
                    style(&character.name).cyan(),
                );
            }
            Ok(())
        }
        Err(e) => report(e, Action::Edit, json),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use rolecall_types::error::{MetaFormatError, MetaFormatReason};

    #[test]
    fn not_found_wording_depends_on_command() {
        let err = CharacterError::NotFound("Aria".to_string());
        assert_eq!(rejection_message(&err, Action::Show).unwrap(), SHOW_MISSING);
        assert_eq!(rejection_message(&err, Action::Delete).unwrap(), MISSING);
        assert_eq!(rejection_message(&err, Action::Edit).unwrap(), MISSING);
    }

    #[test]
    fn owner_wording_depends_on_command() {
        let err = CharacterError::NotOwner("Aria".to_string());
        assert_eq!(rejection_message(&err, Action::Delete).unwrap(), NOT_OWNER);
        assert_eq!(rejection_message(&err, Action::Edit).unwrap(), EDIT_NOT_OWNER);
    }

    #[test]
    fn input_rejections() {
        assert_eq!(
            rejection_message(&CharacterError::DuplicateName("Aria".into()), Action::Create)
                .unwrap(),
            NAME_TAKEN
        );
        assert_eq!(
            rejection_message(&CharacterError::UnknownAttribute("colour".into()), Action::Edit)
                .unwrap(),
            INVALID_ITEM
        );
        let format = CharacterError::Format(MetaFormatError {
            segment: "a:1".to_string(),
            reason: MetaFormatReason::MissingSeparator,
        });
        assert_eq!(rejection_message(&format, Action::Edit).unwrap(), INVALID_FORMAT);
        assert_eq!(
            rejection_message(&CharacterError::Timeout(Duration::from_secs(60)), Action::Create)
                .unwrap(),
            TIMED_OUT
        );
        assert_eq!(
            rejection_message(&CharacterError::Cancelled, Action::Create).unwrap(),
            ""
        );
    }

    #[test]
    fn infrastructure_failures_are_not_rejections() {
        assert!(rejection_message(&CharacterError::Storage("disk".into()), Action::Show).is_none());
        assert!(
            rejection_message(&CharacterError::Transport("closed".into()), Action::Create)
                .is_none()
        );
        assert!(report(CharacterError::Storage("disk".into()), Action::Show, false).is_err());
    }
}
