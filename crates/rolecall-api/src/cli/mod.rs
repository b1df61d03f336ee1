//! CLI command definitions for the `rolecall` binary.
//!
//! Uses clap derive macros for argument parsing. Global flags stand in for the
//! chat context a bot command would carry: which guild, channel and user the
//! command is issued from.

pub mod character;
pub mod console;

use clap::{Parser, Subcommand};
use rolecall_types::ids::{ChannelId, GuildId, UserId};
use rolecall_types::message::Invocation;

/// Manage role-play characters for a guild.
#[derive(Parser)]
#[command(name = "rolecall", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Guild the command runs in.
    #[arg(long, global = true, env = "ROLECALL_GUILD", default_value = "1")]
    pub guild: GuildId,

    /// Channel prompts are posted to and replies are read from.
    #[arg(long, global = true, env = "ROLECALL_CHANNEL", default_value = "1")]
    pub channel: ChannelId,

    /// User issuing the command.
    #[arg(long, global = true, env = "ROLECALL_USER", default_value = "1")]
    pub user: UserId,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log errors (command output is unaffected).
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Keep characters in memory for this run only.
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn invocation(&self) -> Invocation {
        Invocation::new(self.guild, self.channel, self.user)
    }

    /// Default log directives for the verbosity flags.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info,rolecall=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List your characters.
    #[command(alias = "chars")]
    Characters,

    /// List every character in the guild, grouped by initial.
    Allchars,

    /// Show a character sheet.
    #[command(aliases = ["c", "char"])]
    Show {
        /// Exact character name.
        name: String,
    },

    /// Create a character interactively (answers are read from stdin).
    ///
    /// Each stdin line is one answer, so additional info must be given on a
    /// single line with comma-separated `key: value` pairs. Use `edit <name>
    /// meta` for the newline-separated form.
    #[command(alias = "new")]
    Create {
        /// Name of the new character.
        name: String,
    },

    /// Delete one of your characters.
    #[command(alias = "remove")]
    Delete {
        /// Exact character name.
        name: String,
    },

    /// Edit one attribute of one of your characters.
    ///
    /// Attributes: name, description, level, meta (`key: value` pairs
    /// separated by commas or newlines).
    Edit {
        /// Exact character name.
        name: String,

        /// Attribute to change.
        attribute: String,

        /// New value; remaining words are joined with spaces.
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
}
