//! Rolecall CLI entry point.
//!
//! Binary name: `rolecall`
//!
//! Parses CLI arguments, initializes logging, the character store and the
//! console transport, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use rolecall_observe::tracing_setup::{init_tracing, shutdown_tracing, LogFormat};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(cli.log_filter(), format, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init(cli.memory).await?;
    let invocation = cli.invocation();

    match cli.command {
        Commands::Characters => {
            cli::character::list_characters(&state, invocation, cli.json).await?;
        }

        Commands::Allchars => {
            cli::character::list_all(&state, invocation, cli.json).await?;
        }

        Commands::Show { name } => {
            cli::character::show_character(&state, invocation, &name, cli.json).await?;
        }

        Commands::Create { name } => {
            cli::character::create_character(&state, invocation, &name, cli.json).await?;
        }

        Commands::Delete { name } => {
            cli::character::delete_character(&state, invocation, &name, cli.json).await?;
        }

        Commands::Edit {
            name,
            attribute,
            value,
        } => {
            let value = value.join(" ");
            cli::character::edit_character(&state, invocation, &name, &attribute, &value, cli.json)
                .await?;
        }
    }

    Ok(())
}
