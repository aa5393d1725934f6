mod artwork;
mod cli;
mod config;
mod daemon;
mod ipc;
mod models;
mod player;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{App, Cli, Commands};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let app = App::new(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            app.run()?;
        }
        Commands::Set {
            details,
            state,
            kind,
            image,
            image_text,
            start,
            end,
        } => {
            app.set(&details, &state, kind, image, image_text, start, end)?;
        }
        Commands::Clear => {
            app.clear()?;
        }
        Commands::Locate { base_dir } => {
            app.locate(base_dir)?;
        }
        Commands::NowPlaying => {
            app.now_playing()?;
        }
        Commands::Config { save } => {
            app.show_config(save)?;
        }
    }

    Ok(())
}
