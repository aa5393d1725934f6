use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
pub use commands::*;

#[derive(Parser)]
#[command(name = "music-presence")]
#[command(about = "Show what Apple Music is playing in your Discord status")]
#[command(version)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "MUSIC_PRESENCE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the player and keep the Discord status in sync (default)
    Run,

    /// Set a custom status and keep it shown until interrupted
    Set {
        /// First line of the status
        #[arg(short, long, default_value = "")]
        details: String,
        /// Second line of the status
        #[arg(short, long, default_value = "")]
        state: String,
        /// Activity type (0 playing, 1 streaming, 2 listening, 3 watching, 4 custom, 5 competing)
        #[arg(short, long, default_value_t = 2)]
        kind: u8,
        /// Large image asset key or URL
        #[arg(long)]
        image: Option<String>,
        /// Hover text for the large image
        #[arg(long)]
        image_text: Option<String>,
        /// Start time in Unix seconds
        #[arg(long)]
        start: Option<i64>,
        /// End time in Unix seconds
        #[arg(long)]
        end: Option<i64>,
    },

    /// Clear the Discord status
    Clear,

    /// Print the path of the Discord IPC socket
    Locate {
        /// Directory to search instead of the configured one
        #[arg(long)]
        base_dir: Option<PathBuf>,
    },

    /// Print the track the player reports
    #[command(name = "now-playing")]
    NowPlaying,

    /// Show the effective configuration
    Config {
        /// Write it to the default config path
        #[arg(long)]
        save: bool,
    },
}
