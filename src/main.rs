//! iconsprite - assemble a directory of svg icons into one symbol sprite.

mod cli;
mod config;
mod core;
mod deliver;
mod logger;
mod reload;
mod serve;
mod sprite;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SpriteConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = SpriteConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => cli::build::build_sprite(&config).map(|_| ()),
        Commands::Serve { .. } => serve::serve(&config),
        Commands::Ids { .. } => cli::ids::list_ids(&config),
    }
}
