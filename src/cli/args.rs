//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Assemble svg icons into one symbol sprite
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: sprite.toml)
    #[arg(short = 'C', long, default_value = "sprite.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the sprite and write it to the output directory
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: SpriteArgs,

        /// Output directory path (relative to current directory)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        output: Option<PathBuf>,
    },

    /// Start development server with live reload
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: SpriteArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable file watching for auto-rebuild
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,

        /// Directory of static HTML pages to serve with the sprite injected
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        root: Option<PathBuf>,
    },

    /// Print the symbol id of every discovered icon
    Ids {
        #[command(flatten)]
        args: SpriteArgs,
    },
}

/// Arguments shared by every command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SpriteArgs {
    /// Icon directory (repeatable, replaces `sprite.dirs`)
    #[arg(short = 'd', long = "dir", value_hint = clap::ValueHint::DirPath)]
    pub dirs: Vec<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Commands {
    pub const fn sprite_args(&self) -> &SpriteArgs {
        match self {
            Self::Build { args, .. } | Self::Serve { args, .. } | Self::Ids { args } => args,
        }
    }
}
