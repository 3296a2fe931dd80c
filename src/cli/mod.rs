//! Command-line interface module.

mod args;
pub mod build;
pub mod ids;

pub use args::{Cli, Commands, SpriteArgs};
