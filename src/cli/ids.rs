//! `iconsprite ids`: print the symbol id of every discovered icon.

use std::io::{Write, stdout};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::config::SpriteConfig;
use crate::sprite::{SpriteEngine, describe};

pub fn list_ids(config: &SpriteConfig) -> Result<()> {
    let ids = symbol_ids(config)?;
    let mut out = stdout().lock();
    for (path, id) in &ids {
        writeln!(out, "{} → {}", relative(path, config.get_root()).display(), id)?;
    }
    Ok(())
}

/// `(path, id)` pairs in discovery order.
fn symbol_ids(config: &SpriteConfig) -> Result<Vec<(PathBuf, String)>> {
    let engine = SpriteEngine::new(&config.sprite, &config.optimize)?;
    engine.symbol_ids().map_err(|e| anyhow!(describe(&e)))
}

/// `path` relative to the config root when it lies below it.
fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
