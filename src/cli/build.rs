//! `iconsprite build`: one full build, written to the output directory.

use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::config::SpriteConfig;
use crate::deliver::{WriteOutcome, persist};
use crate::log;
use crate::sprite::{Sprite, SpriteEngine, describe};

/// Build the sprite and persist it.
///
/// Fails only on configuration or discovery errors; a failed write is
/// logged and leaves the exit status alone.
pub fn build_sprite(config: &SpriteConfig) -> Result<Arc<Sprite>> {
    let engine = SpriteEngine::new(&config.sprite, &config.optimize)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let update = runtime
        .block_on(engine.build())
        .map_err(|e| anyhow!(describe(&e)))?;
    let sprite = update.sprite;

    match persist(&config.output, &sprite) {
        Some(WriteOutcome::Written(path)) => log!("build"; "wrote {}", path.display()),
        Some(WriteOutcome::Unchanged(path)) => log!("build"; "unchanged {}", path.display()),
        None => {}
    }
    log!("build"; "sprite {} ({} symbols)", sprite.hash, sprite.symbols.len());

    Ok(sprite)
}
