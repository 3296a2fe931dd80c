//! Sprite engine: Discovery → Symbol Cache → Assembler → Store.
//!
//! Every mutation of the cache and the current sprite goes through
//! [`SpriteEngine::build`] or [`SpriteEngine::rebuild`]. Callers must not run
//! two of them at once; the watch driver serializes rebuilds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tokio::sync::broadcast;

use super::assemble::{Sprite, assemble};
use super::cache::SymbolCache;
use super::discover::discover;
use super::error::DiscoveryError;
use super::id::SymbolIdTemplate;
use super::optimize::optimizer_for;
use super::store::{SpriteStore, SpriteUpdate};
use super::symbol::SymbolCompiler;
use crate::config::{ConfigError, OptimizeConfig, SpriteSection};

pub struct SpriteEngine {
    roots: Vec<PathBuf>,
    attrs: BTreeMap<String, String>,
    cache: Arc<SymbolCache>,
    store: SpriteStore,
}

impl SpriteEngine {
    /// Validate settings and set up an engine with an empty cache.
    ///
    /// Fails on an invalid symbol id template, before any file is read.
    pub fn new(sprite: &SpriteSection, optimize: &OptimizeConfig) -> Result<Self, ConfigError> {
        let template = SymbolIdTemplate::parse(&sprite.symbol_id)?;
        let compiler = SymbolCompiler::new(optimizer_for(optimize), template, sprite.hoist_defs);

        Ok(Self {
            roots: sprite.dirs.clone(),
            attrs: sprite.attrs.clone(),
            cache: Arc::new(SymbolCache::new(compiler)),
            store: SpriteStore::new(),
        })
    }

    /// Full build from an empty cache.
    pub async fn build(&self) -> Result<SpriteUpdate, DiscoveryError> {
        self.cache.clear();
        self.refresh().await
    }

    /// Incremental build: drop exactly the entries of `changed`, then reassemble.
    pub async fn rebuild(&self, changed: &[PathBuf]) -> Result<SpriteUpdate, DiscoveryError> {
        let invalidated = changed
            .iter()
            .filter(|path| self.cache.invalidate(path))
            .count();
        crate::debug!("engine"; "invalidated {}/{} cache entries", invalidated, changed.len());
        self.refresh().await
    }

    async fn refresh(&self) -> Result<SpriteUpdate, DiscoveryError> {
        let files = discover(&self.roots)?;

        let keep: FxHashSet<&Path> = files.iter().map(PathBuf::as_path).collect();
        let pruned = self.cache.retain(&keep);
        if pruned > 0 {
            crate::debug!("engine"; "pruned {} vanished file(s)", pruned);
        }

        let sprite = assemble(&files, &self.cache, &self.attrs).await;
        Ok(self.store.publish(sprite))
    }

    /// Snapshot of the current sprite, `None` before the first build.
    pub fn current(&self) -> Option<Arc<Sprite>> {
        self.store.current()
    }

    pub fn symbol_id(&self, path: &Path) -> String {
        self.cache.compiler().symbol_id(path)
    }

    /// Fired once per completed build.
    pub fn subscribe(&self) -> broadcast::Receiver<SpriteUpdate> {
        self.store.subscribe()
    }

    /// Every discovered file with the id it maps to, in discovery order.
    pub fn symbol_ids(&self) -> Result<Vec<(PathBuf, String)>, DiscoveryError> {
        Ok(discover(&self.roots)?
            .into_iter()
            .map(|path| {
                let id = self.symbol_id(&path);
                (path, id)
            })
            .collect())
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    #[cfg(test)]
    pub fn cache(&self) -> &SymbolCache {
        &self.cache
    }
}
