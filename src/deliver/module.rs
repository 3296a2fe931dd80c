//! Virtual ES module exposing the current sprite.
//!
//! ```js
//! import sprite, { hash, symbols } from "virtual:svg-sprite";
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::sprite::Sprite;

/// Import specifier of the module.
pub const VIRTUAL_ID: &str = "virtual:svg-sprite";

/// Resolved id; the NUL prefix keeps other resolvers away from it.
pub const RESOLVED_ID: &str = "\0virtual:svg-sprite";

/// Map an import specifier to the resolved module id.
pub fn resolve_id(id: &str) -> Option<&'static str> {
    (id == VIRTUAL_ID).then_some(RESOLVED_ID)
}

/// Module source for `sprite`. String values are JSON-escaped.
pub fn render_module(sprite: &Sprite) -> String {
    format!(
        "export const hash = {};\nexport const symbols = {};\nexport default {};\n",
        Value::from(sprite.hash.as_str()),
        Value::from(sprite.symbols.clone()),
        Value::from(sprite.content.as_str()),
    )
}

/// Rendered module source, cached per sprite hash.
#[derive(Default)]
pub struct VirtualModule {
    cached: Mutex<Option<(String, Arc<str>)>>,
}

impl VirtualModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module source for a resolved id, `None` for any other id.
    pub fn load(&self, id: &str, sprite: &Sprite) -> Option<Arc<str>> {
        if id != RESOLVED_ID {
            return None;
        }

        let mut cached = self.cached.lock();
        if let Some((hash, source)) = cached.as_ref()
            && *hash == sprite.hash
        {
            return Some(Arc::clone(source));
        }

        let source: Arc<str> = render_module(sprite).into();
        *cached = Some((sprite.hash.clone(), Arc::clone(&source)));
        Some(source)
    }

    /// Drop the cached source; called on every sprite update.
    pub fn invalidate(&self) {
        self.cached.lock().take();
    }

    pub fn is_cached(&self) -> bool {
        self.cached.lock().is_some()
    }
}
