//! The current sprite.
//!
//! Readers take a snapshot with [`SpriteStore::current`]; a new sprite is
//! published with a single pointer swap, so content and hash are always
//! read as a pair.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::broadcast;

use super::assemble::Sprite;

/// Capacity of the update channel. Slow subscribers skip to newer updates.
const UPDATE_CAPACITY: usize = 16;

/// Sent once per completed (re)build.
#[derive(Debug, Clone)]
pub struct SpriteUpdate {
    pub sprite: Arc<Sprite>,
    /// Whether the hash differs from the previously published sprite.
    pub changed: bool,
}

/// Holder of the one current sprite.
pub struct SpriteStore {
    current: ArcSwapOption<Sprite>,
    updates: broadcast::Sender<SpriteUpdate>,
}

impl Default for SpriteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SpriteStore {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            current: ArcSwapOption::empty(),
            updates,
        }
    }

    /// Snapshot of the current sprite, `None` before the first build.
    pub fn current(&self) -> Option<Arc<Sprite>> {
        self.current.load_full()
    }

    /// Replace the current sprite and notify subscribers.
    pub fn publish(&self, sprite: Sprite) -> SpriteUpdate {
        let sprite = Arc::new(sprite);
        let previous = self.current.swap(Some(Arc::clone(&sprite)));
        let changed = previous.is_none_or(|prev| prev.hash != sprite.hash);

        let update = SpriteUpdate { sprite, changed };
        // No subscribers is fine
        let _ = self.updates.send(update.clone());
        update
    }

    /// Receive an update after every completed build.
    pub fn subscribe(&self) -> broadcast::Receiver<SpriteUpdate> {
        self.updates.subscribe()
    }
}
