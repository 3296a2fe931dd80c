//! Watch mode: raw file events → reconciler → serialized rebuilds.
//!
//! Architecture:
//! ```text
//! notify → watcher (classify) → Reconciler (pure timing) → SpriteEngine::rebuild
//! ```
//!
//! At most one rebuild runs at a time. Events that arrive meanwhile are
//! recorded by the reconciler and produce the next batch once the current
//! rebuild finished.

mod event;
pub mod reconcile;
mod watcher;

pub use event::{ChangeKind, FileEvent};
pub use watcher::{IconWatcher, watch_roots};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::logger::{status_error, status_success, status_unchanged, status_warning};
use crate::sprite::store::SpriteUpdate;
use crate::sprite::{DiscoveryError, SpriteEngine, describe};
use reconcile::{Batch, Reconciler};

type Rebuild = JoinHandle<(Batch, Result<SpriteUpdate, DiscoveryError>)>;

/// Drives the reconciler from a stream of file events.
pub struct WatchDriver {
    engine: Arc<SpriteEngine>,
    events: mpsc::Receiver<FileEvent>,
    reconciler: Reconciler,
}

impl WatchDriver {
    pub fn new(
        engine: Arc<SpriteEngine>,
        events: mpsc::Receiver<FileEvent>,
        debounce: Duration,
    ) -> Self {
        Self {
            engine,
            events,
            reconciler: Reconciler::new(debounce),
        }
    }

    /// Run until the event channel closes, then let an in-flight rebuild finish.
    pub async fn run(mut self) {
        let mut inflight: Option<Rebuild> = None;

        loop {
            let deadline = self.reconciler.deadline();
            let wake = tokio::time::Instant::from_std(deadline.unwrap_or_else(Instant::now));

            tokio::select! {
                biased;
                finished = join(&mut inflight), if inflight.is_some() => {
                    inflight = None;
                    match finished {
                        Ok((batch, result)) => report(&batch, result),
                        Err(e) => status_error("rebuild task failed", &e.to_string()),
                    }
                    self.reconciler.finish(Instant::now());
                }
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    self.reconciler.observe(event, Instant::now());
                }
                _ = tokio::time::sleep_until(wake), if deadline.is_some() && inflight.is_none() => {
                    if let Some(batch) = self.reconciler.poll(Instant::now()) {
                        inflight = Some(self.spawn_rebuild(batch));
                    }
                }
            }
        }

        if let Some(handle) = inflight
            && let Ok((batch, result)) = handle.await
        {
            report(&batch, result);
        }
    }

    fn spawn_rebuild(&self, batch: Batch) -> Rebuild {
        crate::debug!("watch"; "rebuild: {}", batch.summary());
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            let result = engine.rebuild(&batch.paths()).await;
            (batch, result)
        })
    }
}

async fn join(
    handle: &mut Option<Rebuild>,
) -> Result<(Batch, Result<SpriteUpdate, DiscoveryError>), tokio::task::JoinError> {
    match handle {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

fn report(batch: &Batch, result: Result<SpriteUpdate, DiscoveryError>) {
    match result {
        Ok(update) if update.sprite.is_empty() => {
            status_warning(&format!("{} → sprite is empty", batch.summary()));
        }
        Ok(update) if update.changed => status_success(&format!(
            "{} → sprite {} ({} symbols)",
            batch.summary(),
            update.sprite.hash,
            update.sprite.symbols.len()
        )),
        Ok(_) => status_unchanged(&format!("{} (sprite unchanged)", batch.summary())),
        // The previous sprite stays current
        Err(e) => status_error("rebuild failed", &describe(&e)),
    }
}
