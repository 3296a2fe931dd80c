//! notify → [`FileEvent`] bridge.
//!
//! The watcher is created before the initial build so nothing that changes
//! during that build is lost; events buffer in the channel meanwhile.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::event::{ChangeKind, FileEvent};

const CHANNEL_CAPACITY: usize = 256;

/// Keeps the OS watcher alive; dropping it closes the event channel.
pub struct IconWatcher {
    _watcher: RecommendedWatcher,
}

/// Watch `roots` recursively, delivering classified events on the returned channel.
pub fn watch_roots(roots: &[PathBuf]) -> notify::Result<(IconWatcher, mpsc::Receiver<FileEvent>)> {
    // notify callbacks are sync: bridge through a std channel and a thread
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })?;

    for root in roots {
        watcher.watch(root, RecursiveMode::Recursive)?;
        crate::debug!("watch"; "watching {}", root.display());
    }

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    std::thread::spawn(move || {
        while let Ok(result) = notify_rx.recv() {
            match result {
                Ok(event) => {
                    for file_event in classify(&event) {
                        if tx.blocking_send(file_event).is_err() {
                            return; // Receiver dropped
                        }
                    }
                }
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        }
    });

    Ok((IconWatcher { _watcher: watcher }, rx))
}

/// Map one notify event to add/change/remove events.
///
/// Metadata-only and access events are dropped. Renames are resolved by
/// checking whether each path still exists.
pub fn classify(event: &notify::Event) -> Vec<FileEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => Some(ChangeKind::Added),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::Added),
        EventKind::Modify(ModifyKind::Name(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Changed),
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .map(|path| FileEvent::new(path.clone(), kind.unwrap_or_else(|| by_existence(path))))
        .collect()
}

fn by_existence(path: &Path) -> ChangeKind {
    if path.exists() {
        ChangeKind::Added
    } else {
        ChangeKind::Removed
    }
}
