//! Change reconciler state machine.
//!
//! ```text
//!            event                 deadline passed
//!   Idle ─────────────► Debouncing ───────────────► Rebuilding
//!    ▲                   │  ▲  event: restart timer    │
//!    │                   └──┘                          │ finish()
//!    └──────── nothing pending ◄───────────────────────┤
//!                        Debouncing ◄── events queued ─┘
//! ```
//!
//! Time is passed in by the caller, so the machine never reads a clock.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::event::{ChangeKind, FileEvent};
use crate::sprite::discover::is_icon_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No pending rebuild.
    Idle,
    /// Waiting for quiescence until `deadline`.
    Debouncing { deadline: Instant },
    /// A rebuild is in flight.
    Rebuilding,
}

/// Changes handed to one rebuild pass, sorted by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch(pub Vec<(PathBuf, ChangeKind)>);

impl Batch {
    /// Paths whose cache entries must be invalidated.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.0.iter().map(|(path, _)| path.clone()).collect()
    }

    /// Short human summary, e.g. `solid/check.svg changed`.
    pub fn summary(&self) -> String {
        match self.0.as_slice() {
            [(path, kind)] => format!("{} {}", display_name(path), kind.label()),
            changes => format!("{} files changed", changes.len()),
        }
    }
}

fn display_name(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy());
    match (path.parent().and_then(Path::file_name), name) {
        (Some(dir), Some(name)) => format!("{}/{}", dir.to_string_lossy(), name),
        (None, Some(name)) => name.into_owned(),
        _ => path.display().to_string(),
    }
}

pub struct Reconciler {
    debounce: Duration,
    phase: Phase,
    /// Path → merged change kind since the last batch
    pending: FxHashMap<PathBuf, ChangeKind>,
}

impl Reconciler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            phase: Phase::Idle,
            pending: FxHashMap::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Feed one raw event. Returns `false` if it was ignored.
    ///
    /// Non-icon and editor temp paths cause no transition. During
    /// `Rebuilding` the event is only recorded; the timer starts on
    /// [`finish`](Self::finish).
    pub fn observe(&mut self, event: FileEvent, now: Instant) -> bool {
        if !is_icon_path(&event.path) || is_temp_file(&event.path) {
            return false;
        }

        self.merge(event);

        if self.phase != Phase::Rebuilding {
            self.phase = Phase::Debouncing {
                deadline: now + self.debounce,
            };
        }
        true
    }

    /// Dedup rules:
    /// - Removed → Added/Changed: restored, use the new event
    /// - Added/Changed → Removed: deleted, upgrade to Removed
    /// - otherwise: first event wins
    fn merge(&mut self, event: FileEvent) {
        let FileEvent { path, kind } = event;
        let Some(&existing) = self.pending.get(&path) else {
            crate::debug!("watch"; "{}: {}", kind.label(), path.display());
            self.pending.insert(path, kind);
            return;
        };

        match (existing, kind) {
            (ChangeKind::Removed, ChangeKind::Added | ChangeKind::Changed) => {
                self.pending.insert(path, kind);
            }
            // An atomic save reports Added for a file already in the sprite
            (ChangeKind::Added | ChangeKind::Changed, ChangeKind::Removed) => {
                self.pending.insert(path, ChangeKind::Removed);
            }
            _ => {}
        }
    }

    /// When the caller should call [`poll`](Self::poll) next.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Debouncing { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Take the pending batch once the debounce deadline has passed.
    ///
    /// On `Some`, the machine is in `Rebuilding` until [`finish`](Self::finish).
    pub fn poll(&mut self, now: Instant) -> Option<Batch> {
        let Phase::Debouncing { deadline } = self.phase else {
            return None;
        };
        if now < deadline {
            return None;
        }

        if self.pending.is_empty() {
            self.phase = Phase::Idle;
            return None;
        }

        let mut changes: Vec<_> = self.pending.drain().collect();
        changes.sort_by(|a, b| a.0.cmp(&b.0));
        self.phase = Phase::Rebuilding;
        Some(Batch(changes))
    }

    /// The in-flight rebuild completed.
    pub fn finish(&mut self, now: Instant) {
        if self.phase != Phase::Rebuilding {
            return;
        }
        self.phase = if self.pending.is_empty() {
            Phase::Idle
        } else {
            Phase::Debouncing {
                deadline: now + self.debounce,
            }
        };
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
