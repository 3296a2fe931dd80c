//! Single-flight symbol cache.
//!
//! Each path maps to a shared cell. The first requester compiles the file,
//! concurrent requesters for the same path wait on the same cell and observe
//! the same result. Presence of an initialized cell is what "already
//! processed" means; there is no eviction besides explicit invalidation.
//!
//! ```text
//! get(path) ──► entry(path) ──► OnceCell ──► compile_file (at most once)
//!                                  ▲
//! invalidate(path) ── removes ─────┘   (an in-flight compile finishes into
//!                                       a cell nobody can reach anymore)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxHashSet;
use tokio::sync::OnceCell;

use super::error::CompileError;
use super::symbol::{Symbol, SymbolCompiler};

type Cell = Arc<OnceCell<Arc<Symbol>>>;

/// Path → compiled symbol, memoized per cache generation.
pub struct SymbolCache {
    entries: DashMap<PathBuf, Cell>,
    compiler: SymbolCompiler,
}

impl SymbolCache {
    pub fn new(compiler: SymbolCompiler) -> Self {
        Self {
            entries: DashMap::new(),
            compiler,
        }
    }

    pub fn compiler(&self) -> &SymbolCompiler {
        &self.compiler
    }

    /// Return the cached symbol, compiling the file on a miss.
    ///
    /// Failures are not cached: the entry is dropped so the next request
    /// compiles again.
    pub async fn get(&self, path: &Path) -> Result<Arc<Symbol>, CompileError> {
        // The shard guard must not live across an await point
        let cell: Cell = Arc::clone(&self.entries.entry(path.to_path_buf()).or_default());

        let result = cell
            .get_or_try_init(|| async {
                crate::debug!("cache"; "compile {}", path.display());
                self.compiler.compile_file(path).await.map(Arc::new)
            })
            .await
            .map(Arc::clone);

        if result.is_err() {
            self.entries
                .remove_if(path, |_, current| Arc::ptr_eq(current, &cell) && !current.initialized());
        }
        result
    }

    /// Whether a compiled symbol is present for `path`.
    #[cfg(test)]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries
            .get(path)
            .is_some_and(|cell| cell.initialized())
    }

    /// Drop the entry for one path. Returns whether one was present.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Drop every entry whose path is not in `keep`.
    pub fn retain(&self, keep: &FxHashSet<&Path>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|path, _| keep.contains(path.as_path()));
        before - self.entries.len()
    }

    /// Start a new generation.
    pub fn clear(&self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::error::OptimizeError;
    use crate::sprite::id::SymbolIdTemplate;
    use crate::sprite::optimize::{MarkupOptimizer, Optimize};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Counts optimizer invocations, i.e. compilations.
    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl Optimize for Counting {
        fn optimize(&self, raw: &str) -> Result<String, OptimizeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            MarkupOptimizer::default().optimize(raw)
        }
    }

    fn counting_cache() -> (SymbolCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let compiler = SymbolCompiler::new(
            Arc::new(Counting {
                calls: Arc::clone(&calls),
            }),
            SymbolIdTemplate::default(),
            true,
        );
        (SymbolCache::new(compiler), calls)
    }

    #[tokio::test]
    async fn test_get_compiles_once() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.svg");
        fs::write(&file, "<svg><path d=\"M1 1\"/></svg>").unwrap();

        let (cache, calls) = counting_cache();
        let first = cache.get(&file).await.unwrap();
        let second = cache.get(&file).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&file));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_gets_are_coalesced() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.svg");
        fs::write(&file, "<svg><path d=\"M1 1\"/></svg>").unwrap();

        let (cache, calls) = counting_cache();
        let cache = Arc::new(cache);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let file = file.clone();
                tokio::spawn(async move { cache.get(&file).await.unwrap() })
            })
            .collect();

        let mut symbols = Vec::new();
        for handle in handles {
            symbols.push(handle.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(symbols.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_invalidate_recompiles() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.svg");
        fs::write(&file, "<svg><path d=\"M1 1\"/></svg>").unwrap();

        let (cache, calls) = counting_cache();
        let old = cache.get(&file).await.unwrap();

        fs::write(&file, "<svg><path d=\"M2 2\"/></svg>").unwrap();
        // Still cached: presence, not freshness, governs reuse
        assert_eq!(cache.get(&file).await.unwrap().body, old.body);

        assert!(cache.invalidate(&file));
        let new = cache.get(&file).await.unwrap();
        assert_eq!(new.body, "<path d=\"M2 2\"/>");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bad.svg");
        fs::write(&file, "<svg><g></svg>").unwrap();

        let (cache, _) = counting_cache();
        assert!(cache.get(&file).await.is_err());
        assert!(!cache.contains(&file));
        assert!(cache.is_empty());

        fs::write(&file, "<svg/>").unwrap();
        assert!(cache.get(&file).await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_and_retain() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.svg");
        let b = dir.path().join("b.svg");
        fs::write(&a, "<svg/>").unwrap();
        fs::write(&b, "<svg/>").unwrap();

        let (cache, _) = counting_cache();
        cache.get(&a).await.unwrap();
        cache.get(&b).await.unwrap();
        assert_eq!(cache.len(), 2);

        let keep: FxHashSet<&Path> = [a.as_path()].into_iter().collect();
        assert_eq!(cache.retain(&keep), 1);
        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));

        cache.clear();
        assert!(cache.is_empty());
    }
}
