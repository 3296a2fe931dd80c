//! Icon discovery (pure, no side effects).
//!
//! Walks every configured root recursively and returns the `.svg` files in a
//! stable order: roots in configured order, and within a root a depth-first
//! walk with directory entries sorted by name. The sprite's symbol order is
//! this order, so it must not depend on scheduling.

use jwalk::WalkDir;
use rustc_hash::FxHashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::DiscoveryError;

/// Suffix of icon files.
pub const ICON_EXTENSION: &str = "svg";

/// Whether a path names an icon file (by suffix only).
pub fn is_icon_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == ICON_EXTENSION)
}

/// List all icon files under `roots`.
///
/// A missing or unreadable root fails the whole scan. Entries that cannot be
/// read inside a valid tree are logged and skipped. A file reachable from two
/// overlapping roots is listed once, at its first position.
pub fn discover(roots: &[PathBuf]) -> Result<Vec<PathBuf>, DiscoveryError> {
    for root in roots {
        check_root(root)?;
    }

    let mut seen = FxHashSet::default();
    let mut files = Vec::new();

    for root in roots {
        for entry in WalkDir::new(root).sort(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    crate::log!("warning"; "skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if is_icon_path(&path) && seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    crate::debug!("discover"; "found {} icon(s) in {} root(s)", files.len(), roots.len());
    Ok(files)
}

/// A root must exist, be a directory, and be listable.
fn check_root(root: &Path) -> Result<(), DiscoveryError> {
    let meta = fs::metadata(root).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DiscoveryError::MissingRoot(root.to_path_buf()),
        _ => DiscoveryError::Unreadable(root.to_path_buf(), e),
    })?;

    if !meta.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    fs::read_dir(root).map_err(|e| DiscoveryError::Unreadable(root.to_path_buf(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<svg/>").unwrap();
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_is_icon_path() {
        assert!(is_icon_path(Path::new("a/b.svg")));
        assert!(!is_icon_path(Path::new("a/b.png")));
        assert!(!is_icon_path(Path::new("a/svg")));
        assert!(!is_icon_path(Path::new("a/b.svg.bak")));
    }

    #[test]
    fn test_discover_sorted_recursive() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "solid/close.svg");
        touch(root, "solid/check.svg");
        touch(root, "arrow.svg");
        touch(root, "outline/check.svg");
        touch(root, "readme.md");

        let files = discover(&[root.to_path_buf()]).unwrap();
        assert_eq!(
            names(&files, root),
            vec![
                "arrow.svg",
                "outline/check.svg",
                "solid/check.svg",
                "solid/close.svg",
            ]
        );
    }

    #[test]
    fn test_discover_is_stable() {
        let dir = TempDir::new().unwrap();
        for name in ["z.svg", "a.svg", "m/b.svg", "m/a.svg"] {
            touch(dir.path(), name);
        }
        let roots = [dir.path().to_path_buf()];
        assert_eq!(discover(&roots).unwrap(), discover(&roots).unwrap());
    }

    #[test]
    fn test_discover_roots_in_configured_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b/one.svg");
        touch(dir.path(), "a/two.svg");

        let files = discover(&[dir.path().join("b"), dir.path().join("a")]).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["b/one.svg", "a/two.svg"]);
    }

    #[test]
    fn test_discover_overlapping_roots_dedup() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sub/x.svg");

        let files = discover(&[dir.path().to_path_buf(), dir.path().join("sub")]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_discover_empty_root() {
        let dir = TempDir::new().unwrap();
        assert!(discover(&[dir.path().to_path_buf()]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover(&[missing]),
            Err(DiscoveryError::MissingRoot(_))
        ));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.svg");
        assert!(matches!(
            discover(&[dir.path().join("a.svg")]),
            Err(DiscoveryError::NotADirectory(_))
        ));
    }
}
