//! On-disk sprite artifact.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::sprite::{Sprite, WriteError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// An identical file already existed.
    Unchanged(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::Unchanged(path) => path,
        }
    }
}

/// Write `sprite` to `output.dir`, named by `output.filename` with `[hash]`
/// substituted.
pub fn write_sprite(output: &OutputConfig, sprite: &Sprite) -> Result<WriteOutcome, WriteError> {
    let path = output.dir.join(output.resolve_filename(&sprite.hash));
    write_if_changed(&path, sprite.content.as_bytes())
}

/// Write `content` unless `path` already holds exactly these bytes.
pub fn write_if_changed(path: &Path, content: &[u8]) -> Result<WriteOutcome, WriteError> {
    // Unreadable existing files fall through to the write, which reports the error
    if let Ok(existing) = fs::read(path)
        && existing == content
    {
        return Ok(WriteOutcome::Unchanged(path.to_path_buf()));
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| WriteError::CreateDir(parent.to_path_buf(), e))?;
    }

    fs::write(path, content).map_err(|e| WriteError::Write(path.to_path_buf(), e))?;
    Ok(WriteOutcome::Written(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn output(dir: &Path) -> OutputConfig {
        OutputConfig {
            dir: dir.join("dist/icons"),
            ..Default::default()
        }
    }

    #[test]
    fn test_write_creates_dirs_and_names_by_hash() {
        let temp = TempDir::new().unwrap();
        let sprite = Sprite::render(&[], &BTreeMap::new());

        let outcome = write_sprite(&output(temp.path()), &sprite).unwrap();
        let expected = temp
            .path()
            .join(format!("dist/icons/sprite.{}.svg", sprite.hash));

        assert_eq!(outcome, WriteOutcome::Written(expected.clone()));
        assert_eq!(fs::read_to_string(expected).unwrap(), sprite.content);
    }

    #[test]
    fn test_identical_content_not_rewritten() {
        let temp = TempDir::new().unwrap();
        let sprite = Sprite::render(&[], &BTreeMap::new());
        let config = output(temp.path());

        write_sprite(&config, &sprite).unwrap();
        let outcome = write_sprite(&config, &sprite).unwrap();
        assert!(matches!(outcome, WriteOutcome::Unchanged(_)));
    }

    #[test]
    fn test_different_content_overwritten() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sprite.svg");
        fs::write(&path, "old").unwrap();

        let outcome = write_if_changed(&path, b"new").unwrap();
        assert_eq!(outcome.path(), path);
        assert!(matches!(outcome, WriteOutcome::Written(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_write_error_when_parent_is_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("dist");
        fs::write(&blocker, "file").unwrap();

        let err = write_if_changed(&blocker.join("sprite.svg"), b"x").unwrap_err();
        assert!(matches!(err, WriteError::CreateDir(..)));
    }
}
