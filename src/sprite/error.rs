//! Error types for the sprite pipeline.
//!
//! Only [`DiscoveryError`] is fatal. [`CompileError`] skips a single file and
//! [`WriteError`] leaves the in-memory sprite untouched.

use std::path::PathBuf;
use thiserror::Error;

/// A configured root directory cannot be scanned.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("icon directory `{0}` does not exist")]
    MissingRoot(PathBuf),

    #[error("icon directory `{0}` is not a directory")]
    NotADirectory(PathBuf),

    #[error("cannot read icon directory `{0}`")]
    Unreadable(PathBuf, #[source] std::io::Error),
}

/// The external optimizer rejected the markup.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("malformed markup: {0}")]
    Malformed(String),

    #[error("usvg: {0}")]
    Usvg(String),
}

/// One icon file could not be turned into a symbol.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("cannot read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("optimizer failed on `{path}`")]
    Optimize {
        path: PathBuf,
        #[source]
        source: OptimizeError,
    },

    #[error("`{0}` has no root element")]
    NoRootElement(PathBuf),

    #[error("cannot parse optimized markup of `{path}`: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("compile task for `{0}` was aborted")]
    Aborted(PathBuf),
}

impl CompileError {
    /// The file this error belongs to.
    #[cfg(test)]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Read { path, .. } | Self::Optimize { path, .. } | Self::Parse { path, .. } => {
                path
            }
            Self::NoRootElement(path) | Self::Aborted(path) => path,
        }
    }
}

/// The sprite artifact could not be persisted.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot create output directory `{0}`")]
    CreateDir(PathBuf, #[source] std::io::Error),

    #[error("cannot write sprite to `{0}`")]
    Write(PathBuf, #[source] std::io::Error),
}

/// Render an error with its `source()` chain, `outer: inner: root`.
pub fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_compile_error_path() {
        let err = CompileError::Read {
            path: PathBuf::from("icons/a.svg"),
            source: Error::new(ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.path(), &PathBuf::from("icons/a.svg"));

        let err = CompileError::NoRootElement(PathBuf::from("icons/b.svg"));
        assert_eq!(err.path(), &PathBuf::from("icons/b.svg"));
        assert!(format!("{err}").contains("no root element"));
    }

    #[test]
    fn test_describe_includes_sources() {
        let err = CompileError::Optimize {
            path: PathBuf::from("a.svg"),
            source: OptimizeError::Malformed("unexpected end".into()),
        };
        assert_eq!(
            describe(&err),
            "optimizer failed on `a.svg`: malformed markup: unexpected end"
        );
    }

    #[test]
    fn test_discovery_error_display() {
        let err = DiscoveryError::MissingRoot(PathBuf::from("/nope"));
        assert!(format!("{err}").contains("/nope"));
    }
}
