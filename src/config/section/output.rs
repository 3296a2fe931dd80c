//! `[output]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [output]
//! enable = true
//! dir = "dist"                    # Relative to config dir
//! filename = "sprite.[hash].svg"  # [hash] is the content hash
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Placeholder replaced by the sprite's content hash.
pub const HASH_PLACEHOLDER: &str = "[hash]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write the sprite to disk on every build.
    pub enable: bool,

    pub dir: PathBuf,

    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enable: true,
            dir: PathBuf::from("dist"),
            filename: "sprite.[hash].svg".to_string(),
        }
    }
}

impl OutputConfig {
    const FILENAME: FieldPath = FieldPath::new("output.filename");

    /// File name for a sprite with the given hash.
    pub fn resolve_filename(&self, hash: &str) -> String {
        self.filename.replace(HASH_PLACEHOLDER, hash)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.filename.trim().is_empty() {
            diag.error(Self::FILENAME, "file name is empty");
        } else if self.filename.contains('/') || self.filename.contains('\\') {
            diag.error_with_hint(
                Self::FILENAME,
                "file name must not contain path separators",
                "put directories in `output.dir`",
            );
        } else if !self.filename.contains(HASH_PLACEHOLDER) {
            diag.warn(
                Self::FILENAME,
                format!("no `{HASH_PLACEHOLDER}` placeholder, output will not be cache-busted"),
            );
        }
    }
}
