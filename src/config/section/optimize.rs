//! `[optimize]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [optimize]
//! backend = "builtin"     # builtin | usvg
//! multipass = true        # Repeat passes until stable (forced on unless set)
//! merge_paths = false     # Merge adjacent compatible <path/> elements
//! ```

use serde::{Deserialize, Serialize};

/// Optimizer backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerBackend {
    /// Streaming quick-xml cleanup.
    #[default]
    Builtin,
    /// Full normalization through usvg.
    Usvg,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConfig {
    pub backend: OptimizerBackend,

    /// `None` means "not set by the user", which enables multipass.
    pub multipass: Option<bool>,

    /// Icon authors rely on path identity, so this stays off unless enabled.
    pub merge_paths: bool,
}

impl OptimizeConfig {
    pub fn multipass(&self) -> bool {
        self.multipass.unwrap_or(true)
    }
}
