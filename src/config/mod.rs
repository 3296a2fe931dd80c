//! Configuration management for `sprite.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── sprite     # [sprite]
//! │   ├── optimize   # [optimize]
//! │   ├── output     # [output]
//! │   ├── inject     # [inject]
//! │   └── serve      # [serve]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # Config lookup and path resolution
//! └── mod.rs         # SpriteConfig (this file)
//! ```

pub mod section;
pub mod types;
mod util;

pub use section::{
    InjectConfig, InjectPosition, OptimizeConfig, OptimizerBackend, OutputConfig, ServeConfig,
    SpriteSection,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};
pub use util::normalize_path;

use crate::cli::{Cli, Commands};
use crate::log;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use util::{find_config_file, resolve_against};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sprite.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpriteConfig {
    /// Absolute path to the config file, empty when running without one
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub sprite: SpriteSection,

    #[serde(default)]
    pub optimize: OptimizeConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Absent section disables HTML injection
    #[serde(default)]
    pub inject: Option<InjectConfig>,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl SpriteConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. Without one, `--dir`
    /// must be given and defaults are used for everything else.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let args = cli.command.sprite_args();
        crate::logger::set_verbose(args.verbose);

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = normalize_path(&path);
                config
            }
            None if !args.dirs.is_empty() => {
                log!("config"; "no {} found, using defaults", cli.config.display());
                Self::default()
            }
            None => return Err(ConfigError::NotFound(cli.config.clone()).into()),
        };

        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone());
        config.set_root(&root);
        config.normalize_paths();
        config.apply_command_options(&cli.command, &cwd);
        config.validate()?;

        Ok(config)
    }

    /// Parse and resolve a config whose relative paths live under `root`.
    #[cfg(test)]
    pub fn parse(content: &str, root: &Path) -> Result<Self> {
        let (mut config, ignored) = Self::parse_with_ignored(content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, Path::new("sprite.toml"));
        }
        config.set_root(root);
        config.normalize_paths();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    pub fn get_root(&self) -> &Path {
        &self.root
    }

    pub fn set_root(&mut self, path: &Path) {
        self.root = normalize_path(path);
    }

    /// Output directory joined with the filename for `hash`.
    pub fn output_path(&self, hash: &str) -> PathBuf {
        self.output.dir.join(self.output.resolve_filename(hash))
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific options. CLI paths are relative to `cwd`.
    fn apply_command_options(&mut self, command: &Commands, cwd: &Path) {
        let args = command.sprite_args();
        if !args.dirs.is_empty() {
            self.sprite.dirs = args
                .dirs
                .iter()
                .map(|dir| resolve_against(dir, cwd))
                .collect();
        }

        match command {
            Commands::Build { output, .. } => {
                if let Some(dir) = output {
                    self.output.dir = resolve_against(dir, cwd);
                }
            }
            Commands::Serve {
                interface,
                port,
                watch,
                root,
                ..
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
                if let Some(root) = root {
                    self.serve.root = Some(resolve_against(root, cwd));
                }
            }
            Commands::Ids { .. } => {}
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Resolve every configured path against the root directory.
    fn normalize_paths(&mut self) {
        let root = self.root.clone();
        self.sprite.dirs = self
            .sprite
            .dirs
            .iter()
            .map(|dir| resolve_against(dir, &root))
            .collect();
        self.output.dir = resolve_against(&self.output.dir, &root);
        if let Some(static_root) = self.serve.root.take() {
            self.serve.root = Some(resolve_against(&static_root, &root));
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the whole configuration.
    ///
    /// Collects all validation errors and returns them at once; warnings are
    /// printed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.sprite.validate(&mut diag);
        self.output.validate(&mut diag);
        self.serve.validate(&mut diag);

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config without path resolution or validation.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SpriteConfig {
    let (parsed, ignored) = SpriteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_toml() {
        let result = SpriteConfig::parse_with_ignored("[sprite\ndirs = []");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[sprite]\ndirs = [\"icons\"]\ncolour = \"red\"\n[unknown_section]\nfield = 1";
        let (config, ignored) = SpriteConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.sprite.dirs, vec![PathBuf::from("icons")]);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
        assert!(ignored.iter().any(|f| f == "sprite.colour"));
    }

    #[test]
    fn test_no_unknown_fields() {
        let (_, ignored) = SpriteConfig::parse_with_ignored("[serve]\nport = 1").unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_parse_resolves_relative_paths() {
        let temp = TempDir::new().unwrap();
        let root = normalize_path(temp.path());
        fs::create_dir(root.join("icons")).unwrap();

        let config = SpriteConfig::parse(
            "[sprite]\ndirs = [\"icons\"]\n[output]\ndir = \"out\"\n[serve]\nroot = \"public\"",
            &root,
        )
        .unwrap();

        assert_eq!(config.sprite.dirs, vec![root.join("icons")]);
        assert_eq!(config.output.dir, root.join("out"));
        assert_eq!(config.serve.root, Some(root.join("public")));
        assert_eq!(
            config.output_path("0123456789ab"),
            root.join("out/sprite.0123456789ab.svg")
        );
    }

    #[test]
    fn test_parse_rejects_template_without_name() {
        let temp = TempDir::new().unwrap();
        let err = SpriteConfig::parse("[sprite]\nsymbol_id = \"[dir]\"", temp.path()).unwrap_err();

        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err}");
        };
        assert!(
            diag.errors()
                .iter()
                .any(|d| d.field.as_str() == "sprite.symbol_id")
        );
    }

    #[test]
    fn test_parse_collects_all_errors() {
        let temp = TempDir::new().unwrap();
        let err = SpriteConfig::parse(
            "[sprite]\ndirs = []\nsymbol_id = \"x\"\n[serve]\nroute = \"x\"",
            temp.path(),
        )
        .unwrap_err();

        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err}");
        };
        assert_eq!(diag.len(), 3);
    }
}
