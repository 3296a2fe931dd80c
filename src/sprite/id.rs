//! Symbol id templates.
//!
//! A template such as `icon-[dir]-[name]` turns `icons/solid/check.svg` into
//! `icon-solid-check`. `[dir]` is the base name of the parent directory and
//! `[name]` is the file name without extension.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::config::ConfigError;

/// Placeholder for the file name without extension (mandatory).
pub const NAME: &str = "[name]";

/// Placeholder for the parent directory's base name.
pub const DIR: &str = "[dir]";

/// Template used when the config does not set `sprite.symbol_id`.
pub const DEFAULT_TEMPLATE: &str = "[dir]-[name]";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Za-z_]+)\]").unwrap());

/// A validated symbol id template.
///
/// Construction fails unless the template contains `[name]`, so a
/// [`SymbolIdTemplate`] can always render an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolIdTemplate(String);

impl SymbolIdTemplate {
    /// Validate and wrap a template string.
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        if !template.contains(NAME) {
            return Err(ConfigError::Validation(format!(
                "symbol id template `{template}` must contain `{NAME}`"
            )));
        }
        Ok(Self(template.to_string()))
    }

    /// Substitute `[dir]` and `[name]` for the given icon path.
    pub fn render(&self, path: &Path) -> String {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        let dir = path
            .parent()
            .and_then(Path::file_name)
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();

        self.0.replace(DIR, &dir).replace(NAME, &name)
    }

    /// Placeholders other than `[dir]` and `[name]`, left verbatim by [`render`](Self::render).
    pub fn unknown_placeholders(template: &str) -> Vec<String> {
        PLACEHOLDER
            .find_iter(template)
            .map(|m| m.as_str())
            .filter(|p| *p != NAME && *p != DIR)
            .map(str::to_string)
            .collect()
    }
}

impl Default for SymbolIdTemplate {
    fn default() -> Self {
        Self(DEFAULT_TEMPLATE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_template_without_name() {
        assert!(SymbolIdTemplate::parse("[dir]").is_err());
        assert!(SymbolIdTemplate::parse("icon").is_err());
        assert!(SymbolIdTemplate::parse("").is_err());
    }

    #[test]
    fn test_render_dir_and_name() {
        let template = SymbolIdTemplate::parse("[dir]-[name]").unwrap();
        assert_eq!(
            template.render(Path::new("/work/icons/solid/check.svg")),
            "solid-check"
        );
    }

    #[test]
    fn test_render_name_only() {
        let template = SymbolIdTemplate::parse("icon-[name]").unwrap();
        assert_eq!(template.render(Path::new("/a/b/close.svg")), "icon-close");
    }

    #[test]
    fn test_render_repeated_placeholders() {
        let template = SymbolIdTemplate::parse("[name]_[name]").unwrap();
        assert_eq!(template.render(Path::new("x/y.svg")), "y_y");
    }

    #[test]
    fn test_render_without_parent() {
        let template = SymbolIdTemplate::default();
        assert_eq!(template.render(Path::new("check.svg")), "-check");
    }

    #[test]
    fn test_colliding_ids_are_allowed() {
        let template = SymbolIdTemplate::parse("[name]").unwrap();
        let a = template.render(Path::new("/icons/solid/check.svg"));
        let b = template.render(Path::new("/icons/outline/check.svg"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_placeholders() {
        assert!(SymbolIdTemplate::unknown_placeholders("[dir]-[name]").is_empty());
        assert_eq!(
            SymbolIdTemplate::unknown_placeholders("[hash]-[name]-[ext]"),
            vec!["[hash]", "[ext]"]
        );
    }
}
