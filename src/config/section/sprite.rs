//! `[sprite]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [sprite]
//! dirs = ["icons"]              # Icon roots (relative to config dir)
//! symbol_id = "[dir]-[name]"    # Must contain [name]
//! hoist_defs = true             # Move nested <defs> into one shared <defs>
//!
//! [sprite.attrs]
//! style = "display: none"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::sprite::id::{self, SymbolIdTemplate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteSection {
    /// Root directories scanned for icons, in order.
    pub dirs: Vec<PathBuf>,

    /// Symbol id template with `[dir]` and `[name]` placeholders.
    pub symbol_id: String,

    /// Hoist `<defs>` that are direct children of an icon root.
    pub hoist_defs: bool,

    /// Extra attributes on the sprite root element.
    /// Sorted by name when serialized.
    pub attrs: BTreeMap<String, String>,
}

impl Default for SpriteSection {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from("icons")],
            symbol_id: id::DEFAULT_TEMPLATE.to_string(),
            hoist_defs: true,
            attrs: BTreeMap::new(),
        }
    }
}

impl SpriteSection {
    const DIRS: FieldPath = FieldPath::new("sprite.dirs");
    const SYMBOL_ID: FieldPath = FieldPath::new("sprite.symbol_id");
    const ATTRS: FieldPath = FieldPath::new("sprite.attrs");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.dirs.is_empty() {
            diag.error_with_hint(
                Self::DIRS,
                "no icon directories configured",
                "set `dirs = [\"icons\"]` or pass --dir",
            );
        }

        if SymbolIdTemplate::parse(&self.symbol_id).is_err() {
            diag.error_with_hint(
                Self::SYMBOL_ID,
                format!("`{}` does not contain `{}`", self.symbol_id, id::NAME),
                format!("e.g. `{}`", id::DEFAULT_TEMPLATE),
            );
        }

        let unknown = SymbolIdTemplate::unknown_placeholders(&self.symbol_id);
        if !unknown.is_empty() {
            diag.warn(
                Self::SYMBOL_ID,
                format!("unknown placeholder(s) {} are kept verbatim", unknown.join(", ")),
            );
        }

        if self.attrs.contains_key("xmlns") {
            diag.warn(Self::ATTRS, "`xmlns` is fixed and will be ignored");
        }
    }
}
