//! Sprite assembly and content hashing.
//!
//! Compiles are issued concurrently but joined in discovery order, so the
//! output only depends on file contents and discovery order.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use quick_xml::escape::escape;

use super::cache::SymbolCache;
use super::error::{CompileError, describe};
use super::symbol::{SVG_NS, Symbol};

/// Length of the content hash, in hex characters.
pub const HASH_LEN: usize = 12;

/// An assembled sprite document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    /// Serialized `<svg>` root element.
    pub content: String,
    /// Short content hash of `content`.
    pub hash: String,
    /// Symbol ids in document order.
    pub symbols: Vec<String>,
}

impl Sprite {
    /// Serialize symbols into one document.
    ///
    /// `attrs` are emitted sorted by name after the fixed namespace
    /// declaration. Hoisted defs are concatenated into one shared `<defs>`.
    pub fn render(symbols: &[Arc<Symbol>], attrs: &BTreeMap<String, String>) -> Self {
        let mut content = String::with_capacity(64 + symbols.len() * 256);
        content.push_str("<svg xmlns=\"");
        content.push_str(SVG_NS);
        content.push('"');
        for (key, value) in attrs {
            if key == "xmlns" {
                continue;
            }
            content.push(' ');
            content.push_str(key);
            content.push_str("=\"");
            content.push_str(&escape(value.as_str()));
            content.push('"');
        }
        content.push('>');

        let defs: Vec<&str> = symbols
            .iter()
            .filter_map(|s| s.defs.as_deref())
            .filter(|d| !d.is_empty())
            .collect();
        if !defs.is_empty() {
            content.push_str("<defs>");
            defs.iter().for_each(|d| content.push_str(d));
            content.push_str("</defs>");
        }

        for symbol in symbols {
            symbol.write_to(&mut content);
        }
        content.push_str("</svg>");

        let hash = filename_hash(content.as_bytes());
        Self {
            content,
            hash,
            symbols: symbols.iter().map(|s| s.id.clone()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Compute blake3 hash for filename ([`HASH_LEN`] hex chars).
///
/// Used for cache-correct file naming: content changes → filename changes.
pub fn filename_hash(content: &[u8]) -> String {
    let hash = blake3::hash(content);
    hash.to_hex()[..HASH_LEN].to_string()
}

/// Resolve every file through the cache and assemble the result.
///
/// Files that fail to compile are logged and left out. With no symbols at
/// all, an empty but well-formed sprite is returned.
pub async fn assemble(
    files: &[PathBuf],
    cache: &Arc<SymbolCache>,
    attrs: &BTreeMap<String, String>,
) -> Sprite {
    let handles: Vec<_> = files
        .iter()
        .map(|path| {
            let cache = Arc::clone(cache);
            let path = path.clone();
            tokio::spawn(async move { cache.get(&path).await })
        })
        .collect();

    // Barrier: wait for every compile of this generation, in discovery order
    let mut symbols = Vec::with_capacity(files.len());
    for (path, handle) in files.iter().zip(handles) {
        let result = handle
            .await
            .unwrap_or_else(|_| Err(CompileError::Aborted(path.clone())));
        match result {
            Ok(symbol) => symbols.push(symbol),
            Err(e) => crate::log!("warning"; "skipping {}", describe(&e)),
        }
    }

    if symbols.is_empty() {
        crate::log!("warning"; "no symbols produced from {} file(s), serving an empty sprite", files.len());
    }

    Sprite::render(&symbols, attrs)
}
