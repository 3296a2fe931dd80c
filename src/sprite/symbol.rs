//! Symbol compiler: one icon file → one `<symbol>`.
//!
//! ```text
//! raw svg ──► optimizer ──► root element ──► <symbol id viewBox attrs…>
//!                                 │                children…
//!                                 └── <defs> ──► hoisted into the sprite
//! ```

use std::path::Path;
use std::sync::Arc;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::error::CompileError;
use super::id::SymbolIdTemplate;
use super::optimize::Optimize;

/// Coordinate box used when the icon does not declare one.
pub const DEFAULT_VIEW_BOX: &str = "0 0 24 24";

/// The SVG namespace, declared once on the sprite root.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Root attributes that are never copied onto a symbol. A fixed size would
/// defeat reuse at arbitrary sizes.
const DROPPED_ATTRS: &[&str] = &["width", "height"];

/// A compiled icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Rendered symbol id.
    pub id: String,
    /// `viewBox` of the source root, or [`DEFAULT_VIEW_BOX`].
    pub view_box: String,
    /// Remaining root attributes in source order. Values are kept escaped.
    pub attrs: Vec<(String, String)>,
    /// Children of the source root, serialized.
    pub body: String,
    /// Contents of hoisted `<defs>` blocks, if any.
    pub defs: Option<String>,
}

impl Symbol {
    /// Append `<symbol …>…</symbol>` to `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push_str("<symbol id=\"");
        out.push_str(&escape(self.id.as_str()));
        out.push_str("\" viewBox=\"");
        out.push_str(&self.view_box);
        out.push('"');
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }
        out.push('>');
        out.push_str(&self.body);
        out.push_str("</symbol>");
    }
}

/// Turns raw icon markup into [`Symbol`]s.
///
/// Compiling the same content with the same optimizer twice yields equal
/// symbols.
#[derive(Clone)]
pub struct SymbolCompiler {
    optimizer: Arc<dyn Optimize>,
    template: SymbolIdTemplate,
    hoist_defs: bool,
}

impl SymbolCompiler {
    pub fn new(optimizer: Arc<dyn Optimize>, template: SymbolIdTemplate, hoist_defs: bool) -> Self {
        Self {
            optimizer,
            template,
            hoist_defs,
        }
    }

    /// Symbol id for an icon path.
    pub fn symbol_id(&self, path: &Path) -> String {
        self.template.render(path)
    }

    /// Read an icon from disk and compile it.
    pub async fn compile_file(&self, path: &Path) -> Result<Symbol, CompileError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CompileError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        self.compile(path, &raw)
    }

    /// Compile raw markup belonging to `path`.
    pub fn compile(&self, path: &Path, raw: &str) -> Result<Symbol, CompileError> {
        let optimized = self
            .optimizer
            .optimize(raw)
            .map_err(|source| CompileError::Optimize {
                path: path.to_path_buf(),
                source,
            })?;

        let parse_err = |e: &dyn std::fmt::Display| CompileError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut reader = Reader::from_str(&optimized);
        let (root, self_closing) = loop {
            match reader.read_event().map_err(|e| parse_err(&e))? {
                Event::Start(start) => break (start.into_owned(), false),
                Event::Empty(start) => break (start.into_owned(), true),
                Event::Eof => return Err(CompileError::NoRootElement(path.to_path_buf())),
                _ => {}
            }
        };

        let (view_box, attrs) = read_root_attrs(&root).map_err(|e| parse_err(&e))?;

        let mut body = Writer::new(Vec::new());
        let mut defs = Writer::new(Vec::new());
        let mut has_defs = false;

        if !self_closing {
            let mut depth = 1usize;
            // Depth of the hoisted <defs> currently open
            let mut defs_depth: Option<usize> = None;

            loop {
                let event = reader.read_event().map_err(|e| parse_err(&e))?;
                match event {
                    Event::Eof => return Err(parse_err(&"root element is not closed")),
                    Event::Start(start) => {
                        depth += 1;
                        if self.hoist_defs && depth == 2 && is_defs(&start) {
                            defs_depth = Some(depth);
                            has_defs = true;
                            continue;
                        }
                        let target = if defs_depth.is_some() { &mut defs } else { &mut body };
                        target
                            .write_event(Event::Start(start))
                            .map_err(|e| parse_err(&e))?;
                    }
                    Event::End(end) => {
                        if defs_depth == Some(depth) {
                            defs_depth = None;
                            depth -= 1;
                            continue;
                        }
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                        let target = if defs_depth.is_some() { &mut defs } else { &mut body };
                        target
                            .write_event(Event::End(end))
                            .map_err(|e| parse_err(&e))?;
                    }
                    Event::Empty(start) if self.hoist_defs && depth == 1 && is_defs(&start) => {}
                    other => {
                        let target = if defs_depth.is_some() { &mut defs } else { &mut body };
                        target.write_event(other).map_err(|e| parse_err(&e))?;
                    }
                }
            }
        }

        let body = String::from_utf8(body.into_inner()).map_err(|e| parse_err(&e))?;
        let defs = if has_defs {
            Some(String::from_utf8(defs.into_inner()).map_err(|e| parse_err(&e))?)
        } else {
            None
        };

        Ok(Symbol {
            id: self.symbol_id(path),
            view_box,
            attrs,
            body,
            defs,
        })
    }
}

fn is_defs(start: &BytesStart<'_>) -> bool {
    start.local_name().as_ref() == b"defs"
}

/// Split root attributes into the viewBox and the attributes to copy.
///
/// `width`/`height` are dropped, `id` is replaced by the symbol id, and the
/// default namespace is declared on the sprite root instead.
fn read_root_attrs(
    root: &BytesStart<'_>,
) -> Result<(String, Vec<(String, String)>), quick_xml::events::attributes::AttrError> {
    let mut view_box = None;
    let mut attrs = Vec::new();

    for attr in root.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = String::from_utf8_lossy(&attr.value).into_owned();

        match key.as_str() {
            "viewBox" => view_box = Some(value),
            "id" => {}
            "xmlns" if value == SVG_NS => {}
            k if DROPPED_ATTRS.contains(&k) => {}
            _ => attrs.push((key, value)),
        }
    }

    let view_box = view_box
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_VIEW_BOX.to_string());
    Ok((view_box, attrs))
}
