//! Markup optimizers run before symbol extraction.
//!
//! Every optimizer is a pure function from raw markup to optimized markup.
//! Two backends are provided:
//!
//! - [`MarkupOptimizer`]: streaming pass over the XML events (quick-xml).
//!   Strips declarations, comments and blank text outside text content, normalizes tag
//!   whitespace, and optionally merges adjacent paths.
//! - [`UsvgOptimizer`]: full normalization through `usvg`.
//!
//! Comment removal is not configurable. License headers inside icons would
//! otherwise be copied into every page that inlines the sprite.

use std::borrow::Cow;
use std::sync::Arc;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

use super::error::OptimizeError;
use crate::config::{OptimizeConfig, OptimizerBackend};

/// Upper bound for multipass optimization.
const MAX_PASSES: usize = 10;

/// Attributes that make a `<path>` unsafe to merge with its neighbour.
const MERGE_BLOCKERS: &[&[u8]] = &[
    b"id",
    b"marker-start",
    b"marker-mid",
    b"marker-end",
    b"clip-path",
    b"mask",
];

/// Elements whose whitespace-only text is rendered or read out.
const TEXT_CONTENT: &[&[u8]] = &[b"text", b"tspan", b"textPath", b"title", b"desc"];

/// An optimizer collaborator: raw markup in, optimized markup out.
pub trait Optimize: Send + Sync {
    fn optimize(&self, raw: &str) -> Result<String, OptimizeError>;
}

/// Build the optimizer selected by the config.
pub fn optimizer_for(config: &OptimizeConfig) -> Arc<dyn Optimize> {
    match config.backend {
        OptimizerBackend::Builtin => Arc::new(MarkupOptimizer {
            multipass: config.multipass(),
            merge_paths: config.merge_paths,
        }),
        OptimizerBackend::Usvg => Arc::new(UsvgOptimizer::default()),
    }
}

// ============================================================================
// Builtin optimizer
// ============================================================================

/// Streaming markup optimizer.
#[derive(Debug, Clone)]
pub struct MarkupOptimizer {
    /// Repeat passes until the output stops changing.
    pub multipass: bool,
    /// Merge adjacent sibling `<path/>` elements with identical attributes.
    pub merge_paths: bool,
}

impl Default for MarkupOptimizer {
    fn default() -> Self {
        Self {
            multipass: true,
            merge_paths: false,
        }
    }
}

impl Optimize for MarkupOptimizer {
    fn optimize(&self, raw: &str) -> Result<String, OptimizeError> {
        let mut current = self.pass(raw)?;
        if !self.multipass {
            return Ok(current);
        }

        for _ in 1..MAX_PASSES {
            let next = self.pass(&current)?;
            if next == current {
                break;
            }
            current = next;
        }
        Ok(current)
    }
}

impl MarkupOptimizer {
    fn pass(&self, input: &str) -> Result<String, OptimizeError> {
        let mut reader = Reader::from_str(input);
        let mut writer = Writer::new(Vec::with_capacity(input.len()));
        // Last mergeable <path/> not yet written
        let mut pending: Option<BytesStart<'static>> = None;
        // One entry per open element: is it a text-content element
        let mut open: Vec<bool> = Vec::new();
        let mut in_text = 0usize;

        loop {
            let event = reader.read_event().map_err(malformed)?;
            match event {
                Event::Eof => break,
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
                Event::Text(ref text)
                    if in_text == 0 && text.iter().all(u8::is_ascii_whitespace) => {}
                Event::Start(start) => {
                    flush(&mut writer, &mut pending)?;
                    let is_text = TEXT_CONTENT.contains(&start.local_name().as_ref());
                    writer
                        .write_event(Event::Start(normalize(&start)?))
                        .map_err(malformed)?;
                    open.push(is_text);
                    in_text += usize::from(is_text);
                }
                Event::End(end) => {
                    let Some(was_text) = open.pop() else {
                        return Err(OptimizeError::Malformed(format!(
                            "unexpected closing tag `{}`",
                            String::from_utf8_lossy(end.name().as_ref())
                        )));
                    };
                    in_text -= usize::from(was_text);
                    flush(&mut writer, &mut pending)?;
                    writer.write_event(Event::End(end)).map_err(malformed)?;
                }
                Event::Empty(start) => {
                    let start = normalize(&start)?;
                    if self.merge_paths && is_mergeable_path(&start) {
                        pending = match pending.take() {
                            Some(prev) if same_attrs_except_d(&prev, &start) => {
                                Some(merge_paths(&prev, &start)?)
                            }
                            Some(prev) => {
                                writer.write_event(Event::Empty(prev)).map_err(malformed)?;
                                Some(start)
                            }
                            None => Some(start),
                        };
                        continue;
                    }
                    flush(&mut writer, &mut pending)?;
                    writer.write_event(Event::Empty(start)).map_err(malformed)?;
                }
                other => {
                    flush(&mut writer, &mut pending)?;
                    writer.write_event(other).map_err(malformed)?;
                }
            }
        }

        if !open.is_empty() {
            return Err(OptimizeError::Malformed(format!(
                "{} unclosed element(s) at end of input",
                open.len()
            )));
        }
        flush(&mut writer, &mut pending)?;

        String::from_utf8(writer.into_inner()).map_err(malformed)
    }
}

fn malformed(e: impl std::fmt::Display) -> OptimizeError {
    OptimizeError::Malformed(e.to_string())
}

fn flush(
    writer: &mut Writer<Vec<u8>>,
    pending: &mut Option<BytesStart<'static>>,
) -> Result<(), OptimizeError> {
    if let Some(path) = pending.take() {
        writer.write_event(Event::Empty(path)).map_err(malformed)?;
    }
    Ok(())
}

/// Rebuild a start tag with single spaces between attributes and
/// double-quoted values.
fn normalize(start: &BytesStart<'_>) -> Result<BytesStart<'static>, OptimizeError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        out.push_attribute(Attribute {
            key: attr.key,
            value: quote_safe(attr.value),
        });
    }
    Ok(out)
}

/// Values read from single-quoted attributes may contain a raw `"`.
fn quote_safe(value: Cow<'_, [u8]>) -> Cow<'_, [u8]> {
    if !value.contains(&b'"') {
        return value;
    }
    let mut out = Vec::with_capacity(value.len() + 8);
    for &b in value.iter() {
        if b == b'"' {
            out.extend_from_slice(b"&quot;");
        } else {
            out.push(b);
        }
    }
    Cow::Owned(out)
}

fn attrs_of(start: &BytesStart<'_>) -> Vec<(Vec<u8>, Vec<u8>)> {
    start
        .attributes()
        .flatten()
        .map(|a| (a.key.as_ref().to_vec(), a.value.into_owned()))
        .collect()
}

fn is_mergeable_path(start: &BytesStart<'_>) -> bool {
    if start.local_name().as_ref() != b"path" {
        return false;
    }
    let attrs = attrs_of(start);
    let d = attrs.iter().find(|(k, _)| k.as_slice() == b"d");
    // A leading relative moveto would be re-anchored by concatenation
    let absolute = d.is_some_and(|(_, v)| v.trim_ascii_start().first() == Some(&b'M'));
    absolute
        && !attrs
            .iter()
            .any(|(k, _)| MERGE_BLOCKERS.contains(&k.as_slice()))
}

fn same_attrs_except_d(a: &BytesStart<'_>, b: &BytesStart<'_>) -> bool {
    let strip = |s: &BytesStart<'_>| -> Vec<(Vec<u8>, Vec<u8>)> {
        attrs_of(s)
            .into_iter()
            .filter(|(k, _)| k.as_slice() != b"d")
            .collect()
    };
    strip(a) == strip(b)
}

fn merge_paths(
    prev: &BytesStart<'_>,
    next: &BytesStart<'_>,
) -> Result<BytesStart<'static>, OptimizeError> {
    let next_d = attrs_of(next)
        .into_iter()
        .find(|(k, _)| k.as_slice() == b"d")
        .map(|(_, v)| v)
        .unwrap_or_default();

    let mut out = BytesStart::new("path");
    for (key, value) in attrs_of(prev) {
        let value = if key.as_slice() == b"d" {
            let mut joined = value;
            joined.push(b' ');
            joined.extend_from_slice(next_d.trim_ascii());
            joined
        } else {
            value
        };
        out.push_attribute(Attribute {
            key: QName(&key),
            value: Cow::Owned(value),
        });
    }
    Ok(out)
}

// ============================================================================
// usvg optimizer
// ============================================================================

/// Normalizes icons through `usvg`: shapes become paths, styles are resolved
/// and comments disappear. Paths are never merged.
#[derive(Debug, Clone)]
pub struct UsvgOptimizer {
    /// DPI used to resolve absolute units.
    pub dpi: f32,
}

impl Default for UsvgOptimizer {
    fn default() -> Self {
        Self { dpi: 96.0 }
    }
}

impl Optimize for UsvgOptimizer {
    fn optimize(&self, raw: &str) -> Result<String, OptimizeError> {
        let options = usvg::Options {
            dpi: self.dpi,
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(raw.as_bytes(), &options)
            .map_err(|e| OptimizeError::Usvg(e.to_string()))?;

        let write_options = usvg::WriteOptions {
            indent: usvg::Indent::None,
            ..Default::default()
        };
        Ok(tree.to_string(&write_options))
    }
}
