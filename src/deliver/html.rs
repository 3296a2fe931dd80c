//! HTML injection of the sprite markup.
//!
//! Works on bytes with ASCII case-insensitive tag matching, so documents are
//! never parsed or re-serialized.

use crate::config::InjectPosition;

const BODY_OPEN: &[u8] = b"<body";
const BODY_CLOSE: &[u8] = b"</body>";

/// Insert `sprite` into `html` at `position`, at most once.
///
/// A document that already contains `sprite` verbatim is returned as is.
/// Without a `<body>` tag the sprite is prepended (body start) or appended
/// (body end).
pub fn inject_sprite(html: &[u8], sprite: &str, position: InjectPosition) -> Vec<u8> {
    if contains(html, sprite.as_bytes()) {
        return html.to_vec();
    }
    match position {
        InjectPosition::BodyStart => insert_after_body_open(html, sprite.as_bytes()),
        InjectPosition::BodyEnd => insert_before_body_close(html, sprite.as_bytes()),
    }
}

/// Insert `snippet` right before the last `</body>`, or append it.
pub fn insert_before_body_close(html: &[u8], snippet: &[u8]) -> Vec<u8> {
    let pos = html
        .windows(BODY_CLOSE.len())
        .rposition(|w| w.eq_ignore_ascii_case(BODY_CLOSE))
        .unwrap_or(html.len());
    splice(html, pos, snippet)
}

/// Insert `snippet` right after the opening `<body …>` tag, or prepend it.
pub fn insert_after_body_open(html: &[u8], snippet: &[u8]) -> Vec<u8> {
    let pos = find_body_open_end(html).unwrap_or(0);
    splice(html, pos, snippet)
}

/// Byte offset just past the `>` of the first `<body` tag.
fn find_body_open_end(html: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = html[from..]
        .windows(BODY_OPEN.len())
        .position(|w| w.eq_ignore_ascii_case(BODY_OPEN))
    {
        let start = from + offset;
        let after = start + BODY_OPEN.len();
        // `<bodyguard>` is not a body tag
        match html.get(after) {
            Some(b'>') => return Some(after + 1),
            Some(c) if c.is_ascii_whitespace() => {
                return html[after..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map(|gt| after + gt + 1);
            }
            _ => from = after,
        }
    }
    None
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

fn splice(html: &[u8], pos: usize, snippet: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(html.len() + snippet.len());
    result.extend_from_slice(&html[..pos]);
    result.extend_from_slice(snippet);
    result.extend_from_slice(&html[pos..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPRITE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><symbol id="a" viewBox="0 0 24 24"></symbol></svg>"#;

    fn inject(html: &str, position: InjectPosition) -> String {
        String::from_utf8(inject_sprite(html.as_bytes(), SPRITE, position)).unwrap()
    }

    #[test]
    fn test_body_start() {
        let html = "<html><body class=\"x\"><p>hi</p></body></html>";
        assert_eq!(
            inject(html, InjectPosition::BodyStart),
            format!("<html><body class=\"x\">{SPRITE}<p>hi</p></body></html>")
        );
    }

    #[test]
    fn test_body_end_uses_last_close_tag() {
        let html = "<body><pre>&lt;/body&gt; </body></pre></BODY>";
        assert_eq!(
            inject(html, InjectPosition::BodyEnd),
            format!("<body><pre>&lt;/body&gt; </body></pre>{SPRITE}</BODY>")
        );
    }

    #[test]
    fn test_case_insensitive_open_tag() {
        let html = "<BODY>x</BODY>";
        assert_eq!(
            inject(html, InjectPosition::BodyStart),
            format!("<BODY>{SPRITE}x</BODY>")
        );
    }

    #[test]
    fn test_similar_tag_names_skipped() {
        let html = "<bodyguard></bodyguard><body>x</body>";
        assert_eq!(
            inject(html, InjectPosition::BodyStart),
            format!("<bodyguard></bodyguard><body>{SPRITE}x</body>")
        );
    }

    #[test]
    fn test_without_body_tag() {
        assert_eq!(inject("<p>x</p>", InjectPosition::BodyStart), format!("{SPRITE}<p>x</p>"));
        assert_eq!(inject("<p>x</p>", InjectPosition::BodyEnd), format!("<p>x</p>{SPRITE}"));
    }

    #[test]
    fn test_injects_exactly_once() {
        let once = inject("<body></body>", InjectPosition::BodyEnd);
        let twice = inject(&once, InjectPosition::BodyEnd);
        assert_eq!(once, twice);
        assert_eq!(twice.matches("<symbol").count(), 1);
    }

    #[test]
    fn test_insert_before_body_close() {
        let out = insert_before_body_close(b"<body>x</body>", b"<script></script>");
        assert_eq!(out, b"<body>x<script></script></body>");
    }
}
