//! Request routing for the dev responder.
//!
//! | Path                        | Response                           |
//! |-----------------------------|------------------------------------|
//! | `serve.route`               | current sprite (ETag = hash)       |
//! | `/<output filename>`        | current sprite (ETag = hash)       |
//! | `/__sprite.json`            | `{hash, symbols}`                  |
//! | `/@id/virtual:svg-sprite`   | virtual ES module                  |
//! | anything else               | static file under `serve.root`     |
//!
//! Routing is separate from tiny_http so it can be exercised directly.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::path::{mime, resolve_path, url_path};
use crate::config::{InjectPosition, OutputConfig, SpriteConfig};
use crate::deliver::html::insert_before_body_close;
use crate::deliver::module::{VIRTUAL_ID, resolve_id};
use crate::deliver::{VirtualModule, inject_sprite};
use crate::sprite::{Sprite, SpriteEngine};

/// Path of the JSON sprite summary.
pub const SUMMARY_PATH: &str = "/__sprite.json";

/// URL prefix under which module ids are served.
const MODULE_PREFIX: &str = "/@id/";

/// A response before it is written to the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn not_found() -> Self {
        Self::new(404, mime::PLAIN, "404 Not Found")
    }

    pub fn unavailable() -> Self {
        Self::new(503, mime::PLAIN, "503 Service Unavailable")
    }
}

/// Maps request URLs to replies built from the current sprite.
pub struct Responder {
    engine: Arc<SpriteEngine>,
    module: VirtualModule,
    route: String,
    output: OutputConfig,
    root: Option<PathBuf>,
    inject: Option<InjectPosition>,
    reload_port: Option<u16>,
}

impl Responder {
    pub fn new(config: &SpriteConfig, engine: Arc<SpriteEngine>, reload_port: Option<u16>) -> Self {
        Self {
            engine,
            module: VirtualModule::new(),
            route: config.serve.route.clone(),
            output: config.output.clone(),
            root: config.serve.root.clone(),
            inject: config.inject.as_ref().map(|inject| inject.position),
            reload_port,
        }
    }

    pub fn module(&self) -> &VirtualModule {
        &self.module
    }

    /// Reply for a GET of `url`. `if_none_match` is the raw request header.
    pub fn respond(&self, url: &str, if_none_match: Option<&str>) -> Reply {
        let Some(sprite) = self.engine.current() else {
            return Reply::unavailable();
        };

        let path = url_path(url);
        if path == self.route || self.is_artifact(path, &sprite) {
            return sprite_reply(&sprite, if_none_match);
        }

        if path == SUMMARY_PATH {
            let summary = serde_json::json!({
                "hash": sprite.hash,
                "symbols": sprite.symbols,
            });
            return Reply::new(200, mime::JSON, summary.to_string())
                .with_header("Cache-Control", "no-cache");
        }

        if let Some(id) = path.strip_prefix(MODULE_PREFIX) {
            return match resolve_id(id).and_then(|resolved| self.module.load(resolved, &sprite)) {
                Some(source) => Reply::new(200, mime::JAVASCRIPT, source.as_bytes())
                    .with_header("Cache-Control", "no-cache"),
                None => Reply::not_found(),
            };
        }

        self.static_file(url, &sprite)
    }

    fn is_artifact(&self, path: &str, sprite: &Sprite) -> bool {
        path.strip_prefix('/') == Some(self.output.resolve_filename(&sprite.hash).as_str())
    }

    fn static_file(&self, url: &str, sprite: &Sprite) -> Reply {
        let Some(path) = self.root.as_deref().and_then(|root| resolve_path(url, root)) else {
            return Reply::not_found();
        };
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) => {
                crate::debug!("serve"; "failed to read {}: {}", path.display(), e);
                return Reply::not_found();
            }
        };

        let content_type = mime::from_path(&path);
        if content_type != mime::HTML {
            return Reply::new(200, content_type, body);
        }
        Reply::new(200, content_type, self.decorate_html(body, sprite))
    }

    /// Add the sprite and the live reload client to an HTML page.
    fn decorate_html(&self, body: Vec<u8>, sprite: &Sprite) -> Vec<u8> {
        let body = match self.inject {
            Some(position) => inject_sprite(&body, &sprite.content, position),
            None => body,
        };
        match self.reload_port {
            Some(port) => insert_before_body_close(&body, crate::reload::client_script(port).as_bytes()),
            None => body,
        }
    }
}

fn sprite_reply(sprite: &Sprite, if_none_match: Option<&str>) -> Reply {
    let etag = format!("\"{}\"", sprite.hash);
    let reply = if if_none_match.is_some_and(|header| etag_matches(header, &sprite.hash)) {
        Reply::new(304, mime::SVG, Vec::new())
    } else {
        Reply::new(200, mime::SVG, sprite.content.as_bytes())
    };
    reply
        .with_header("ETag", etag)
        .with_header("Cache-Control", "no-cache")
}

/// `If-None-Match` may list several (possibly weak) tags, or `*`.
fn etag_matches(header: &str, hash: &str) -> bool {
    header.split(',').map(str::trim).any(|tag| {
        tag == "*" || tag.trim_start_matches("W/").trim_matches('"') == hash
    })
}

/// Import path of the virtual module on this server.
pub fn module_url() -> String {
    format!("{MODULE_PREFIX}{VIRTUAL_ID}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InjectConfig, normalize_path};
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        responder: Responder,
    }

    async fn fixture(inject: Option<InjectPosition>, reload_port: Option<u16>) -> Fixture {
        let temp = TempDir::new().unwrap();
        let base = normalize_path(temp.path());
        let icons = base.join("icons");
        let public = base.join("public");
        fs::create_dir_all(&icons).unwrap();
        fs::create_dir_all(&public).unwrap();
        fs::write(icons.join("check.svg"), "<svg viewBox=\"0 0 24 24\"><path d=\"M1 1\"/></svg>")
            .unwrap();
        fs::write(
            public.join("index.html"),
            "<html><body><main></main></body></html>",
        )
        .unwrap();
        fs::write(public.join("app.css"), "body{}").unwrap();

        let mut config = SpriteConfig::default();
        config.sprite.dirs = vec![icons];
        config.serve.root = Some(public);
        config.inject = inject.map(|position| InjectConfig { position });

        let engine = Arc::new(SpriteEngine::new(&config.sprite, &config.optimize).unwrap());
        engine.build().await.unwrap();

        Fixture {
            _temp: temp,
            responder: Responder::new(&config, engine, reload_port),
        }
    }

    fn header<'a>(reply: &'a Reply, name: &str) -> Option<&'a str> {
        reply
            .headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_unavailable_before_first_sprite() {
        let config = SpriteConfig::default();
        let engine = Arc::new(SpriteEngine::new(&config.sprite, &config.optimize).unwrap());
        let responder = Responder::new(&config, engine, None);
        assert_eq!(responder.respond("/__sprite.svg", None).status, 503);
    }

    #[tokio::test]
    async fn test_sprite_route_and_etag() {
        let f = fixture(None, None).await;
        let reply = f.responder.respond("/__sprite.svg?t=1", None);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, mime::SVG);
        assert!(String::from_utf8(reply.body.clone()).unwrap().contains("id=\"icons-check\""));
        assert_eq!(header(&reply, "Cache-Control"), Some("no-cache"));

        let etag = header(&reply, "ETag").unwrap().to_string();
        let cached = f.responder.respond("/__sprite.svg", Some(&etag));
        assert_eq!(cached.status, 304);
        assert!(cached.body.is_empty());

        let stale = f.responder.respond("/__sprite.svg", Some("\"000000000000\""));
        assert_eq!(stale.status, 200);
    }

    #[tokio::test]
    async fn test_artifact_filename_route() {
        let f = fixture(None, None).await;
        let hash = f.responder.engine.current().unwrap().hash.clone();
        let reply = f.responder.respond(&format!("/sprite.{hash}.svg"), None);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, mime::SVG);
        assert_eq!(f.responder.respond("/sprite.000000000000.svg", None).status, 404);
    }

    #[tokio::test]
    async fn test_summary_json() {
        let f = fixture(None, None).await;
        let reply = f.responder.respond(SUMMARY_PATH, None);
        let value: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(value["symbols"], serde_json::json!(["icons-check"]));
        assert_eq!(value["hash"].as_str().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_virtual_module() {
        let f = fixture(None, None).await;
        let reply = f.responder.respond(&module_url(), None);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, mime::JAVASCRIPT);
        let source = String::from_utf8(reply.body).unwrap();
        assert!(source.contains("export const symbols = [\"icons-check\"]"));
        assert!(f.responder.module().is_cached());

        assert_eq!(f.responder.respond("/@id/virtual:other", None).status, 404);
    }

    #[tokio::test]
    async fn test_html_gets_sprite_and_client() {
        let f = fixture(Some(InjectPosition::BodyStart), Some(35729)).await;
        let reply = f.responder.respond("/", None);
        assert_eq!(reply.status, 200);
        let html = String::from_utf8(reply.body).unwrap();

        let sprite = f.responder.engine.current().unwrap();
        assert!(html.starts_with(&format!("<html><body>{}<main>", sprite.content)));
        assert!(html.contains(":35729"));
        assert!(html.ends_with("</script></body></html>"));
        assert_eq!(html.matches(&sprite.content).count(), 1);
    }

    #[tokio::test]
    async fn test_html_untouched_without_inject() {
        let f = fixture(None, None).await;
        let reply = f.responder.respond("/index.html", None);
        assert_eq!(reply.body, b"<html><body><main></main></body></html>");
    }

    #[tokio::test]
    async fn test_static_and_missing() {
        let f = fixture(Some(InjectPosition::BodyEnd), None).await;
        let css = f.responder.respond("/app.css", None);
        assert_eq!(css.content_type, mime::CSS);
        assert_eq!(css.body, b"body{}");
        assert_eq!(f.responder.respond("/nope.html", None).status, 404);
    }

    #[test]
    fn test_etag_matches() {
        assert!(etag_matches("\"abc\"", "abc"));
        assert!(etag_matches("W/\"abc\"", "abc"));
        assert!(etag_matches("\"x\", \"abc\"", "abc"));
        assert!(etag_matches("*", "abc"));
        assert!(!etag_matches("\"abd\"", "abc"));
    }
}
