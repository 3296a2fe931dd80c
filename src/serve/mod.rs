//! Development server with live reload support.
//!
//! The request loop runs on the calling thread; the initial build, the
//! watch driver and the live reload hub run on a tokio runtime.

mod lifecycle;
mod path;
mod response;
mod route;

pub use route::{Reply, Responder};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel;
use tiny_http::{Request, Server};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::config::SpriteConfig;
use crate::reload::{ReloadHub, start_ws_server};
use crate::sprite::SpriteEngine;
use crate::{debug, log};

/// Request handler threads.
const REQUEST_THREADS: usize = 4;

/// How long shutdown waits for an in-flight rebuild.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server without starting the request loop.
///
/// Requests are answered with `503` until the first sprite exists.
pub fn bind_server(config: &SpriteConfig) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}{}", addr, config.serve.route);
    debug!("serve"; "module http://{}{}", addr, route::module_url());

    Ok(BoundServer {
        server,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Receiver of the Ctrl+C signal.
    pub fn shutdown_signal(&self) -> channel::Receiver<()> {
        self.shutdown_rx.clone()
    }

    /// Start the request loop (blocking until the server is unblocked).
    pub fn run(&self, responder: &Arc<Responder>) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(REQUEST_THREADS)
            .build()?;

        for request in self.server.incoming_requests() {
            let responder = Arc::clone(responder);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &responder) {
                    log!("serve"; "request error: {e}");
                }
            });
        }
        Ok(())
    }
}

/// Run `iconsprite serve` until Ctrl+C or a fatal startup error.
pub fn serve(config: &SpriteConfig) -> Result<()> {
    let engine = Arc::new(SpriteEngine::new(&config.sprite, &config.optimize)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let bound = bind_server(config)?;
    let reload_port = if config.serve.watch {
        Some(start_reload(&runtime, config, &engine)?)
    } else {
        None
    };

    let responder = Arc::new(Responder::new(config, Arc::clone(&engine), reload_port));
    runtime.spawn(lifecycle::track_updates(
        engine.subscribe(),
        Arc::clone(&responder),
        config.output.clone(),
    ));

    let watch = config.serve.watch.then(|| config.serve.debounce());
    let shutdown = bound.shutdown_signal();
    let session = runtime.spawn(async move {
        let result = lifecycle::run_session(engine, watch, shutdown).await;
        if result.is_err() {
            // Nothing to serve: stop the request loop
            crate::core::request_shutdown();
        }
        result
    });

    bound.run(&responder)?;

    let finished = runtime.block_on(async { tokio::time::timeout(SHUTDOWN_GRACE, session).await });
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    match finished {
        Ok(joined) => joined?,
        Err(_) => {
            debug!("serve"; "rebuild still running at shutdown");
            Ok(())
        }
    }
}

fn start_reload(runtime: &Runtime, config: &SpriteConfig, engine: &SpriteEngine) -> Result<u16> {
    let (tx, rx) = mpsc::channel(16);
    let port = start_ws_server(config.serve.interface, config.serve.reload_port, tx)?;
    runtime.spawn(ReloadHub::new().run(rx, engine.subscribe()));
    debug!("reload"; "ws://{}:{}", config.serve.interface, port);
    Ok(port)
}

/// Handle a single HTTP request
fn handle_request(request: Request, responder: &Responder) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::send(request, Reply::unavailable());
    }
    if !response::is_read_request(&request) {
        return response::respond_method_not_allowed(request);
    }

    let if_none_match = response::if_none_match(&request);
    let reply = responder.respond(request.url(), if_none_match.as_deref());
    debug!("serve"; "{} {}", reply.status, request.url());
    response::send(request, reply)
}
