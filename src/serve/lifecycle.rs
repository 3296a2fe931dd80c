//! Server lifecycle management.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::{Receiver, TryRecvError};
use tiny_http::Server;
use tokio::sync::broadcast::{self, error::RecvError};

use super::route::Responder;
use crate::config::OutputConfig;
use crate::sprite::{SpriteEngine, SpriteUpdate, describe};
use crate::watch::{WatchDriver, watch_roots};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Interval between shutdown signal checks.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match Server::http(SocketAddr::new(interface, port)) {
            Ok(server) => {
                // Port 0 binds an ephemeral port
                let addr = server
                    .server_addr()
                    .to_ip()
                    .unwrap_or_else(|| SocketAddr::new(interface, port));
                if offset > 0 {
                    crate::log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Initial build, then (with `watch`) rebuilds until the shutdown signal.
///
/// The watcher is started before the initial build so that edits made while
/// it runs are not lost. Fails on a watcher or discovery error at startup.
pub async fn run_session(
    engine: Arc<SpriteEngine>,
    watch: Option<Duration>,
    shutdown: Receiver<()>,
) -> Result<()> {
    let watcher = match watch {
        Some(debounce) => Some((watch_roots(engine.roots())?, debounce)),
        None => None,
    };

    let update = engine
        .build()
        .await
        .map_err(|e| anyhow::anyhow!(describe(&e)))?;
    crate::log!(
        "sprite";
        "{} ({} symbols)",
        update.sprite.hash,
        update.sprite.symbols.len()
    );

    let Some(((watcher, events), debounce)) = watcher else {
        return Ok(());
    };
    for root in engine.roots() {
        crate::log!("watch"; "{}", root.display());
    }

    let driver = tokio::spawn(WatchDriver::new(engine, events, debounce).run());
    wait_for_signal(shutdown).await;

    // Closing the event channel stops the driver after any in-flight rebuild
    drop(watcher);
    let _ = driver.await;
    Ok(())
}

/// Keep delivery adapters in step with the current sprite.
///
/// Every update invalidates the virtual module and writes the artifact;
/// the write is idempotent, so a failed write is retried by the next build.
pub async fn track_updates(
    mut updates: broadcast::Receiver<SpriteUpdate>,
    responder: Arc<Responder>,
    output: OutputConfig,
) {
    loop {
        match updates.recv().await {
            Ok(update) => {
                responder.module().invalidate();
                crate::deliver::persist(&output, &update.sprite);
            }
            Err(RecvError::Lagged(n)) => crate::debug!("serve"; "skipped {} sprite updates", n),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn wait_for_signal(shutdown: Receiver<()>) {
    loop {
        match shutdown.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => tokio::time::sleep(SHUTDOWN_POLL).await,
        }
    }
}
