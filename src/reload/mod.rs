//! Live reload over WebSocket.
//!
//! ```text
//! listener thread ──TcpStream──► ReloadHub ◄──SpriteUpdate── SpriteStore
//!                                    │
//!                                    └── {"type":"sprite"} ──► browsers
//! ```
//!
//! - `message` - JSON message types
//! - `server` - TCP listener with port retry

pub mod message;
pub mod server;

pub use message::ReloadMessage;
pub use server::start_ws_server;

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use crate::sprite::SpriteUpdate;

/// Browser script that reloads the page when the sprite changes.
const CLIENT_JS: &str = include_str!("client.js");

/// Render the client `<script>` tag for a reload server on `port`.
pub fn client_script(port: u16) -> String {
    format!(
        "<script>{}</script>",
        CLIENT_JS.replace("__WS_PORT__", &port.to_string())
    )
}

/// Connected live reload clients.
#[derive(Clone, Default)]
pub struct ReloadHub {
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
}

impl ReloadHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Accept new clients and forward sprite changes until both channels close.
    pub async fn run(
        self,
        mut streams: mpsc::Receiver<TcpStream>,
        mut updates: broadcast::Receiver<SpriteUpdate>,
    ) {
        let mut accepting = true;
        loop {
            tokio::select! {
                stream = streams.recv(), if accepting => match stream {
                    Some(stream) => {
                        let hub = self.clone();
                        // The handshake blocks on the socket
                        tokio::task::spawn_blocking(move || hub.add_client(stream));
                    }
                    None => accepting = false,
                },
                update = updates.recv() => match update {
                    Ok(update) if update.changed => {
                        self.broadcast(&ReloadMessage::sprite(update.sprite.hash.clone()));
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(n)) => {
                        crate::debug!("reload"; "skipped {} sprite updates", n);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }

    fn add_client(&self, stream: TcpStream) {
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let connected = ReloadMessage::Connected.to_json();
                if let Err(e) = ws.send(Message::Text(connected.into())) {
                    crate::log!("reload"; "failed to send connected message: {}", e);
                    return;
                }
                let mut clients = self.clients.lock();
                clients.push(ws);
                crate::debug!("reload"; "client connected (total: {})", clients.len());
            }
            Err(e) => crate::log!("reload"; "handshake failed: {}", e),
        }
    }

    /// Send to every client, dropping the ones that went away.
    pub fn broadcast(&self, msg: &ReloadMessage) {
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            crate::debug!("reload"; "no clients connected");
            return;
        }

        let text = Message::Text(msg.to_json().into());
        clients.retain_mut(|ws| match ws.send(text.clone()) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("reload"; "broadcast to {} clients", clients.len());
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use super::*;
    use crate::sprite::assemble::Sprite;
    use crate::sprite::store::SpriteStore;

    fn read_text(ws: &mut WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>>) -> String {
        match ws.read().unwrap() {
            Message::Text(text) => text.as_str().to_owned(),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_client_script_has_port() {
        let script = client_script(35729);
        assert!(script.starts_with("<script>"));
        assert!(script.contains(":35729"));
        assert!(!script.contains("__WS_PORT__"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_hub_pushes_changed_sprite() {
        let store = SpriteStore::new();
        let hub = ReloadHub::new();
        let (tx, rx) = mpsc::channel(4);
        let port = start_ws_server(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, tx).unwrap();
        tokio::spawn(hub.clone().run(rx, store.subscribe()));

        let mut ws = tokio::task::spawn_blocking(move || {
            let (mut ws, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
            assert_eq!(read_text(&mut ws), r#"{"type":"connected"}"#);
            ws
        })
        .await
        .unwrap();

        // Registration follows the handshake
        for _ in 0..50 {
            if hub.client_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(hub.client_count(), 1);

        let sprite = Sprite::render(&[], &Default::default());
        let hash = sprite.hash.clone();
        store.publish(sprite);

        let text = tokio::task::spawn_blocking(move || read_text(&mut ws))
            .await
            .unwrap();
        assert_eq!(text, ReloadMessage::sprite(hash).to_json());
    }
}
