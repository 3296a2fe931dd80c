//! WebSocket listener for live reload.
//!
//! Accepted TCP streams are handed to the [`ReloadHub`](super::ReloadHub)
//! through a channel; the handshake happens there.

use std::net::{IpAddr, TcpListener, TcpStream};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Start the listener on `base_port` (or the next free port) and return the
/// port actually bound.
pub fn start_ws_server(
    interface: IpAddr,
    base_port: u16,
    tx: mpsc::Sender<TcpStream>,
) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        loop {
            if crate::core::is_shutdown() {
                break;
            }
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "client connected: {}", addr);

                    // Handshake and sends are blocking
                    let _ = stream.set_nonblocking(false);

                    if tx.blocking_send(stream).is_err() {
                        crate::debug!("reload"; "hub stopped, closing listener");
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind live reload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn test_bind_skips_taken_port() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        match try_bind_port(LOCALHOST, port, 1) {
            Err(e) => assert!(e.to_string().contains("1 attempts")),
            Ok(_) => panic!("port {port} should be taken"),
        }
    }

    #[test]
    fn test_bind_any_port() {
        let (_listener, port) = try_bind_port(LOCALHOST, 0, 1).unwrap();
        assert_ne!(port, 0);
    }
}
