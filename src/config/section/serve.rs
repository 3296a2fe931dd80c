//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5280                 # HTTP port number
//! route = "/__sprite.svg"     # URL of the current sprite
//! root = "public"             # Optional static directory, HTML gets the sprite injected
//! watch = true                # Rebuild on icon changes
//! debounce_ms = 100           # Quiescence window for change bursts
//! reload_port = 35729         # Live reload WebSocket port
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Route of the current sprite.
    pub route: String,

    /// Static directory served alongside the sprite.
    pub root: Option<PathBuf>,

    /// Enable file watcher for live reload.
    pub watch: bool,

    /// Quiescence window in milliseconds. `0` rebuilds on the first event.
    pub debounce_ms: u64,

    /// Live reload WebSocket port.
    pub reload_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5280,
            route: "/__sprite.svg".to_string(),
            root: None,
            watch: true,
            debounce_ms: 100,
            reload_port: 35729,
        }
    }
}

impl ServeConfig {
    const ROUTE: FieldPath = FieldPath::new("serve.route");

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.route.starts_with('/') {
            diag.error_with_hint(
                Self::ROUTE,
                format!("`{}` is not an absolute URL path", self.route),
                format!("use `/{}`", self.route.trim_start_matches('/')),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
    use std::time::Duration;

    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config =
            test_parse_config("[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nwatch = false");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert!(!config.serve.watch);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 5280);
        assert_eq!(config.serve.route, "/__sprite.svg");
        assert!(config.serve.root.is_none());
        assert!(config.serve.watch);
        assert_eq!(config.serve.debounce(), Duration::from_millis(100));
        assert_eq!(config.serve.reload_port, 35729);
    }

    #[test]
    fn test_serve_config_ipv6() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_serve_config_zero_debounce() {
        let config = test_parse_config("[serve]\ndebounce_ms = 0");
        assert_eq!(config.serve.debounce(), Duration::ZERO);
    }

    #[test]
    fn test_serve_route_must_be_absolute() {
        let serve = ServeConfig {
            route: "sprite.svg".into(),
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        serve.validate(&mut diag);
        assert!(diag.has_errors());
        assert_eq!(diag.errors()[0].hint.as_deref(), Some("use `/sprite.svg`"));
    }
}
