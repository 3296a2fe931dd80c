//! Live reload message protocol.
//!
//! JSON messages pushed from the dev server to browser clients:
//!
//! - `connected`: handshake finished
//! - `sprite`: a rebuild produced a sprite with a new hash

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Connection established
    Connected,

    /// The current sprite changed
    Sprite {
        /// Content hash of the new sprite
        hash: String,
    },
}

impl ReloadMessage {
    pub fn sprite(hash: impl Into<String>) -> Self {
        Self::Sprite { hash: hash.into() }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"connected"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_json() {
        assert_eq!(ReloadMessage::Connected.to_json(), r#"{"type":"connected"}"#);
    }

    #[test]
    fn test_sprite_json() {
        let json = ReloadMessage::sprite("3f2a9c01be77").to_json();
        assert_eq!(json, r#"{"type":"sprite","hash":"3f2a9c01be77"}"#);

        let parsed: ReloadMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ReloadMessage::sprite("3f2a9c01be77"));
    }
}
