//! `[inject]` section configuration.
//!
//! Present section enables HTML injection of the sprite.
//!
//! ```toml
//! [inject]
//! position = "body-end"   # body-start | body-end
//! ```

use serde::{Deserialize, Serialize};

/// Where in `<body>` the sprite goes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum InjectPosition {
    BodyStart,
    #[default]
    BodyEnd,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectConfig {
    pub position: InjectPosition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_inject_absent_by_default() {
        assert!(test_parse_config("").inject.is_none());
    }

    #[test]
    fn test_inject_position() {
        let config = test_parse_config("[inject]\nposition = \"body-start\"");
        assert_eq!(config.inject.unwrap().position, InjectPosition::BodyStart);

        let config = test_parse_config("[inject]");
        assert_eq!(config.inject.unwrap().position, InjectPosition::BodyEnd);
    }
}
