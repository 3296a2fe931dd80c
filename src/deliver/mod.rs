//! Delivery adapters: consumers of the current sprite.
//!
//! | Module   | Purpose                                      |
//! |----------|----------------------------------------------|
//! | `write`  | Hash-named artifact on disk, idempotent      |
//! | `html`   | Sprite injection at body start or end        |
//! | `module` | `virtual:svg-sprite` ES module source        |

pub mod html;
pub mod module;
pub mod write;

pub use html::inject_sprite;
pub use module::VirtualModule;
pub use write::{WriteOutcome, write_sprite};

use crate::config::OutputConfig;
use crate::sprite::{Sprite, describe};

/// Persist `sprite` and log the outcome. Failures leave the in-memory sprite
/// untouched; the next build writes again.
pub fn persist(output: &OutputConfig, sprite: &Sprite) -> Option<WriteOutcome> {
    if !output.enable {
        return None;
    }
    match write_sprite(output, sprite) {
        Ok(outcome) => {
            match &outcome {
                WriteOutcome::Written(path) => crate::debug!("write"; "{}", path.display()),
                WriteOutcome::Unchanged(path) => {
                    crate::debug!("write"; "unchanged {}", path.display())
                }
            }
            Some(outcome)
        }
        Err(e) => {
            crate::log!("error"; "{}", describe(&e));
            None
        }
    }
}
