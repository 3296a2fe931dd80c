//! Configuration section definitions.
//!
//! Each module corresponds to a section in `sprite.toml`:
//!
//! | Module     | TOML Section   | Purpose                            |
//! |------------|----------------|------------------------------------|
//! | `sprite`   | `[sprite]`     | Icon roots, symbol ids, root attrs |
//! | `optimize` | `[optimize]`   | Optimizer backend and flags        |
//! | `output`   | `[output]`     | On-disk artifact                   |
//! | `inject`   | `[inject]`     | HTML injection                     |
//! | `serve`    | `[serve]`      | Development server                 |

mod inject;
mod optimize;
pub mod output;
mod serve;
mod sprite;

pub use inject::{InjectConfig, InjectPosition};
pub use optimize::{OptimizeConfig, OptimizerBackend};
pub use output::OutputConfig;
pub use serve::ServeConfig;
pub use sprite::SpriteSection;
