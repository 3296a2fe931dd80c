//! Sprite assembly and incremental cache.
//!
//! Architecture:
//! ```text
//! discover (ordered paths)
//!    → SymbolCache::get (single-flight, compiles misses through the optimizer)
//!    → assemble (joins in discovery order, hashes)
//!    → SpriteStore::publish (atomic swap + update broadcast)
//! ```

// Symbol id templates.
pub mod id;
// Ordered icon discovery.
pub mod discover;
// Optimizer backends.
pub mod optimize;
// One icon → one symbol.
pub mod symbol;
// Path-keyed single-flight cache.
pub mod cache;
// Sprite document and content hash.
pub mod assemble;
// Current sprite handle.
pub mod store;
// Facade over the above.
pub mod engine;
pub mod error;


pub use assemble::Sprite;
pub use engine::SpriteEngine;
pub use error::{CompileError, DiscoveryError, WriteError, describe};
pub use store::SpriteUpdate;
