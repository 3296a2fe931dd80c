//! Configuration utility types.
//!
//! | Module  | Purpose                     |
//! |---------|-----------------------------|
//! | `error` | Configuration error types   |
//! | `field` | Dotted field paths          |

mod error;
mod field;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use field::FieldPath;
