//! # Contentflow Config
//!
//! TOML configuration with environment-variable expansion.

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
