//! Configuration loading and management.
//!
//! - [`types`]: Core config struct definitions (Config, ServerConfig)
//! - [`links`]: Server-to-server link configuration (LinkBlock)
//! - [`validation`]: Startup checks that serde cannot express

mod links;
mod types;
mod validation;

pub use links::LinkBlock;
pub use types::{Config, ConfigError, ServerConfig};
pub use validation::{ValidationError, validate};
