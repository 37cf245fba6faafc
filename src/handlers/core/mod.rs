//! Core handler infrastructure.
//!
//! This module contains the fundamental types for the command handler
//! system: the per-link context, the handler trait and the registry.

pub mod context;
pub mod registry;
pub mod traits;

pub use context::{Context, LinkState, Peer};
pub use registry::Registry;
pub use traits::ServerHandler;
