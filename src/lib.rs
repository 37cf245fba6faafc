//! # p10d
//!
//! Network view for a P10 server link: numeric allocation, server and client
//! tracking, and deterministic nick collision handling.
//!
//! - [`config`]: TOML configuration and startup validation
//! - [`state`]: the [`state::Matrix`] and the client table
//! - [`handlers`]: P10 token handlers and the dispatch [`handlers::Registry`]
//! - [`sync`]: outbound link table and split-horizon relay
//! - [`metrics`], [`telemetry`]: Prometheus metrics and tracing helpers

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;
pub mod sync;
pub mod telemetry;
