//! Domain managers for server state.

pub mod user;
