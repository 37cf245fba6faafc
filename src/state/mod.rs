//! Shared network state.
//!
//! - [`Matrix`]: the server's view of the network (servers and clients)
//! - [`UserManager`]: the client table with collision application
//! - [`NumericAllocator`]: user numerics for local clients
//! - [`StateObserver`]: hook used to relay state changes to links

mod client;
pub mod managers;
mod matrix;
mod numeric;
pub mod observer;

pub use client::Client;
pub use managers::user::{NickOutcome, UserManager};
pub use matrix::{Matrix, ServerInfo, ServerLink};
pub use numeric::NumericAllocator;
pub use observer::{KillNotice, StateObserver};
