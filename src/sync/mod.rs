//! Server-to-server relay.
//!
//! Holds the outbound channel of every directly linked peer and relays
//! state changes to them with split-horizon: a change is never echoed back
//! to the link it arrived on.

mod link;
mod observer;

pub use link::{LinkSender, LinkTable};
