//! P10 command handlers.
//!
//! This module contains the handler trait and command registry for
//! dispatching lines received from a linked server.
//!
//! Handlers receive a typed [`p10_proto::P10Message`]; tokenization happens
//! once in [`Registry::dispatch`] over the borrowed line.

mod core;
mod server;

pub use self::core::{Context, LinkState, Peer, Registry, ServerHandler};
pub use crate::error::{HandlerError, HandlerResult};
pub use server::{
    EndOfBurstHandler, KillHandler, NickHandler, PassHandler, QuitHandler, ServerIntroHandler,
    SquitHandler,
};
