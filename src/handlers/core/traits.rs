//! Handler trait for commands received over a server link.

use super::context::Context;
use crate::error::HandlerResult;
use async_trait::async_trait;
use p10_proto::P10Message;

/// Handler for one or more P10 tokens.
///
/// # Example
///
/// ```ignore
/// pub struct QuitHandler;
///
/// #[async_trait]
/// impl ServerHandler for QuitHandler {
///     async fn handle(&self, ctx: &mut Context<'_>, msg: &P10Message) -> HandlerResult {
///         let Command::Quit { reason } = &msg.command else {
///             return Err(unexpected(msg));
///         };
///         // ... remove the origin client
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ServerHandler: Send + Sync {
    /// Handle a parsed line from the peer.
    async fn handle(&self, ctx: &mut Context<'_>, msg: &P10Message) -> HandlerResult;
}
