use crate::handlers::core::context::unexpected;
use crate::handlers::{Context, HandlerError, HandlerResult, ServerHandler};
use async_trait::async_trait;
use p10_proto::{Command, P10Message};
use tracing::debug;

/// Handler for PASS, the first line of a link handshake.
///
/// The password is only checked once `SERVER` names the link block.
pub struct PassHandler;

#[async_trait]
impl ServerHandler for PassHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &P10Message) -> HandlerResult {
        let Command::Pass { password } = &msg.command else {
            return Err(unexpected(msg));
        };

        if ctx.link.peer.is_some() {
            return Err(HandlerError::Protocol(
                "PASS after link registration".to_string(),
            ));
        }

        debug!("Link password received");
        ctx.link.password = Some(password.clone());
        Ok(())
    }
}
