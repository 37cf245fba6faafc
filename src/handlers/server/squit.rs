use crate::handlers::core::context::unexpected;
use crate::handlers::{Context, HandlerError, HandlerResult, ServerHandler};
use async_trait::async_trait;
use p10_proto::{Command, P10Message};
use tracing::{debug, info};

/// Handler for SQ: a server left the network.
///
/// Removes the server, every server behind it and all of their clients. An
/// `SQ` naming this server means the peer is dropping the link.
pub struct SquitHandler;

#[async_trait]
impl ServerHandler for SquitHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &P10Message) -> HandlerResult {
        let Command::Squit { server, ts, reason } = &msg.command else {
            return Err(unexpected(msg));
        };

        let numeric = if server.eq_ignore_ascii_case(&ctx.matrix.server.name) {
            ctx.peer()?.numeric
        } else {
            ctx.matrix
                .find_server(server)
                .ok_or_else(|| HandlerError::UnknownServer(server.clone()))?
        };

        // A non-zero timestamp must match the link being split
        if *ts != 0
            && let Some(link) = ctx.matrix.server(numeric)
            && link.link_ts != *ts
        {
            debug!(server = %server, ts, link_ts = link.link_ts, "Ignoring stale SQ");
            return Ok(());
        }

        let (removed, clients) = ctx.matrix.remove_server(numeric);
        info!(
            server = %server,
            servers = removed.len(),
            clients,
            reason = %reason,
            "Server split"
        );

        let lost_peer = ctx
            .link
            .peer
            .as_ref()
            .is_some_and(|p| removed.iter().any(|s| s.numeric == p.numeric));
        if lost_peer {
            if let Some(peer) = ctx.link.peer.take() {
                ctx.matrix.links.detach(&peer.name);
            }
        } else {
            ctx.matrix.links.broadcast(msg, ctx.peer_name());
        }
        Ok(())
    }
}
