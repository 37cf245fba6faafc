use crate::handlers::core::context::{require_origin, unexpected};
use crate::handlers::{Context, HandlerResult, ServerHandler};
use async_trait::async_trait;
use p10_proto::{Command, MessageParseError, P10Message, ServerNumeric};
use tracing::info;

/// Handler for EB (end of burst) and EA (end of burst acknowledgement).
///
/// The peer's own `EB` is answered with `EA`; markers from servers behind
/// the peer are relayed.
pub struct EndOfBurstHandler;

#[async_trait]
impl ServerHandler for EndOfBurstHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &P10Message) -> HandlerResult {
        let origin: ServerNumeric = require_origin(msg)?
            .parse()
            .map_err(MessageParseError::from)?;
        let from_peer = ctx.peer()?.numeric == origin;

        match &msg.command {
            Command::EndOfBurst => {
                ctx.matrix.set_burst_complete(origin);
                if from_peer {
                    ctx.link.burst_received = true;
                    info!(
                        peer = ctx.peer_name().unwrap_or_default(),
                        lines = ctx.link.lines,
                        servers = ctx.matrix.servers.len(),
                        clients = ctx.matrix.user_manager.client_count(),
                        "Burst complete"
                    );
                    ctx.send(P10Message::new(
                        ctx.matrix.server.numeric.to_string(),
                        Command::EndOfBurstAck,
                    ))?;
                }
            }
            Command::EndOfBurstAck => {
                if from_peer {
                    ctx.link.burst_acked = true;
                    info!(peer = ctx.peer_name().unwrap_or_default(), "Burst acknowledged");
                }
            }
            _ => return Err(unexpected(msg)),
        }

        if !from_peer {
            ctx.matrix.links.broadcast(msg, ctx.peer_name());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::server::test_support::Harness;

    #[tokio::test]
    async fn peer_burst_is_acknowledged() {
        let mut h = Harness::linked().await;
        h.feed("AC EB").await.unwrap();
        assert!(h.link.burst_received);
        assert_eq!(h.sent(), vec!["AB EA"]);
        assert!(h.matrix.server("AC".parse().unwrap()).unwrap().burst_complete);

        h.feed("AC EA").await.unwrap();
        assert!(h.link.burst_acked);
        assert!(h.sent().is_empty());
    }

    #[tokio::test]
    async fn remote_burst_marker_is_not_answered() {
        let mut h = Harness::linked().await;
        h.feed("AC S far.example.net 2 100 300 P10 ADAA] :Far")
            .await
            .unwrap();
        h.feed("AD EB").await.unwrap();
        assert!(!h.link.burst_received);
        assert!(h.sent().is_empty());
        assert!(h.matrix.server("AD".parse().unwrap()).unwrap().burst_complete);
    }
}
