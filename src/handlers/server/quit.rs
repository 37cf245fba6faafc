use crate::error::RegistryError;
use crate::handlers::core::context::{require_origin, unexpected};
use crate::handlers::{Context, HandlerResult, ServerHandler};
use async_trait::async_trait;
use p10_proto::{Command, FullNumeric, MessageParseError, P10Message};
use tracing::debug;

/// Handler for Q: a remote client quit.
pub struct QuitHandler;

#[async_trait]
impl ServerHandler for QuitHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &P10Message) -> HandlerResult {
        let Command::Quit { reason } = &msg.command else {
            return Err(unexpected(msg));
        };
        let numeric: FullNumeric = require_origin(msg)?
            .parse()
            .map_err(MessageParseError::from)?;
        ctx.require_behind_peer(numeric.server())?;

        match ctx
            .matrix
            .user_manager
            .quit(numeric, reason, ctx.peer_name())
        {
            Ok(_) => Ok(()),
            Err(RegistryError::NoSuchClient(_)) => {
                debug!(numeric = %numeric, "QUIT for unknown client");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::server::test_support::Harness;

    #[tokio::test]
    async fn quit_frees_the_nick() {
        let mut h = Harness::linked().await;
        h.feed("AC N Alice 1 1000 alice a.example +i B]AAAB ACAAA :Alice")
            .await
            .unwrap();
        h.feed("ACAAA Q :Leaving").await.unwrap();
        assert_eq!(h.matrix.user_manager.find_nick("alice"), None);

        // The client might already be gone after a collision
        assert!(h.feed("ACAAA Q :Leaving").await.is_ok());
    }

    #[tokio::test]
    async fn quit_from_server_origin_is_rejected() {
        let mut h = Harness::linked().await;
        let err = h.feed("AC Q :what").await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_numeric");
    }

    #[tokio::test]
    async fn peer_cannot_quit_local_clients() {
        let mut h = Harness::linked().await;
        let bob = h.local_client("Bob");
        // Drop the relayed introduction of Bob
        h.sent();

        let err = h.feed("ABAAA Q :spoofed").await.unwrap_err();
        assert_eq!(err.error_code(), "protocol_violation");
        assert!(h.matrix.user_manager.get(bob).is_some());
        assert!(h.sent().is_empty());
    }
}
