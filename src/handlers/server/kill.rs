use crate::error::RegistryError;
use crate::handlers::core::context::{require_origin, unexpected};
use crate::handlers::{Context, HandlerResult, ServerHandler};
use async_trait::async_trait;
use p10_proto::{Command, P10Message};
use tracing::debug;

/// Handler for D (KILL) received from a remote server.
///
/// When a server sends KILL, we must:
/// 1. Remove the target, closing its connection if it is local
/// 2. Propagate the KILL to other linked servers (split-horizon)
///
/// Propagation is done by the link table observing the removal. A KILL for
/// a client we no longer know (typically a collision loser we already
/// removed) is dropped.
pub struct KillHandler;

#[async_trait]
impl ServerHandler for KillHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &P10Message) -> HandlerResult {
        let Command::Kill { target, reason } = &msg.command else {
            return Err(unexpected(msg));
        };
        let origin = require_origin(msg)?;

        match ctx
            .matrix
            .user_manager
            .kill(*target, origin, reason, ctx.peer_name())
        {
            Ok(_) => Ok(()),
            Err(RegistryError::NoSuchClient(_)) => {
                debug!(target = %target, origin = %origin, "KILL for unknown client");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::server::test_support::Harness;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn kill_removes_target() {
        let mut h = Harness::linked().await;
        h.feed("AC N Alice 1 1000 alice a.example +i B]AAAB ACAAA :Alice")
            .await
            .unwrap();
        h.feed("ACAAB D ACAAA :leaf.example.net!oper (spam)")
            .await
            .unwrap();
        assert_eq!(h.matrix.user_manager.client_count(), 0);
        // Never echoed back to the link it came from
        assert!(h.sent().is_empty());
    }

    #[tokio::test]
    async fn kill_is_relayed_to_other_links() {
        let mut h = Harness::linked().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        h.matrix.links.attach("other.example.net", tx);

        h.feed("AC N Alice 1 1000 alice a.example +i B]AAAB ACAAA :Alice")
            .await
            .unwrap();
        h.feed("AC D ACAAA :leaf.example.net (bye)").await.unwrap();

        let relayed: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|m| m.to_string())
            .collect();
        assert_eq!(
            relayed,
            vec![
                "AC N Alice 2 1000 alice a.example +i B]AAAB ACAAA :Alice",
                "AC D ACAAA :leaf.example.net (bye)",
            ]
        );
    }

    #[tokio::test]
    async fn kill_of_local_client_closes_it() {
        let mut h = Harness::linked().await;
        let (tx, mut rx) = mpsc::channel(4);
        let local = h
            .matrix
            .user_manager
            .register_local("Bob", "bob", "hub.example", 1000, tx)
            .unwrap();
        // Local introductions are announced to the peer
        assert_eq!(h.sent().len(), 1);

        h.feed(&format!("ACAAA D {local} :leaf.example.net (out)"))
            .await
            .unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            "ERROR :Closing Link: Bob (Killed (leaf.example.net (out)))"
        );
        assert_eq!(h.matrix.user_manager.local_count(), 0);
    }

    #[tokio::test]
    async fn kill_for_unknown_target_is_ignored() {
        let mut h = Harness::linked().await;
        assert!(h.feed("AC D ACAAQ :gone").await.is_ok());
    }
}
