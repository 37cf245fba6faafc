use crate::error::RegistryError;
use crate::handlers::core::context::{require_origin, unexpected};
use crate::handlers::{Context, HandlerError, HandlerResult, ServerHandler};
use crate::state::Client;
use async_trait::async_trait;
use p10_proto::{
    Command, FullNumeric, MessageParseError, NickIntro, P10Message, ServerNumeric, is_from_server,
};
use tracing::debug;

/// Handler for N: client introduction (server origin) or nick change
/// (client origin).
///
/// Collisions are resolved and applied by the `UserManager`; the KILLs it
/// decides are relayed through the link table.
pub struct NickHandler;

#[async_trait]
impl ServerHandler for NickHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &P10Message) -> HandlerResult {
        let origin = require_origin(msg)?;
        match &msg.command {
            Command::Nick(intro) => introduce(ctx, origin, intro),
            Command::NickChange { nick, ts } => change(ctx, origin, nick, *ts),
            _ => Err(unexpected(msg)),
        }
    }
}

fn introduce(ctx: &mut Context<'_>, origin: &str, intro: &NickIntro) -> HandlerResult {
    let numeric = intro.numeric.to_string();
    if !is_from_server(&numeric, origin) {
        return Err(HandlerError::Protocol(format!(
            "{origin} introduced {} with foreign numeric {numeric}",
            intro.nick
        )));
    }

    let server = origin
        .parse::<ServerNumeric>()
        .ok()
        .and_then(|n| ctx.matrix.server(n))
        .ok_or_else(|| HandlerError::UnknownServer(origin.to_string()))?;
    ctx.require_behind_peer(server.numeric)?;
    if intro.numeric.user().value() > server.capacity {
        return Err(HandlerError::Protocol(format!(
            "{numeric} exceeds the capacity of {}",
            server.name
        )));
    }

    let outcome = ctx
        .matrix
        .user_manager
        .introduce(Client::from_intro(intro.clone()), ctx.peer_name())?;

    debug!(
        numeric = %numeric,
        nick = %intro.nick,
        accepted = outcome.accepted(),
        kills = outcome.kills().len(),
        "Client introduced"
    );
    Ok(())
}

fn change(ctx: &mut Context<'_>, origin: &str, nick: &str, ts: u64) -> HandlerResult {
    let numeric: FullNumeric = origin.parse().map_err(MessageParseError::from)?;
    ctx.require_behind_peer(numeric.server())?;
    let ts = if ts == 0 {
        chrono::Utc::now().timestamp().max(0) as u64
    } else {
        ts
    };

    match ctx
        .matrix
        .user_manager
        .change_nick(numeric, nick, ts, ctx.peer_name())
    {
        Ok(_) => Ok(()),
        Err(RegistryError::NoSuchClient(_)) => {
            debug!(numeric = %numeric, nick = %nick, "Nick change for unknown client");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::server::test_support::Harness;
    use crate::handlers::HandlerError;

    #[tokio::test]
    async fn introduction_registers_client() {
        let mut h = Harness::linked().await;
        h.feed("AC N Alice 1 1000 alice a.example +i B]AAAB ACAAA :Alice")
            .await
            .unwrap();
        assert_eq!(
            h.matrix.user_manager.find_nick("alice"),
            Some("ACAAA".parse().unwrap())
        );
        assert!(h.sent().is_empty());
    }

    #[tokio::test]
    async fn collision_kills_are_sent_to_the_peer() {
        let mut h = Harness::linked().await;
        h.feed("AC N Alice 1 1000 alice a.example +i B]AAAB ACAAA :Alice")
            .await
            .unwrap();
        h.feed("AC N alice 1 2000 mallory b.example +i B]AAAC ACAAB :Mallory")
            .await
            .unwrap();

        assert_eq!(
            h.sent(),
            vec!["AB D ACAAB :hub.example.net (older nick overruled)"]
        );
        assert_eq!(
            h.matrix.user_manager.find_nick("ALICE"),
            Some("ACAAA".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn tie_kills_both() {
        let mut h = Harness::linked().await;
        h.feed("AC N Alice 1 1000 alice a.example +i B]AAAB ACAAA :Alice")
            .await
            .unwrap();
        h.feed("AC N Alice 1 1000 bob b.example +i B]AAAC ACAAB :Bob")
            .await
            .unwrap();

        assert_eq!(
            h.sent(),
            vec![
                "AB D ACAAA :hub.example.net (nick collision (both lose))",
                "AB D ACAAB :hub.example.net (nick collision (both lose))",
            ]
        );
        assert_eq!(h.matrix.user_manager.client_count(), 0);
    }

    #[tokio::test]
    async fn foreign_numeric_is_a_protocol_violation() {
        let mut h = Harness::linked().await;
        let err = h
            .feed("AC N Eve 1 1000 eve e.example +i B]AAAB ADAAA :Eve")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "protocol_violation");
        assert_eq!(h.matrix.user_manager.client_count(), 0);
    }

    #[tokio::test]
    async fn reused_numeric_and_capacity_are_checked() {
        let mut h = Harness::linked().await;
        h.feed("AC N Alice 1 1000 alice a.example +i B]AAAB ACAAA :Alice")
            .await
            .unwrap();
        let err = h
            .feed("AC N Bob 1 1000 bob b.example +i B]AAAC ACAAA :Bob")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "numeric_in_use");

        // Leaf advertised capacity 63 (ACAA])
        let err = h
            .feed("AC N Carol 1 1000 carol c.example +i B]AAAD ACABA :Carol")
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Protocol(_)));
    }

    #[tokio::test]
    async fn nick_change_and_unknown_client() {
        let mut h = Harness::linked().await;
        h.feed("AC N Alice 1 1000 alice a.example +i B]AAAB ACAAA :Alice")
            .await
            .unwrap();
        h.feed("ACAAA N Alicia 1500").await.unwrap();
        assert_eq!(
            h.matrix.user_manager.find_nick("alicia"),
            Some("ACAAA".parse().unwrap())
        );
        assert!(h.feed("ACAAZ N Ghost 1500").await.is_ok());
    }

    #[tokio::test]
    async fn relay_saturates_hop_count() {
        let mut h = Harness::linked().await;
        let mut other = h.attach_other();
        h.feed("AC N Alice 4294967295 1000 alice a.example +i B]AAAB ACAAA :Alice")
            .await
            .unwrap();

        let relayed = other.try_recv().unwrap().to_string();
        assert_eq!(
            relayed,
            "AC N Alice 4294967295 1000 alice a.example +i B]AAAB ACAAA :Alice"
        );
        assert!(h.sent().is_empty());
    }

    #[tokio::test]
    async fn peer_cannot_rename_local_clients() {
        let mut h = Harness::linked().await;
        let bob = h.local_client("Bob");
        // Drop the relayed introduction of Bob
        h.sent();
        h.feed("AC N Alice 1 1000 alice a.example +i B]AAAB ACAAA :Alice")
            .await
            .unwrap();

        let err = h.feed("ABAAA N Hijacked 1500").await.unwrap_err();
        assert_eq!(err.error_code(), "protocol_violation");
        let err = h.feed("ABAAA N Alice 500").await.unwrap_err();
        assert_eq!(err.error_code(), "protocol_violation");

        assert_eq!(h.matrix.user_manager.get(bob).unwrap().nick, "Bob");
        assert_eq!(
            h.matrix.user_manager.find_nick("alice"),
            Some("ACAAA".parse().unwrap())
        );
        assert!(h.sent().is_empty());
    }

    #[tokio::test]
    async fn introduction_from_server_behind_another_link_is_rejected() {
        let mut h = Harness::linked().await;
        h.matrix
            .add_server(crate::state::ServerLink {
                name: "other.example.net".into(),
                numeric: "AF".parse().unwrap(),
                capacity: 63,
                hops: 1,
                uplink: None,
                link_ts: 100,
                burst_complete: false,
            })
            .unwrap();

        let err = h
            .feed("AF N Frank 1 1000 frank f.example +i B]AAAB AFAAA :Frank")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "protocol_violation");
        assert_eq!(h.matrix.user_manager.client_count(), 0);
    }
}
