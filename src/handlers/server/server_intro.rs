use crate::handlers::core::context::unexpected;
use crate::handlers::{Context, HandlerError, HandlerResult, Peer, ServerHandler};
use crate::state::ServerLink;
use async_trait::async_trait;
use p10_proto::{Command, P10Message, ServerIntro, ServerNumeric};
use tracing::info;

/// Handler for SERVER (link handshake) and S (server behind the peer).
///
/// The handshake form is checked against the configured link block: the
/// peer must introduce itself with the block's numeric and, if the block
/// has a password, must have sent it in `PASS`.
pub struct ServerIntroHandler;

#[async_trait]
impl ServerHandler for ServerIntroHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &P10Message) -> HandlerResult {
        let Command::Server(intro) = &msg.command else {
            return Err(unexpected(msg));
        };

        if intro.numeric == ctx.matrix.server.numeric {
            return Err(HandlerError::Protocol(format!(
                "server {} uses our numeric {}",
                intro.name, intro.numeric
            )));
        }

        match msg.origin.as_deref() {
            None => handshake(ctx, intro),
            Some(origin) => introduce_remote(ctx, origin, intro),
        }
    }
}

fn handshake(ctx: &mut Context<'_>, intro: &ServerIntro) -> HandlerResult {
    if ctx.link.peer.is_some() {
        return Err(HandlerError::Protocol("duplicate SERVER".to_string()));
    }

    let block = ctx
        .config
        .link(&intro.name)
        .ok_or_else(|| HandlerError::AccessDenied(format!("no link block for {}", intro.name)))?;
    if block.numeric != intro.numeric {
        return Err(HandlerError::AccessDenied(format!(
            "{} must use numeric {}, not {}",
            intro.name, block.numeric, intro.numeric
        )));
    }
    if !block.accepts_password(ctx.link.password.as_deref()) {
        return Err(HandlerError::AccessDenied(format!(
            "bad password from {}",
            intro.name
        )));
    }

    ctx.matrix.add_server(ServerLink {
        name: intro.name.clone(),
        numeric: intro.numeric,
        capacity: intro.capacity,
        hops: intro.hops,
        uplink: None,
        link_ts: intro.link_ts,
        burst_complete: false,
    })?;

    ctx.link.password = None;
    ctx.link.peer = Some(Peer {
        name: intro.name.clone(),
        numeric: intro.numeric,
    });
    ctx.matrix.links.attach(&intro.name, ctx.sender.clone());

    info!(
        peer = %intro.name,
        numeric = %intro.numeric,
        protocol = %intro.protocol,
        capacity = intro.capacity,
        "Link established"
    );
    Ok(())
}

fn introduce_remote(ctx: &mut Context<'_>, origin: &str, intro: &ServerIntro) -> HandlerResult {
    let uplink: ServerNumeric = origin
        .parse()
        .map_err(|_| HandlerError::Protocol(format!("S from non-server origin {origin}")))?;
    if ctx.matrix.server(uplink).is_none() {
        return Err(HandlerError::UnknownServer(origin.to_string()));
    }
    ctx.require_behind_peer(uplink)?;

    ctx.matrix.add_server(ServerLink {
        name: intro.name.clone(),
        numeric: intro.numeric,
        capacity: intro.capacity,
        hops: intro.hops,
        uplink: Some(uplink),
        link_ts: intro.link_ts,
        burst_complete: false,
    })?;

    let relay = P10Message::new(
        origin,
        Command::Server(ServerIntro {
            hops: intro.hops.saturating_add(1),
            ..intro.clone()
        }),
    );
    ctx.matrix.links.broadcast(&relay, ctx.peer_name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::handlers::server::test_support::Harness;
    use crate::handlers::HandlerError;

    #[tokio::test]
    async fn handshake_registers_peer() {
        let h = Harness::linked().await;
        let peer = h.link.peer.clone().unwrap();
        assert_eq!(peer.name, "leaf.example.net");
        assert_eq!(peer.numeric.to_string(), "AC");
        assert!(h.link.password.is_none());
        assert_eq!(h.matrix.server(peer.numeric).unwrap().capacity, 63);
        assert_eq!(h.matrix.links.len(), 1);
    }

    #[tokio::test]
    async fn handshake_checks_link_block() {
        let mut h = Harness::new();
        h.feed("PASS :wrong").await.unwrap();
        let err = h
            .feed("SERVER leaf.example.net 1 100 200 J10 ACAA] +h :Leaf")
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::AccessDenied(_)));
        assert!(err.is_fatal());
        assert!(h.link.peer.is_none());

        let mut h = Harness::new();
        h.feed("PASS :secret").await.unwrap();
        let err = h
            .feed("SERVER leaf.example.net 1 100 200 J10 ADAA] +h :Leaf")
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::AccessDenied(_)));

        let mut h = Harness::new();
        let err = h
            .feed("SERVER rogue.example.net 1 100 200 J10 AEAA] :Rogue")
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn our_own_numeric_is_refused() {
        let mut h = Harness::linked().await;
        let err = h
            .feed("AC S impostor.example.net 2 100 200 P10 ABAA] :Impostor")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "protocol_violation");
    }

    #[tokio::test]
    async fn remote_server_needs_known_uplink() {
        let mut h = Harness::linked().await;
        h.feed("AC S far.example.net 2 100 200 P10 ADAA] :Far")
            .await
            .unwrap();
        let far = h.matrix.server("AD".parse().unwrap()).unwrap();
        assert_eq!(far.uplink, Some("AC".parse().unwrap()));

        let err = h
            .feed("AZ S lost.example.net 3 100 200 P10 AEAA] :Lost")
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::UnknownServer(_)));

        let err = h
            .feed("AC S far.example.net 2 100 200 P10 ADAA] :Again")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "server_exists");
    }

    #[tokio::test]
    async fn relay_saturates_hop_count() {
        let mut h = Harness::linked().await;
        let mut other = h.attach_other();
        h.feed("AC S far.example.net 4294967295 100 200 P10 ADAA] :Far")
            .await
            .unwrap();

        assert_eq!(
            other.try_recv().unwrap().to_string(),
            "AC S far.example.net 4294967295 100 200 P10 ADAA] :Far"
        );
        assert_eq!(h.matrix.server("AD".parse().unwrap()).unwrap().hops, u32::MAX);
    }
}
