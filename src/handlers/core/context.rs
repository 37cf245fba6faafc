//! Command handler context and per-link state.
//!
//! Defines the `Context<'a>` struct passed to all handlers.

use crate::config::Config;
use crate::error::{HandlerError, HandlerResult};
use crate::state::Matrix;
use crate::sync::LinkSender;
use p10_proto::{MessageParseError, P10Message, ServerNumeric};
use std::sync::Arc;

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// Shared network state.
    pub matrix: &'a Arc<Matrix>,
    /// Daemon configuration (link blocks).
    pub config: &'a Config,
    /// State of the link the line arrived on.
    pub link: &'a mut LinkState,
    /// Outbound queue of that link.
    pub sender: &'a LinkSender,
}

impl<'a> Context<'a> {
    /// Create a new context.
    pub fn new(
        matrix: &'a Arc<Matrix>,
        config: &'a Config,
        link: &'a mut LinkState,
        sender: &'a LinkSender,
    ) -> Self {
        Self {
            matrix,
            config,
            link,
            sender,
        }
    }

    /// The peer on the other end, once `SERVER` has been accepted.
    pub fn peer(&self) -> Result<&Peer, HandlerError> {
        self.link
            .peer
            .as_ref()
            .ok_or_else(|| HandlerError::NotLinked("(any)".to_string()))
    }

    /// Name of the peer, used as the `source` of state changes.
    #[inline]
    pub fn peer_name(&self) -> Option<&str> {
        self.link.peer.as_ref().map(|p| p.name.as_str())
    }

    /// Fail unless `server` sits behind the peer this line arrived from.
    ///
    /// A peer may only speak for servers on its side of the link, never for
    /// us or for servers reached through another link.
    pub fn require_behind_peer(&self, server: ServerNumeric) -> HandlerResult {
        let peer = self.peer()?;
        if self.matrix.is_behind(server, peer.numeric) {
            Ok(())
        } else {
            Err(HandlerError::Protocol(format!(
                "{} spoke for {server}, which is not behind it",
                peer.name
            )))
        }
    }

    /// Queue a line back to the peer.
    pub fn send(&self, msg: P10Message) -> HandlerResult {
        self.sender.send(msg)?;
        Ok(())
    }
}

/// A directly linked server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub name: String,
    pub numeric: ServerNumeric,
}

/// State tracked for one server link.
#[derive(Debug, Default)]
pub struct LinkState {
    /// Password received via `PASS`, cleared once the link is accepted.
    pub password: Option<String>,
    /// Set by a successful `SERVER` handshake.
    pub peer: Option<Peer>,
    /// Whether the peer's `EB` has arrived.
    pub burst_received: bool,
    /// Whether the peer acknowledged our burst with `EA`.
    pub burst_acked: bool,
    /// Lines received on this link.
    pub lines: u64,
}

/// The origin of a line, which every post-handshake command carries.
pub fn require_origin(msg: &P10Message) -> Result<&str, HandlerError> {
    msg.origin.as_deref().ok_or_else(|| {
        MessageParseError::MissingOrigin {
            token: msg.command.token().to_string(),
        }
        .into()
    })
}

/// Error for a handler invoked with a command it is not registered for.
pub fn unexpected(msg: &P10Message) -> HandlerError {
    HandlerError::Internal(format!("unexpected command {}", msg.command.token()))
}
