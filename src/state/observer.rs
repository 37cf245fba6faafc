//! State observer trait for link propagation.
//!
//! This module defines the `StateObserver` trait, which lets the link layer
//! hook into changes of the client table and relay them to peers.

use super::Client;
use p10_proto::{FullNumeric, P10Message};

/// A client removed by KILL, either decided here or relayed from a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillNotice {
    /// The killed client.
    pub target: FullNumeric,
    /// Its nickname at the time of the kill.
    pub nick: String,
    /// Numeric of the server or user that issued the kill.
    pub origin: String,
    /// Kill path and reason, `"<server> (<reason>)"`.
    pub path: String,
    /// Link the kill arrived on, or `None` if it was decided locally.
    pub source: Option<String>,
}

impl KillNotice {
    /// The `D` line announcing this kill.
    pub fn to_message(&self) -> P10Message {
        P10Message::kill(self.origin.clone(), self.target, self.path.clone())
    }
}

/// Trait for observing changes of the client table.
///
/// Methods are called by the `UserManager` after its lock has been released.
/// `source` names the link a change arrived on, or is `None` if the change
/// originated locally; implementations must not echo a change back to its
/// source.
pub trait StateObserver: Send + Sync {
    /// Called when a client has been added.
    fn on_client_introduce(&self, client: &Client, source: Option<&str>);

    /// Called when a client has changed nick.
    fn on_client_nick(&self, client: &Client, source: Option<&str>);

    /// Called when a client has been killed, including collision losers.
    fn on_client_kill(&self, kill: &KillNotice);

    /// Called when a client has quit.
    fn on_client_quit(&self, client: &Client, reason: &str, source: Option<&str>);
}
