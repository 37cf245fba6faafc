//! Outbound link table.

use dashmap::DashMap;
use p10_proto::P10Message;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Sender half of a peer's outbound queue.
pub type LinkSender = mpsc::UnboundedSender<P10Message>;

/// Directly linked peers, keyed by lowercased server name.
#[derive(Default)]
pub struct LinkTable {
    links: DashMap<String, LinkSender>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a peer's outbound queue.
    pub fn attach(&self, name: &str, sender: LinkSender) {
        debug!(peer = %name, "Link attached");
        self.links.insert(name.to_ascii_lowercase(), sender);
    }

    /// Detach a peer. Returns whether it was attached.
    pub fn detach(&self, name: &str) -> bool {
        self.links.remove(&name.to_ascii_lowercase()).is_some()
    }

    /// Detach every peer, closing their queues once other clones drop.
    pub fn clear(&self) {
        self.links.clear();
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Send `msg` to every peer except `except`. Returns the number reached.
    pub fn broadcast(&self, msg: &P10Message, except: Option<&str>) -> usize {
        let mut sent = 0;
        for entry in self.links.iter() {
            if except.is_some_and(|name| entry.key().eq_ignore_ascii_case(name)) {
                continue;
            }
            match entry.value().send(msg.clone()) {
                Ok(()) => sent += 1,
                Err(e) => warn!(peer = %entry.key(), error = %e, "Failed to relay to peer"),
            }
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p10_proto::Command;

    #[test]
    fn test_broadcast_skips_source() {
        let table = LinkTable::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        table.attach("Leaf.example.net", tx_a);
        table.attach("other.example.net", tx_b);

        let msg = P10Message::new("AB", Command::EndOfBurst);
        assert_eq!(table.broadcast(&msg, Some("leaf.example.net")), 1);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), msg);

        assert_eq!(table.broadcast(&msg, None), 2);
        assert!(table.detach("LEAF.EXAMPLE.NET"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_closed_peer_is_not_counted() {
        let table = LinkTable::new();
        let (tx, rx) = mpsc::unbounded_channel();
        table.attach("gone.example.net", tx);
        drop(rx);
        assert_eq!(table.broadcast(&P10Message::new("AB", Command::EndOfBurst), None), 0);
    }
}
