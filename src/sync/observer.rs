//! Relays client table changes to linked peers.

use super::LinkTable;
use crate::state::{Client, KillNotice, StateObserver};
use p10_proto::{Command, P10Message};
use tracing::debug;

impl StateObserver for LinkTable {
    fn on_client_introduce(&self, client: &Client, source: Option<&str>) {
        let msg = P10Message::new(
            client.server().to_string(),
            Command::Nick(client.to_intro(client.hops.saturating_add(1))),
        );
        self.broadcast(&msg, source);
    }

    fn on_client_nick(&self, client: &Client, source: Option<&str>) {
        let msg = P10Message::new(
            client.numeric.to_string(),
            Command::NickChange {
                nick: client.nick.clone(),
                ts: client.nick_ts,
            },
        );
        self.broadcast(&msg, source);
    }

    fn on_client_kill(&self, kill: &KillNotice) {
        let reached = self.broadcast(&kill.to_message(), kill.source.as_deref());
        debug!(target = %kill.target, peers = reached, "Relayed KILL");
    }

    fn on_client_quit(&self, client: &Client, reason: &str, source: Option<&str>) {
        let msg = P10Message::new(
            client.numeric.to_string(),
            Command::Quit {
                reason: reason.to_string(),
            },
        );
        self.broadcast(&msg, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn client() -> Client {
        Client {
            numeric: "ACAAB".parse().unwrap(),
            nick: "Alice".into(),
            nick_ts: 1000,
            hops: 1,
            user: "alice".into(),
            host: "a.example".into(),
            modes: Some("+i".into()),
            mode_args: Vec::new(),
            ip: "B]AAAB".into(),
            realname: "Alice".into(),
            seen_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_collision_kill_goes_to_every_link() {
        let table = LinkTable::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        table.attach("leaf.example.net", tx);

        table.on_client_kill(&KillNotice {
            target: "ACAAB".parse().unwrap(),
            nick: "Alice".into(),
            origin: "AB".into(),
            path: "hub.example.net (nick collision (both lose))".into(),
            source: None,
        });
        assert_eq!(
            rx.try_recv().unwrap().to_string(),
            "AB D ACAAB :hub.example.net (nick collision (both lose))"
        );
    }

    #[test]
    fn test_introduction_is_relayed_one_hop_further() {
        let table = LinkTable::new();
        let (tx_src, mut rx_src) = mpsc::unbounded_channel();
        let (tx_other, mut rx_other) = mpsc::unbounded_channel();
        table.attach("leaf.example.net", tx_src);
        table.attach("other.example.net", tx_other);

        table.on_client_introduce(&client(), Some("leaf.example.net"));
        assert!(rx_src.try_recv().is_err());
        assert_eq!(
            rx_other.try_recv().unwrap().to_string(),
            "AC N Alice 2 1000 alice a.example +i B]AAAB ACAAB :Alice"
        );

        table.on_client_quit(&client(), "Leaving", None);
        assert_eq!(rx_src.try_recv().unwrap().to_string(), "ACAAB Q :Leaving");
    }
}
