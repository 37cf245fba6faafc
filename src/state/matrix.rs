//! The Matrix - Central shared state for the daemon.
//!
//! The Matrix holds the servers and clients this daemon knows about in
//! concurrent data structures accessible from any async task.

use crate::config::Config;
use crate::error::RegistryError;
use crate::state::UserManager;
use crate::sync::LinkTable;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use p10_proto::ServerNumeric;
use std::sync::Arc;
use tracing::info;

/// This server's identity information.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub numeric: ServerNumeric,
    pub description: String,
    /// Highest user numeric advertised in `SERVER`.
    pub capacity_mask: u32,
    /// Unix time the daemon started.
    pub created: i64,
}

/// A server on the network other than ourselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLink {
    pub name: String,
    pub numeric: ServerNumeric,
    /// Highest user numeric the server allocates.
    pub capacity: u32,
    pub hops: u32,
    /// Server that introduced it; `None` for a directly linked peer.
    pub uplink: Option<ServerNumeric>,
    pub link_ts: u64,
    /// Whether the server's `EB` has been seen.
    pub burst_complete: bool,
}

/// The Matrix - Central shared state container.
pub struct Matrix {
    /// This server's identity.
    pub server: ServerInfo,
    /// Known servers, indexed by numeric.
    pub servers: DashMap<ServerNumeric, ServerLink>,
    /// Client table and collision application.
    pub user_manager: UserManager,
    /// Outbound senders of directly linked peers.
    pub links: Arc<LinkTable>,
}

impl Matrix {
    /// Create the state for the configured server.
    pub fn new(config: &Config) -> Self {
        let server = ServerInfo {
            name: config.server.name.clone(),
            numeric: config.server.numeric,
            description: config.server.description.clone(),
            capacity_mask: config.server.capacity_mask(),
            created: chrono::Utc::now().timestamp(),
        };

        let links = Arc::new(LinkTable::new());
        let mut user_manager = UserManager::new(
            server.name.clone(),
            server.numeric,
            config.server.max_clients,
        );
        user_manager.set_observer(links.clone());

        Self {
            server,
            servers: DashMap::new(),
            user_manager,
            links,
        }
    }

    /// Add a server. Fails if the numeric is ours or already linked.
    pub fn add_server(&self, link: ServerLink) -> Result<(), RegistryError> {
        if link.numeric == self.server.numeric {
            return Err(RegistryError::ServerExists(link.numeric));
        }
        match self.servers.entry(link.numeric) {
            Entry::Occupied(_) => return Err(RegistryError::ServerExists(link.numeric)),
            Entry::Vacant(slot) => {
                info!(
                    name = %link.name,
                    numeric = %link.numeric,
                    hops = link.hops,
                    capacity = link.capacity,
                    "Server linked"
                );
                slot.insert(link);
            }
        }
        crate::metrics::set_servers(self.servers.len());
        Ok(())
    }

    /// Look up a server by numeric.
    pub fn server(&self, numeric: ServerNumeric) -> Option<ServerLink> {
        self.servers.get(&numeric).map(|s| s.clone())
    }

    /// Find a server's numeric by name (case-insensitive).
    pub fn find_server(&self, name: &str) -> Option<ServerNumeric> {
        self.servers
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| *s.key())
    }

    /// Whether `server` is `peer` or reached through it.
    ///
    /// Walks `uplink` pointers; our own numeric and unknown servers are
    /// never behind a peer.
    pub fn is_behind(&self, server: ServerNumeric, peer: ServerNumeric) -> bool {
        let mut current = server;
        // Bounded so a corrupt uplink chain cannot loop forever
        for _ in 0..=self.servers.len() {
            if current == peer {
                return true;
            }
            match self.servers.get(&current).and_then(|s| s.uplink) {
                Some(up) => current = up,
                None => return false,
            }
        }
        false
    }

    /// Record that a server finished its burst.
    pub fn set_burst_complete(&self, numeric: ServerNumeric) {
        if let Some(mut link) = self.servers.get_mut(&numeric) {
            link.burst_complete = true;
        }
    }

    /// Remove a server, every server behind it and all of their clients.
    ///
    /// Returns the removed servers (the named one first) and the number of
    /// clients dropped with them.
    pub fn remove_server(&self, numeric: ServerNumeric) -> (Vec<ServerLink>, usize) {
        let mut doomed = vec![numeric];
        let mut i = 0;
        while i < doomed.len() {
            let parent = doomed[i];
            let children: Vec<ServerNumeric> = self
                .servers
                .iter()
                .filter(|s| s.uplink == Some(parent) && !doomed.contains(s.key()))
                .map(|s| *s.key())
                .collect();
            doomed.extend(children);
            i += 1;
        }

        let mut removed = Vec::with_capacity(doomed.len());
        let mut clients = 0;
        for n in doomed {
            if let Some((_, link)) = self.servers.remove(&n) {
                clients += self.user_manager.remove_server(n).len();
                removed.push(link);
            }
        }
        crate::metrics::set_servers(self.servers.len());
        (removed, clients)
    }
}
