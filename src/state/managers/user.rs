//! User management state and behavior.
//!
//! This module contains the `UserManager` struct, which owns the client
//! table: the nick index, the clients by numeric and the allocator for
//! local numerics. All three are mutated under one lock so no reader ever
//! sees a nick owned by a collision loser.

use crate::error::RegistryError;
use crate::state::observer::{KillNotice, StateObserver};
use crate::state::{Client, NumericAllocator};
use dashmap::DashMap;
use p10_proto::{
    CollisionVerdict, FullNumeric, IdentityClaim, ServerNumeric, irc_to_lower, resolve_collision,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Kill reason when the older claim wins against a different identity.
pub const REASON_OVERRULED: &str = "older nick overruled";
/// Kill reason when a reconnecting user@host displaces its old session.
pub const REASON_SAME_IDENTITY: &str = "nick collision from same user@host";
/// Kill reason when both claims carry the same timestamp.
pub const REASON_BOTH_LOSE: &str = "nick collision (both lose)";

/// Result of claiming a nickname through an introduction or a nick change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NickOutcome {
    /// The nickname was free (or already held by the same client).
    Accepted,
    /// The nickname was held by another client and the resolver decided.
    ///
    /// The verdict is from the point of view of `(holder, claimant)`.
    Collision {
        verdict: CollisionVerdict,
        kills: Vec<KillNotice>,
    },
}

impl NickOutcome {
    /// Whether the claimant holds the nickname afterwards.
    pub fn accepted(&self) -> bool {
        match self {
            Self::Accepted => true,
            Self::Collision { verdict, .. } => verdict.second_survives(),
        }
    }

    /// Clients killed as a consequence of this claim.
    pub fn kills(&self) -> &[KillNotice] {
        match self {
            Self::Accepted => &[],
            Self::Collision { kills, .. } => kills,
        }
    }
}

/// Tables guarded by the manager's lock.
struct ClientTable {
    /// RFC 1459 casemapped nick to owner.
    nicks: HashMap<String, FullNumeric>,
    clients: HashMap<FullNumeric, Client>,
    allocator: NumericAllocator,
    local: ServerNumeric,
}

impl ClientTable {
    fn insert(&mut self, client: Client) {
        self.nicks.insert(irc_to_lower(&client.nick), client.numeric);
        self.clients.insert(client.numeric, client);
    }

    fn remove(&mut self, numeric: FullNumeric) -> Option<Client> {
        let client = self.clients.remove(&numeric)?;
        let key = irc_to_lower(&client.nick);
        if self.nicks.get(&key) == Some(&numeric) {
            self.nicks.remove(&key);
        }
        if client.server() == self.local {
            self.allocator.release(numeric.user());
        }
        Some(client)
    }

    /// Move `numeric` to a new nick. The new nick must be free or its own.
    fn rename(&mut self, numeric: FullNumeric, nick: &str, ts: u64) -> Option<Client> {
        let client = self.clients.get_mut(&numeric)?;
        let old_key = irc_to_lower(&client.nick);
        client.nick = nick.to_string();
        client.nick_ts = ts;
        let renamed = client.clone();

        if self.nicks.get(&old_key) == Some(&numeric) {
            self.nicks.remove(&old_key);
        }
        self.nicks.insert(irc_to_lower(nick), numeric);
        Some(renamed)
    }
}

/// Pick the kill reason for a resolved collision.
fn collision_reason(
    verdict: CollisionVerdict,
    holder: &IdentityClaim<'_>,
    claimant: &IdentityClaim<'_>,
) -> &'static str {
    if verdict == CollisionVerdict::BothLose {
        REASON_BOTH_LOSE
    } else if holder.same_identity(claimant) {
        REASON_SAME_IDENTITY
    } else {
        REASON_OVERRULED
    }
}

/// Manages the client table and the senders of local clients.
///
/// The UserManager is responsible for:
/// - Tracking every client on the network by numeric and nickname.
/// - Applying collision verdicts atomically.
/// - Allocating numerics for local clients.
/// - Closing local connections that lose a collision or are killed.
pub struct UserManager {
    table: RwLock<ClientTable>,
    /// Line senders for locally connected clients.
    pub senders: DashMap<FullNumeric, mpsc::Sender<String>>,
    /// This server's name, used as the kill path prefix.
    pub server_name: String,
    /// This server's numeric, the origin of collision kills.
    pub server_numeric: ServerNumeric,
    /// Observer for state changes.
    pub observer: Option<Arc<dyn StateObserver>>,
}

impl UserManager {
    pub fn new(server_name: String, server_numeric: ServerNumeric, max_clients: u32) -> Self {
        Self {
            table: RwLock::new(ClientTable {
                nicks: HashMap::new(),
                clients: HashMap::new(),
                allocator: NumericAllocator::new(max_clients),
                local: server_numeric,
            }),
            senders: DashMap::new(),
            server_name,
            server_numeric,
            observer: None,
        }
    }

    /// Set the state observer.
    pub fn set_observer(&mut self, observer: Arc<dyn StateObserver>) {
        self.observer = Some(observer);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Look up a client by numeric.
    pub fn get(&self, numeric: FullNumeric) -> Option<Client> {
        self.table.read().clients.get(&numeric).cloned()
    }

    /// Owner of a nickname, under RFC 1459 case mapping.
    pub fn find_nick(&self, nick: &str) -> Option<FullNumeric> {
        self.table.read().nicks.get(&irc_to_lower(nick)).copied()
    }

    /// Number of clients on the network.
    pub fn client_count(&self) -> usize {
        self.table.read().clients.len()
    }

    /// Number of nicknames held. Always equal to [`Self::client_count`].
    pub fn nick_count(&self) -> usize {
        self.table.read().nicks.len()
    }

    /// Number of clients connected to this server.
    pub fn local_count(&self) -> usize {
        self.table.read().allocator.in_use() as usize
    }

    // ------------------------------------------------------------------
    // Local clients
    // ------------------------------------------------------------------

    /// Register a client connected to this server.
    ///
    /// A held nickname is refused outright; local registration never
    /// triggers a collision.
    ///
    /// Library entry point for embedders with a client listener; the `p10d`
    /// binary has none.
    pub fn register_local(
        &self,
        nick: &str,
        user: &str,
        host: &str,
        ts: u64,
        sender: mpsc::Sender<String>,
    ) -> Result<FullNumeric, RegistryError> {
        let client = {
            let mut table = self.table.write();
            if table.nicks.contains_key(&irc_to_lower(nick)) {
                return Err(RegistryError::NicknameInUse(nick.to_string()));
            }
            let user_numeric = table.allocator.allocate()?;
            let client = Client {
                numeric: FullNumeric::new(self.server_numeric, user_numeric),
                nick: nick.to_string(),
                nick_ts: ts,
                hops: 0,
                user: user.to_string(),
                host: host.to_string(),
                modes: None,
                mode_args: Vec::new(),
                ip: "AAAAAA".to_string(),
                realname: String::new(),
                seen_at: chrono::Utc::now(),
            };
            table.insert(client.clone());
            client
        };

        self.senders.insert(client.numeric, sender);
        debug!(numeric = %client.numeric, nick = %client.nick, "Registered local client");
        self.after_change();
        if let Some(observer) = &self.observer {
            observer.on_client_introduce(&client, None);
        }
        Ok(client.numeric)
    }

    // ------------------------------------------------------------------
    // Collision application
    // ------------------------------------------------------------------

    /// Introduce a remote client (`N` from a server).
    ///
    /// If the nickname is held, the holder's claim is the first argument to
    /// the resolver and the incoming client's the second. Losers are removed
    /// and the winner (if any) inserted under one write lock; the incoming
    /// client is only ever inserted if it wins.
    pub fn introduce(
        &self,
        client: Client,
        source: Option<&str>,
    ) -> Result<NickOutcome, RegistryError> {
        let (verdict, reason, losers, inserted) = {
            let mut table = self.table.write();
            if table.clients.contains_key(&client.numeric) {
                return Err(RegistryError::NumericInUse(client.numeric));
            }

            let holder = table
                .nicks
                .get(&irc_to_lower(&client.nick))
                .and_then(|n| table.clients.get(n))
                .cloned();

            let Some(holder) = holder else {
                table.insert(client.clone());
                drop(table);
                self.after_change();
                if let Some(observer) = &self.observer {
                    observer.on_client_introduce(&client, source);
                }
                return Ok(NickOutcome::Accepted);
            };

            let holder_uh = holder.user_at_host();
            let claimant_uh = client.user_at_host();
            let first = IdentityClaim::new(holder.nick_ts, &holder_uh);
            let second = IdentityClaim::new(client.nick_ts, &claimant_uh);
            let verdict = resolve_collision(&first, &second);
            let reason = collision_reason(verdict, &first, &second);

            let mut losers = Vec::with_capacity(2);
            if !verdict.first_survives() {
                losers.extend(table.remove(holder.numeric));
            }
            let inserted = verdict.second_survives();
            if inserted {
                table.insert(client.clone());
            } else {
                losers.push(client.clone());
            }
            (verdict, reason, losers, inserted)
        };

        info!(
            nick = %client.nick,
            incoming = %client.numeric,
            verdict = %verdict,
            reason,
            "Nick collision"
        );
        crate::metrics::record_collision(verdict.as_str());

        let kills = self.finish_collision(losers, reason);
        if inserted && let Some(observer) = &self.observer {
            observer.on_client_introduce(&client, source);
        }
        Ok(NickOutcome::Collision { verdict, kills })
    }

    /// Change a client's nickname.
    ///
    /// The renaming client claims the new nick with timestamp `ts`. Local
    /// clients get `NicknameInUse` instead of a collision.
    pub fn change_nick(
        &self,
        numeric: FullNumeric,
        nick: &str,
        ts: u64,
        source: Option<&str>,
    ) -> Result<NickOutcome, RegistryError> {
        let (verdict, reason, losers, renamed) = {
            let mut table = self.table.write();
            let current = table
                .clients
                .get(&numeric)
                .cloned()
                .ok_or(RegistryError::NoSuchClient(numeric))?;

            let holder = table
                .nicks
                .get(&irc_to_lower(nick))
                .filter(|&&owner| owner != numeric)
                .and_then(|n| table.clients.get(n))
                .cloned();

            let Some(holder) = holder else {
                let renamed = table.rename(numeric, nick, ts);
                drop(table);
                if let (Some(observer), Some(client)) = (&self.observer, &renamed) {
                    observer.on_client_nick(client, source);
                }
                return Ok(NickOutcome::Accepted);
            };

            if source.is_none() && current.server() == self.server_numeric {
                return Err(RegistryError::NicknameInUse(nick.to_string()));
            }

            let holder_uh = holder.user_at_host();
            let claimant_uh = current.user_at_host();
            let first = IdentityClaim::new(holder.nick_ts, &holder_uh);
            let second = IdentityClaim::new(ts, &claimant_uh);
            let verdict = resolve_collision(&first, &second);
            let reason = collision_reason(verdict, &first, &second);

            let mut losers = Vec::with_capacity(2);
            if !verdict.first_survives() {
                losers.extend(table.remove(holder.numeric));
            }
            let renamed = if verdict.second_survives() {
                table.rename(numeric, nick, ts)
            } else {
                losers.extend(table.remove(numeric));
                None
            };
            (verdict, reason, losers, renamed)
        };

        info!(
            nick = %nick,
            renaming = %numeric,
            verdict = %verdict,
            reason,
            "Nick change collision"
        );
        crate::metrics::record_collision(verdict.as_str());

        let kills = self.finish_collision(losers, reason);
        if let (Some(observer), Some(client)) = (&self.observer, &renamed) {
            observer.on_client_nick(client, source);
        }
        Ok(NickOutcome::Collision { verdict, kills })
    }

    /// Report collision losers. Runs after the table lock is released.
    fn finish_collision(&self, losers: Vec<Client>, reason: &str) -> Vec<KillNotice> {
        let path = format!("{} ({})", self.server_name, reason);
        let kills: Vec<KillNotice> = losers
            .into_iter()
            .map(|client| KillNotice {
                target: client.numeric,
                nick: client.nick,
                origin: self.server_numeric.to_string(),
                path: path.clone(),
                source: None,
            })
            .collect();

        for kill in &kills {
            crate::metrics::record_kill("collision");
            self.close_local(kill.target, &kill.nick, &kill.path);
            if let Some(observer) = &self.observer {
                observer.on_client_kill(kill);
            }
        }
        self.after_change();
        kills
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Kill a client on behalf of `origin`.
    ///
    /// `path` is relayed unchanged; `source` is the link the kill arrived on.
    pub fn kill(
        &self,
        target: FullNumeric,
        origin: &str,
        path: &str,
        source: Option<&str>,
    ) -> Result<KillNotice, RegistryError> {
        let client = self
            .table
            .write()
            .remove(target)
            .ok_or(RegistryError::NoSuchClient(target))?;

        let notice = KillNotice {
            target,
            nick: client.nick,
            origin: origin.to_string(),
            path: path.to_string(),
            source: source.map(str::to_string),
        };

        info!(target = %target, nick = %notice.nick, origin = %origin, path = %path, "Client killed");
        crate::metrics::record_kill(if source.is_some() { "remote" } else { "local" });
        self.close_local(target, &notice.nick, path);
        if let Some(observer) = &self.observer {
            observer.on_client_kill(&notice);
        }
        self.after_change();
        Ok(notice)
    }

    /// Remove a client that quit.
    pub fn quit(
        &self,
        numeric: FullNumeric,
        reason: &str,
        source: Option<&str>,
    ) -> Result<Client, RegistryError> {
        let client = self
            .table
            .write()
            .remove(numeric)
            .ok_or(RegistryError::NoSuchClient(numeric))?;

        debug!(numeric = %numeric, nick = %client.nick, reason = %reason, "Client quit");
        self.senders.remove(&numeric);
        if let Some(observer) = &self.observer {
            observer.on_client_quit(&client, reason, source);
        }
        self.after_change();
        Ok(client)
    }

    /// Remove every client of a departed server.
    ///
    /// No per-client notifications are sent; the `SQ` itself tells peers.
    pub fn remove_server(&self, server: ServerNumeric) -> Vec<Client> {
        let removed: Vec<Client> = {
            let mut table = self.table.write();
            let doomed: Vec<FullNumeric> = table
                .clients
                .keys()
                .copied()
                .filter(|n| server.owns(*n))
                .collect();
            doomed
                .into_iter()
                .filter_map(|n| table.remove(n))
                .collect()
        };

        for client in &removed {
            self.senders.remove(&client.numeric);
        }
        if !removed.is_empty() {
            debug!(server = %server, clients = removed.len(), "Removed clients of departed server");
            self.after_change();
        }
        removed
    }

    /// Send `ERROR` to a local client and drop its sender.
    fn close_local(&self, numeric: FullNumeric, nick: &str, path: &str) {
        if let Some((_, sender)) = self.senders.remove(&numeric) {
            let line = format!("ERROR :Closing Link: {nick} (Killed ({path}))");
            if let Err(e) = sender.try_send(line) {
                warn!(numeric = %numeric, error = %e, "Failed to notify killed local client");
            }
        }
    }

    fn after_change(&self) {
        crate::metrics::set_clients(self.client_count());
    }
}
