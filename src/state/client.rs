//! Clients as seen by the network view.

use chrono::{DateTime, Utc};
use p10_proto::{FullNumeric, NickIntro, ServerNumeric};

/// A client known to this server, local or remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub numeric: FullNumeric,
    pub nick: String,
    /// Nick timestamp; the collision claim's age.
    pub nick_ts: u64,
    pub hops: u32,
    pub user: String,
    pub host: String,
    pub modes: Option<String>,
    pub mode_args: Vec<String>,
    /// Base64-encoded IP as sent in `N`.
    pub ip: String,
    pub realname: String,
    /// When this server learned about the client.
    pub seen_at: DateTime<Utc>,
}

impl Client {
    /// Build a client from an `N` introduction.
    pub fn from_intro(intro: NickIntro) -> Self {
        Self {
            numeric: intro.numeric,
            nick: intro.nick,
            nick_ts: intro.ts,
            hops: intro.hops,
            user: intro.user,
            host: intro.host,
            modes: intro.modes,
            mode_args: intro.mode_args,
            ip: intro.ip,
            realname: intro.realname,
            seen_at: Utc::now(),
        }
    }

    /// The `N` introduction that announces this client, `hops` away.
    pub fn to_intro(&self, hops: u32) -> NickIntro {
        NickIntro {
            nick: self.nick.clone(),
            hops,
            ts: self.nick_ts,
            user: self.user.clone(),
            host: self.host.clone(),
            modes: self.modes.clone(),
            mode_args: self.mode_args.clone(),
            ip: self.ip.clone(),
            numeric: self.numeric,
            realname: self.realname.clone(),
        }
    }

    /// `user@host`, the identity compared during collisions.
    pub fn user_at_host(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// The server this client is connected to.
    #[inline]
    pub fn server(&self) -> ServerNumeric {
        self.numeric.server()
    }
}
