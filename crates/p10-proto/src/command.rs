//! Typed P10 commands.
//!
//! Only the commands that carry numerics or collision inputs are modelled;
//! everything else is preserved as [`Command::Other`] so it can be relayed or
//! ignored by the caller.

use std::fmt;
use std::str::FromStr;

use crate::error::{MessageParseError, Result};
use crate::line::P10Line;
use crate::numeric::{FullNumeric, ServerNumeric, FULL_NUMERIC_LEN};

fn parse_int<T: FromStr>(field: &'static str, value: &str) -> Result<T> {
    value.parse().map_err(|_| MessageParseError::InvalidInteger {
        field,
        value: value.to_string(),
    })
}

/// `SERVER`/`S`: a server joining the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIntro {
    /// Server name.
    pub name: String,
    /// Hop count from the sender.
    pub hops: u32,
    /// Time the server started.
    pub boot_ts: u64,
    /// Time the link was established.
    pub link_ts: u64,
    /// Protocol string (`J10` during burst, `P10` after).
    pub protocol: String,
    /// The server's numeric.
    pub numeric: ServerNumeric,
    /// Highest user numeric the server allocates.
    pub capacity: u32,
    /// Server flags (`+h6` ...), when sent.
    pub flags: Option<String>,
    /// Free-form description.
    pub description: String,
}

/// `N` from a server: a client joining the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NickIntro {
    /// Nickname.
    pub nick: String,
    /// Hop count from the sender.
    pub hops: u32,
    /// Nick timestamp used for collision resolution.
    pub ts: u64,
    /// Username (ident).
    pub user: String,
    /// Hostname.
    pub host: String,
    /// User modes, with leading `+`.
    pub modes: Option<String>,
    /// Arguments for modes that take one (`+r account`, `+h vhost`).
    pub mode_args: Vec<String>,
    /// Base64-encoded IP address.
    pub ip: String,
    /// The client's full numeric.
    pub numeric: FullNumeric,
    /// Real name (GECOS).
    pub realname: String,
}

impl NickIntro {
    /// `user@host` as used in collision claims.
    pub fn user_at_host(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// A P10 command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `PASS :password`
    Pass {
        /// Link password.
        password: String,
    },
    /// `SERVER` (handshake) or `S` (remote server).
    Server(ServerIntro),
    /// `N` from a server numeric.
    Nick(NickIntro),
    /// `N` from a user numeric: nickname change.
    NickChange {
        /// New nickname.
        nick: String,
        /// Timestamp of the change.
        ts: u64,
    },
    /// `D`: kill a client.
    Kill {
        /// Client being killed.
        target: FullNumeric,
        /// Kill path and reason.
        reason: String,
    },
    /// `Q`: client quit.
    Quit {
        /// Quit message.
        reason: String,
    },
    /// `SQ`: server quit.
    Squit {
        /// Name of the departing server.
        server: String,
        /// Link timestamp, `0` to force.
        ts: u64,
        /// Reason.
        reason: String,
    },
    /// `EB`: end of burst.
    EndOfBurst,
    /// `EA`: end of burst acknowledgement.
    EndOfBurstAck,
    /// Any token not interpreted here.
    Other {
        /// Command token.
        token: String,
        /// Raw parameters.
        params: Vec<String>,
    },
}

impl Command {
    /// Short token used for dispatch. `SERVER` and `S` both map to `S`.
    pub fn token(&self) -> &str {
        match self {
            Self::Pass { .. } => "PASS",
            Self::Server(_) => "S",
            Self::Nick(_) | Self::NickChange { .. } => "N",
            Self::Kill { .. } => "D",
            Self::Quit { .. } => "Q",
            Self::Squit { .. } => "SQ",
            Self::EndOfBurst => "EB",
            Self::EndOfBurstAck => "EA",
            Self::Other { token, .. } => token,
        }
    }

    /// Build a typed command from a tokenized line.
    pub fn from_line(line: &P10Line<'_>) -> Result<Self> {
        let p = &line.params;
        match line.token {
            "PASS" => {
                line.require(1)?;
                Ok(Self::Pass {
                    password: p[0].to_string(),
                })
            }
            "SERVER" | "S" => {
                line.require(7)?;
                let (numeric, capacity) = ServerNumeric::split_capacity(p[5])?;
                let (flags, description) = if p.len() >= 8 {
                    (Some(p[6].to_string()), p[p.len() - 1])
                } else {
                    (None, p[6])
                };
                Ok(Self::Server(ServerIntro {
                    name: p[0].to_string(),
                    hops: parse_int("hopcount", p[1])?,
                    boot_ts: parse_int("boot timestamp", p[2])?,
                    link_ts: parse_int("link timestamp", p[3])?,
                    protocol: p[4].to_string(),
                    numeric,
                    capacity,
                    flags,
                    description: description.to_string(),
                }))
            }
            "N" => {
                // A user numeric origin means a nick change
                if line.origin.is_some_and(|o| o.len() == FULL_NUMERIC_LEN) {
                    line.require(1)?;
                    let ts = match p.get(1) {
                        Some(ts) => parse_int("timestamp", ts)?,
                        None => 0,
                    };
                    return Ok(Self::NickChange {
                        nick: p[0].to_string(),
                        ts,
                    });
                }

                line.require(8)?;
                let n = p.len();
                let middle = &p[5..n - 3];
                let (modes, mode_args) = match middle.split_first() {
                    Some((modes, args)) => (
                        Some(modes.to_string()),
                        args.iter().map(|a| a.to_string()).collect(),
                    ),
                    None => (None, Vec::new()),
                };
                Ok(Self::Nick(NickIntro {
                    nick: p[0].to_string(),
                    hops: parse_int("hopcount", p[1])?,
                    ts: parse_int("timestamp", p[2])?,
                    user: p[3].to_string(),
                    host: p[4].to_string(),
                    modes,
                    mode_args,
                    ip: p[n - 3].to_string(),
                    numeric: p[n - 2].parse()?,
                    realname: p[n - 1].to_string(),
                }))
            }
            "D" => {
                line.require(1)?;
                Ok(Self::Kill {
                    target: p[0].parse()?,
                    reason: p.get(1).copied().unwrap_or_default().to_string(),
                })
            }
            "Q" => Ok(Self::Quit {
                reason: p.first().copied().unwrap_or_default().to_string(),
            }),
            "SQ" => {
                line.require(1)?;
                let ts = match p.get(1) {
                    Some(ts) => parse_int("timestamp", ts)?,
                    None => 0,
                };
                Ok(Self::Squit {
                    server: p[0].to_string(),
                    ts,
                    reason: p.get(2).copied().unwrap_or_default().to_string(),
                })
            }
            "EB" => Ok(Self::EndOfBurst),
            "EA" => Ok(Self::EndOfBurstAck),
            other => Ok(Self::Other {
                token: other.to_string(),
                params: p.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }
}

/// A command with its origin, ready to be written to or read from a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P10Message {
    /// Origin numeric; `None` for handshake lines.
    pub origin: Option<String>,
    /// The command.
    pub command: Command,
}

impl P10Message {
    /// A message originating from `origin`.
    pub fn new(origin: impl Into<String>, command: Command) -> Self {
        Self {
            origin: Some(origin.into()),
            command,
        }
    }

    /// A handshake message without origin.
    pub fn originless(command: Command) -> Self {
        Self {
            origin: None,
            command,
        }
    }

    /// `D` line killing `target`.
    pub fn kill(origin: impl Into<String>, target: FullNumeric, reason: impl Into<String>) -> Self {
        Self::new(
            origin,
            Command::Kill {
                target,
                reason: reason.into(),
            },
        )
    }
}

impl FromStr for P10Message {
    type Err = MessageParseError;

    fn from_str(s: &str) -> Result<Self> {
        let line = P10Line::parse(s)?;
        Ok(Self {
            origin: line.origin.map(str::to_string),
            command: Command::from_line(&line)?,
        })
    }
}

impl fmt::Display for P10Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(origin) = &self.origin {
            write!(f, "{origin} ")?;
        }

        match &self.command {
            Command::Pass { password } => write!(f, "PASS :{password}"),
            Command::Server(s) => {
                let token = if self.origin.is_some() { "S" } else { "SERVER" };
                write!(
                    f,
                    "{token} {} {} {} {} {} {}",
                    s.name, s.hops, s.boot_ts, s.link_ts, s.protocol, s.numeric
                )?;
                // The capacity mask shares the user numeric encoding
                match crate::numeric::UserNumeric::new(s.capacity) {
                    Ok(mask) => write!(f, "{mask}")?,
                    Err(_) => return Err(fmt::Error),
                }
                if let Some(flags) = &s.flags {
                    write!(f, " {flags}")?;
                }
                write!(f, " :{}", s.description)
            }
            Command::Nick(n) => {
                write!(f, "N {} {} {} {} {}", n.nick, n.hops, n.ts, n.user, n.host)?;
                if let Some(modes) = &n.modes {
                    write!(f, " {modes}")?;
                    for arg in &n.mode_args {
                        write!(f, " {arg}")?;
                    }
                }
                write!(f, " {} {} :{}", n.ip, n.numeric, n.realname)
            }
            Command::NickChange { nick, ts } => write!(f, "N {nick} {ts}"),
            Command::Kill { target, reason } => write!(f, "D {target} :{reason}"),
            Command::Quit { reason } => write!(f, "Q :{reason}"),
            Command::Squit { server, ts, reason } => write!(f, "SQ {server} {ts} :{reason}"),
            Command::EndOfBurst => f.write_str("EB"),
            Command::EndOfBurstAck => f.write_str("EA"),
            Command::Other { token, params } => {
                f.write_str(token)?;
                if let Some((last, init)) = params.split_last() {
                    for p in init {
                        write!(f, " {p}")?;
                    }
                    if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                        write!(f, " :{last}")?;
                    } else {
                        write!(f, " {last}")?;
                    }
                }
                Ok(())
            }
        }
    }
}
